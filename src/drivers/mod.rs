//! Device drivers for PantherOS
//!
//! All drivers follow these principles:
//! - No unsafe code; hardware access goes through the vendor layer
//! - Input validation on all public interfaces
//! - No panics on invalid input (return errors)

pub mod console;
