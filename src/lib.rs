//! PantherOS Serial - UART lower-half driver
//!
//! Binds the chip's physical UARTs into a character-device serial core.
//!
//! # Layout
//! - [`serial`]: per-port lifecycle, interrupt routing, termios handling
//! - [`drivers::console`]: console strategies and the kernel print macros
//! - [`board`]: default pin/IRQ wiring and boot-time device registration
//! - [`logger`]: `log` backend writing to the selected console
//!
//! # Bring-up Order
//! 1. Build a [`serial::PortRegistry`] over the vendor hardware factory
//! 2. Construct one [`serial::UartPort`] per board UART
//! 3. [`board::serial_init`] sets up the console port and registers devices
//! 4. Select a console with [`drivers::console::install`], then [`logger::init`]

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod board;
pub mod drivers;
pub mod logger;
pub mod serial;

#[cfg(test)]
mod testing;
