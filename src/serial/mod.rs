//! UART Lower-Half Driver
//!
//! Binds physical UARTs into the serial core.
//!
//! # Design
//! - Each port's Tx pin selects one physical UART (slot)
//! - A registry owns at most one live hardware handle per slot
//! - Ports move through Unconfigured / Detached / Attached
//! - Hardware interrupts are routed to the serial core's pumps
//! - Terminal attribute changes restart the port with the new settings

pub mod config;
pub mod error;
pub mod hal;
pub mod pins;
pub mod port;
pub mod registry;
pub mod termios;

pub use config::{FlowControl, Parity, PortConfig, StopBits, WordLength};
pub use error::{Errno, SerialError};
pub use hal::{HardwareFactory, IrqEvent, UartHardware};
pub use pins::{PinName, UartSlot};
pub use port::{IrqDemux, PortPhase, SerialPump, UartOps, UartPort};
pub use registry::PortRegistry;
pub use termios::{ControlFlags, Termios};
