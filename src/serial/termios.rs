//! Terminal Attribute Translation
//!
//! Converts between termios-style requests and [`PortConfig`].
//!
//! # Known Asymmetry
//! `get` always reports `CS8`, whatever word length is configured, while
//! `set` honours the requested `CSIZE`. A `set(get())` round trip therefore
//! resets the word length to 8 bits.

use bitflags::bitflags;

use super::config::{Parity, PortConfig, StopBits, WordLength};
use super::error::{Result, SerialError};
use super::hal::HardwareFactory;
use super::port::UartPort;

/// ioctl command numbers
pub mod cmds {
    /// Read terminal attributes.
    pub const TCGETS: u32 = 0x5401;
    /// Write terminal attributes.
    pub const TCSETS: u32 = 0x5402;
}

bitflags! {
    /// Control mode flags (`c_cflag`).
    #[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
    pub struct ControlFlags: u32 {
        const CS6 = 0x0010;
        const CS7 = 0x0020;
        const CS8 = 0x0030;
        /// Character size mask.
        const CSIZE = 0x0030;
        /// Two stop bits instead of one.
        const CSTOPB = 0x0040;
        const CREAD = 0x0080;
        /// Parity enable.
        const PARENB = 0x0100;
        /// Odd parity instead of even.
        const PARODD = 0x0200;
        const HUPCL = 0x0400;
        const CLOCAL = 0x0800;
        const CRTS_IFLOW = 0x1000;
        const CCTS_OFLOW = 0x2000;
    }
}

impl ControlFlags {
    /// Five-bit characters (all `CSIZE` bits clear).
    pub const CS5: Self = Self::empty();

    /// Decode the character size field.
    pub fn word_length(self) -> WordLength {
        match (self & Self::CSIZE).bits() {
            0x0000 => WordLength::Five,
            0x0010 => WordLength::Six,
            0x0020 => WordLength::Seven,
            _ => WordLength::Eight,
        }
    }

    /// Replace the character size field.
    pub fn with_word_length(self, word_len: WordLength) -> Self {
        let size = match word_len {
            WordLength::Five => Self::CS5,
            WordLength::Six => Self::CS6,
            WordLength::Seven => Self::CS7,
            WordLength::Eight => Self::CS8,
        };
        self.difference(Self::CSIZE).union(size)
    }
}

/// Terminal attributes exchanged through `TCGETS` / `TCSETS`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Termios {
    pub c_iflag: u32,
    pub c_oflag: u32,
    pub c_cflag: ControlFlags,
    pub c_lflag: u32,
    /// Line speed in bits per second.
    pub c_speed: u32,
}

impl Termios {
    /// Input speed (`cfgetispeed`).
    #[inline]
    pub const fn input_speed(&self) -> u32 {
        self.c_speed
    }

    /// Set the input speed (`cfsetispeed`).
    #[inline]
    pub fn set_input_speed(&mut self, speed: u32) {
        self.c_speed = speed;
    }
}

/// Build terminal attributes from a port configuration.
///
/// The character size is always reported as `CS8`.
pub fn attributes_of(cfg: &PortConfig) -> Termios {
    let mut cflag = ControlFlags::CS8;
    match cfg.parity {
        Parity::None => {}
        Parity::Even => cflag |= ControlFlags::PARENB,
        Parity::Odd => cflag |= ControlFlags::PARENB | ControlFlags::PARODD,
    }
    if cfg.stop_bits == StopBits::Two {
        cflag |= ControlFlags::CSTOPB;
    }

    let mut attrs = Termios {
        c_cflag: cflag,
        ..Termios::default()
    };
    attrs.set_input_speed(cfg.baud);
    attrs
}

/// Write terminal attributes into a port configuration.
///
/// Only word length, parity, stop bits and baud are taken from `attrs`.
/// A zero speed is rejected before anything is written, since no divisor
/// exists for it.
pub fn apply_attributes(cfg: &mut PortConfig, attrs: &Termios) -> Result<()> {
    let baud = attrs.input_speed();
    if baud == 0 {
        return Err(SerialError::InvalidArgument);
    }
    let cflag = attrs.c_cflag;

    cfg.word_len = cflag.word_length();
    cfg.parity = if !cflag.contains(ControlFlags::PARENB) {
        Parity::None
    } else if cflag.contains(ControlFlags::PARODD) {
        Parity::Odd
    } else {
        Parity::Even
    };
    cfg.stop_bits = if cflag.contains(ControlFlags::CSTOPB) {
        StopBits::Two
    } else {
        StopBits::One
    };
    cfg.baud = baud;
    Ok(())
}

/// Report the current attributes of a port.
pub fn get<F: HardwareFactory>(port: &UartPort<'_, F>) -> Termios {
    attributes_of(&port.config())
}

/// Apply new attributes to a port.
///
/// The configuration is rewritten, then the port goes through a full
/// shutdown/setup cycle. Live hardware registers are never patched.
pub fn set<F: HardwareFactory>(port: &UartPort<'_, F>, attrs: &Termios) -> Result<()> {
    let mut cfg = port.config();
    apply_attributes(&mut cfg, attrs)?;
    port.update_config(|current| *current = cfg);
    port.reconfigure()
}

/// Dispatch a terminal ioctl.
///
/// # Returns
/// * `InvalidArgument` - `arg` is missing
/// * `NotTty` - unknown command
pub fn ioctl<F: HardwareFactory>(port: &UartPort<'_, F>, cmd: u32, arg: Option<&mut Termios>) -> Result<()> {
    match cmd {
        cmds::TCGETS => {
            let attrs = arg.ok_or(SerialError::InvalidArgument)?;
            *attrs = get(port);
            Ok(())
        }
        cmds::TCSETS => {
            let attrs = arg.ok_or(SerialError::InvalidArgument)?;
            set(port, attrs)
        }
        _ => {
            log::debug!("serial: unsupported ioctl {:#x}", cmd);
            Err(SerialError::NotTty)
        }
    }
}
