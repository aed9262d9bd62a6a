//! Per-Port Line Configuration
//!
//! [`PortConfig`] is the mutable configuration record for one port. It is
//! built at startup from board defaults and rewritten in place by termios
//! requests; the hardware only sees it on the next `setup`.

use super::error::{Result, SerialError};
use super::pins::PinName;

/// Number of data bits per character.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum WordLength {
    Five = 5,
    Six = 6,
    Seven = 7,
    Eight = 8,
}

impl WordLength {
    /// Convert a bit count into a word length.
    pub const fn from_bits(bits: u8) -> Result<Self> {
        match bits {
            5 => Ok(Self::Five),
            6 => Ok(Self::Six),
            7 => Ok(Self::Seven),
            8 => Ok(Self::Eight),
            _ => Err(SerialError::UnsupportedWordLength),
        }
    }

    /// Bit count.
    #[inline]
    pub const fn bits(self) -> u8 {
        self as u8
    }
}

/// Parity checking mode.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Parity {
    None,
    Odd,
    Even,
}

impl Parity {
    #[inline]
    pub const fn is_enabled(self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Number of stop bits.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum StopBits {
    One,
    Two,
}

/// Hardware flow control mode.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FlowControl {
    None,
    /// RTS only
    Rts,
    /// CTS only
    Cts,
    /// Both RTS and CTS
    RtsCts,
}

/// Character framing handed to the hardware on `configure`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct FrameFormat {
    pub word_len: WordLength,
    pub parity: Parity,
    /// Force the parity bit to a fixed level (mark/space) instead of computing it.
    pub stick_parity: bool,
    pub stop_bits: StopBits,
}

/// Receive FIFO tuning handed to the hardware on `initialize`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct FifoSettings {
    /// Bytes in the rx FIFO before an rx interrupt is raised.
    pub rx_trigger_level: u8,
    /// Idle character times before a partially filled rx FIFO raises a timeout interrupt.
    pub rx_timeout: u32,
}

/// Configuration state of one port.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct PortConfig {
    pub word_len: WordLength,
    pub parity: Parity,
    pub stick_parity: bool,
    pub stop_bits: StopBits,
    pub flow_control: FlowControl,
    pub rx_trigger_level: u8,
    pub rx_timeout: u32,
    pub baud: u32,
    pub tx: PinName,
    pub rx: PinName,
    /// Interrupt line of the peripheral.
    pub irq: u32,
}

impl PortConfig {
    /// Default baud rate.
    pub const DEFAULT_BAUD: u32 = 115_200;
    /// Default rx FIFO trigger level.
    pub const DEFAULT_RX_TRIGGER: u8 = 1;
    /// Default rx timeout count.
    pub const DEFAULT_RX_TIMEOUT: u32 = 64;

    /// Create an 8N1 configuration at the default baud rate.
    pub const fn new(tx: PinName, rx: PinName, irq: u32) -> Self {
        Self {
            word_len: WordLength::Eight,
            parity: Parity::None,
            stick_parity: false,
            stop_bits: StopBits::One,
            flow_control: FlowControl::None,
            rx_trigger_level: Self::DEFAULT_RX_TRIGGER,
            rx_timeout: Self::DEFAULT_RX_TIMEOUT,
            baud: Self::DEFAULT_BAUD,
            tx,
            rx,
            irq,
        }
    }

    /// Set the baud rate.
    pub const fn with_baud(mut self, baud: u32) -> Self {
        self.baud = baud;
        self
    }

    /// Set the character framing.
    pub const fn with_format(mut self, word_len: WordLength, parity: Parity, stop_bits: StopBits) -> Self {
        self.word_len = word_len;
        self.parity = parity;
        self.stop_bits = stop_bits;
        self
    }

    /// Set the flow control mode.
    pub const fn with_flow_control(mut self, flow_control: FlowControl) -> Self {
        self.flow_control = flow_control;
        self
    }

    /// Framing to program into the hardware.
    pub const fn frame_format(&self) -> FrameFormat {
        FrameFormat {
            word_len: self.word_len,
            parity: self.parity,
            stick_parity: self.stick_parity,
            stop_bits: self.stop_bits,
        }
    }

    /// FIFO tuning to program into the hardware.
    pub const fn fifo_settings(&self) -> FifoSettings {
        FifoSettings {
            rx_trigger_level: self.rx_trigger_level,
            rx_timeout: self.rx_timeout,
        }
    }
}
