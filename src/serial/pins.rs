//! Pin to UART Slot Resolution
//!
//! Every UART on the chip is reached through a fixed set of Tx pins. The
//! Tx pin alone decides which physical UART (slot) a port drives.
//!
//! # Slot Map
//! ```text
//! slot 0  KM4 uart0      Tx: PA_18, PA_21, PB_9, PB_19
//! slot 1  KM4 uart1_bt   (not reachable from a Tx pin)
//! slot 2  KM0 log uart   Tx: PA_7
//! slot 3  KM0 luart      Tx: PA_12, PA_26, PB_1
//! ```

use super::error::{Result, SerialError};

/// Number of physical UART instances.
pub const UART_SLOTS: usize = 4;

/// A GPIO pin identifier.
///
/// Encoded as `port << 5 | pin`, so port A occupies 0x00..0x1F and port B
/// occupies 0x20..0x3F.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct PinName(u8);

impl PinName {
    /// Number of pins per GPIO port.
    pub const PINS_PER_PORT: u8 = 32;

    /// Create a pin on port A.
    ///
    /// Returns None if the pin number is out of range.
    #[inline]
    pub const fn port_a(pin: u8) -> Option<Self> {
        if pin < Self::PINS_PER_PORT {
            Some(Self(pin))
        } else {
            None
        }
    }

    /// Create a pin on port B.
    ///
    /// Returns None if the pin number is out of range.
    #[inline]
    pub const fn port_b(pin: u8) -> Option<Self> {
        if pin < Self::PINS_PER_PORT {
            Some(Self(Self::PINS_PER_PORT + pin))
        } else {
            None
        }
    }

    /// Get the raw pin encoding.
    #[inline]
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Port letter ('A' or 'B').
    #[inline]
    pub const fn port(self) -> char {
        if self.0 < Self::PINS_PER_PORT {
            'A'
        } else {
            'B'
        }
    }

    /// Pin number within the port.
    #[inline]
    pub const fn number(self) -> u8 {
        self.0 % Self::PINS_PER_PORT
    }

    pub const PA_7: Self = Self(7);
    pub const PA_8: Self = Self(8);
    pub const PA_12: Self = Self(12);
    pub const PA_13: Self = Self(13);
    pub const PA_18: Self = Self(18);
    pub const PA_19: Self = Self(19);
    pub const PA_21: Self = Self(21);
    pub const PA_22: Self = Self(22);
    pub const PA_26: Self = Self(26);
    pub const PB_1: Self = Self(32 + 1);
    pub const PB_2: Self = Self(32 + 2);
    pub const PB_9: Self = Self(32 + 9);
    pub const PB_19: Self = Self(32 + 19);
}

impl core::fmt::Debug for PinName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "P{}_{}", self.port(), self.number())
    }
}

impl core::fmt::Display for PinName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Debug::fmt(self, f)
    }
}

/// A physical UART instance.
///
/// This is a newtype to prevent using arbitrary integers as slot indices.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
#[repr(transparent)]
pub struct UartSlot(u8);

impl UartSlot {
    /// Create a new slot index.
    ///
    /// Returns None if the index is out of range.
    #[inline]
    pub const fn new(index: u8) -> Option<Self> {
        if (index as usize) < UART_SLOTS {
            Some(Self(index))
        } else {
            None
        }
    }

    /// Get the index value.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// KM4 uart0.
    pub const UART0: Self = Self(0);
    /// KM4 uart1 (shared with Bluetooth).
    pub const UART1_BT: Self = Self(1);
    /// KM0 log uart.
    pub const LOG_UART: Self = Self(2);
    /// KM0 low-power uart.
    pub const LUART: Self = Self(3);
}

/// Resolve the physical UART a Tx pin is wired to.
///
/// Pure and total over the recognized pin set. Any other pin is a board
/// mismatch and is reported as [`SerialError::UnmappedPin`].
pub const fn resolve(tx: PinName) -> Result<UartSlot> {
    match tx {
        PinName::PA_12 | PinName::PB_1 | PinName::PA_26 => Ok(UartSlot::LUART),
        PinName::PA_18 | PinName::PA_21 | PinName::PB_9 | PinName::PB_19 => Ok(UartSlot::UART0),
        PinName::PA_7 => Ok(UartSlot::LOG_UART),
        _ => Err(SerialError::UnmappedPin(tx)),
    }
}
