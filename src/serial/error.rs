//! Serial Driver Errors
//!
//! Two tiers of failure are reported through [`SerialError`]:
//! - Configuration and lifecycle faults (unmapped pin, slot already owned,
//!   operation issued in the wrong port phase). These indicate a board or
//!   caller bug; the driver reports them instead of halting.
//! - Caller-facing runtime errors from the ioctl surface. These map onto
//!   negative errno values via [`Errno`] and never leave partial state.

use super::pins::PinName;
use super::port::PortPhase;

/// Error type for serial driver operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerialError {
    /// The Tx pin is not wired to any UART on this chip.
    UnmappedPin(PinName),
    /// The slot already has a live hardware handle.
    SlotOccupied,
    /// The slot has no hardware handle.
    SlotEmpty,
    /// The slot is held by another context; retry later.
    SlotBusy,
    /// The port is not in the phase the operation requires.
    InvalidState {
        expected: PortPhase,
        found: PortPhase,
    },
    /// Null or malformed ioctl argument.
    InvalidArgument,
    /// The ioctl command is not supported by this device.
    NotTty,
    /// The requested character size cannot be programmed.
    UnsupportedWordLength,
    /// A bounded wait ran out of polls.
    Timeout,
    /// A console strategy was already selected.
    ConsoleAlreadyInstalled,
    /// The serial core refused a device registration.
    RegistrationFailed,
}

impl SerialError {
    /// Map the error onto the errno returned through the device interface.
    pub const fn errno(self) -> Errno {
        match self {
            Self::NotTty => Errno::Enotty,
            Self::Timeout | Self::SlotBusy => Errno::Eagain,
            Self::SlotOccupied | Self::ConsoleAlreadyInstalled => Errno::Ebusy,
            Self::SlotEmpty | Self::UnmappedPin(_) => Errno::Enodev,
            Self::InvalidState { .. }
            | Self::InvalidArgument
            | Self::UnsupportedWordLength
            | Self::RegistrationFailed => Errno::Einval,
        }
    }
}

impl core::fmt::Display for SerialError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::UnmappedPin(pin) => write!(f, "pin {} is not wired to a UART", pin),
            Self::SlotOccupied => write!(f, "UART slot already owned"),
            Self::SlotEmpty => write!(f, "UART slot is empty"),
            Self::SlotBusy => write!(f, "UART slot is busy"),
            Self::InvalidState { expected, found } => {
                write!(f, "port is {:?}, operation requires {:?}", found, expected)
            }
            Self::InvalidArgument => write!(f, "invalid argument"),
            Self::NotTty => write!(f, "inappropriate ioctl for device"),
            Self::UnsupportedWordLength => write!(f, "unsupported character size"),
            Self::Timeout => write!(f, "transmitter did not become ready"),
            Self::ConsoleAlreadyInstalled => write!(f, "console already selected"),
            Self::RegistrationFailed => write!(f, "device registration failed"),
        }
    }
}

/// Error codes returned across the character-device boundary
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Errno {
    /// Try again
    Eagain = -11,
    /// Device or resource busy
    Ebusy = -16,
    /// No such device
    Enodev = -19,
    /// Invalid argument
    Einval = -22,
    /// Inappropriate ioctl for device
    Enotty = -25,
}

impl From<SerialError> for Errno {
    fn from(err: SerialError) -> Self {
        err.errno()
    }
}

/// Result alias used throughout the driver.
pub type Result<T> = core::result::Result<T, SerialError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ioctl_errors_map_to_errno() {
        assert_eq!(SerialError::InvalidArgument.errno() as i32, -22);
        assert_eq!(SerialError::NotTty.errno() as i32, -25);
        assert_eq!(Errno::from(SerialError::SlotOccupied), Errno::Ebusy);
        assert_eq!(SerialError::SlotBusy.errno(), Errno::Eagain);
    }
}
