//! Common error types for HAL operations

use core::fmt;

/// HAL operation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalError {
    /// Pin or channel not wired on this board
    InvalidPin(u8),
    /// Duty or pulse outside the peripheral's range
    OutOfRange(u16),
    /// Peripheral is busy
    Busy,
    /// Hardware error occurred
    HardwareError,
}

impl fmt::Display for HalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPin(pin) => write!(f, "invalid pin {pin}"),
            Self::OutOfRange(value) => write!(f, "value {value} out of range"),
            Self::Busy => write!(f, "peripheral busy"),
            Self::HardwareError => write!(f, "hardware error"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for HalError {}

/// Result type for HAL operations
pub type HalResult<T> = Result<T, HalError>;
