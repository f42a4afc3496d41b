//! Analog inputs

use crate::error::HalResult;

/// Full-scale reading of the 10-bit converter.
pub const ADC_MAX: u16 = 1023;

/// ADC channel on the board.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AdcPin(pub u8);

/// Sampled analog inputs.
pub trait AnalogInputs {
    /// Latest conversion of `pin`, `0..=ADC_MAX`.
    fn read_channel(&mut self, pin: AdcPin) -> HalResult<u16>;

    /// `true` once a fresh conversion of every enabled channel is available.
    fn is_sample_ready(&self) -> bool;
}
