//! PWM outputs

use crate::error::HalResult;

/// Largest duty cycle, in tenths of a percent.
pub const MAX_DUTY: u16 = 1000;

/// PWM channel on the board.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PwmPin(pub u8);

/// PWM duty control
pub trait PwmOutputs {
    /// Set duty cycle, `0..=MAX_DUTY`
    fn set_duty_cycle(&mut self, channel: PwmPin, duty: u16) -> HalResult<()>;
}
