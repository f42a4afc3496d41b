//! RC servo outputs

use crate::error::HalResult;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ServoPin(pub u8);

pub trait ServoOutputs {
    /// Set the pulse width in microseconds
    fn set_pulse_time(&mut self, channel: ServoPin, micros: u16) -> HalResult<()>;
}
