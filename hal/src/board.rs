//! The whole collaborator surface in one object

use crate::adc::AnalogInputs;
use crate::gpio::DigitalOutputs;
use crate::pwm::PwmOutputs;
use crate::servo::ServoOutputs;

/// Everything the robot drives or samples. Implemented automatically for any
/// type providing the individual traits.
pub trait Board: AnalogInputs + PwmOutputs + DigitalOutputs + ServoOutputs + Send {}

impl<T> Board for T where T: AnalogInputs + PwmOutputs + DigitalOutputs + ServoOutputs + Send {}
