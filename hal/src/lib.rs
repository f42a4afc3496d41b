//! Hardware Abstraction Layer (HAL) for the robot's board
//!
//! The behavior crates never touch registers. They talk to the board through
//! the narrow traits below: analog reads, PWM duty cycles, port bit set/clear
//! and servo pulse widths. [`Board`] bundles them so one object can be shared.
//! The `sim` feature adds a recording in-memory board for tests and host runs.

#![cfg_attr(not(feature = "std"), no_std)]

pub mod adc;
pub mod board;
pub mod error;
pub mod gpio;
pub mod pwm;
pub mod servo;

#[cfg(feature = "sim")]
pub mod sim;

// Re-export commonly used types
pub use adc::{AdcPin, AnalogInputs, ADC_MAX};
pub use board::Board;
pub use error::{HalError, HalResult};
pub use gpio::{DigitalOutputs, Port, PortPin};
pub use pwm::{PwmOutputs, PwmPin, MAX_DUTY};
pub use servo::{ServoOutputs, ServoPin};
