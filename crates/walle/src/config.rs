//! Robot configuration.
//!
//! Defaults reproduce the competition robot: its pin assignment, sensor
//! thresholds and sampling periods. With the `serde` feature the whole tree
//! can be loaded from a file and partially overridden.

use esf::Priority;
use hal::{AdcPin, Port, PortPin, PwmPin, ServoPin};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::motors::Compensation;

/// Where every sensor and actuator is wired.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct PinMap {
    /// Front-left, mid-left, mid-right, front-right.
    pub tape: [AdcPin; 4],
    pub tape_flash: PortPin,
    pub bumper_left: AdcPin,
    pub bumper_right: AdcPin,
    pub track_wire: [AdcPin; 2],
    pub battery: AdcPin,
    pub left_pwm: PwmPin,
    pub left_dir: PortPin,
    pub right_pwm: PwmPin,
    pub right_dir: PortPin,
    pub gates: [ServoPin; 2],
}

impl Default for PinMap {
    fn default() -> Self {
        Self {
            tape: [AdcPin(13), AdcPin(14), AdcPin(15), AdcPin(16)],
            tape_flash: PortPin::new(Port::W, 7),
            bumper_left: AdcPin(3),
            bumper_right: AdcPin(4),
            track_wire: [AdcPin(5), AdcPin(6)],
            battery: AdcPin(0),
            left_pwm: PwmPin(10),
            left_dir: PortPin::new(Port::Y, 9),
            right_pwm: PwmPin(12),
            right_dir: PortPin::new(Port::Y, 11),
            gates: [ServoPin(6), ServoPin(7)],
        }
    }
}

/// Tape sensor thresholds and timing.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct TapeConfig {
    /// `diff` above this reads WHITE.
    pub white_threshold: i32,
    /// `diff` below this reads BLACK.
    pub black_threshold: i32,
    pub startup_ms: u32,
    pub phase_ms: u32,
    /// Poll delay right after a reported change.
    pub holdoff_ms: u32,
}

impl Default for TapeConfig {
    fn default() -> Self {
        Self {
            white_threshold: 800,
            black_threshold: 400,
            startup_ms: 500,
            phase_ms: 2,
            holdoff_ms: 20,
        }
    }
}

/// Which side of the threshold band means ENGAGED.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// Below `low` is ENGAGED, above `high` is CLEAR.
    ActiveLow,
    /// Above `high` is ENGAGED, below `low` is CLEAR.
    ActiveHigh,
}

/// Dual-threshold contact or proximity channel pair.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct ContactConfig {
    pub high: u16,
    pub low: u16,
    pub polarity: Polarity,
    pub startup_ms: u32,
    pub poll_ms: u32,
    /// Poll delay after a change; further changes are not seen before it.
    pub cooldown_ms: u32,
}

impl ContactConfig {
    pub fn bumper() -> Self {
        Self {
            high: 800,
            low: 200,
            polarity: Polarity::ActiveLow,
            startup_ms: 25,
            poll_ms: 25,
            cooldown_ms: 500,
        }
    }

    pub fn track_wire() -> Self {
        Self {
            high: 900,
            low: 600,
            polarity: Polarity::ActiveLow,
            startup_ms: 500,
            poll_ms: 5,
            cooldown_ms: 20,
        }
    }
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self::bumper()
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DriveConfig {
    pub compensation: Compensation,
}

/// Gate servo pulse widths.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct GateConfig {
    pub open_us: u16,
    pub close_us: u16,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            open_us: 1000,
            close_us: 2000,
        }
    }
}

/// Bus slots. Higher runs first.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct Priorities {
    pub tape: Priority,
    pub bumper: Priority,
    pub track_wire: Priority,
    pub top: Priority,
}

impl Default for Priorities {
    fn default() -> Self {
        Self {
            tape: Priority(4),
            bumper: Priority(3),
            track_wire: Priority(2),
            top: Priority(1),
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct BotConfig {
    pub pins: PinMap,
    pub tape: TapeConfig,
    pub bumper: ContactConfig,
    pub track_wire: ContactConfig,
    pub drive: DriveConfig,
    pub gates: GateConfig,
    pub priorities: Priorities,
    pub queue_depth: usize,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            pins: PinMap::default(),
            tape: TapeConfig::default(),
            bumper: ContactConfig::bumper(),
            track_wire: ContactConfig::track_wire(),
            drive: DriveConfig::default(),
            gates: GateConfig::default(),
            priorities: Priorities::default(),
            queue_depth: 16,
        }
    }
}

impl BotConfig {
    pub fn builder() -> BotConfigBuilder {
        BotConfigBuilder::default()
    }
}

/// Builder for ergonomic configuration construction.
#[derive(Debug, Clone, Default)]
pub struct BotConfigBuilder {
    config: BotConfig,
}

impl BotConfigBuilder {
    pub fn pins(mut self, pins: PinMap) -> Self {
        self.config.pins = pins;
        self
    }

    pub fn tape(mut self, tape: TapeConfig) -> Self {
        self.config.tape = tape;
        self
    }

    pub fn bumper(mut self, bumper: ContactConfig) -> Self {
        self.config.bumper = bumper;
        self
    }

    pub fn track_wire(mut self, track_wire: ContactConfig) -> Self {
        self.config.track_wire = track_wire;
        self
    }

    pub fn compensation(mut self, compensation: Compensation) -> Self {
        self.config.drive.compensation = compensation;
        self
    }

    pub fn gates(mut self, gates: GateConfig) -> Self {
        self.config.gates = gates;
        self
    }

    pub fn priorities(mut self, priorities: Priorities) -> Self {
        self.config.priorities = priorities;
        self
    }

    pub fn queue_depth(mut self, depth: usize) -> Self {
        self.config.queue_depth = depth;
        self
    }

    pub fn build(self) -> BotConfig {
        self.config
    }
}
