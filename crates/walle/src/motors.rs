//! Drive motors and maneuvers.
//!
//! Four per-side primitives (forward/backward for each wheel, plus halts)
//! write a duty cycle and a direction bit, compensating the speed first. A
//! combined maneuver compensates once and splits the result between the
//! wheels, so both sides see the same battery reading.

use hal::{AdcPin, Board, HalResult, PortPin, PwmPin, ADC_MAX, MAX_DUTY};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use Heading::{Backward, Forward};
use Side::{Left, Right};

/// Fixed wheel speeds used by [`Drive::orbit`].
pub const ORBIT_LEFT: u16 = 540;
pub const ORBIT_RIGHT: u16 = 210;

/// Battery-voltage compensation of requested duty cycles.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Compensation {
    Disabled,
    /// Scale by `max_voltage / measured` so speed holds as the pack drains.
    Battery { max_voltage: f32 },
}

impl Compensation {
    pub const MAX_VOLTAGE: f32 = 9.7;

    /// Volts represented by a raw battery-divider reading.
    pub fn battery_volts(raw: u16) -> f32 {
        (raw as f32 / ADC_MAX as f32) * 33.0 - 0.6
    }

    /// Compensated duty for `speed` given a raw battery reading.
    pub fn apply(self, speed: u16, raw_battery: u16) -> u16 {
        match self {
            Compensation::Disabled => speed,
            Compensation::Battery { max_voltage } => {
                let volts = Self::battery_volts(raw_battery);
                if volts <= 0.0 {
                    return speed;
                }
                let scaled = (speed as f32 * (max_voltage / volts)) as i64;
                scaled.clamp(0, MAX_DUTY as i64) as u16
            }
        }
    }
}

impl Default for Compensation {
    fn default() -> Self {
        if cfg!(feature = "battery-compensation") {
            Compensation::Battery {
                max_voltage: Self::MAX_VOLTAGE,
            }
        } else {
            Compensation::Disabled
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Heading {
    Forward,
    Backward,
}

/// Wiring the drive needs.
#[derive(Debug, Clone, Copy)]
pub struct DrivePins {
    pub left_pwm: PwmPin,
    pub left_dir: PortPin,
    pub right_pwm: PwmPin,
    pub right_dir: PortPin,
    pub battery: AdcPin,
}

/// A borrowed view of the board that issues motor commands.
///
/// Hardware write failures are logged and dropped; a maneuver never fails.
pub struct Drive<'a> {
    board: &'a mut dyn Board,
    pins: DrivePins,
    compensation: Compensation,
}

impl<'a> Drive<'a> {
    pub fn new(board: &'a mut dyn Board, pins: DrivePins, compensation: Compensation) -> Self {
        Self {
            board,
            pins,
            compensation,
        }
    }

    /// Requested duty after battery compensation. Identity when disabled.
    pub fn adjust_pwm(&mut self, speed: u16) -> u16 {
        let raw = self.battery();
        self.compensate(speed, raw)
    }

    /// Runs one wheel at a compensated speed. The left wheel's direction bit
    /// is high for forward, the right wheel's is low.
    pub fn wheel(&mut self, side: Side, heading: Heading, speed: u16) {
        let duty = self.adjust_pwm(speed);
        self.set_wheel(side, heading, duty);
    }

    pub fn stop(&mut self, side: Side) {
        let (pwm, dir) = self.side_pins(side);
        self.write(|board| board.set_duty_cycle(pwm, 0));
        self.write(|board| board.clear_port_bits(dir));
    }

    pub fn left_forward(&mut self, speed: u16) {
        self.wheel(Left, Forward, speed);
    }

    pub fn left_backward(&mut self, speed: u16) {
        self.wheel(Left, Backward, speed);
    }

    pub fn right_forward(&mut self, speed: u16) {
        self.wheel(Right, Forward, speed);
    }

    pub fn right_backward(&mut self, speed: u16) {
        self.wheel(Right, Backward, speed);
    }

    pub fn left_halt(&mut self) {
        self.stop(Left);
    }

    pub fn right_halt(&mut self) {
        self.stop(Right);
    }

    pub fn halt(&mut self) {
        self.stop(Left);
        self.stop(Right);
    }

    pub fn forward(&mut self, speed: u16) {
        self.pair(speed, (Right, Forward), 1, (Left, Forward));
    }

    pub fn backward(&mut self, speed: u16) {
        self.pair(speed, (Right, Backward), 1, (Left, Backward));
    }

    pub fn tank_turn_right(&mut self, speed: u16) {
        self.pair(speed, (Right, Backward), 1, (Left, Forward));
    }

    pub fn tank_turn_left(&mut self, speed: u16) {
        self.pair(speed, (Left, Backward), 1, (Right, Forward));
    }

    /// Tank turn toward `side`.
    pub fn tank_turn(&mut self, side: Side, speed: u16) {
        match side {
            Side::Left => self.tank_turn_left(speed),
            Side::Right => self.tank_turn_right(speed),
        }
    }

    pub fn pivot_right(&mut self, speed: u16) {
        self.pair(speed, (Left, Forward), 2, (Right, Backward));
    }

    pub fn pivot_left(&mut self, speed: u16) {
        self.pair(speed, (Right, Forward), 2, (Left, Backward));
    }

    pub fn rr_pivot_right(&mut self, speed: u16) {
        self.pair(speed, (Left, Backward), 3, (Right, Backward));
    }

    pub fn rr_pivot_left(&mut self, speed: u16) {
        self.pair(speed, (Right, Backward), 3, (Left, Backward));
    }

    pub fn bank_turn_left(&mut self, speed: u16, factor: u16) {
        self.pair(speed, (Left, Forward), factor, (Right, Forward));
    }

    pub fn reverse_bank_turn_left(&mut self, speed: u16, factor: u16) {
        self.pair(speed, (Left, Backward), factor, (Right, Backward));
    }

    pub fn bank_turn_right(&mut self, speed: u16, factor: u16) {
        self.pair(speed, (Right, Forward), factor, (Left, Forward));
    }

    pub fn reverse_bank_turn_right(&mut self, speed: u16, factor: u16) {
        self.pair(speed, (Right, Backward), factor, (Left, Backward));
    }

    pub fn true_pivot_left(&mut self, speed: u16) {
        let duty = self.adjust_pwm(speed);
        self.right_halt();
        self.set_wheel(Left, Backward, duty);
    }

    pub fn true_pivot_right(&mut self, speed: u16) {
        let duty = self.adjust_pwm(speed);
        self.left_halt();
        self.set_wheel(Right, Backward, duty);
    }

    /// Fixed asymmetric forward speeds, both scaled by one battery reading.
    pub fn orbit(&mut self) {
        let raw = self.battery();
        let left = self.compensate(ORBIT_LEFT, raw);
        let right = self.compensate(ORBIT_RIGHT, raw);
        self.set_wheel(Left, Forward, left);
        self.set_wheel(Right, Forward, right);
    }

    /// Compensates `speed` once, then runs `short` at `duty / divisor` and
    /// `long` at the full duty, in that order.
    fn pair(&mut self, speed: u16, short: (Side, Heading), divisor: u16, long: (Side, Heading)) {
        let duty = self.adjust_pwm(speed);
        self.set_wheel(short.0, short.1, duty / divisor.max(1));
        self.set_wheel(long.0, long.1, duty);
    }

    /// Raw battery reading, or `None` when compensation is off or the read
    /// failed.
    fn battery(&mut self) -> Option<u16> {
        if self.compensation == Compensation::Disabled {
            return None;
        }
        match self.board.read_channel(self.pins.battery) {
            Ok(raw) => Some(raw),
            Err(err) => {
                log::warn!("battery read failed: {err}");
                None
            }
        }
    }

    fn compensate(&self, speed: u16, raw: Option<u16>) -> u16 {
        match raw {
            Some(raw) => self.compensation.apply(speed, raw),
            None => speed,
        }
    }

    /// Writes an already compensated duty and the direction bit.
    fn set_wheel(&mut self, side: Side, heading: Heading, duty: u16) {
        let (pwm, dir) = self.side_pins(side);
        let high = matches!(
            (side, heading),
            (Side::Left, Heading::Forward) | (Side::Right, Heading::Backward)
        );
        log::trace!("{side:?} {heading:?} {duty}");
        self.write(|board| board.set_duty_cycle(pwm, duty));
        if high {
            self.write(|board| board.set_port_bits(dir));
        } else {
            self.write(|board| board.clear_port_bits(dir));
        }
    }

    fn side_pins(&self, side: Side) -> (PwmPin, PortPin) {
        match side {
            Side::Left => (self.pins.left_pwm, self.pins.left_dir),
            Side::Right => (self.pins.right_pwm, self.pins.right_dir),
        }
    }

    fn write<F>(&mut self, op: F)
    where
        F: FnOnce(&mut dyn Board) -> HalResult<()>,
    {
        if let Err(err) = op(&mut *self.board) {
            log::warn!("motor write failed: {err}");
        }
    }
}
