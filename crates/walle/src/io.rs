//! Collaborators shared by the machine tree.

use esf::sync::{Arc, Mutex};
use esf::{TimerId, Timers};
use hal::{Board, HalResult, ServoPin};

use crate::config::{BotConfig, GateConfig};
use crate::motors::{Compensation, Drive, DrivePins};

/// The board, shared between the services and the machine tree.
pub type SharedBoard = Arc<Mutex<dyn Board>>;

/// Ball gate servo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    First,
    Second,
}

/// Context every robot machine runs with: the board for motor and servo
/// commands, and the timer table.
pub struct Io {
    board: SharedBoard,
    timers: Timers,
    drive: DrivePins,
    compensation: Compensation,
    gates: [ServoPin; 2],
    gate_pulses: GateConfig,
}

impl Io {
    pub fn new(board: SharedBoard, timers: Timers, config: &BotConfig) -> Self {
        let pins = &config.pins;
        Self {
            board,
            timers,
            drive: DrivePins {
                left_pwm: pins.left_pwm,
                left_dir: pins.left_dir,
                right_pwm: pins.right_pwm,
                right_dir: pins.right_dir,
                battery: pins.battery,
            },
            compensation: config.drive.compensation,
            gates: pins.gates,
            gate_pulses: config.gates.clone(),
        }
    }

    /// Runs `maneuver` against the drive motors.
    pub fn drive<F>(&self, maneuver: F)
    where
        F: FnOnce(&mut Drive<'_>),
    {
        let mut board = self.board.lock();
        let mut drive = Drive::new(&mut *board, self.drive, self.compensation);
        maneuver(&mut drive);
    }

    pub fn arm(&self, timer: TimerId, millis: u32) {
        self.timers.arm(timer, millis);
    }

    pub fn timers(&self) -> &Timers {
        &self.timers
    }

    pub fn open_gate(&self, gate: Gate) {
        self.set_gate(gate, self.gate_pulses.open_us);
    }

    pub fn close_gate(&self, gate: Gate) {
        self.set_gate(gate, self.gate_pulses.close_us);
    }

    fn set_gate(&self, gate: Gate, micros: u16) {
        let pin = match gate {
            Gate::First => self.gates[0],
            Gate::Second => self.gates[1],
        };
        let result: HalResult<()> = self.board.lock().set_pulse_time(pin, micros);
        if let Err(err) = result {
            log::warn!("gate {gate:?} write failed: {err}");
        }
    }
}
