//! Loading balls from the ammo dispenser.
//!
//! The robot creeps forward until a bumper touches the dispenser, backs off,
//! swings toward the side that touched, then drives in until both track-wire
//! detectors confirm it is lined up. A ram/reverse sequence shakes the
//! plunger to release the balls.

use esf::{Event, Machine, Outcome, Rule, Trigger};

use crate::events::{
    bump, timers::RECEIVE, wire, AMMO_PLUNGER_LOST, BALLS_LOADED, BUMPER_TRIPPED,
    TRACK_WIRE_FOUND,
};
use crate::io::Io;
use crate::motors::Side;

pub const FAST: u16 = 600;
pub const SLOW: u16 = 300;
pub const APPROACH_MS: u32 = 1500;
pub const MOVE_BACK_MS: u32 = 1200;
pub const ROTATION_MS: u32 = 800;
pub const ATTEMPT_MS: u32 = 1200;
pub const RAM_MS: u32 = 2000;
pub const REV_MS: u32 = 150;
/// Inner-wheel divisor for the ram bank turns.
pub const BANK_FACTOR: u16 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveState {
    Init,
    Approach,
    BackUp,
    Turn45,
    DriveIn,
    Realign,
    Ram1,
    Rev2,
    Ram2,
    Rev3,
    Ram3,
}

#[derive(Debug, Default)]
pub struct Receive {
    last_bump: u16,
}

use ReceiveState as S;

impl Receive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_bump(&self) -> u16 {
        self.last_bump
    }

    /// Turn that swings the robot back toward the dispenser. Only a
    /// single-side hit picks one; a head-on hit needs no turn.
    fn toward_dispenser(&self) -> Option<Side> {
        match self.last_bump {
            bump::LEFT => Some(Side::Right),
            bump::RIGHT => Some(Side::Left),
            _ => None,
        }
    }

    /// Motor command held for as long as `state` is active.
    fn cruise(&self, state: S, io: &Io) {
        match state {
            S::Approach | S::DriveIn => io.drive(|d| d.forward(SLOW)),
            S::BackUp | S::Ram1 => io.drive(|d| d.backward(FAST)),
            S::Turn45 | S::Realign => {
                if let Some(side) = self.toward_dispenser() {
                    io.drive(|d| d.tank_turn(side, SLOW));
                }
            }
            S::Rev2 => io.drive(|d| d.forward(FAST)),
            S::Ram2 => io.drive(|d| d.reverse_bank_turn_left(FAST, BANK_FACTOR)),
            S::Rev3 => io.drive(|d| d.bank_turn_left(FAST, BANK_FACTOR)),
            S::Ram3 => io.drive(|d| d.reverse_bank_turn_right(FAST, BANK_FACTOR)),
            S::Init => {}
        }
    }

    fn enter_timed(&self, state: S, io: &mut Io, millis: u32) -> Outcome<S> {
        io.arm(RECEIVE, millis);
        self.cruise(state, io);
        Outcome::Handled
    }

    fn start(&mut self, _io: &mut Io, _e: &Event) -> Outcome<S> {
        Outcome::Transition(S::Approach)
    }

    fn enter_approach(&mut self, io: &mut Io, _e: &Event) -> Outcome<S> {
        self.enter_timed(S::Approach, io, APPROACH_MS)
    }

    fn touched(&mut self, _io: &mut Io, e: &Event) -> Outcome<S> {
        self.last_bump = e.param;
        Outcome::Transition(S::BackUp)
    }

    fn gave_up(&mut self, _io: &mut Io, _e: &Event) -> Outcome<S> {
        Outcome::Forward(S::Init, Event::empty(AMMO_PLUNGER_LOST))
    }

    fn enter_back_up(&mut self, io: &mut Io, _e: &Event) -> Outcome<S> {
        self.enter_timed(S::BackUp, io, MOVE_BACK_MS)
    }

    fn to_turn(&mut self, _io: &mut Io, _e: &Event) -> Outcome<S> {
        Outcome::Transition(S::Turn45)
    }

    fn enter_turn(&mut self, io: &mut Io, _e: &Event) -> Outcome<S> {
        self.enter_timed(S::Turn45, io, ROTATION_MS)
    }

    fn to_drive_in(&mut self, _io: &mut Io, _e: &Event) -> Outcome<S> {
        Outcome::Transition(S::DriveIn)
    }

    fn enter_drive_in(&mut self, io: &mut Io, _e: &Event) -> Outcome<S> {
        self.enter_timed(S::DriveIn, io, ATTEMPT_MS)
    }

    fn wire_ahead(&mut self, _io: &mut Io, e: &Event) -> Outcome<S> {
        if e.param & wire::DETECTOR_1 != 0 {
            Outcome::Transition(S::Realign)
        } else {
            Outcome::Unhandled
        }
    }

    fn enter_realign(&mut self, io: &mut Io, _e: &Event) -> Outcome<S> {
        self.enter_timed(S::Realign, io, RAM_MS)
    }

    fn wire_aligned(&mut self, _io: &mut Io, e: &Event) -> Outcome<S> {
        if e.param & wire::DETECTOR_0 != 0 {
            Outcome::Transition(S::Ram1)
        } else {
            Outcome::Unhandled
        }
    }

    fn enter_ram1(&mut self, io: &mut Io, _e: &Event) -> Outcome<S> {
        self.enter_timed(S::Ram1, io, RAM_MS)
    }

    fn to_rev2(&mut self, _io: &mut Io, _e: &Event) -> Outcome<S> {
        Outcome::Transition(S::Rev2)
    }

    fn enter_rev2(&mut self, io: &mut Io, _e: &Event) -> Outcome<S> {
        self.enter_timed(S::Rev2, io, REV_MS)
    }

    fn to_ram2(&mut self, _io: &mut Io, _e: &Event) -> Outcome<S> {
        Outcome::Transition(S::Ram2)
    }

    fn enter_ram2(&mut self, io: &mut Io, _e: &Event) -> Outcome<S> {
        self.enter_timed(S::Ram2, io, RAM_MS)
    }

    fn to_rev3(&mut self, _io: &mut Io, _e: &Event) -> Outcome<S> {
        Outcome::Transition(S::Rev3)
    }

    fn enter_rev3(&mut self, io: &mut Io, _e: &Event) -> Outcome<S> {
        self.enter_timed(S::Rev3, io, REV_MS)
    }

    fn to_ram3(&mut self, _io: &mut Io, _e: &Event) -> Outcome<S> {
        Outcome::Transition(S::Ram3)
    }

    fn enter_ram3(&mut self, io: &mut Io, _e: &Event) -> Outcome<S> {
        self.enter_timed(S::Ram3, io, RAM_MS)
    }

    fn loaded(&mut self, _io: &mut Io, _e: &Event) -> Outcome<S> {
        Outcome::Forward(S::Init, Event::empty(BALLS_LOADED))
    }
}

const TIMEOUT: Trigger = Trigger::Timeout(RECEIVE);
const WIRE: Trigger = Trigger::On(TRACK_WIRE_FOUND);

impl Machine for Receive {
    type State = ReceiveState;
    type Context = Io;

    const NAME: &'static str = "Receive";
    const INITIAL: S = S::Init;
    const RULES: &'static [Rule<Self>] = &[
        Rule::on(S::Init, Trigger::Init, Self::start),
        Rule::on(S::Approach, Trigger::Entry, Self::enter_approach),
        Rule::on(S::Approach, Trigger::On(BUMPER_TRIPPED), Self::touched),
        Rule::on(S::Approach, TIMEOUT, Self::gave_up),
        Rule::on(S::BackUp, Trigger::Entry, Self::enter_back_up),
        Rule::on(S::BackUp, TIMEOUT, Self::to_turn),
        Rule::on(S::Turn45, Trigger::Entry, Self::enter_turn),
        Rule::on(S::Turn45, TIMEOUT, Self::to_drive_in),
        Rule::on(S::DriveIn, Trigger::Entry, Self::enter_drive_in),
        Rule::on(S::DriveIn, WIRE, Self::wire_ahead),
        Rule::on(S::Realign, Trigger::Entry, Self::enter_realign),
        Rule::on(S::Realign, WIRE, Self::wire_aligned),
        Rule::on(S::Ram1, Trigger::Entry, Self::enter_ram1),
        Rule::on(S::Ram1, TIMEOUT, Self::to_rev2),
        Rule::on(S::Rev2, Trigger::Entry, Self::enter_rev2),
        Rule::on(S::Rev2, TIMEOUT, Self::to_ram2),
        Rule::on(S::Ram2, Trigger::Entry, Self::enter_ram2),
        Rule::on(S::Ram2, TIMEOUT, Self::to_rev3),
        Rule::on(S::Rev3, Trigger::Entry, Self::enter_rev3),
        Rule::on(S::Rev3, TIMEOUT, Self::to_ram3),
        Rule::on(S::Ram3, Trigger::Entry, Self::enter_ram3),
        Rule::on(S::Ram3, TIMEOUT, Self::loaded),
    ];

    fn while_active(&mut self, state: S, io: &mut Io, _e: &Event) -> Outcome<S> {
        self.cruise(state, io);
        Outcome::Unhandled
    }
}
