//! Patrolling the exclusion zone after a deposit.
//!
//! Pulls away from the goal, turns around and follows the tape border with
//! the [`TapeFollow`] machine. Bumps, real or reported by tape-follow, hand
//! control to [`BumpResponse`] until resolved. A periodic scan sweeps ninety
//! degrees left and back so the beacon detector gets a look around.

use esf::{Event, Hsm, Machine, Outcome, Rule, Trigger};

use crate::events::{tape, timers::EX_RADAR, BUMPER_TRIPPED, BUMP_RESOLVED, TAPE_SENSOR_TRIPPED};
use crate::io::Io;
use crate::machines::bump_response::BumpResponse;
use crate::machines::tape_follow::TapeFollow;

pub const FAST: u16 = 600;
pub const SLOW: u16 = 300;
pub const DEPART_MS: u32 = 1000;
pub const TURN_AROUND_MS: u32 = 2160;
pub const SWEEP_MS: u32 = 1620;
pub const SCAN_MS: u32 = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadarState {
    Init,
    Departing,
    TurningAround,
    TapeFollowing,
    BumpResolving,
    SweepLeft,
    SweepBack,
}

#[derive(Debug)]
pub struct ExclusionRadar {
    tape_follow: Hsm<TapeFollow>,
    bump_response: Hsm<BumpResponse>,
    previous_bump: u16,
    tapes_tripped: u32,
}

impl Default for ExclusionRadar {
    fn default() -> Self {
        Self::new()
    }
}

use RadarState as S;

impl ExclusionRadar {
    pub fn new() -> Self {
        Self {
            tape_follow: Hsm::new(TapeFollow::new()),
            bump_response: Hsm::new(BumpResponse::new()),
            previous_bump: 0,
            tapes_tripped: 0,
        }
    }

    pub fn tape_follow(&self) -> &Hsm<TapeFollow> {
        &self.tape_follow
    }

    pub fn bump_response(&self) -> &Hsm<BumpResponse> {
        &self.bump_response
    }

    /// Corners on black tape in the latest tape reading.
    pub fn tapes_tripped(&self) -> u32 {
        self.tapes_tripped
    }

    fn cruise(state: S, io: &Io) {
        match state {
            S::Departing => io.drive(|d| d.forward(FAST)),
            S::TurningAround | S::SweepLeft => io.drive(|d| d.tank_turn_left(SLOW)),
            S::SweepBack => io.drive(|d| d.tank_turn_right(SLOW)),
            _ => {}
        }
    }

    fn start(&mut self, _io: &mut Io, _e: &Event) -> Outcome<S> {
        Outcome::Transition(S::Departing)
    }

    fn enter_departing(&mut self, io: &mut Io, _e: &Event) -> Outcome<S> {
        io.arm(EX_RADAR, DEPART_MS);
        Self::cruise(S::Departing, io);
        Outcome::Handled
    }

    fn to_turning_around(&mut self, _io: &mut Io, _e: &Event) -> Outcome<S> {
        Outcome::Transition(S::TurningAround)
    }

    fn enter_turning_around(&mut self, io: &mut Io, _e: &Event) -> Outcome<S> {
        io.arm(EX_RADAR, TURN_AROUND_MS);
        Self::cruise(S::TurningAround, io);
        Outcome::Handled
    }

    fn to_tape_following(&mut self, _io: &mut Io, _e: &Event) -> Outcome<S> {
        Outcome::Transition(S::TapeFollowing)
    }

    fn enter_tape_following(&mut self, io: &mut Io, _e: &Event) -> Outcome<S> {
        io.arm(EX_RADAR, SCAN_MS);
        if let Err(err) = self.tape_follow.init(io) {
            log::error!("{err}");
        }
        Outcome::Handled
    }

    fn bumped(&mut self, _io: &mut Io, e: &Event) -> Outcome<S> {
        self.previous_bump = e.param;
        Outcome::Transition(S::BumpResolving)
    }

    fn to_sweep_left(&mut self, _io: &mut Io, _e: &Event) -> Outcome<S> {
        Outcome::Transition(S::SweepLeft)
    }

    fn enter_bump_resolving(&mut self, io: &mut Io, _e: &Event) -> Outcome<S> {
        self.bump_response.machine_mut().set_bump(self.previous_bump);
        if let Err(err) = self.bump_response.init(io) {
            log::error!("{err}");
        }
        Outcome::Handled
    }

    fn enter_sweep_left(&mut self, io: &mut Io, _e: &Event) -> Outcome<S> {
        io.arm(EX_RADAR, SWEEP_MS);
        Self::cruise(S::SweepLeft, io);
        Outcome::Handled
    }

    fn to_sweep_back(&mut self, _io: &mut Io, _e: &Event) -> Outcome<S> {
        Outcome::Transition(S::SweepBack)
    }

    fn enter_sweep_back(&mut self, io: &mut Io, _e: &Event) -> Outcome<S> {
        io.arm(EX_RADAR, SWEEP_MS);
        Self::cruise(S::SweepBack, io);
        Outcome::Handled
    }
}

const TIMEOUT: Trigger = Trigger::Timeout(EX_RADAR);

impl Machine for ExclusionRadar {
    type State = RadarState;
    type Context = Io;

    const NAME: &'static str = "ExclusionRadar";
    const INITIAL: S = S::Init;
    const RULES: &'static [Rule<Self>] = &[
        Rule::on(S::Init, Trigger::Init, Self::start),
        Rule::on(S::Departing, Trigger::Entry, Self::enter_departing),
        Rule::on(S::Departing, TIMEOUT, Self::to_turning_around),
        Rule::on(S::TurningAround, Trigger::Entry, Self::enter_turning_around),
        Rule::on(S::TurningAround, TIMEOUT, Self::to_tape_following),
        Rule::on(S::TapeFollowing, Trigger::Entry, Self::enter_tape_following),
        Rule::on(S::TapeFollowing, Trigger::On(BUMPER_TRIPPED), Self::bumped),
        Rule::on(S::TapeFollowing, TIMEOUT, Self::to_sweep_left),
        Rule::on(S::BumpResolving, Trigger::Entry, Self::enter_bump_resolving),
        Rule::on(S::BumpResolving, Trigger::On(BUMP_RESOLVED), Self::to_tape_following),
        Rule::on(S::SweepLeft, Trigger::Entry, Self::enter_sweep_left),
        Rule::on(S::SweepLeft, TIMEOUT, Self::to_sweep_back),
        Rule::on(S::SweepBack, Trigger::Entry, Self::enter_sweep_back),
        Rule::on(S::SweepBack, TIMEOUT, Self::to_tape_following),
    ];

    fn observe(&mut self, event: &Event) {
        match event.signal {
            BUMPER_TRIPPED => self.previous_bump = event.param,
            TAPE_SENSOR_TRIPPED => self.tapes_tripped = tape::tripped(event.param),
            _ => {}
        }
    }

    fn delegate(&mut self, state: S, io: &mut Io, event: Event) -> Event {
        match state {
            S::TapeFollowing => self.tape_follow.run(io, event),
            S::BumpResolving => self.bump_response.run(io, event),
            _ => event,
        }
    }

    fn while_active(&mut self, state: S, io: &mut Io, _e: &Event) -> Outcome<S> {
        Self::cruise(state, io);
        Outcome::Unhandled
    }
}
