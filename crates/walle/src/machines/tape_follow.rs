//! Line following along the tape.
//!
//! Drives forward until one side's sensors find tape, then steers to keep the
//! front sensor on it: realigning when the middle sensor drifts onto the
//! tape, pivoting back when the front sensor loses it. Tape under the
//! opposite front corner means a head-on wall of tape; that is reported to
//! the parent as a synthetic bump on the side that found it.

use esf::{Event, Machine, Outcome, Rule, Trigger};

use crate::events::{bump, tape, timers::TAPE_FOLLOW, BUMPER_TRIPPED, TAPE_SENSOR_TRIPPED};
use crate::io::Io;

pub const FAST: u16 = 400;
pub const SLOW: u16 = 300;
pub const STRAIGHT_MS: u32 = 2000;
pub const LOST_MS: u32 = 3500;
pub const TURN_MS: u32 = 600;
pub const ESCAPE_MS: u32 = 4000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapeState {
    Init,
    MoveForward,
    ShiftDirection,
    FoundRightTape,
    RightRealign,
    RightTapeLost,
    FoundLeftTape,
    LeftRealign,
    LeftTapeLost,
}

/// Which tape corners are currently black.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Corners {
    pub front_right: bool,
    pub mid_right: bool,
    pub mid_left: bool,
    pub front_left: bool,
}

impl Corners {
    pub fn from_mask(mask: u16) -> Self {
        Self {
            front_right: mask & tape::FRONT_RIGHT != 0,
            mid_right: mask & tape::MID_RIGHT != 0,
            mid_left: mask & tape::MID_LEFT != 0,
            front_left: mask & tape::FRONT_LEFT != 0,
        }
    }
}

#[derive(Debug, Default)]
pub struct TapeFollow {
    corners: Corners,
    /// Set once a found-tape state has held its heading for the straight
    /// time; realigning then uses the tighter reverse pivot.
    been_awhile: bool,
}

use TapeState as S;

impl TapeFollow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn corners(&self) -> Corners {
        self.corners
    }

    fn start(&mut self, _io: &mut Io, _e: &Event) -> Outcome<S> {
        Outcome::Transition(S::MoveForward)
    }

    fn enter_move_forward(&mut self, io: &mut Io, _e: &Event) -> Outcome<S> {
        io.drive(|d| d.forward(FAST));
        io.arm(TAPE_FOLLOW, LOST_MS);
        Outcome::Handled
    }

    fn seek(&mut self, _io: &mut Io, _e: &Event) -> Outcome<S> {
        let c = self.corners;
        if (c.front_right || c.mid_right) && !c.mid_left && !c.front_left {
            Outcome::Transition(S::FoundRightTape)
        } else if (c.front_left || c.mid_left) && !c.mid_right && !c.front_right {
            Outcome::Transition(S::FoundLeftTape)
        } else {
            Outcome::Handled
        }
    }

    fn shift(&mut self, _io: &mut Io, _e: &Event) -> Outcome<S> {
        Outcome::Transition(S::ShiftDirection)
    }

    fn enter_shift(&mut self, io: &mut Io, _e: &Event) -> Outcome<S> {
        io.drive(|d| d.tank_turn_left(SLOW));
        io.arm(TAPE_FOLLOW, TURN_MS);
        Outcome::Handled
    }

    fn resume(&mut self, _io: &mut Io, _e: &Event) -> Outcome<S> {
        Outcome::Transition(S::MoveForward)
    }

    fn enter_found(&mut self, io: &mut Io, _e: &Event) -> Outcome<S> {
        io.drive(|d| d.forward(SLOW));
        io.arm(TAPE_FOLLOW, STRAIGHT_MS);
        self.been_awhile = false;
        Outcome::Handled
    }

    fn held(&mut self, _io: &mut Io, _e: &Event) -> Outcome<S> {
        self.been_awhile = true;
        Outcome::Handled
    }

    fn follow_right(&mut self, _io: &mut Io, _e: &Event) -> Outcome<S> {
        let c = self.corners;
        if c.front_left {
            Outcome::Forward(S::MoveForward, Event::new(BUMPER_TRIPPED, bump::RIGHT))
        } else if !c.front_right {
            Outcome::Transition(S::RightTapeLost)
        } else if c.mid_right {
            Outcome::Transition(S::RightRealign)
        } else {
            Outcome::Handled
        }
    }

    fn enter_right_realign(&mut self, io: &mut Io, _e: &Event) -> Outcome<S> {
        if self.been_awhile {
            io.drive(|d| d.rr_pivot_left(SLOW));
        } else {
            io.drive(|d| d.pivot_left(SLOW));
        }
        Outcome::Handled
    }

    fn right_realigned(&mut self, _io: &mut Io, _e: &Event) -> Outcome<S> {
        let c = self.corners;
        match (c.mid_right, c.front_right) {
            (false, true) => Outcome::Transition(S::FoundRightTape),
            (false, false) => Outcome::Transition(S::MoveForward),
            _ => Outcome::Handled,
        }
    }

    fn enter_right_lost(&mut self, io: &mut Io, _e: &Event) -> Outcome<S> {
        io.drive(|d| d.rr_pivot_right(SLOW));
        io.arm(TAPE_FOLLOW, ESCAPE_MS);
        Outcome::Handled
    }

    fn right_recovered(&mut self, _io: &mut Io, _e: &Event) -> Outcome<S> {
        if self.corners.front_right {
            Outcome::Transition(S::FoundRightTape)
        } else {
            Outcome::Handled
        }
    }

    fn follow_left(&mut self, _io: &mut Io, _e: &Event) -> Outcome<S> {
        let c = self.corners;
        if c.front_right {
            Outcome::Forward(S::MoveForward, Event::new(BUMPER_TRIPPED, bump::LEFT))
        } else if !c.front_left {
            Outcome::Transition(S::LeftTapeLost)
        } else if c.mid_left {
            Outcome::Transition(S::LeftRealign)
        } else {
            Outcome::Handled
        }
    }

    fn enter_left_realign(&mut self, io: &mut Io, _e: &Event) -> Outcome<S> {
        if self.been_awhile {
            io.drive(|d| d.rr_pivot_right(SLOW));
        } else {
            io.drive(|d| d.pivot_right(SLOW));
        }
        Outcome::Handled
    }

    fn left_realigned(&mut self, _io: &mut Io, _e: &Event) -> Outcome<S> {
        let c = self.corners;
        match (c.mid_left, c.front_left) {
            (false, true) => Outcome::Transition(S::FoundLeftTape),
            (false, false) => Outcome::Transition(S::MoveForward),
            _ => Outcome::Handled,
        }
    }

    fn enter_left_lost(&mut self, io: &mut Io, _e: &Event) -> Outcome<S> {
        io.drive(|d| d.rr_pivot_left(SLOW));
        io.arm(TAPE_FOLLOW, ESCAPE_MS);
        Outcome::Handled
    }

    fn left_recovered(&mut self, _io: &mut Io, _e: &Event) -> Outcome<S> {
        if self.corners.front_left {
            Outcome::Transition(S::FoundLeftTape)
        } else {
            Outcome::Handled
        }
    }
}

const TAPE: Trigger = Trigger::On(TAPE_SENSOR_TRIPPED);
const TIMEOUT: Trigger = Trigger::Timeout(TAPE_FOLLOW);

impl Machine for TapeFollow {
    type State = TapeState;
    type Context = Io;

    const NAME: &'static str = "TapeFollow";
    const INITIAL: S = S::Init;
    const RULES: &'static [Rule<Self>] = &[
        Rule::on(S::Init, Trigger::Init, Self::start),
        Rule::on(S::MoveForward, Trigger::Entry, Self::enter_move_forward),
        Rule::on(S::MoveForward, TAPE, Self::seek),
        Rule::on(S::MoveForward, TIMEOUT, Self::shift),
        Rule::on(S::ShiftDirection, Trigger::Entry, Self::enter_shift),
        Rule::on(S::ShiftDirection, TIMEOUT, Self::resume),
        Rule::on(S::FoundRightTape, Trigger::Entry, Self::enter_found),
        Rule::on(S::FoundRightTape, TAPE, Self::follow_right),
        Rule::on(S::FoundRightTape, TIMEOUT, Self::held),
        Rule::on(S::RightRealign, Trigger::Entry, Self::enter_right_realign),
        Rule::on(S::RightRealign, TAPE, Self::right_realigned),
        Rule::on(S::RightRealign, TIMEOUT, Self::held),
        Rule::on(S::RightTapeLost, Trigger::Entry, Self::enter_right_lost),
        Rule::on(S::RightTapeLost, TAPE, Self::right_recovered),
        Rule::on(S::RightTapeLost, TIMEOUT, Self::resume),
        Rule::on(S::FoundLeftTape, Trigger::Entry, Self::enter_found),
        Rule::on(S::FoundLeftTape, TAPE, Self::follow_left),
        Rule::on(S::FoundLeftTape, TIMEOUT, Self::held),
        Rule::on(S::LeftRealign, Trigger::Entry, Self::enter_left_realign),
        Rule::on(S::LeftRealign, TAPE, Self::left_realigned),
        Rule::on(S::LeftRealign, TIMEOUT, Self::held),
        Rule::on(S::LeftTapeLost, Trigger::Entry, Self::enter_left_lost),
        Rule::on(S::LeftTapeLost, TAPE, Self::left_recovered),
        Rule::on(S::LeftTapeLost, TIMEOUT, Self::resume),
    ];

    fn observe(&mut self, event: &Event) {
        if event.is(TAPE_SENSOR_TRIPPED) {
            self.corners = Corners::from_mask(event.param);
        }
    }

    fn while_active(&mut self, state: S, io: &mut Io, _e: &Event) -> Outcome<S> {
        if state == S::ShiftDirection {
            io.drive(|d| d.tank_turn_left(SLOW));
        }
        Outcome::Unhandled
    }
}
