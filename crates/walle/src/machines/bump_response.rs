//! Backing away from an obstacle.
//!
//! The parent records which bumper was hit and restarts this machine. It
//! backs straight off, turns away from the hit side, then returns to its
//! pseudo-state reporting `BUMP_RESOLVED` so the parent can carry on.

use esf::{Event, Machine, Outcome, Rule, Trigger};

use crate::events::{bump, timers::BUMP_RESPONSE, BUMPER_TRIPPED, BUMP_RESOLVED};
use crate::io::Io;
use crate::motors::Side;

pub const SLOW: u16 = 300;
pub const BACK_OFF_MS: u32 = 600;
pub const TURN_AWAY_MS: u32 = 600;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BumpState {
    Init,
    BackingOff,
    TurningAway,
}

#[derive(Debug, Default)]
pub struct BumpResponse {
    bump: u16,
}

use BumpState as S;

impl BumpResponse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bumper mask to resolve. Set before [`Hsm::init`](esf::Hsm::init).
    pub fn set_bump(&mut self, mask: u16) {
        self.bump = mask;
    }

    pub fn bump(&self) -> u16 {
        self.bump
    }

    /// Left hit turns right; anything else turns left.
    fn away(&self) -> Side {
        if self.bump & bump::LEFT != 0 && self.bump & bump::RIGHT == 0 {
            Side::Right
        } else {
            Side::Left
        }
    }

    fn start(&mut self, _io: &mut Io, _e: &Event) -> Outcome<S> {
        Outcome::Transition(S::BackingOff)
    }

    fn enter_backing_off(&mut self, io: &mut Io, _e: &Event) -> Outcome<S> {
        io.drive(|d| d.backward(SLOW));
        io.arm(BUMP_RESPONSE, BACK_OFF_MS);
        Outcome::Handled
    }

    fn bumped_again(&mut self, _io: &mut Io, e: &Event) -> Outcome<S> {
        if e.param == 0 {
            return Outcome::Handled;
        }
        self.bump = e.param;
        Outcome::Transition(S::BackingOff)
    }

    fn turn(&mut self, _io: &mut Io, _e: &Event) -> Outcome<S> {
        Outcome::Transition(S::TurningAway)
    }

    fn enter_turning_away(&mut self, io: &mut Io, _e: &Event) -> Outcome<S> {
        let side = self.away();
        io.drive(|d| d.tank_turn(side, SLOW));
        io.arm(BUMP_RESPONSE, TURN_AWAY_MS);
        Outcome::Handled
    }

    fn resolved(&mut self, _io: &mut Io, _e: &Event) -> Outcome<S> {
        Outcome::Forward(S::Init, Event::empty(BUMP_RESOLVED))
    }
}

impl Machine for BumpResponse {
    type State = BumpState;
    type Context = Io;

    const NAME: &'static str = "BumpResponse";
    const INITIAL: S = S::Init;
    const RULES: &'static [Rule<Self>] = &[
        Rule::on(S::Init, Trigger::Init, Self::start),
        Rule::on(S::BackingOff, Trigger::Entry, Self::enter_backing_off),
        Rule::on(S::BackingOff, Trigger::Timeout(BUMP_RESPONSE), Self::turn),
        Rule::on(S::TurningAway, Trigger::Entry, Self::enter_turning_away),
        Rule::on(S::TurningAway, Trigger::Timeout(BUMP_RESPONSE), Self::resolved),
        Rule::any(Trigger::On(BUMPER_TRIPPED), Self::bumped_again),
    ];

    fn while_active(&mut self, state: S, io: &mut Io, _e: &Event) -> Outcome<S> {
        if state == S::TurningAway {
            let side = self.away();
            io.drive(|d| d.tank_turn(side, SLOW));
        }
        Outcome::Unhandled
    }
}
