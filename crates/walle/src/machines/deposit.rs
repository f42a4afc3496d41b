//! Ball release sequence.
//!
//! Cycles the two gate servos in turn: open, close, then reopen briefly to
//! let the mechanism settle. Reports `BALL_DROPPED` once the second gate has
//! closed behind its ball.

use esf::{Event, Machine, Outcome, Rule, Trigger};

use crate::events::{timers::DEPOSIT, BALL_DROPPED};
use crate::io::{Gate, Io};

pub const GATE_MS: u32 = 800;
pub const SETTLE_MS: u32 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepositState {
    Init,
    OpenGate0,
    CloseGate0,
    SettleGate0,
    OpenGate1,
    CloseGate1,
    SettleGate1,
}

#[derive(Debug, Default)]
pub struct DepositBalls;

use DepositState as S;

impl DepositBalls {
    pub fn new() -> Self {
        Self
    }

    fn start(&mut self, _io: &mut Io, _e: &Event) -> Outcome<S> {
        Outcome::Transition(S::OpenGate0)
    }

    fn move_gate(io: &mut Io, gate: Gate, open: bool, millis: u32) {
        if open {
            io.open_gate(gate);
        } else {
            io.close_gate(gate);
        }
        io.arm(DEPOSIT, millis);
    }

    fn enter_open0(&mut self, io: &mut Io, _e: &Event) -> Outcome<S> {
        Self::move_gate(io, Gate::First, true, GATE_MS);
        Outcome::Handled
    }

    fn enter_close0(&mut self, io: &mut Io, _e: &Event) -> Outcome<S> {
        Self::move_gate(io, Gate::First, false, GATE_MS);
        Outcome::Handled
    }

    fn enter_settle0(&mut self, io: &mut Io, _e: &Event) -> Outcome<S> {
        Self::move_gate(io, Gate::First, true, SETTLE_MS);
        Outcome::Handled
    }

    fn enter_open1(&mut self, io: &mut Io, _e: &Event) -> Outcome<S> {
        Self::move_gate(io, Gate::Second, true, GATE_MS);
        Outcome::Handled
    }

    fn enter_close1(&mut self, io: &mut Io, _e: &Event) -> Outcome<S> {
        Self::move_gate(io, Gate::Second, false, GATE_MS);
        Outcome::Handled
    }

    fn enter_settle1(&mut self, io: &mut Io, _e: &Event) -> Outcome<S> {
        Self::move_gate(io, Gate::Second, true, SETTLE_MS);
        Outcome::Handled
    }

    fn to_close0(&mut self, _io: &mut Io, _e: &Event) -> Outcome<S> {
        Outcome::Transition(S::CloseGate0)
    }

    fn to_settle0(&mut self, _io: &mut Io, _e: &Event) -> Outcome<S> {
        Outcome::Transition(S::SettleGate0)
    }

    fn to_open1(&mut self, _io: &mut Io, _e: &Event) -> Outcome<S> {
        Outcome::Transition(S::OpenGate1)
    }

    fn to_close1(&mut self, _io: &mut Io, _e: &Event) -> Outcome<S> {
        Outcome::Transition(S::CloseGate1)
    }

    fn dropped(&mut self, _io: &mut Io, _e: &Event) -> Outcome<S> {
        Outcome::Forward(S::SettleGate1, Event::empty(BALL_DROPPED))
    }

    fn finish(&mut self, _io: &mut Io, _e: &Event) -> Outcome<S> {
        Outcome::Transition(S::Init)
    }
}

const TIMEOUT: Trigger = Trigger::Timeout(DEPOSIT);

impl Machine for DepositBalls {
    type State = DepositState;
    type Context = Io;

    const NAME: &'static str = "DepositBalls";
    const INITIAL: S = S::Init;
    const RULES: &'static [Rule<Self>] = &[
        Rule::on(S::Init, Trigger::Init, Self::start),
        Rule::on(S::OpenGate0, Trigger::Entry, Self::enter_open0),
        Rule::on(S::OpenGate0, TIMEOUT, Self::to_close0),
        Rule::on(S::CloseGate0, Trigger::Entry, Self::enter_close0),
        Rule::on(S::CloseGate0, TIMEOUT, Self::to_settle0),
        Rule::on(S::SettleGate0, Trigger::Entry, Self::enter_settle0),
        Rule::on(S::SettleGate0, TIMEOUT, Self::to_open1),
        Rule::on(S::OpenGate1, Trigger::Entry, Self::enter_open1),
        Rule::on(S::OpenGate1, TIMEOUT, Self::to_close1),
        Rule::on(S::CloseGate1, Trigger::Entry, Self::enter_close1),
        Rule::on(S::CloseGate1, TIMEOUT, Self::dropped),
        Rule::on(S::SettleGate1, Trigger::Entry, Self::enter_settle1),
        Rule::on(S::SettleGate1, TIMEOUT, Self::finish),
    ];
}
