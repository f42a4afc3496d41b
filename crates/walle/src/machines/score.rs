//! Scoring run: find the goal beacon, back into the goal and drop the balls.
//!
//! After driving to mid-field the robot spins until the beacon is seen,
//! drives at it until the front corners hit the goal tape, turns around and
//! reverses in, then runs [`DepositBalls`] twice. It then patrols with
//! [`ExclusionRadar`] until the beacon shows up again. A bump anywhere hands
//! control to [`BumpResponse`] and restarts from mid-field.

use esf::{Event, Hsm, Machine, Outcome, Rule, Trigger};

use crate::events::{
    tape, timers::SCORE, BALL_DROPPED, BEACON_FOUND, BEACON_LOST, BUMPER_TRIPPED, BUMP_RESOLVED,
    TAPE_SENSOR_TRIPPED,
};
use crate::io::Io;
use crate::machines::bump_response::BumpResponse;
use crate::machines::deposit::DepositBalls;
use crate::machines::exclusion_radar::ExclusionRadar;

pub const FAST: u16 = 500;
pub const SLOW: u16 = 300;
pub const SEARCH: u16 = 250;
pub const CENTER_MS: u32 = 800;
pub const BACK_UP_MS: u32 = 600;
pub const BACK_IN_MS: u32 = 200;
pub const TURN_AROUND_MS: u32 = 1950;
pub const DETACH_MS: u32 = 2000;
pub const MINI_SWEEP_MS: u32 = 400;

/// Both front corners on tape: square to the goal line.
const GOAL_LINE: u16 = tape::FRONT_LEFT | tape::FRONT_RIGHT;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreState {
    Init,
    MoveCenter,
    Radar,
    MiniRadarLeft,
    MiniRadarRight,
    ZoneIn,
    BackUp,
    TurnAround,
    BackIn,
    DropBall,
    DropBallAgain,
    Detach,
    ExclusionRadar,
    BumpResolving,
}

#[derive(Debug)]
pub struct Score {
    deposit: Hsm<DepositBalls>,
    radar: Hsm<ExclusionRadar>,
    bump_response: Hsm<BumpResponse>,
    last_bump: u16,
    sweep_ms: u32,
    tapes_tripped: u32,
}

impl Default for Score {
    fn default() -> Self {
        Self::new()
    }
}

use ScoreState as S;

impl Score {
    pub fn new() -> Self {
        Self {
            deposit: Hsm::new(DepositBalls::new()),
            radar: Hsm::new(ExclusionRadar::new()),
            bump_response: Hsm::new(BumpResponse::new()),
            last_bump: 0,
            sweep_ms: MINI_SWEEP_MS,
            tapes_tripped: 0,
        }
    }

    pub fn deposit(&self) -> &Hsm<DepositBalls> {
        &self.deposit
    }

    pub fn radar(&self) -> &Hsm<ExclusionRadar> {
        &self.radar
    }

    pub fn bump_response(&self) -> &Hsm<BumpResponse> {
        &self.bump_response
    }

    /// Current half-width of the beacon re-acquisition sweep.
    pub fn sweep_ms(&self) -> u32 {
        self.sweep_ms
    }

    /// Corners on black tape in the latest tape reading.
    pub fn tapes_tripped(&self) -> u32 {
        self.tapes_tripped
    }

    fn cruise(state: S, io: &Io) {
        match state {
            S::MoveCenter | S::ZoneIn => io.drive(|d| d.forward(FAST)),
            S::Radar | S::MiniRadarLeft => io.drive(|d| d.tank_turn_left(SEARCH)),
            S::MiniRadarRight => io.drive(|d| d.tank_turn_right(SEARCH)),
            S::BackUp | S::BackIn => io.drive(|d| d.backward(FAST)),
            S::TurnAround => io.drive(|d| d.tank_turn_left(FAST)),
            S::Detach => io.drive(|d| d.forward(SLOW)),
            _ => {}
        }
    }

    fn restart_deposit(&mut self, io: &mut Io) {
        io.drive(|d| d.halt());
        if let Err(err) = self.deposit.init(io) {
            log::error!("{err}");
        }
    }

    fn start(&mut self, _io: &mut Io, _e: &Event) -> Outcome<S> {
        self.sweep_ms = MINI_SWEEP_MS;
        Outcome::Transition(S::MoveCenter)
    }

    fn enter_move_center(&mut self, io: &mut Io, _e: &Event) -> Outcome<S> {
        io.arm(SCORE, CENTER_MS);
        Self::cruise(S::MoveCenter, io);
        Outcome::Handled
    }

    fn to_radar(&mut self, _io: &mut Io, _e: &Event) -> Outcome<S> {
        Outcome::Transition(S::Radar)
    }

    fn enter_radar(&mut self, io: &mut Io, _e: &Event) -> Outcome<S> {
        Self::cruise(S::Radar, io);
        Outcome::Handled
    }

    fn zone_in(&mut self, _io: &mut Io, _e: &Event) -> Outcome<S> {
        Outcome::Transition(S::ZoneIn)
    }

    fn enter_mini_left(&mut self, io: &mut Io, _e: &Event) -> Outcome<S> {
        io.arm(SCORE, self.sweep_ms);
        Self::cruise(S::MiniRadarLeft, io);
        Outcome::Handled
    }

    fn to_mini_right(&mut self, _io: &mut Io, _e: &Event) -> Outcome<S> {
        Outcome::Transition(S::MiniRadarRight)
    }

    fn enter_mini_right(&mut self, io: &mut Io, _e: &Event) -> Outcome<S> {
        self.sweep_ms = self.sweep_ms.saturating_mul(2);
        io.arm(SCORE, self.sweep_ms);
        Self::cruise(S::MiniRadarRight, io);
        Outcome::Handled
    }

    fn to_mini_left(&mut self, _io: &mut Io, _e: &Event) -> Outcome<S> {
        Outcome::Transition(S::MiniRadarLeft)
    }

    fn enter_zone_in(&mut self, io: &mut Io, _e: &Event) -> Outcome<S> {
        Self::cruise(S::ZoneIn, io);
        Outcome::Handled
    }

    fn beacon_lost(&mut self, _io: &mut Io, _e: &Event) -> Outcome<S> {
        self.sweep_ms = MINI_SWEEP_MS;
        Outcome::Transition(S::MiniRadarLeft)
    }

    fn at_goal_line(&mut self, _io: &mut Io, e: &Event) -> Outcome<S> {
        if e.param & GOAL_LINE == GOAL_LINE {
            Outcome::Transition(S::BackUp)
        } else {
            Outcome::Unhandled
        }
    }

    fn enter_back_up(&mut self, io: &mut Io, _e: &Event) -> Outcome<S> {
        io.arm(SCORE, BACK_UP_MS);
        io.drive(|d| d.backward(SLOW));
        Outcome::Handled
    }

    fn to_turn_around(&mut self, _io: &mut Io, _e: &Event) -> Outcome<S> {
        Outcome::Transition(S::TurnAround)
    }

    fn enter_turn_around(&mut self, io: &mut Io, _e: &Event) -> Outcome<S> {
        io.arm(SCORE, TURN_AROUND_MS);
        Self::cruise(S::TurnAround, io);
        Outcome::Handled
    }

    fn to_back_in(&mut self, _io: &mut Io, _e: &Event) -> Outcome<S> {
        Outcome::Transition(S::BackIn)
    }

    fn enter_back_in(&mut self, io: &mut Io, _e: &Event) -> Outcome<S> {
        io.arm(SCORE, BACK_IN_MS);
        Self::cruise(S::BackIn, io);
        Outcome::Handled
    }

    fn to_drop_ball(&mut self, _io: &mut Io, _e: &Event) -> Outcome<S> {
        Outcome::Transition(S::DropBall)
    }

    fn enter_drop(&mut self, io: &mut Io, _e: &Event) -> Outcome<S> {
        self.restart_deposit(io);
        Outcome::Handled
    }

    fn dropped_first(&mut self, _io: &mut Io, _e: &Event) -> Outcome<S> {
        Outcome::Transition(S::DropBallAgain)
    }

    fn dropped_second(&mut self, _io: &mut Io, _e: &Event) -> Outcome<S> {
        Outcome::Transition(S::Detach)
    }

    fn enter_detach(&mut self, io: &mut Io, _e: &Event) -> Outcome<S> {
        io.arm(SCORE, DETACH_MS);
        Self::cruise(S::Detach, io);
        Outcome::Handled
    }

    fn to_exclusion_radar(&mut self, _io: &mut Io, _e: &Event) -> Outcome<S> {
        Outcome::Transition(S::ExclusionRadar)
    }

    fn enter_exclusion_radar(&mut self, io: &mut Io, _e: &Event) -> Outcome<S> {
        if let Err(err) = self.radar.init(io) {
            log::error!("{err}");
        }
        Outcome::Handled
    }

    fn enter_bump_resolving(&mut self, io: &mut Io, _e: &Event) -> Outcome<S> {
        self.bump_response.machine_mut().set_bump(self.last_bump);
        if let Err(err) = self.bump_response.init(io) {
            log::error!("{err}");
        }
        Outcome::Handled
    }

    fn bumped(&mut self, _io: &mut Io, e: &Event) -> Outcome<S> {
        self.last_bump = e.param;
        Outcome::Transition(S::BumpResolving)
    }

    fn resolved(&mut self, _io: &mut Io, _e: &Event) -> Outcome<S> {
        Outcome::Transition(S::MoveCenter)
    }
}

const TIMEOUT: Trigger = Trigger::Timeout(SCORE);
const FOUND: Trigger = Trigger::On(BEACON_FOUND);

impl Machine for Score {
    type State = ScoreState;
    type Context = Io;

    const NAME: &'static str = "Score";
    const INITIAL: S = S::Init;
    const RULES: &'static [Rule<Self>] = &[
        Rule::on(S::Init, Trigger::Init, Self::start),
        Rule::on(S::MoveCenter, Trigger::Entry, Self::enter_move_center),
        Rule::on(S::MoveCenter, TIMEOUT, Self::to_radar),
        Rule::on(S::Radar, Trigger::Entry, Self::enter_radar),
        Rule::on(S::Radar, FOUND, Self::zone_in),
        Rule::on(S::MiniRadarLeft, Trigger::Entry, Self::enter_mini_left),
        Rule::on(S::MiniRadarLeft, FOUND, Self::zone_in),
        Rule::on(S::MiniRadarLeft, TIMEOUT, Self::to_mini_right),
        Rule::on(S::MiniRadarRight, Trigger::Entry, Self::enter_mini_right),
        Rule::on(S::MiniRadarRight, FOUND, Self::zone_in),
        Rule::on(S::MiniRadarRight, TIMEOUT, Self::to_mini_left),
        Rule::on(S::ZoneIn, Trigger::Entry, Self::enter_zone_in),
        Rule::on(S::ZoneIn, Trigger::On(BEACON_LOST), Self::beacon_lost),
        Rule::on(S::ZoneIn, Trigger::On(TAPE_SENSOR_TRIPPED), Self::at_goal_line),
        Rule::on(S::BackUp, Trigger::Entry, Self::enter_back_up),
        Rule::on(S::BackUp, TIMEOUT, Self::to_turn_around),
        Rule::on(S::TurnAround, Trigger::Entry, Self::enter_turn_around),
        Rule::on(S::TurnAround, TIMEOUT, Self::to_back_in),
        Rule::on(S::BackIn, Trigger::Entry, Self::enter_back_in),
        Rule::on(S::BackIn, TIMEOUT, Self::to_drop_ball),
        Rule::on(S::DropBall, Trigger::Entry, Self::enter_drop),
        Rule::on(S::DropBall, Trigger::On(BALL_DROPPED), Self::dropped_first),
        Rule::on(S::DropBallAgain, Trigger::Entry, Self::enter_drop),
        Rule::on(S::DropBallAgain, Trigger::On(BALL_DROPPED), Self::dropped_second),
        Rule::on(S::Detach, Trigger::Entry, Self::enter_detach),
        Rule::on(S::Detach, TIMEOUT, Self::to_exclusion_radar),
        Rule::on(S::ExclusionRadar, Trigger::Entry, Self::enter_exclusion_radar),
        Rule::on(S::ExclusionRadar, FOUND, Self::zone_in),
        Rule::on(S::BumpResolving, Trigger::Entry, Self::enter_bump_resolving),
        Rule::on(S::BumpResolving, Trigger::On(BUMP_RESOLVED), Self::resolved),
        Rule::any(Trigger::On(BUMPER_TRIPPED), Self::bumped),
    ];

    fn observe(&mut self, event: &Event) {
        match event.signal {
            TAPE_SENSOR_TRIPPED => self.tapes_tripped = tape::tripped(event.param),
            BUMPER_TRIPPED => self.last_bump = event.param,
            _ => {}
        }
    }

    fn delegate(&mut self, state: S, io: &mut Io, event: Event) -> Event {
        match state {
            S::DropBall | S::DropBallAgain => self.deposit.run(io, event),
            S::ExclusionRadar => self.radar.run(io, event),
            S::BumpResolving => self.bump_response.run(io, event),
            _ => event,
        }
    }

    fn while_active(&mut self, state: S, io: &mut Io, _e: &Event) -> Outcome<S> {
        Self::cruise(state, io);
        Outcome::Unhandled
    }
}
