//! Mode selection: load balls, then go score them.

use esf::{Event, Hsm, Machine, Outcome, Rule, Trigger};

use crate::events::{AMMO_PLUNGER_LOST, BALLS_LOADED};
use crate::io::Io;
use crate::machines::receive::Receive;
use crate::machines::score::Score;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopState {
    Init,
    Receiving,
    Scoring,
}

#[derive(Debug)]
pub struct Top {
    receive: Hsm<Receive>,
    score: Hsm<Score>,
}

impl Default for Top {
    fn default() -> Self {
        Self::new()
    }
}

use TopState as S;

impl Top {
    pub fn new() -> Self {
        Self {
            receive: Hsm::new(Receive::new()),
            score: Hsm::new(Score::new()),
        }
    }

    pub fn receive(&self) -> &Hsm<Receive> {
        &self.receive
    }

    pub fn score(&self) -> &Hsm<Score> {
        &self.score
    }

    fn start(&mut self, _io: &mut Io, _e: &Event) -> Outcome<S> {
        Outcome::Transition(S::Receiving)
    }

    fn enter_receiving(&mut self, io: &mut Io, _e: &Event) -> Outcome<S> {
        if let Err(err) = self.receive.init(io) {
            log::error!("{err}");
        }
        Outcome::Handled
    }

    fn loaded(&mut self, _io: &mut Io, _e: &Event) -> Outcome<S> {
        log::info!("balls loaded, heading out to score");
        Outcome::Transition(S::Scoring)
    }

    fn plunger_lost(&mut self, _io: &mut Io, _e: &Event) -> Outcome<S> {
        log::info!("lost the ammo plunger, retrying");
        Outcome::Transition(S::Receiving)
    }

    fn enter_scoring(&mut self, io: &mut Io, _e: &Event) -> Outcome<S> {
        io.drive(|d| d.halt());
        if let Err(err) = self.score.init(io) {
            log::error!("{err}");
        }
        Outcome::Handled
    }
}

impl Machine for Top {
    type State = TopState;
    type Context = Io;

    const NAME: &'static str = "Top";
    const INITIAL: S = S::Init;
    const RULES: &'static [Rule<Self>] = &[
        Rule::on(S::Init, Trigger::Init, Self::start),
        Rule::on(S::Receiving, Trigger::Entry, Self::enter_receiving),
        Rule::on(S::Receiving, Trigger::On(BALLS_LOADED), Self::loaded),
        Rule::on(S::Receiving, Trigger::On(AMMO_PLUNGER_LOST), Self::plunger_lost),
        Rule::on(S::Scoring, Trigger::Entry, Self::enter_scoring),
    ];

    fn delegate(&mut self, state: S, io: &mut Io, event: Event) -> Event {
        match state {
            S::Receiving => self.receive.run(io, event),
            S::Scoring => self.score.run(io, event),
            S::Init => event,
        }
    }
}
