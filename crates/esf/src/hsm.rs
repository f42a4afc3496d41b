//! Table-driven hierarchical state machine engine.
//!
//! A machine is a plain struct implementing [`Machine`]: its states are an
//! enum, and its behavior is a static table of [`Rule`]s mapping
//! `(state, trigger)` to an action. [`Hsm`] owns the current state and runs
//! the protocol:
//!
//! 1. `observe` sees every non-pseudo event first, whatever the state.
//! 2. `delegate` hands the event to embedded child machines; a child that
//!    consumes it ends processing.
//! 3. The first matching rule runs: state-specific rules before any-state
//!    rules, each in table order.
//! 4. With no matching rule, the `while_active` hook runs.
//!
//! An action that requests a transition causes exactly one `EXIT` on the old
//! state followed by exactly one `ENTRY` on the new one. Neither is re-queued;
//! they are delivered directly, so no other event can interleave.
//!
//! Composition is call-based: a parent holds its children as `Hsm<Child>`
//! fields, calls [`Hsm::init`] from an entry action to restart them, and
//! forwards events through [`Hsm::run`] from `delegate`. Whatever a child
//! leaves unconsumed comes back as the return value, which is how events are
//! translated between levels.

use core::fmt;

use crate::active::{ActiveBehavior, ActiveContext};
use crate::event::{Event, Signal};
use crate::time::TimerId;

/// Signature of a rule action.
pub type Action<M> =
    fn(&mut M, &mut <M as Machine>::Context, &Event) -> Outcome<<M as Machine>::State>;

/// What an action asks the engine to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome<S> {
    /// Not handled here; the event is returned to the caller unchanged.
    Unhandled,
    /// Consumed without a transition.
    Handled,
    /// Consumed; transition to the given state.
    Transition(S),
    /// Transition, then return `Event` to the caller unconsumed.
    Forward(S, Event),
    /// No transition; return `Event` to the caller in place of the input.
    Reply(Event),
}

/// Event pattern a rule reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Init,
    Entry,
    Exit,
    /// Any event with this signal, whatever its parameter.
    On(Signal),
    /// `ES_TIMEOUT` for this timer only.
    Timeout(TimerId),
}

impl Trigger {
    pub fn matches(&self, event: &Event) -> bool {
        match *self {
            Trigger::Init => event.signal == Signal::INIT,
            Trigger::Entry => event.signal == Signal::ENTRY,
            Trigger::Exit => event.signal == Signal::EXIT,
            Trigger::On(signal) => event.signal == signal,
            Trigger::Timeout(timer) => timer.matches(event),
        }
    }
}

/// One row of a machine's state table.
pub struct Rule<M: Machine> {
    /// `None` applies in every state.
    pub state: Option<M::State>,
    pub trigger: Trigger,
    pub action: Action<M>,
}

impl<M: Machine> Rule<M> {
    pub const fn on(state: M::State, trigger: Trigger, action: Action<M>) -> Self {
        Self {
            state: Some(state),
            trigger,
            action,
        }
    }

    pub const fn any(trigger: Trigger, action: Action<M>) -> Self {
        Self {
            state: None,
            trigger,
            action,
        }
    }
}

/// A concrete state machine definition.
pub trait Machine: Sized + 'static {
    type State: Copy + Eq + fmt::Debug + 'static;
    /// Collaborators the actions drive (motors, timers, ...).
    type Context: ?Sized;

    const NAME: &'static str;
    /// The initial pseudo-state. It must have a rule for [`Trigger::Init`].
    const INITIAL: Self::State;
    const RULES: &'static [Rule<Self>];

    /// Sees every non-pseudo event before anything else.
    fn observe(&mut self, _event: &Event) {}

    /// Forwards `event` to the child machine active in `state`, if any.
    fn delegate(&mut self, _state: Self::State, _ctx: &mut Self::Context, event: Event) -> Event {
        event
    }

    /// Default handling when no rule matched a non-pseudo event.
    fn while_active(
        &mut self,
        _state: Self::State,
        _ctx: &mut Self::Context,
        _event: &Event,
    ) -> Outcome<Self::State> {
        Outcome::Unhandled
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HsmError {
    #[error("{machine}: INIT did not leave the initial pseudo-state")]
    InitNotConsumed { machine: &'static str },
}

/// A running instance of machine `M`.
pub struct Hsm<M: Machine> {
    state: M::State,
    machine: M,
}

impl<M: Machine> Hsm<M> {
    pub fn new(machine: M) -> Self {
        Self {
            state: M::INITIAL,
            machine,
        }
    }

    pub fn state(&self) -> M::State {
        self.state
    }

    pub fn machine(&self) -> &M {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut M {
        &mut self.machine
    }

    /// Discards the current state, returns to the initial pseudo-state and
    /// delivers `INIT` so the machine takes its first transition.
    pub fn init(&mut self, ctx: &mut M::Context) -> Result<(), HsmError> {
        self.state = M::INITIAL;
        self.run(ctx, Event::INIT);
        if self.state == M::INITIAL {
            return Err(HsmError::InitNotConsumed { machine: M::NAME });
        }
        Ok(())
    }

    /// Processes `event` to completion. Returns `Event::NONE` when the event
    /// was consumed, otherwise the event the caller should react to.
    pub fn run(&mut self, ctx: &mut M::Context, event: Event) -> Event {
        if event.is_none() {
            return Event::NONE;
        }

        let mut event = event;
        if !event.signal.is_pseudo() {
            self.machine.observe(&event);
            event = self.machine.delegate(self.state, ctx, event);
            if event.is_none() {
                return Event::NONE;
            }
        }

        let outcome = match self.lookup(&event) {
            Some(action) => action(&mut self.machine, ctx, &event),
            None if !event.signal.is_pseudo() => {
                self.machine.while_active(self.state, ctx, &event)
            }
            None => Outcome::Unhandled,
        };

        match outcome {
            Outcome::Unhandled => event,
            Outcome::Handled => Event::NONE,
            Outcome::Reply(reply) => reply,
            Outcome::Transition(next) => {
                self.transition(ctx, next);
                Event::NONE
            }
            Outcome::Forward(next, reply) => {
                self.transition(ctx, next);
                reply
            }
        }
    }

    fn transition(&mut self, ctx: &mut M::Context, next: M::State) {
        let from = self.state;
        self.deliver_pseudo(ctx, Event::EXIT);
        self.state = next;
        log::debug!("{}: {:?} -> {:?}", M::NAME, from, next);
        self.deliver_pseudo(ctx, Event::ENTRY);
    }

    fn deliver_pseudo(&mut self, ctx: &mut M::Context, event: Event) {
        let Some(action) = self.lookup(&event) else {
            return;
        };
        match action(&mut self.machine, ctx, &event) {
            Outcome::Transition(to) | Outcome::Forward(to, _) => log::error!(
                "{}: {} action of {:?} requested a transition to {:?}; ignored",
                M::NAME,
                event.signal,
                self.state,
                to
            ),
            _ => {}
        }
    }

    fn lookup(&self, event: &Event) -> Option<Action<M>> {
        let specific = M::RULES
            .iter()
            .find(|rule| rule.state == Some(self.state) && rule.trigger.matches(event));
        specific
            .or_else(|| {
                M::RULES
                    .iter()
                    .find(|rule| rule.state.is_none() && rule.trigger.matches(event))
            })
            .map(|rule| rule.action)
    }
}

impl<M: Machine> fmt::Debug for Hsm<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hsm")
            .field("machine", &M::NAME)
            .field("state", &self.state)
            .finish()
    }
}

/// Runs a top-level [`Hsm`] as an active object on the bus, owning the
/// context its actions drive.
pub struct HsmBehavior<M: Machine>
where
    M::Context: Sized,
{
    hsm: Hsm<M>,
    ctx: M::Context,
}

impl<M: Machine> HsmBehavior<M>
where
    M::Context: Sized,
{
    pub fn new(machine: M, ctx: M::Context) -> Self {
        Self {
            hsm: Hsm::new(machine),
            ctx,
        }
    }

    pub fn hsm(&self) -> &Hsm<M> {
        &self.hsm
    }

    pub fn context(&self) -> &M::Context {
        &self.ctx
    }
}

impl<M> ActiveBehavior for HsmBehavior<M>
where
    M: Machine + Send,
    M::State: Send,
    M::Context: Sized + Send + 'static,
{
    fn name(&self) -> &'static str {
        M::NAME
    }

    fn on_event(&mut self, _ctx: &mut ActiveContext, event: Event) -> Event {
        if event.is(Signal::INIT) {
            if let Err(err) = self.hsm.init(&mut self.ctx) {
                log::error!("{err}");
            }
            return Event::NONE;
        }
        self.hsm.run(&mut self.ctx, event)
    }
}
