//! Named one-shot millisecond timers.
//!
//! A [`Timers`] table is a cheap, cloneable handle: services and state
//! machines arm timers through it, and a [`TimerWheel`] advances it and posts
//! an `ES_TIMEOUT` event carrying the timer's id to the slot the timer is
//! bound to.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use crate::active::Priority;
use crate::event::{Event, Signal};
use crate::kernel::{Kernel, KernelError};
use crate::sync::{Arc, Mutex};

/// Identity of a named timer. Carried as the parameter of `ES_TIMEOUT`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(pub u8);

impl TimerId {
    /// The `ES_TIMEOUT` event this timer produces when it expires.
    pub const fn timeout(self) -> Event {
        Event::new(Signal::TIMEOUT, self.0 as u16)
    }

    /// `true` when `event` is this timer's expiry.
    pub fn matches(self, event: &Event) -> bool {
        event.signal == Signal::TIMEOUT && event.param == self.0 as u16
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TimeEventError {
    #[error("kernel error: {0}")]
    Kernel(#[from] KernelError),
}

#[derive(Debug, Clone)]
struct TimerSlot {
    name: &'static str,
    target: Option<Priority>,
    remaining: u32,
    armed: bool,
}

impl TimerSlot {
    fn unbound() -> Self {
        Self {
            name: "unbound",
            target: None,
            remaining: 0,
            armed: false,
        }
    }
}

/// An expired timer and the slot its timeout should be posted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expired {
    pub id: TimerId,
    pub name: &'static str,
    pub target: Option<Priority>,
}

/// Shared table of named timers.
#[derive(Clone, Default)]
pub struct Timers {
    inner: Arc<Mutex<BTreeMap<TimerId, TimerSlot>>>,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names `id` and routes its timeouts to `target`.
    pub fn bind(&self, id: TimerId, name: &'static str, target: Priority) {
        let mut table = self.inner.lock();
        let slot = table.entry(id).or_insert_with(TimerSlot::unbound);
        slot.name = name;
        slot.target = Some(target);
    }

    /// Starts `id` counting down from `millis`, overwriting any time left.
    pub fn arm(&self, id: TimerId, millis: u32) {
        let mut table = self.inner.lock();
        let slot = table.entry(id).or_insert_with(TimerSlot::unbound);
        slot.remaining = millis;
        slot.armed = true;
        log::trace!("timer {} armed for {}ms", slot.name, millis);
    }

    pub fn disarm(&self, id: TimerId) {
        if let Some(slot) = self.inner.lock().get_mut(&id) {
            slot.armed = false;
            slot.remaining = 0;
        }
    }

    pub fn is_armed(&self, id: TimerId) -> bool {
        self.inner.lock().get(&id).is_some_and(|slot| slot.armed)
    }

    /// Time left on an armed timer.
    pub fn remaining(&self, id: TimerId) -> Option<u32> {
        self.inner
            .lock()
            .get(&id)
            .filter(|slot| slot.armed)
            .map(|slot| slot.remaining)
    }

    pub fn name(&self, id: TimerId) -> Option<&'static str> {
        self.inner.lock().get(&id).map(|slot| slot.name)
    }

    /// Advances every armed timer by `elapsed_ms` and disarms the ones that
    /// reached zero, in id order.
    pub fn advance(&self, elapsed_ms: u32) -> Vec<Expired> {
        let mut table = self.inner.lock();
        let mut expired = Vec::new();
        for (id, slot) in table.iter_mut().filter(|(_, slot)| slot.armed) {
            slot.remaining = slot.remaining.saturating_sub(elapsed_ms);
            if slot.remaining == 0 {
                slot.armed = false;
                expired.push(Expired {
                    id: *id,
                    name: slot.name,
                    target: slot.target,
                });
            }
        }
        expired
    }
}

/// Drives a [`Timers`] table from elapsed wall time and posts expiries to the
/// kernel.
pub struct TimerWheel {
    kernel: Arc<Kernel>,
    timers: Timers,
}

impl TimerWheel {
    pub fn new(kernel: Arc<Kernel>, timers: Timers) -> Self {
        Self { kernel, timers }
    }

    pub fn timers(&self) -> &Timers {
        &self.timers
    }

    /// Posts every timer that expired within `elapsed_ms`. A timeout the bus
    /// refuses is re-armed to fire on the next tick; the first such error is
    /// returned once every other expiry has been posted.
    pub fn tick(&self, elapsed_ms: u32) -> Result<(), TimeEventError> {
        let mut failed = None;
        for expired in self.timers.advance(elapsed_ms) {
            let Some(target) = expired.target else {
                log::warn!("timer {:?} expired with no bound target", expired.id);
                continue;
            };
            log::trace!("timer {} expired", expired.name);
            if let Err(err) = self.kernel.post(target, expired.id.timeout()) {
                log::warn!("timer {} not delivered, retrying: {err}", expired.name);
                self.timers.arm(expired.id, 0);
                failed.get_or_insert(err);
            }
        }
        match failed {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }
}
