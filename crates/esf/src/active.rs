//! Active objects.
//!
//! An active object couples a behavior (a sensor service or a state machine)
//! with a bounded FIFO of pending events. The kernel owns them and dispatches
//! one event at a time in priority order.

use alloc::collections::VecDeque;

use crate::event::Event;
use crate::kernel::{Bus, KernelError};
use crate::sync::{Arc, Mutex};

/// Bus slot of an active object. Doubles as its identity; a higher value is
/// dispatched first.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Priority(pub u8);

impl Priority {
    pub const fn new(level: u8) -> Self {
        Self(level)
    }
}

/// Per-dispatch context handed to behaviors.
pub struct ActiveContext {
    priority: Priority,
    bus: Arc<Bus>,
}

impl ActiveContext {
    pub fn new(priority: Priority, bus: Arc<Bus>) -> Self {
        Self { priority, bus }
    }

    /// Slot of the object currently running.
    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Posts `event` to another slot on the same bus.
    pub fn post(&self, target: Priority, event: Event) -> Result<(), KernelError> {
        self.bus.post(target, event)
    }

    pub fn bus(&self) -> &Arc<Bus> {
        &self.bus
    }
}

/// Implemented by everything that runs on the bus.
pub trait ActiveBehavior: Send + 'static {
    /// Short name used in logs and startup diagnostics.
    fn name(&self) -> &'static str;

    /// Called once before the initial `INIT` event is queued.
    fn on_start(&mut self, _ctx: &mut ActiveContext) {}

    /// Processes one event to completion and returns whatever was left
    /// unconsumed (`Event::NONE` when fully handled).
    fn on_event(&mut self, ctx: &mut ActiveContext, event: Event) -> Event;
}

/// Object-safe interface used by the kernel.
pub trait ActiveRunnable: Send + Sync {
    fn name(&self) -> &'static str;
    fn priority(&self) -> Priority;
    fn start(&self, bus: &Arc<Bus>);
    fn dispatch_one(&self, bus: &Arc<Bus>) -> bool;
    fn post(&self, event: Event) -> Result<(), KernelError>;
    fn has_events(&self) -> bool;
    fn pending(&self) -> usize;
}

/// Concrete active object for a specific behavior.
pub struct ActiveObject<B: ActiveBehavior> {
    name: &'static str,
    priority: Priority,
    depth: usize,
    queue: Mutex<VecDeque<Event>>,
    behavior: Mutex<B>,
}

impl<B: ActiveBehavior> ActiveObject<B> {
    pub fn new(priority: Priority, depth: usize, behavior: B) -> Arc<Self> {
        Arc::new(Self {
            name: behavior.name(),
            priority,
            depth,
            queue: Mutex::new(VecDeque::with_capacity(depth)),
            behavior: Mutex::new(behavior),
        })
    }

    fn pop_event(&self) -> Option<Event> {
        self.queue.lock().pop_front()
    }
}

impl<B: ActiveBehavior> ActiveRunnable for ActiveObject<B> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn priority(&self) -> Priority {
        self.priority
    }

    fn start(&self, bus: &Arc<Bus>) {
        let mut behavior = self.behavior.lock();
        let mut ctx = ActiveContext::new(self.priority, Arc::clone(bus));
        behavior.on_start(&mut ctx);
    }

    fn dispatch_one(&self, bus: &Arc<Bus>) -> bool {
        let Some(event) = self.pop_event() else {
            return false;
        };
        let mut behavior = self.behavior.lock();
        let mut ctx = ActiveContext::new(self.priority, Arc::clone(bus));
        let left = behavior.on_event(&mut ctx, event);
        if !left.is_none() {
            log::trace!("{}: {} left unconsumed", self.name, left);
        }
        true
    }

    fn post(&self, event: Event) -> Result<(), KernelError> {
        let mut queue = self.queue.lock();
        if queue.len() >= self.depth {
            return Err(KernelError::QueueFull(self.priority));
        }
        queue.push_back(event);
        Ok(())
    }

    fn has_events(&self) -> bool {
        !self.queue.lock().is_empty()
    }

    fn pending(&self) -> usize {
        self.queue.lock().len()
    }
}

pub type ActiveObjectRef = Arc<dyn ActiveRunnable>;

/// Wraps `behavior` in an active object with a queue of `depth` events.
pub fn new_active_object<B: ActiveBehavior>(
    priority: Priority,
    depth: usize,
    behavior: B,
) -> ActiveObjectRef {
    ActiveObject::new(priority, depth, behavior) as ActiveObjectRef
}

/// A behavior that stays reachable from outside the kernel.
///
/// The kernel runs one clone; the owner keeps another to inspect state
/// between dispatches. Never lock it from inside the behavior itself.
pub struct Shared<B> {
    name: &'static str,
    inner: Arc<Mutex<B>>,
}

impl<B: ActiveBehavior> Shared<B> {
    pub fn new(behavior: B) -> Self {
        Self {
            name: behavior.name(),
            inner: Arc::new(Mutex::new(behavior)),
        }
    }

    pub fn lock(&self) -> crate::sync::MutexGuard<'_, B> {
        self.inner.lock()
    }
}

impl<B> Clone for Shared<B> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: ActiveBehavior> ActiveBehavior for Shared<B> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn on_start(&mut self, ctx: &mut ActiveContext) {
        self.inner.lock().on_start(ctx);
    }

    fn on_event(&mut self, ctx: &mut ActiveContext, event: Event) -> Event {
        self.inner.lock().on_event(ctx, event)
    }
}
