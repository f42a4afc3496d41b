//! Priority-ordered event bus and cooperative run-to-completion scheduler.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use crate::active::{new_active_object, ActiveBehavior, ActiveObjectRef, Priority};
use crate::event::{Event, Signal};
use crate::sync::{Arc, Mutex};

/// Configuration for the kernel.
#[derive(Debug, Clone)]
pub struct KernelConfig {
    pub name: &'static str,
    /// Capacity of each active object's queue.
    pub queue_depth: usize,
    /// Called every time `run_until_idle` drains all queues.
    pub idle_callback: Option<fn()>,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            name: "ESF",
            queue_depth: 16,
            idle_callback: None,
        }
    }
}

impl KernelConfig {
    /// Creates a new kernel configuration builder.
    pub fn builder() -> KernelConfigBuilder {
        KernelConfigBuilder::default()
    }
}

/// Builder for ergonomic kernel configuration construction.
#[derive(Debug, Clone, Default)]
pub struct KernelConfigBuilder {
    config: KernelConfig,
}

impl KernelConfigBuilder {
    pub fn name(mut self, name: &'static str) -> Self {
        self.config.name = name;
        self
    }

    /// Sets the per-object queue capacity. Zero is bumped to one.
    pub fn queue_depth(mut self, depth: usize) -> Self {
        self.config.queue_depth = depth.max(1);
        self
    }

    pub fn idle_callback(mut self, callback: fn()) -> Self {
        self.config.idle_callback = Some(callback);
        self
    }

    pub fn build(self) -> KernelConfig {
        self.config
    }
}

pub struct KernelBuilder {
    config: KernelConfig,
    objects: Vec<ActiveObjectRef>,
}

impl KernelBuilder {
    pub fn new(config: KernelConfig) -> Self {
        Self {
            config,
            objects: Vec::new(),
        }
    }

    pub fn register(mut self, object: ActiveObjectRef) -> Self {
        self.objects.push(object);
        self
    }

    /// Wraps `behavior` in an active object sized by the kernel's queue depth
    /// and registers it at `priority`.
    pub fn spawn<B: ActiveBehavior>(self, priority: Priority, behavior: B) -> Self {
        let depth = self.config.queue_depth;
        self.register(new_active_object(priority, depth, behavior))
    }

    pub fn build(mut self) -> Kernel {
        self.objects.sort_by_key(|ao| ao.priority());
        Kernel::new(self.config, self.objects)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KernelError {
    #[error("no active object registered at priority {0:?}")]
    NotFound(Priority),
    #[error("event queue at priority {0:?} is full")]
    QueueFull(Priority),
    #[error("failed to queue the initial event for `{name}`")]
    StartFailed {
        name: &'static str,
        #[source]
        cause: alloc::boxed::Box<KernelError>,
    },
}

/// Routing table from priority slots to active objects.
///
/// Shared by the kernel, by every behavior through its
/// [`ActiveContext`](crate::ActiveContext), and by the timer wheel.
pub struct Bus {
    objects: Vec<ActiveObjectRef>,
    by_priority: BTreeMap<Priority, ActiveObjectRef>,
}

impl Bus {
    fn new(objects: Vec<ActiveObjectRef>) -> Self {
        let by_priority = objects
            .iter()
            .map(|ao| (ao.priority(), Arc::clone(ao)))
            .collect();
        Self {
            objects,
            by_priority,
        }
    }

    pub fn post(&self, target: Priority, event: Event) -> Result<(), KernelError> {
        let ao = self
            .by_priority
            .get(&target)
            .ok_or(KernelError::NotFound(target))?;
        log::trace!("post {} -> {}", event, ao.name());
        ao.post(event)
    }

    /// Posts a copy of `event` to every registered object.
    pub fn publish(&self, event: Event) -> Result<(), KernelError> {
        self.objects.iter().try_for_each(|ao| ao.post(event))
    }

    pub fn contains(&self, priority: Priority) -> bool {
        self.by_priority.contains_key(&priority)
    }

    /// Number of events waiting at `priority`.
    pub fn pending(&self, priority: Priority) -> Option<usize> {
        self.by_priority.get(&priority).map(|ao| ao.pending())
    }
}

pub struct Kernel {
    config: KernelConfig,
    bus: Arc<Bus>,
    last: Mutex<Option<Priority>>,
}

impl Kernel {
    pub fn builder() -> KernelBuilder {
        KernelBuilder::new(KernelConfig::default())
    }

    pub fn with_config(config: KernelConfig) -> KernelBuilder {
        KernelBuilder::new(config)
    }

    fn new(config: KernelConfig, objects: Vec<ActiveObjectRef>) -> Self {
        Self {
            config,
            bus: Arc::new(Bus::new(objects)),
            last: Mutex::new(None),
        }
    }

    pub fn post(&self, target: Priority, event: Event) -> Result<(), KernelError> {
        self.bus.post(target, event)
    }

    pub fn publish(&self, event: Event) -> Result<(), KernelError> {
        self.bus.publish(event)
    }

    /// Runs every behavior's start hook, then queues `INIT` for each object.
    ///
    /// A post failure is the one startup fault; it names the object whose
    /// initial event could not be queued.
    pub fn start(&self) -> Result<(), KernelError> {
        log::info!(
            "{}: starting {} active objects",
            self.config.name,
            self.bus.objects.len()
        );
        for ao in &self.bus.objects {
            ao.start(&self.bus);
        }
        for ao in &self.bus.objects {
            ao.post(Event::empty(Signal::INIT))
                .map_err(|cause| KernelError::StartFailed {
                    name: ao.name(),
                    cause: alloc::boxed::Box::new(cause),
                })?;
        }
        Ok(())
    }

    /// Dispatches one event from the highest-priority non-empty queue.
    /// Returns `false` when every queue is empty.
    pub fn dispatch_once(&self) -> bool {
        let candidate = self
            .bus
            .objects
            .iter()
            .rev()
            .find(|ao| ao.has_events())
            .cloned();

        let Some(ao) = candidate else {
            if self.last.lock().take().is_some() {
                log::trace!("{}: idle", self.config.name);
            }
            return false;
        };

        {
            let mut last = self.last.lock();
            if *last != Some(ao.priority()) {
                log::trace!("{}: next {}", self.config.name, ao.name());
                *last = Some(ao.priority());
            }
        }
        ao.dispatch_one(&self.bus)
    }

    pub fn run_until_idle(&self) {
        while self.dispatch_once() {}
        if let Some(idle_cb) = self.config.idle_callback {
            idle_cb();
        }
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    pub fn bus(&self) -> &Arc<Bus> {
        &self.bus
    }
}
