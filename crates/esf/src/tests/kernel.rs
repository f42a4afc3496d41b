use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::active::{ActiveBehavior, ActiveContext, Priority};
use crate::event::{Event, Signal};
use crate::kernel::{Kernel, KernelConfig, KernelError};

const PING: Signal = Signal::user(0);
const PONG: Signal = Signal::user(1);

#[derive(Clone, Default)]
struct Collector {
    events: Arc<Mutex<Vec<(Priority, Event)>>>,
}

impl ActiveBehavior for Collector {
    fn name(&self) -> &'static str {
        "collector"
    }

    fn on_event(&mut self, ctx: &mut ActiveContext, event: Event) -> Event {
        self.events.lock().unwrap().push((ctx.priority(), event));
        Event::NONE
    }
}

/// Answers every PING with a PONG to a fixed peer.
struct Echo {
    peer: Priority,
}

impl ActiveBehavior for Echo {
    fn name(&self) -> &'static str {
        "echo"
    }

    fn on_event(&mut self, ctx: &mut ActiveContext, event: Event) -> Event {
        if event.is(PING) {
            ctx.post(self.peer, Event::new(PONG, event.param)).unwrap();
            return Event::NONE;
        }
        event
    }
}

#[test]
fn kernel_delivers_events() {
    let collector = Collector::default();
    let probe = collector.clone();

    let kernel = Kernel::builder().spawn(Priority(1), collector).build();
    kernel.post(Priority(1), Event::new(Signal(0x42), 7)).unwrap();
    kernel.run_until_idle();

    let events = probe.events.lock().unwrap();
    assert_eq!(events.as_slice(), &[(Priority(1), Event::new(Signal(0x42), 7))]);
}

#[test]
fn start_queues_init_for_every_object() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let kernel = Kernel::builder()
        .spawn(Priority(1), Collector { events: events.clone() })
        .spawn(Priority(2), Collector { events: events.clone() })
        .build();

    kernel.start().unwrap();
    kernel.run_until_idle();

    let events = events.lock().unwrap();
    assert_eq!(
        events.as_slice(),
        &[(Priority(2), Event::INIT), (Priority(1), Event::INIT)]
    );
}

#[test]
fn higher_priority_queue_is_drained_first() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let kernel = Kernel::builder()
        .spawn(Priority(1), Collector { events: events.clone() })
        .spawn(Priority(5), Collector { events: events.clone() })
        .build();

    kernel.post(Priority(1), Event::new(PING, 1)).unwrap();
    kernel.post(Priority(5), Event::new(PING, 2)).unwrap();
    kernel.post(Priority(1), Event::new(PING, 3)).unwrap();
    kernel.run_until_idle();

    let order: Vec<u16> = events.lock().unwrap().iter().map(|(_, e)| e.param).collect();
    assert_eq!(order, vec![2, 1, 3]);
}

#[test]
fn behaviors_post_through_the_bus() {
    let collector = Collector::default();
    let probe = collector.clone();
    let kernel = Kernel::builder()
        .spawn(Priority(1), collector)
        .spawn(Priority(2), Echo { peer: Priority(1) })
        .build();

    kernel.post(Priority(2), Event::new(PING, 9)).unwrap();
    kernel.run_until_idle();

    let events = probe.events.lock().unwrap();
    assert_eq!(events.as_slice(), &[(Priority(1), Event::new(PONG, 9))]);
}

#[test]
fn posting_to_an_unset_priority_fails() {
    let kernel = Kernel::builder().spawn(Priority(1), Collector::default()).build();
    assert_eq!(
        kernel.post(Priority(9), Event::empty(PING)),
        Err(KernelError::NotFound(Priority(9)))
    );
}

#[test]
fn full_queue_is_reported() {
    let config = KernelConfig::builder().queue_depth(2).build();
    let kernel = Kernel::with_config(config)
        .spawn(Priority(1), Collector::default())
        .build();

    kernel.post(Priority(1), Event::empty(PING)).unwrap();
    kernel.post(Priority(1), Event::empty(PING)).unwrap();
    assert_eq!(
        kernel.post(Priority(1), Event::empty(PING)),
        Err(KernelError::QueueFull(Priority(1)))
    );
    assert_eq!(kernel.bus().pending(Priority(1)), Some(2));
}

#[test]
fn startup_fails_when_init_cannot_be_queued() {
    let config = KernelConfig::builder().queue_depth(1).build();
    let kernel = Kernel::with_config(config)
        .spawn(Priority(1), Collector::default())
        .build();
    kernel.post(Priority(1), Event::empty(PING)).unwrap();

    match kernel.start() {
        Err(KernelError::StartFailed { name, cause }) => {
            assert_eq!(name, "collector");
            assert_eq!(*cause, KernelError::QueueFull(Priority(1)));
        }
        other => panic!("unexpected start result: {other:?}"),
    }
}

#[test]
fn publish_reaches_every_object() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let kernel = Kernel::builder()
        .spawn(Priority(1), Collector { events: events.clone() })
        .spawn(Priority(3), Collector { events: events.clone() })
        .build();
    assert!(kernel.bus().contains(Priority(3)));
    assert!(!kernel.bus().contains(Priority(2)));

    kernel.publish(Event::new(PING, 4)).unwrap();
    kernel.run_until_idle();

    let events = events.lock().unwrap();
    assert_eq!(
        events.as_slice(),
        &[
            (Priority(3), Event::new(PING, 4)),
            (Priority(1), Event::new(PING, 4))
        ]
    );
}

static IDLE_CALLS: AtomicUsize = AtomicUsize::new(0);

fn count_idle() {
    IDLE_CALLS.fetch_add(1, Ordering::SeqCst);
}

#[test]
fn idle_callback_runs_once_queues_drain() {
    let config = KernelConfig::builder().idle_callback(count_idle).build();
    let kernel = Kernel::with_config(config)
        .spawn(Priority(1), Collector::default())
        .build();

    kernel.post(Priority(1), Event::empty(PING)).unwrap();
    kernel.run_until_idle();

    assert_eq!(IDLE_CALLS.load(Ordering::SeqCst), 1);
    assert_eq!(kernel.bus().pending(Priority(1)), Some(0));
}
