use std::sync::{Arc, Mutex};

use crate::active::{ActiveBehavior, ActiveContext, Priority};
use crate::event::{Event, Signal};
use crate::kernel::{Kernel, KernelConfig, KernelError};
use crate::time::{TimeEventError, TimerId, TimerWheel, Timers};

const BLINK: TimerId = TimerId(3);
const STRAY: TimerId = TimerId(4);
const CHIME: TimerId = TimerId(5);

#[derive(Clone, Default)]
struct Collector {
    events: Arc<Mutex<Vec<Event>>>,
}

impl ActiveBehavior for Collector {
    fn name(&self) -> &'static str {
        "collector"
    }

    fn on_event(&mut self, _ctx: &mut ActiveContext, event: Event) -> Event {
        self.events.lock().unwrap().push(event);
        Event::NONE
    }
}

fn wheel_with_collector() -> (Arc<Kernel>, TimerWheel, Collector) {
    let collector = Collector::default();
    let probe = collector.clone();
    let kernel = Arc::new(Kernel::builder().spawn(Priority(1), collector).build());
    let timers = Timers::new();
    timers.bind(BLINK, "blink", Priority(1));
    let wheel = TimerWheel::new(kernel.clone(), timers);
    (kernel, wheel, probe)
}

#[test]
fn timer_fires_once_after_its_duration() {
    let (kernel, wheel, probe) = wheel_with_collector();
    wheel.timers().arm(BLINK, 10);

    wheel.tick(9).unwrap();
    kernel.run_until_idle();
    assert!(probe.events.lock().unwrap().is_empty());

    wheel.tick(1).unwrap();
    wheel.tick(50).unwrap();
    kernel.run_until_idle();

    let events = probe.events.lock().unwrap();
    assert_eq!(events.as_slice(), &[Event::new(Signal::TIMEOUT, 3)]);
    assert!(!wheel.timers().is_armed(BLINK));
}

#[test]
fn rearming_overwrites_remaining_time() {
    let (_kernel, wheel, _probe) = wheel_with_collector();
    let timers = wheel.timers();
    timers.arm(BLINK, 100);
    wheel.tick(40).unwrap();
    assert_eq!(timers.remaining(BLINK), Some(60));

    timers.arm(BLINK, 20);
    assert_eq!(timers.remaining(BLINK), Some(20));
}

#[test]
fn disarmed_timer_stays_silent() {
    let (kernel, wheel, probe) = wheel_with_collector();
    wheel.timers().arm(BLINK, 5);
    wheel.timers().disarm(BLINK);
    wheel.tick(10).unwrap();
    kernel.run_until_idle();
    assert!(probe.events.lock().unwrap().is_empty());
    assert_eq!(wheel.timers().remaining(BLINK), None);
}

#[test]
fn unbound_timer_expires_without_posting() {
    let (kernel, wheel, probe) = wheel_with_collector();
    wheel.timers().arm(STRAY, 1);
    wheel.tick(1).unwrap();
    kernel.run_until_idle();
    assert!(probe.events.lock().unwrap().is_empty());
    assert_eq!(wheel.timers().name(STRAY), Some("unbound"));
}

#[test]
fn timeout_matches_only_its_own_timer() {
    let event = BLINK.timeout();
    assert!(BLINK.matches(&event));
    assert!(!STRAY.matches(&event));
    assert!(!BLINK.matches(&Event::new(Signal::user(0), 3)));
}

#[test]
fn refused_timeout_is_retried_on_the_next_tick() {
    let collector = Collector::default();
    let probe = collector.clone();
    let config = KernelConfig::builder().queue_depth(1).build();
    let kernel = Arc::new(
        Kernel::with_config(config)
            .spawn(Priority(1), collector)
            .build(),
    );
    let timers = Timers::new();
    timers.bind(BLINK, "blink", Priority(1));
    timers.bind(CHIME, "chime", Priority(1));
    let wheel = TimerWheel::new(kernel.clone(), timers);
    wheel.timers().arm(BLINK, 5);
    wheel.timers().arm(CHIME, 5);

    let result = wheel.tick(5);
    assert!(matches!(
        result,
        Err(TimeEventError::Kernel(KernelError::QueueFull(Priority(1))))
    ));
    assert!(!wheel.timers().is_armed(BLINK));
    assert_eq!(wheel.timers().remaining(CHIME), Some(0));

    kernel.run_until_idle();
    wheel.tick(0).unwrap();
    kernel.run_until_idle();

    let events = probe.events.lock().unwrap();
    assert_eq!(events.as_slice(), &[BLINK.timeout(), CHIME.timeout()]);
    assert!(!wheel.timers().is_armed(CHIME));
}
