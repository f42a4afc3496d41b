mod services;

use esf::sync::{Arc, Mutex};
use esf::{
    ActiveBehavior, ActiveContext, Event, Kernel, Priority, Shared, TimerId, TimerWheel, Timers,
};
use hal::sim::{HalCall, SimBoard};

use crate::config::BotConfig;
use crate::io::{Io, SharedBoard};
use crate::motors::Compensation;

/// A simulated board plus the machine context built on top of it.
struct Rig {
    board: Arc<Mutex<SimBoard>>,
    timers: Timers,
    io: Io,
}

impl Rig {
    fn new() -> Self {
        let config = BotConfig::builder()
            .compensation(Compensation::Disabled)
            .build();
        Self::with_config(&config)
    }

    fn with_config(config: &BotConfig) -> Self {
        let board = Arc::new(Mutex::new(SimBoard::new()));
        let shared: SharedBoard = board.clone();
        let timers = Timers::new();
        let io = Io::new(shared, timers.clone(), config);
        Self { board, timers, io }
    }

    fn take_calls(&self) -> Vec<HalCall> {
        self.board.lock().take_calls()
    }

    fn remaining(&self, timer: TimerId) -> Option<u32> {
        self.timers.remaining(timer)
    }
}

/// Records every non-pseudo event it receives.
#[derive(Clone, Default)]
struct Collector {
    events: Arc<Mutex<Vec<Event>>>,
}

impl Collector {
    fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }
}

impl ActiveBehavior for Collector {
    fn name(&self) -> &'static str {
        "collector"
    }

    fn on_event(&mut self, _ctx: &mut ActiveContext, event: Event) -> Event {
        if !event.signal.is_pseudo() {
            self.events.lock().push(event);
        }
        Event::NONE
    }
}

const SERVICE: Priority = Priority(2);
const SINK: Priority = Priority(1);

/// One sensor service on a bus, posting to a [`Collector`].
struct ServiceRig<B: ActiveBehavior> {
    board: Arc<Mutex<SimBoard>>,
    kernel: Arc<Kernel>,
    wheel: TimerWheel,
    service: Shared<B>,
    sink: Collector,
}

impl<B: ActiveBehavior> ServiceRig<B> {
    fn new<F>(timer: TimerId, make: F) -> Self
    where
        F: FnOnce(SharedBoard, Timers, Priority) -> B,
    {
        let board = Arc::new(Mutex::new(SimBoard::new()));
        let timers = Timers::new();
        timers.bind(timer, "service", SERVICE);
        let shared: SharedBoard = board.clone();
        let service = Shared::new(make(shared, timers.clone(), SINK));
        let sink = Collector::default();
        let kernel = Arc::new(
            Kernel::builder()
                .spawn(SERVICE, service.clone())
                .spawn(SINK, sink.clone())
                .build(),
        );
        let wheel = TimerWheel::new(Arc::clone(&kernel), timers);
        Self {
            board,
            kernel,
            wheel,
            service,
            sink,
        }
    }

    fn start(&self) {
        self.kernel.start().unwrap();
        self.kernel.run_until_idle();
    }

    fn tick(&self, millis: u32) {
        self.wheel.tick(millis).unwrap();
        self.kernel.run_until_idle();
    }

    fn remaining(&self, timer: TimerId) -> Option<u32> {
        self.wheel.timers().remaining(timer)
    }
}

#[test]
fn events_describe_themselves_for_logs() {
    use crate::events::{describe, signal_name, BUMPER_TRIPPED, TAPE_SENSOR_TRIPPED};

    assert_eq!(signal_name(esf::Signal::TIMEOUT), "ES_TIMEOUT");
    assert_eq!(signal_name(esf::Signal::user(40)), "UNKNOWN");
    assert_eq!(describe(&Event::new(BUMPER_TRIPPED, 0x10)), "BUMPER_TRIPPED(0x0010)");
    assert_eq!(
        describe(&Event::new(TAPE_SENSOR_TRIPPED, 0x1001)),
        "TAPE_SENSOR_TRIPPED(0x1001)"
    );
}
