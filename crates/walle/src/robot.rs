//! Wiring of the sensor services and the machine tree onto one bus.

use esf::sync::{Arc, MutexGuard};
use esf::{
    Event, Hsm, HsmBehavior, HsmError, Kernel, KernelConfig, Machine, Shared, TimerWheel, Timers,
};

use crate::config::BotConfig;
use crate::error::BotError;
use crate::events::describe;
use crate::events::timers::{BUMPER, MACHINE_TIMERS, TAPE_SENSOR, TRACK_WIRE};
use crate::io::{Io, SharedBoard};
use crate::machines::{Top, TopState};
use crate::services::{BumperService, TapeSensorService, TrackWireService};

/// The assembled robot.
///
/// The kernel owns one handle to each behavior; the robot keeps another so
/// callers can look at sensor masks and machine states between steps.
pub struct Robot {
    kernel: Arc<Kernel>,
    wheel: TimerWheel,
    board: SharedBoard,
    config: BotConfig,
    tape: Shared<TapeSensorService>,
    bumper: Shared<BumperService>,
    track_wire: Shared<TrackWireService>,
    top: Shared<HsmBehavior<Top>>,
}

impl Robot {
    pub fn new(board: SharedBoard, config: BotConfig) -> Self {
        let prio = config.priorities.clone();
        let pins = &config.pins;

        let timers = Timers::new();
        timers.bind(TAPE_SENSOR, "tape-sensor", prio.tape);
        timers.bind(BUMPER, "bumper", prio.bumper);
        timers.bind(TRACK_WIRE, "track-wire", prio.track_wire);
        for (id, name) in MACHINE_TIMERS {
            timers.bind(id, name, prio.top);
        }

        let tape = Shared::new(TapeSensorService::new(
            board.clone(),
            timers.clone(),
            pins.tape,
            pins.tape_flash,
            config.tape.clone(),
            prio.top,
        ));
        let bumper = Shared::new(BumperService::new(
            board.clone(),
            timers.clone(),
            pins.bumper_left,
            pins.bumper_right,
            config.bumper.clone(),
            prio.top,
        ));
        let track_wire = Shared::new(TrackWireService::new(
            board.clone(),
            timers.clone(),
            pins.track_wire,
            config.track_wire.clone(),
            prio.top,
        ));
        let io = Io::new(board.clone(), timers.clone(), &config);
        let top = Shared::new(HsmBehavior::new(Top::new(), io));

        let kernel_config = KernelConfig::builder()
            .name("walle")
            .queue_depth(config.queue_depth)
            .build();
        let kernel = Arc::new(
            Kernel::with_config(kernel_config)
                .spawn(prio.tape, tape.clone())
                .spawn(prio.bumper, bumper.clone())
                .spawn(prio.track_wire, track_wire.clone())
                .spawn(prio.top, top.clone())
                .build(),
        );
        let wheel = TimerWheel::new(Arc::clone(&kernel), timers);

        Self {
            kernel,
            wheel,
            board,
            config,
            tape,
            bumper,
            track_wire,
            top,
        }
    }

    /// Queues `INIT` for every service and the top machine and runs until
    /// the bus is idle.
    pub fn start(&self) -> Result<(), BotError> {
        self.kernel.start().map_err(BotError::from_start)?;
        self.kernel.run_until_idle();
        if self.top_state() == TopState::Init {
            return Err(HsmError::InitNotConsumed { machine: Top::NAME }.into());
        }
        log::info!("robot started in {:?}", self.top_state());
        Ok(())
    }

    /// Advances the clock by `elapsed_ms`, posts any expired timers and runs
    /// until the bus is idle again.
    pub fn step(&self, elapsed_ms: u32) -> Result<(), BotError> {
        self.wheel.tick(elapsed_ms)?;
        self.kernel.run_until_idle();
        Ok(())
    }

    /// Injects an event for the machine tree, e.g. from the beacon detector.
    pub fn post_top(&self, event: Event) -> Result<(), BotError> {
        log::debug!("inject {}", describe(&event));
        self.kernel.post(self.config.priorities.top, event)?;
        self.kernel.run_until_idle();
        Ok(())
    }

    pub fn top_state(&self) -> TopState {
        self.top.lock().hsm().state()
    }

    /// Runs `f` against the top machine while the bus is not dispatching.
    pub fn inspect<R>(&self, f: impl FnOnce(&Hsm<Top>) -> R) -> R {
        f(self.top.lock().hsm())
    }

    pub fn tape(&self) -> MutexGuard<'_, TapeSensorService> {
        self.tape.lock()
    }

    pub fn bumper(&self) -> MutexGuard<'_, BumperService> {
        self.bumper.lock()
    }

    pub fn track_wire(&self) -> MutexGuard<'_, TrackWireService> {
        self.track_wire.lock()
    }

    pub fn timers(&self) -> &Timers {
        self.wheel.timers()
    }

    pub fn board(&self) -> &SharedBoard {
        &self.board
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }
}
