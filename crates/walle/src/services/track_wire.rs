//! Track-wire proximity service.

use esf::{ActiveBehavior, ActiveContext, Event, Priority, Signal, Timers};
use hal::AdcPin;

use crate::config::ContactConfig;
use crate::events::{timers::TRACK_WIRE, TRACK_WIRE_FOUND, TRACK_WIRE_LOST};
use crate::io::SharedBoard;
use crate::services::contact::{ContactPair, DualThreshold};

/// Watches both track-wire detectors. Posts `TRACK_WIRE_FOUND(tw0 | tw1 << 4)`
/// when the detected set changes to a non-empty one and `TRACK_WIRE_LOST`
/// when it becomes empty.
pub struct TrackWireService {
    board: SharedBoard,
    timers: Timers,
    pins: [AdcPin; 2],
    config: ContactConfig,
    target: Priority,
    pair: ContactPair,
}

impl TrackWireService {
    pub fn new(
        board: SharedBoard,
        timers: Timers,
        pins: [AdcPin; 2],
        config: ContactConfig,
        target: Priority,
    ) -> Self {
        let pair = ContactPair::new(DualThreshold::from_config(&config), [0, 4]);
        Self {
            board,
            timers,
            pins,
            config,
            target,
            pair,
        }
    }

    pub fn mask(&self) -> u16 {
        self.pair.reported()
    }

    fn poll(&mut self, ctx: &ActiveContext) {
        self.timers.arm(TRACK_WIRE, self.config.poll_ms);
        let readings = {
            let mut board = self.board.lock();
            if !board.is_sample_ready() {
                return;
            }
            match (board.read_channel(self.pins[0]), board.read_channel(self.pins[1])) {
                (Ok(tw0), Ok(tw1)) => [tw0, tw1],
                (Err(err), _) | (_, Err(err)) => {
                    log::warn!("track wire read failed: {err}");
                    return;
                }
            }
        };
        let Some(mask) = self.pair.update(readings) else {
            return;
        };
        self.timers.arm(TRACK_WIRE, self.config.cooldown_ms);
        let event = if mask == 0 {
            Event::empty(TRACK_WIRE_LOST)
        } else {
            Event::new(TRACK_WIRE_FOUND, mask)
        };
        log::info!("track wire {mask:#04x}");
        if let Err(err) = ctx.post(self.target, event) {
            log::error!("track wire event dropped: {err}");
        }
    }
}

impl ActiveBehavior for TrackWireService {
    fn name(&self) -> &'static str {
        "TrackWireService"
    }

    fn on_event(&mut self, ctx: &mut ActiveContext, event: Event) -> Event {
        match event.signal {
            Signal::INIT => {
                self.timers.arm(TRACK_WIRE, self.config.startup_ms);
                Event::NONE
            }
            Signal::TIMEOUT if TRACK_WIRE.matches(&event) => {
                self.poll(ctx);
                Event::NONE
            }
            _ => event,
        }
    }
}
