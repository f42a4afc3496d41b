//! Bumper contact service.

use esf::{ActiveBehavior, ActiveContext, Event, Priority, Signal, Timers};
use hal::AdcPin;

use crate::config::ContactConfig;
use crate::events::{timers::BUMPER, BUMPER_TRIPPED};
use crate::io::SharedBoard;
use crate::services::contact::{ContactPair, DualThreshold};

/// Polls both bumper switches and posts `BUMPER_TRIPPED(left << 4 | right)`
/// whenever contact is newly made.
pub struct BumperService {
    board: SharedBoard,
    timers: Timers,
    pins: [AdcPin; 2],
    config: ContactConfig,
    target: Priority,
    pair: ContactPair,
}

impl BumperService {
    pub fn new(
        board: SharedBoard,
        timers: Timers,
        left: AdcPin,
        right: AdcPin,
        config: ContactConfig,
        target: Priority,
    ) -> Self {
        let pair = ContactPair::new(DualThreshold::from_config(&config), [4, 0]);
        Self {
            board,
            timers,
            pins: [left, right],
            config,
            target,
            pair,
        }
    }

    /// Last mask the service acted on.
    pub fn mask(&self) -> u16 {
        self.pair.reported()
    }

    fn poll(&mut self, ctx: &ActiveContext) {
        self.timers.arm(BUMPER, self.config.poll_ms);
        let readings = {
            let mut board = self.board.lock();
            if !board.is_sample_ready() {
                return;
            }
            match (board.read_channel(self.pins[0]), board.read_channel(self.pins[1])) {
                (Ok(left), Ok(right)) => [left, right],
                (Err(err), _) | (_, Err(err)) => {
                    log::warn!("bumper read failed: {err}");
                    return;
                }
            }
        };
        let Some(mask) = self.pair.update(readings) else {
            return;
        };
        self.timers.arm(BUMPER, self.config.cooldown_ms);
        if mask == 0 {
            log::debug!("bumpers released");
            return;
        }
        log::info!("bumper tripped {mask:#04x}");
        if let Err(err) = ctx.post(self.target, Event::new(BUMPER_TRIPPED, mask)) {
            log::error!("bumper event dropped: {err}");
        }
    }
}

impl ActiveBehavior for BumperService {
    fn name(&self) -> &'static str {
        "BumperService"
    }

    fn on_event(&mut self, ctx: &mut ActiveContext, event: Event) -> Event {
        match event.signal {
            Signal::INIT => {
                self.timers.arm(BUMPER, self.config.startup_ms);
                Event::NONE
            }
            Signal::TIMEOUT if BUMPER.matches(&event) => {
                self.poll(ctx);
                Event::NONE
            }
            _ => event,
        }
    }
}
