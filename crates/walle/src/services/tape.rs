//! Tape sensor service.
//!
//! Each reflectance sensor is sampled twice per cycle, once with the IR flash
//! on and once with it off. The difference cancels ambient light and is
//! classified with hysteresis into black or white.

use esf::{ActiveBehavior, ActiveContext, Event, Priority, Signal, Timers};
use hal::{AdcPin, HalResult, PortPin};

use crate::config::TapeConfig;
use crate::events::{tape, timers::TAPE_SENSOR, TAPE_SENSOR_TRIPPED};
use crate::io::SharedBoard;

/// Corner order used by every per-corner array: front-left, mid-left,
/// mid-right, front-right.
pub const CORNER_BITS: [u16; 4] = [
    tape::FRONT_LEFT,
    tape::MID_LEFT,
    tape::MID_RIGHT,
    tape::FRONT_RIGHT,
];

/// Depth of the reading history.
pub const HISTORY_LEN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shade {
    Black,
    White,
}

/// Black/white thresholds on the flash-on/flash-off difference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hysteresis {
    pub white_above: i32,
    pub black_below: i32,
}

impl Hysteresis {
    pub fn from_config(config: &TapeConfig) -> Self {
        Self {
            white_above: config.white_threshold,
            black_below: config.black_threshold,
        }
    }

    /// Values between the thresholds keep `prior`.
    pub fn classify(&self, diff: i32, prior: Shade) -> Shade {
        if diff > self.white_above {
            Shade::White
        } else if diff < self.black_below {
            Shade::Black
        } else {
            prior
        }
    }
}

impl Default for Hysteresis {
    fn default() -> Self {
        Self::from_config(&TapeConfig::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TapeCorner {
    pub sample1: u16,
    pub sample2: u16,
    pub diff: i32,
    pub status: Shade,
}

impl Default for TapeCorner {
    fn default() -> Self {
        Self {
            sample1: 0,
            sample2: 0,
            diff: 0,
            status: Shade::White,
        }
    }
}

impl TapeCorner {
    /// Records the second sample and reclassifies. Returns the new status.
    pub fn settle(&mut self, sample2: u16, hysteresis: &Hysteresis) -> Shade {
        self.sample2 = sample2;
        self.diff = i32::from(self.sample2) - i32::from(self.sample1);
        self.status = hysteresis.classify(self.diff, self.status);
        self.status
    }
}

/// Ring of the last [`HISTORY_LEN`] assembled masks.
#[derive(Debug, Clone, Default)]
pub struct MaskHistory {
    masks: [u16; HISTORY_LEN],
    next: usize,
}

impl MaskHistory {
    pub fn push(&mut self, mask: u16) {
        self.masks[self.next] = mask;
        self.next = (self.next + 1) % HISTORY_LEN;
    }

    /// Most frequent mask in the window. Ties go to the lower slot.
    pub fn dominant(&self) -> u16 {
        let mut best = (0, self.masks[0]);
        for mask in &self.masks {
            let count = self.masks.iter().filter(|m| *m == mask).count();
            if count > best.0 {
                best = (count, *mask);
            }
        }
        best.1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    FlashOn,
    TakeSample1,
    FlashOff,
    TakeSample2,
}

/// Four-phase flash/sample service posting `TAPE_SENSOR_TRIPPED(mask)`.
pub struct TapeSensorService {
    board: SharedBoard,
    timers: Timers,
    pins: [AdcPin; 4],
    flash: PortPin,
    config: TapeConfig,
    hysteresis: Hysteresis,
    target: Priority,
    phase: Phase,
    corners: [TapeCorner; 4],
    reported: u16,
    history: MaskHistory,
}

impl TapeSensorService {
    pub fn new(
        board: SharedBoard,
        timers: Timers,
        pins: [AdcPin; 4],
        flash: PortPin,
        config: TapeConfig,
        target: Priority,
    ) -> Self {
        Self {
            board,
            timers,
            pins,
            flash,
            hysteresis: Hysteresis::from_config(&config),
            config,
            target,
            phase: Phase::FlashOn,
            corners: [TapeCorner::default(); 4],
            reported: 0,
            history: MaskHistory::default(),
        }
    }

    pub fn corners(&self) -> &[TapeCorner; 4] {
        &self.corners
    }

    /// Last mask posted.
    pub fn mask(&self) -> u16 {
        self.reported
    }

    /// Mode of the recent readings, steadier than any single cycle.
    pub fn dominant_mask(&self) -> u16 {
        self.history.dominant()
    }

    fn assemble(&self) -> u16 {
        self.corners
            .iter()
            .zip(CORNER_BITS)
            .filter(|(corner, _)| corner.status == Shade::Black)
            .fold(0, |mask, (_, bit)| mask | bit)
    }

    fn read_all(&self) -> HalResult<[u16; 4]> {
        let mut board = self.board.lock();
        let mut samples = [0; 4];
        for (sample, pin) in samples.iter_mut().zip(self.pins) {
            *sample = board.read_channel(pin)?;
        }
        Ok(samples)
    }

    fn set_flash(&self, on: bool) {
        let mut board = self.board.lock();
        let result = if on {
            board.set_port_bits(self.flash)
        } else {
            board.clear_port_bits(self.flash)
        };
        if let Err(err) = result {
            log::warn!("tape flash write failed: {err}");
        }
    }

    fn sample_ready(&self) -> bool {
        self.board.lock().is_sample_ready()
    }

    fn step(&mut self, ctx: &ActiveContext) {
        self.timers.arm(TAPE_SENSOR, self.config.phase_ms);
        self.phase = match self.phase {
            Phase::FlashOn => {
                self.set_flash(true);
                if self.sample_ready() {
                    Phase::TakeSample1
                } else {
                    Phase::FlashOn
                }
            }
            Phase::TakeSample1 => match self.read_all() {
                Ok(samples) => {
                    for (corner, sample) in self.corners.iter_mut().zip(samples) {
                        corner.sample1 = sample;
                    }
                    Phase::FlashOff
                }
                Err(err) => {
                    log::warn!("tape read failed: {err}");
                    Phase::FlashOn
                }
            },
            Phase::FlashOff => {
                self.set_flash(false);
                if self.sample_ready() {
                    Phase::TakeSample2
                } else {
                    Phase::FlashOff
                }
            }
            Phase::TakeSample2 => {
                match self.read_all() {
                    Ok(samples) => self.classify(ctx, samples),
                    Err(err) => log::warn!("tape read failed: {err}"),
                }
                Phase::FlashOn
            }
        };
    }

    fn classify(&mut self, ctx: &ActiveContext, samples: [u16; 4]) {
        for (corner, sample) in self.corners.iter_mut().zip(samples) {
            corner.settle(sample, &self.hysteresis);
        }
        let mask = self.assemble();
        self.history.push(mask);
        if mask == self.reported {
            return;
        }
        self.reported = mask;
        self.timers.arm(TAPE_SENSOR, self.config.holdoff_ms);
        log::info!("tape {mask:#06x}");
        if let Err(err) = ctx.post(self.target, Event::new(TAPE_SENSOR_TRIPPED, mask)) {
            log::error!("tape event dropped: {err}");
        }
    }
}

impl ActiveBehavior for TapeSensorService {
    fn name(&self) -> &'static str {
        "TapeSensorService"
    }

    fn on_event(&mut self, ctx: &mut ActiveContext, event: Event) -> Event {
        match event.signal {
            Signal::INIT => {
                self.phase = Phase::FlashOn;
                self.timers.arm(TAPE_SENSOR, self.config.startup_ms);
                Event::NONE
            }
            Signal::TIMEOUT if TAPE_SENSOR.matches(&event) => {
                self.step(ctx);
                Event::NONE
            }
            _ => event,
        }
    }
}
