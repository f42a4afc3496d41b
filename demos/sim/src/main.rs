//! Host simulation of the ball-scoring robot.
//!
//! Runs the full service and machine stack against a `SimBoard` whose analog
//! channels carry seeded noise. A fixed script plays the field: a dispenser
//! bump, the track wire, the goal beacon and the goal tape line.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU16, Ordering};

use anyhow::Context;
use clap::Parser;
use esf::sync::{Arc, Mutex};
use esf::Event;
use hal::sim::SimBoard;
use hal::AdcPin;
use rand::{rngs::SmallRng, Rng, SeedableRng};
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use walle::config::PinMap;
use walle::events::{tape, BEACON_FOUND, BEACON_LOST};
use walle::machines::{ScoreState, TopState};
use walle::services::tape::CORNER_BITS;
use walle::{BotConfig, Robot, SharedBoard};

#[derive(Parser, Debug)]
#[command(author, version, about = "Runs the robot against a simulated field")]
struct Args {
    /// Number of clock steps to run.
    #[arg(long, default_value_t = 5000)]
    steps: u32,

    /// Milliseconds per step.
    #[arg(long = "step-ms", default_value_t = 5)]
    step_ms: u32,

    /// Seed for the analog noise.
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// TOML file overriding parts of the default robot configuration.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON log lines.
    #[arg(long)]
    json: bool,
}

/// Peak analog noise added to every reading.
const JITTER: i16 = 12;
const PRESSED: u16 = 100;
const RELEASED: u16 = 900;
const WIRE_NEAR: u16 = 100;
const WIRE_FAR: u16 = 950;
const TAPE_AMBIENT: u16 = 60;
const WHITE_CONTRAST: u16 = 900;
const BLACK_CONTRAST: u16 = 100;
/// About 9.1 V on the battery divider.
const BATTERY_RAW: u16 = 300;

#[derive(Debug, Clone, Copy)]
enum Cue {
    Bumper { left: bool, pressed: bool },
    Wire { detector: usize, near: bool },
    Tape(u16),
    Beacon(bool),
}

/// What happens on the field, by milliseconds since start.
const SCRIPT: &[(u32, Cue)] = &[
    (300, Cue::Bumper { left: true, pressed: true }),
    (400, Cue::Bumper { left: true, pressed: false }),
    (2500, Cue::Wire { detector: 1, near: true }),
    (2700, Cue::Wire { detector: 0, near: true }),
    (4000, Cue::Wire { detector: 0, near: false }),
    (4000, Cue::Wire { detector: 1, near: false }),
    (10500, Cue::Beacon(true)),
    (11000, Cue::Tape(tape::FRONT_LEFT | tape::FRONT_RIGHT)),
    (11100, Cue::Tape(0)),
    (11200, Cue::Beacon(false)),
    (24000, Cue::Beacon(true)),
];

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    setup_tracing(&args);

    let config = load_config(args.config.as_deref())?;
    let pins = config.pins.clone();
    let tape_under = Arc::new(AtomicU16::new(0));

    let board = Arc::new(Mutex::new(field_board(&pins, args.seed, Arc::clone(&tape_under))));
    let shared: SharedBoard = board.clone();
    let robot = Robot::new(shared, config);
    robot.start().context("robot failed to start")?;

    let mut script = SCRIPT.iter().peekable();
    let mut last = String::new();
    let mut motor_calls = 0usize;
    let mut now = 0u32;
    for _ in 0..args.steps {
        now += args.step_ms;
        while let Some((_, cue)) = script.next_if(|(at, _)| *at <= now) {
            info!(t = now, ?cue, "field");
            play(*cue, &robot, &board, &pins, &tape_under)?;
        }
        robot.step(args.step_ms)?;
        motor_calls += board.lock().take_calls().len();

        let states = machine_states(&robot);
        if states != last {
            info!(t = now, "{states}");
            last = states;
        }
    }

    let board = board.lock();
    info!(
        elapsed_ms = now,
        motor_calls,
        left_duty = board.duty(pins.left_pwm).unwrap_or(0),
        right_duty = board.duty(pins.right_pwm).unwrap_or(0),
        tape = robot.tape().dominant_mask(),
        "finished in {last}"
    );
    Ok(())
}

fn setup_tracing(args: &Args) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<BotConfig> {
    let Some(path) = path else {
        return Ok(BotConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

/// A board at rest: bumpers released, no wire nearby, white floor.
fn field_board(pins: &PinMap, seed: u64, tape_under: Arc<AtomicU16>) -> SimBoard {
    let mut board = SimBoard::new();
    board.set_analog(pins.bumper_left, RELEASED);
    board.set_analog(pins.bumper_right, RELEASED);
    for pin in pins.track_wire {
        board.set_analog(pin, WIRE_FAR);
    }
    for pin in pins.tape {
        board.set_analog(pin, TAPE_AMBIENT);
    }
    board.set_analog(pins.battery, BATTERY_RAW);

    let corners: Vec<(AdcPin, u16)> = pins.tape.into_iter().zip(CORNER_BITS).collect();
    let mut second_sample = [false; 4];
    let mut rng = SmallRng::seed_from_u64(seed);
    board.set_noise(move |pin, raw| {
        let level = match corners.iter().position(|(corner, _)| *corner == pin) {
            // Each cycle samples every corner twice; the second reading
            // carries the corner's contrast.
            Some(i) => {
                let second = second_sample[i];
                second_sample[i] = !second;
                let black = tape_under.load(Ordering::Relaxed) & corners[i].1 != 0;
                match (second, black) {
                    (false, _) => raw,
                    (true, false) => raw + WHITE_CONTRAST,
                    (true, true) => raw + BLACK_CONTRAST,
                }
            }
            None => raw,
        };
        level.saturating_add_signed(rng.gen_range(-JITTER..=JITTER))
    });
    board
}

fn play(
    cue: Cue,
    robot: &Robot,
    board: &Mutex<SimBoard>,
    pins: &PinMap,
    tape_under: &AtomicU16,
) -> anyhow::Result<()> {
    match cue {
        Cue::Bumper { left, pressed } => {
            let pin = if left { pins.bumper_left } else { pins.bumper_right };
            let level = if pressed { PRESSED } else { RELEASED };
            board.lock().set_analog(pin, level);
        }
        Cue::Wire { detector, near } => {
            let level = if near { WIRE_NEAR } else { WIRE_FAR };
            board.lock().set_analog(pins.track_wire[detector], level);
        }
        Cue::Tape(mask) => tape_under.store(mask, Ordering::Relaxed),
        Cue::Beacon(seen) => {
            let signal = if seen { BEACON_FOUND } else { BEACON_LOST };
            robot.post_top(Event::empty(signal))?;
        }
    }
    Ok(())
}

fn machine_states(robot: &Robot) -> String {
    robot.inspect(|top| {
        let machine = top.machine();
        match top.state() {
            TopState::Init => "Init".to_string(),
            TopState::Receiving => format!("Receiving/{:?}", machine.receive().state()),
            TopState::Scoring => {
                let score = machine.score();
                match score.state() {
                    ScoreState::ExclusionRadar => {
                        format!("Scoring/ExclusionRadar/{:?}", score.machine().radar().state())
                    }
                    ScoreState::BumpResolving => format!(
                        "Scoring/BumpResolving/{:?}",
                        score.machine().bump_response().state()
                    ),
                    state => format!("Scoring/{state:?}"),
                }
            }
        }
    })
}
