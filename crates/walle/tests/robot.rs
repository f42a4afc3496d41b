use esf::sync::{Arc, Mutex};
use esf::Event;
use hal::sim::SimBoard;
use hal::{AdcPin, PwmPin};
use once_cell::sync::Lazy;

use walle::config::{PinMap, TapeConfig};
use walle::events::{timers::RECEIVE, BALLS_LOADED, BEACON_FOUND};
use walle::machines::{ReceiveState, ScoreState, TopState};
use walle::motors::Compensation;
use walle::{BotConfig, Robot, SharedBoard};

static PINS: Lazy<PinMap> = Lazy::new(PinMap::default);

/// Reads any steady tape level as white, so only bumps and beacons steer.
fn config() -> BotConfig {
    BotConfig::builder()
        .compensation(Compensation::Disabled)
        .tape(TapeConfig {
            white_threshold: -1,
            black_threshold: -100,
            ..TapeConfig::default()
        })
        .build()
}

fn quiet_board() -> Arc<Mutex<SimBoard>> {
    let mut board = SimBoard::new();
    board.set_analog(PINS.bumper_left, 900);
    board.set_analog(PINS.bumper_right, 900);
    for pin in PINS.track_wire {
        board.set_analog(pin, 950);
    }
    Arc::new(Mutex::new(board))
}

fn robot() -> (Robot, Arc<Mutex<SimBoard>>) {
    let board = quiet_board();
    let shared: SharedBoard = board.clone();
    let robot = Robot::new(shared, config());
    robot.start().unwrap();
    (robot, board)
}

fn set(board: &Arc<Mutex<SimBoard>>, pin: AdcPin, level: u16) {
    board.lock().set_analog(pin, level);
}

fn duty(board: &Arc<Mutex<SimBoard>>, pin: PwmPin) -> Option<u16> {
    board.lock().duty(pin)
}

#[test]
fn starts_by_approaching_the_dispenser() {
    let (robot, board) = robot();

    assert_eq!(robot.top_state(), TopState::Receiving);
    assert_eq!(
        robot.inspect(|top| top.machine().receive().state()),
        ReceiveState::Approach
    );
    assert_eq!(duty(&board, PINS.left_pwm), Some(300));
    assert_eq!(duty(&board, PINS.right_pwm), Some(300));
}

#[test]
fn bumper_contact_reaches_the_receive_machine() {
    let (robot, board) = robot();
    robot.step(25).unwrap();

    set(&board, PINS.bumper_left, 100);
    robot.step(25).unwrap();

    assert_eq!(robot.bumper().mask(), 0x10);
    assert_eq!(
        robot.inspect(|top| top.machine().receive().state()),
        ReceiveState::BackUp
    );
    assert_eq!(duty(&board, PINS.left_pwm), Some(600));
}

#[test]
fn full_load_via_track_wire() {
    let (robot, board) = robot();
    robot.step(25).unwrap();
    set(&board, PINS.bumper_right, 100);
    robot.step(25).unwrap();
    set(&board, PINS.bumper_right, 900);

    robot.step(1200).unwrap();
    robot.step(800).unwrap();
    assert_eq!(
        robot.inspect(|top| top.machine().receive().state()),
        ReceiveState::DriveIn
    );

    set(&board, PINS.track_wire[1], 100);
    robot.step(20).unwrap();
    assert_eq!(
        robot.inspect(|top| top.machine().receive().state()),
        ReceiveState::Realign
    );

    set(&board, PINS.track_wire[0], 100);
    robot.step(20).unwrap();
    assert_eq!(
        robot.inspect(|top| top.machine().receive().state()),
        ReceiveState::Ram1
    );

    for millis in [2000, 150, 2000, 150, 2000] {
        robot.step(millis).unwrap();
    }
    assert_eq!(robot.top_state(), TopState::Scoring);
}

#[test]
fn approach_timeout_retries() {
    let (robot, _board) = robot();
    robot.step(1500).unwrap();

    assert_eq!(robot.top_state(), TopState::Receiving);
    assert_eq!(
        robot.inspect(|top| top.machine().receive().state()),
        ReceiveState::Approach
    );
    assert_eq!(robot.timers().remaining(RECEIVE), Some(1500));
}

#[test]
fn beacon_leads_into_the_goal_zone() {
    let (robot, _board) = robot();
    robot.post_top(Event::empty(BALLS_LOADED)).unwrap();
    assert_eq!(robot.top_state(), TopState::Scoring);

    robot.step(800).unwrap();
    assert_eq!(
        robot.inspect(|top| top.machine().score().state()),
        ScoreState::Radar
    );

    robot.post_top(Event::empty(BEACON_FOUND)).unwrap();
    assert_eq!(
        robot.inspect(|top| top.machine().score().state()),
        ScoreState::ZoneIn
    );
    assert_eq!(robot.tape().mask(), 0);
}
