use esf::Event;
use hal::sim::HalCall;
use hal::AdcPin;

use super::ServiceRig;
use crate::config::{ContactConfig, PinMap, Polarity, TapeConfig};
use crate::events::{
    timers::{BUMPER, TAPE_SENSOR, TRACK_WIRE},
    BUMPER_TRIPPED, TAPE_SENSOR_TRIPPED, TRACK_WIRE_FOUND, TRACK_WIRE_LOST,
};
use crate::services::{
    BumperService, ContactPair, DualThreshold, Hysteresis, MaskHistory, Shade, TapeCorner,
    TapeSensorService, TrackWireService,
};

#[test]
fn tape_hysteresis_holds_between_thresholds() {
    let hyst = Hysteresis::default();
    assert_eq!(hyst.classify(850, Shade::Black), Shade::White);
    assert_eq!(hyst.classify(350, Shade::White), Shade::Black);
    assert_eq!(hyst.classify(600, Shade::White), Shade::White);
    assert_eq!(hyst.classify(600, Shade::Black), Shade::Black);
}

#[test]
fn tape_corner_settles_on_the_flash_difference() {
    let hyst = Hysteresis::default();
    let mut corner = TapeCorner {
        sample1: 100,
        ..TapeCorner::default()
    };

    assert_eq!(corner.settle(150, &hyst), Shade::Black);
    assert_eq!(corner.diff, 50);

    corner.sample1 = 100;
    assert_eq!(corner.settle(700, &hyst), Shade::Black);

    corner.sample1 = 0;
    assert_eq!(corner.settle(950, &hyst), Shade::White);
}

#[test]
fn mask_history_reports_the_most_frequent_mask() {
    let mut history = MaskHistory::default();
    for _ in 0..6 {
        history.push(0x0011);
    }
    history.push(0x1000);
    assert_eq!(history.dominant(), 0x0011);

    let mut tied = MaskHistory::default();
    for _ in 0..5 {
        tied.push(0x0001);
    }
    assert_eq!(tied.dominant(), 0x0001);
}

fn tape_rig() -> ServiceRig<TapeSensorService> {
    ServiceRig::new(TAPE_SENSOR, |board, timers, target| {
        let pins = PinMap::default();
        TapeSensorService::new(
            board,
            timers,
            pins.tape,
            pins.tape_flash,
            TapeConfig::default(),
            target,
        )
    })
}

/// Queues one flash-on/flash-off sample pair per corner.
fn script_cycle(rig: &ServiceRig<TapeSensorService>, black: [bool; 4]) {
    let pins = PinMap::default();
    let mut board = rig.board.lock();
    for (pin, black) in pins.tape.into_iter().zip(black) {
        let pair = if black { [500, 600] } else { [0, 900] };
        board.script_analog(pin, pair);
    }
}

/// Startup delay plus the three phase steps up to the second sample.
fn run_first_cycle(rig: &ServiceRig<TapeSensorService>) {
    rig.tick(500);
    for _ in 0..3 {
        rig.tick(2);
    }
}

#[test]
fn tape_service_posts_changed_mask() {
    let rig = tape_rig();
    script_cycle(&rig, [true, false, false, false]);
    rig.start();
    run_first_cycle(&rig);

    assert_eq!(
        rig.sink.events(),
        vec![Event::new(TAPE_SENSOR_TRIPPED, 0x1000)]
    );
    assert_eq!(rig.service.lock().mask(), 0x1000);
    assert_eq!(rig.remaining(TAPE_SENSOR), Some(20));

    let flash = PinMap::default().tape_flash;
    let calls = rig.board.lock().take_calls();
    assert_eq!(calls, vec![HalCall::Set(flash), HalCall::Clear(flash)]);
}

#[test]
fn tape_service_is_silent_while_the_mask_holds() {
    let rig = tape_rig();
    script_cycle(&rig, [false; 4]);
    script_cycle(&rig, [false; 4]);
    rig.start();
    run_first_cycle(&rig);
    for _ in 0..4 {
        rig.tick(2);
    }

    assert!(rig.sink.events().is_empty());
    assert_eq!(rig.remaining(TAPE_SENSOR), Some(2));
    assert_eq!(rig.board.lock().reads(AdcPin(13)), 4);
}

#[test]
fn tape_service_waits_for_a_fresh_sample() {
    let rig = tape_rig();
    rig.board.lock().set_sample_ready(false);
    rig.start();
    rig.tick(500);
    rig.tick(2);
    rig.tick(2);

    assert_eq!(rig.board.lock().reads(AdcPin(13)), 0);
    assert!(rig.sink.events().is_empty());
}

#[test]
fn dual_threshold_polarities() {
    let low = DualThreshold {
        high: 800,
        low: 200,
        polarity: Polarity::ActiveLow,
    };
    assert!(low.classify(100, false));
    assert!(!low.classify(900, true));
    assert!(low.classify(500, true));
    assert!(!low.classify(500, false));

    let high = DualThreshold {
        polarity: Polarity::ActiveHigh,
        ..low
    };
    assert!(high.classify(900, false));
    assert!(!high.classify(100, true));
    assert!(high.classify(500, true));
}

#[test]
fn contact_pair_reports_only_changes() {
    let threshold = DualThreshold::from_config(&ContactConfig::bumper());
    let mut pair = ContactPair::new(threshold, [4, 0]);

    assert_eq!(pair.update([900, 900]), None);
    assert_eq!(pair.update([100, 900]), Some(0x10));
    assert_eq!(pair.update([100, 900]), None);
    assert_eq!(pair.update([100, 100]), Some(0x11));
    assert_eq!(pair.update([500, 500]), None);
    assert_eq!(pair.update([900, 900]), Some(0));
}

const LEFT_BUMPER: AdcPin = AdcPin(3);
const RIGHT_BUMPER: AdcPin = AdcPin(4);

fn bumper_rig() -> ServiceRig<BumperService> {
    let rig = ServiceRig::new(BUMPER, |board, timers, target| {
        BumperService::new(
            board,
            timers,
            LEFT_BUMPER,
            RIGHT_BUMPER,
            ContactConfig::bumper(),
            target,
        )
    });
    {
        let mut board = rig.board.lock();
        board.set_analog(LEFT_BUMPER, 900);
        board.set_analog(RIGHT_BUMPER, 900);
    }
    rig
}

#[test]
fn bumper_posts_the_hit_side() {
    let rig = bumper_rig();
    rig.start();
    rig.tick(25);
    assert!(rig.sink.events().is_empty());

    rig.board.lock().set_analog(LEFT_BUMPER, 100);
    rig.tick(25);

    assert_eq!(rig.sink.events(), vec![Event::new(BUMPER_TRIPPED, 0x10)]);
    assert_eq!(rig.service.lock().mask(), 0x10);
    assert_eq!(rig.remaining(BUMPER), Some(500));
}

#[test]
fn bumper_cooldown_suppresses_polling() {
    let rig = bumper_rig();
    rig.board.lock().set_analog(RIGHT_BUMPER, 50);
    rig.start();
    rig.tick(25);
    assert_eq!(rig.board.lock().reads(RIGHT_BUMPER), 1);

    rig.board.lock().set_analog(RIGHT_BUMPER, 900);
    for _ in 0..19 {
        rig.tick(25);
    }
    assert_eq!(rig.board.lock().reads(RIGHT_BUMPER), 1);

    rig.tick(25);
    assert_eq!(rig.board.lock().reads(RIGHT_BUMPER), 2);
    assert_eq!(rig.sink.events(), vec![Event::new(BUMPER_TRIPPED, 0x01)]);
}

#[test]
fn bumper_release_is_not_posted() {
    let rig = bumper_rig();
    rig.board.lock().set_analog(LEFT_BUMPER, 100);
    rig.start();
    rig.tick(25);

    rig.board.lock().set_analog(LEFT_BUMPER, 900);
    rig.tick(500);

    assert_eq!(rig.sink.events().len(), 1);
    assert_eq!(rig.service.lock().mask(), 0);
    assert_eq!(rig.remaining(BUMPER), Some(500));
}

#[test]
fn bumper_holds_inside_the_band() {
    let rig = bumper_rig();
    rig.board.lock().set_analog(LEFT_BUMPER, 100);
    rig.start();
    rig.tick(25);

    rig.board.lock().set_analog(LEFT_BUMPER, 500);
    rig.tick(500);
    rig.tick(25);

    assert_eq!(rig.service.lock().mask(), 0x10);
    assert_eq!(rig.sink.events().len(), 1);
}

const WIRE_PINS: [AdcPin; 2] = [AdcPin(5), AdcPin(6)];

#[test]
fn track_wire_reports_found_and_lost() {
    let rig = ServiceRig::new(TRACK_WIRE, |board, timers, target| {
        TrackWireService::new(board, timers, WIRE_PINS, ContactConfig::track_wire(), target)
    });
    {
        let mut board = rig.board.lock();
        board.set_analog(WIRE_PINS[0], 100);
        board.set_analog(WIRE_PINS[1], 950);
    }
    rig.start();
    rig.tick(500);

    rig.board.lock().set_analog(WIRE_PINS[1], 100);
    rig.tick(20);

    {
        let mut board = rig.board.lock();
        board.set_analog(WIRE_PINS[0], 950);
        board.set_analog(WIRE_PINS[1], 950);
    }
    rig.tick(20);

    assert_eq!(
        rig.sink.events(),
        vec![
            Event::new(TRACK_WIRE_FOUND, 0x01),
            Event::new(TRACK_WIRE_FOUND, 0x11),
            Event::empty(TRACK_WIRE_LOST),
        ]
    );
    assert_eq!(rig.service.lock().mask(), 0);
}

