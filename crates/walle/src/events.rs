//! Robot event taxonomy, sensor masks and timer names.

use esf::{Event, Signal};

/// Tape corner(s) changed colour. Param: one nibble per corner, 1 = black.
pub const TAPE_SENSOR_TRIPPED: Signal = Signal::user(0);
/// Bumper contact changed. Param: `left << 4 | right`.
pub const BUMPER_TRIPPED: Signal = Signal::user(1);
/// At least one track-wire detector sees the wire. Param: `tw0 | tw1 << 4`.
pub const TRACK_WIRE_FOUND: Signal = Signal::user(2);
pub const TRACK_WIRE_LOST: Signal = Signal::user(3);
pub const BEACON_FOUND: Signal = Signal::user(4);
pub const BEACON_LOST: Signal = Signal::user(5);
pub const BALL_DROPPED: Signal = Signal::user(6);
pub const BALLS_LOADED: Signal = Signal::user(7);
pub const AMMO_PLUNGER_LOST: Signal = Signal::user(8);
pub const BUMP_RESOLVED: Signal = Signal::user(9);

/// Human-readable name for logs.
pub fn signal_name(signal: Signal) -> &'static str {
    match signal {
        Signal::NO_EVENT => "NO_EVENT",
        Signal::INIT => "INIT",
        Signal::ENTRY => "ENTRY",
        Signal::EXIT => "EXIT",
        Signal::TIMEOUT => "ES_TIMEOUT",
        TAPE_SENSOR_TRIPPED => "TAPE_SENSOR_TRIPPED",
        BUMPER_TRIPPED => "BUMPER_TRIPPED",
        TRACK_WIRE_FOUND => "TRACK_WIRE_FOUND",
        TRACK_WIRE_LOST => "TRACK_WIRE_LOST",
        BEACON_FOUND => "BEACON_FOUND",
        BEACON_LOST => "BEACON_LOST",
        BALL_DROPPED => "BALL_DROPPED",
        BALLS_LOADED => "BALLS_LOADED",
        AMMO_PLUNGER_LOST => "AMMO_PLUNGER_LOST",
        BUMP_RESOLVED => "BUMP_RESOLVED",
        _ => "UNKNOWN",
    }
}

pub fn describe(event: &Event) -> String {
    format!("{}({:#06x})", signal_name(event.signal), event.param)
}

/// Tape corner bits.
pub mod tape {
    pub const FRONT_RIGHT: u16 = 0x0001;
    pub const MID_RIGHT: u16 = 0x0010;
    pub const MID_LEFT: u16 = 0x0100;
    pub const FRONT_LEFT: u16 = 0x1000;

    /// Corners reading black in a tape mask.
    pub const fn tripped(mask: u16) -> u32 {
        (mask & (FRONT_RIGHT | MID_RIGHT | MID_LEFT | FRONT_LEFT)).count_ones()
    }
}

/// Bumper side bits.
pub mod bump {
    pub const LEFT: u16 = 0x10;
    pub const RIGHT: u16 = 0x01;
}

/// Track-wire detector bits.
pub mod wire {
    pub const DETECTOR_0: u16 = 0x01;
    pub const DETECTOR_1: u16 = 0x10;
}

/// Named timers. Service timers route to their service, the rest to the top
/// machine.
pub mod timers {
    use esf::TimerId;

    pub const TAPE_SENSOR: TimerId = TimerId(0);
    pub const BUMPER: TimerId = TimerId(1);
    pub const TRACK_WIRE: TimerId = TimerId(2);
    pub const TAPE_FOLLOW: TimerId = TimerId(3);
    pub const SCORE: TimerId = TimerId(4);
    pub const EX_RADAR: TimerId = TimerId(5);
    pub const DEPOSIT: TimerId = TimerId(6);
    pub const RECEIVE: TimerId = TimerId(7);
    pub const BUMP_RESPONSE: TimerId = TimerId(8);

    /// Timers owned by the machine tree, with their names.
    pub const MACHINE_TIMERS: [(TimerId, &str); 6] = [
        (TAPE_FOLLOW, "tape-follow"),
        (SCORE, "score"),
        (EX_RADAR, "exclusion-radar"),
        (DEPOSIT, "deposit"),
        (RECEIVE, "receive"),
        (BUMP_RESPONSE, "bump-response"),
    ];
}

