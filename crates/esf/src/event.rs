//! Event and signal primitives.
//!
//! Every event is a small `Copy` record: a [`Signal`] identifying its kind and
//! a 16-bit parameter whose meaning depends on the signal (a sensor bitmask,
//! the identity of an expired timer, or nothing at all).

use core::fmt;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Identifier for an event kind.
///
/// Values below [`Signal::USER`] are reserved for the framework; applications
/// number their own signals upward from `USER`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Signal(pub u16);

impl Signal {
    /// Nothing to do. Returned by a machine that consumed its event.
    pub const NO_EVENT: Signal = Signal(0);
    /// Forces the initial pseudo-state to take its first transition.
    pub const INIT: Signal = Signal(1);
    /// Delivered to a state right after it becomes current.
    pub const ENTRY: Signal = Signal(2);
    /// Delivered to a state right before it stops being current.
    pub const EXIT: Signal = Signal(3);
    /// A named timer expired; the parameter carries its [`TimerId`](crate::TimerId).
    pub const TIMEOUT: Signal = Signal(4);
    /// First signal available to applications.
    pub const USER: Signal = Signal(16);

    /// Pseudo-signals drive the transition protocol and are never queued from
    /// outside a machine.
    pub const fn is_pseudo(self) -> bool {
        matches!(self.0, 0..=3)
    }

    /// Offset from [`Signal::USER`], for application signal tables.
    pub const fn user(offset: u16) -> Signal {
        Signal(Self::USER.0 + offset)
    }
}

impl From<u16> for Signal {
    #[inline]
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::NO_EVENT => f.write_str("NO_EVENT"),
            Self::INIT => f.write_str("INIT"),
            Self::ENTRY => f.write_str("ENTRY"),
            Self::EXIT => f.write_str("EXIT"),
            Self::TIMEOUT => f.write_str("ES_TIMEOUT"),
            Signal(raw) => write!(f, "SIG({raw:#06x})"),
        }
    }
}

/// An event travelling through the bus and the state machine tree.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub signal: Signal,
    pub param: u16,
}

impl Event {
    pub const NONE: Event = Event::empty(Signal::NO_EVENT);
    pub const INIT: Event = Event::empty(Signal::INIT);
    pub const ENTRY: Event = Event::empty(Signal::ENTRY);
    pub const EXIT: Event = Event::empty(Signal::EXIT);

    pub const fn new(signal: Signal, param: u16) -> Self {
        Self { signal, param }
    }

    pub const fn empty(signal: Signal) -> Self {
        Self::new(signal, 0)
    }

    pub const fn signal(&self) -> Signal {
        self.signal
    }

    /// `true` for the `NO_EVENT` sentinel.
    pub fn is_none(&self) -> bool {
        self.signal == Signal::NO_EVENT
    }

    pub fn is(&self, signal: Signal) -> bool {
        self.signal == signal
    }
}

impl Default for Event {
    fn default() -> Self {
        Self::NONE
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:#06x})", self.signal, self.param)
    }
}
