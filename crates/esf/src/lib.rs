//! # esf
//!
//! Events-and-services framework for cooperative, run-to-completion robot
//! firmware. Services and state machines own a priority slot on a shared
//! [`Bus`](kernel::Bus); one event is dispatched at a time and fully processed
//! before the next is considered.
//!
//! ## Module Overview
//! - [`event`]  – Signals and the `{signal, param}` event record.
//! - [`hsm`]    – Generic table-driven hierarchical state machine engine.
//! - [`active`] – Active objects: a behavior plus its bounded event queue.
//! - [`kernel`] – Priority-ordered multi-queue bus and scheduler.
//! - [`time`]   – Named one-shot millisecond timers.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod active;
pub mod event;
pub mod hsm;
pub mod kernel;
pub mod sync;
pub mod time;

pub use active::{
    new_active_object, ActiveBehavior, ActiveContext, ActiveObjectRef, Priority, Shared,
};
pub use event::{Event, Signal};
pub use hsm::{Hsm, HsmBehavior, HsmError, Machine, Outcome, Rule, Trigger};
pub use kernel::{Bus, Kernel, KernelBuilder, KernelConfig, KernelError};
pub use time::{Expired, TimeEventError, TimerId, TimerWheel, Timers};

#[cfg(test)]
mod tests;
