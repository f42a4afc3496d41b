//! # walle
//!
//! Behavior core of the ball-scoring robot. Three sensor services turn noisy
//! analog readings into discrete events; a tree of hierarchical state
//! machines turns those events into motor and gate commands.
//!
//! ## Module Overview
//! - [`events`]   – Robot signals, sensor bitmasks and timer names.
//! - [`config`]   – Pin map, thresholds and bus priorities.
//! - [`motors`]   – Wheel primitives and composite maneuvers.
//! - [`io`]       – The context every machine drives.
//! - [`services`] – Tape, bumper and track-wire event services.
//! - [`machines`] – Top, Receive, Score and their sub-machines.
//! - [`robot`]    – Wiring of the services and machines onto one bus.

pub mod config;
pub mod error;
pub mod events;
pub mod io;
pub mod machines;
pub mod motors;
pub mod robot;
pub mod services;

pub use config::BotConfig;
pub use error::BotError;
pub use io::{Gate, Io, SharedBoard};
pub use robot::Robot;

#[cfg(test)]
mod tests;
