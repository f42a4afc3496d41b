//! The robot's state machines.
//!
//! Each machine is a struct holding its own flags and, for composing
//! machines, its children as [`Hsm`](esf::Hsm) fields. All of them run
//! against the shared [`Io`](crate::io::Io) context.

pub mod bump_response;
pub mod deposit;
pub mod exclusion_radar;
pub mod receive;
pub mod score;
pub mod tape_follow;
pub mod top;

pub use bump_response::{BumpResponse, BumpState};
pub use deposit::{DepositBalls, DepositState};
pub use exclusion_radar::{ExclusionRadar, RadarState};
pub use receive::{Receive, ReceiveState};
pub use score::{Score, ScoreState};
pub use tape_follow::{TapeFollow, TapeState};
pub use top::{Top, TopState};
