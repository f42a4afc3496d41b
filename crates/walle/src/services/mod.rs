//! Event derivation services.
//!
//! Each service samples analog channels on its own timer and posts a
//! discrete event to the top machine only when the derived bitmask changes.

pub mod bumper;
pub mod contact;
pub mod tape;
pub mod track_wire;

pub use bumper::BumperService;
pub use contact::{ContactPair, DualThreshold};
pub use tape::{Hysteresis, MaskHistory, Shade, TapeCorner, TapeSensorService};
pub use track_wire::TrackWireService;
