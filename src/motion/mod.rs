//! Tile-relative motion
//!
//! [`MotionController`] turns discrete grid commands (advance, rotate, probe)
//! into drive actuation and boundary polling, keeps the
//! [`NavigationState`](crate::navigation::NavigationState) in step with the
//! robot and absorbs missed boundaries with escalating recovery pivots.
//!
//! ```text
//! advance:  Advancing ──boundary──▶ TileReached ──▶ Correcting ──▶ Done
//!               │
//!            timeout
//!               ▼
//!           Recovering ──(back up, pivot, un-pivot)──▶ Advancing
//! ```

mod controller;
mod correction;
mod probe;
mod recovery;

pub use controller::{MotionController, MotionStats};
pub use correction::damp_correction;
pub use probe::ProbeOutcome;
pub use recovery::recovery_pivot_degrees;
