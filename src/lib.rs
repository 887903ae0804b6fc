//! Rekha - grid-following navigation for a two-wheeled line-sensing robot
//!
//! The robot drives across a floor of dark tile markers, counts tiles by
//! watching a reflectance sensor, cancels heading drift at every marker and
//! probes between markers for a hidden tower.
//!
//! ## Layering
//!
//! ```text
//! search::SearchSequencer        fixed column sweep, found / not found
//!        │
//! motion::MotionController       advance / rotate / correct / recover / probe
//!        │                 │
//! sensing::TileBoundarySensor    navigation::NavigationState
//!        │
//! hardware traits                drive, light, touch, range, announcer, trigger
//! ```
//!
//! Hardware bindings live behind the traits in [`hardware`]. The [`sim`]
//! module provides a simulated robot on a tile grid, and [`hardware::mock`]
//! a scripted rig for deterministic tests.

pub mod config;
pub mod error;
pub mod hardware;
pub mod motion;
pub mod navigation;
pub mod search;
pub mod sensing;
pub mod sim;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{Error, Result};
pub use motion::{MotionController, ProbeOutcome};
pub use navigation::{GridPoint, Heading, NavigationState};
pub use search::{SearchOutcome, SearchSequencer};
pub use sensing::TileBoundarySensor;
