//! Discrete grid model: position, heading and board numbering

mod heading;
mod numbering;
mod state;

pub use heading::Heading;
pub use numbering::GridNumbering;
pub use state::{GridPoint, NavigationState};
