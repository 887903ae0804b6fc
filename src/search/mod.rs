//! Fixed column-sweep search for the tower

mod sequencer;

pub use sequencer::{SearchOutcome, SearchSequencer};
