//! Search script
//!
//! ```text
//!  start ──approach legs──▶ column 0 ──probe × cells──┐
//!                                                      │ turn, advance spacing, turn
//!                           column 1 ◀──probe × cells──┘
//!                              ...   (turn sign flips every column)
//! ```
//!
//! The sequencer only issues discrete commands. Missed boundaries are absorbed
//! by the [`MotionController`]; the sequencer sees probe outcomes only.

use crate::config::SearchConfig;
use crate::error::Result;
use crate::hardware::{Cue, StartTrigger};
use crate::motion::{MotionController, ProbeOutcome};
use crate::navigation::GridPoint;

/// Terminal result of a search run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// A probe located the tower; `position` is the half-unit cell it
    /// stands in and `object_number` its label on the board
    Found { object_number: i64, position: GridPoint },
    /// Every column was probed without a contact or echo
    NotFound,
}

/// Runs the fixed search script on a [`MotionController`]: approach legs
/// first, then a snake through the search columns until a probe finds the
/// tower
pub struct SearchSequencer {
    controller: MotionController,
    trigger: Box<dyn StartTrigger>,
    config: SearchConfig,
}

impl SearchSequencer {
    pub fn new(
        controller: MotionController,
        trigger: Box<dyn StartTrigger>,
        config: SearchConfig,
    ) -> Self {
        Self {
            controller,
            trigger,
            config,
        }
    }

    pub fn controller(&self) -> &MotionController {
        &self.controller
    }

    /// Hand back the controller, e.g. to inspect its stats after a run
    pub fn into_controller(self) -> MotionController {
        self.controller
    }

    /// Wait for the start trigger, then run the whole script
    pub fn run(&mut self) -> Result<SearchOutcome> {
        log::info!("Waiting for start");
        self.trigger.wait_for_start()?;
        log::info!(
            "Search started at {} heading {}",
            self.controller.position(),
            self.controller.heading()
        );

        self.approach()?;
        let outcome = self.sweep_columns()?;

        match outcome {
            SearchOutcome::Found {
                object_number,
                position,
            } => {
                log::info!("Object {} found at {}", object_number, position);
                self.controller.announce(
                    &object_number.to_string(),
                    Cue::Speak(format!("Object {}", object_number)),
                )?;
            }
            SearchOutcome::NotFound => {
                log::info!("Search area exhausted without finding the tower");
                self.controller
                    .announce("not found", Cue::Speak("Not found".to_string()))?;
            }
        }
        Ok(outcome)
    }

    /// Drive the approach legs to the first search column
    fn approach(&mut self) -> Result<()> {
        let legs = self.config.approach.clone();
        let (speed, turn_speed) = {
            let motion = self.controller.motion_config();
            (motion.speed, motion.turn_speed)
        };

        for (index, leg) in legs.iter().enumerate() {
            log::debug!(
                "Approach leg {}: {} quarter turn(s), {} tile(s)",
                index + 1,
                leg.quarter_turns,
                leg.tiles
            );
            self.controller.rotate(leg.quarter_turns, turn_speed)?;
            for _ in 0..leg.tiles {
                self.controller.advance_one_tile(speed)?;
            }
        }
        Ok(())
    }

    /// Snake through the search columns probing every cell
    fn sweep_columns(&mut self) -> Result<SearchOutcome> {
        let (speed, probe_speed, turn_speed) = {
            let motion = self.controller.motion_config();
            (motion.speed, motion.probe_speed, motion.turn_speed)
        };
        let mut turn = self.config.first_column_turn;

        for column in 0..self.config.columns {
            log::info!("Searching column {} from {}", column + 1, self.controller.position());

            for _ in 0..self.config.cells_per_column {
                if let ProbeOutcome::Found { position } =
                    self.controller.probe_adjacent_tile(probe_speed)?
                {
                    let object_number = self.controller.numbering().object_number(position);
                    return Ok(SearchOutcome::Found {
                        object_number,
                        position,
                    });
                }
            }

            if column + 1 < self.config.columns {
                self.controller.rotate(turn, turn_speed)?;
                for _ in 0..self.config.column_spacing {
                    self.controller.advance_one_tile(speed)?;
                }
                self.controller.rotate(turn, turn_speed)?;
                turn = -turn;
            }
        }

        Ok(SearchOutcome::NotFound)
    }
}
