//! Missed-boundary recovery
//!
//! When a boundary does not show up in time the robot has most likely veered
//! off the marker line. It backs up onto the marker it left, swings out to
//! one side and back, and retries. Successive misses alternate sides with a
//! growing swing:
//!
//! | Attempt | Pivot (quarter turns) |
//! |---------|-----------------------|
//! | 1 | -1 (clockwise) |
//! | 2 | +1 |
//! | 3 | -2 |
//! | 4 | +2 |

use super::controller::MotionController;
use crate::error::{Error, Result};
use std::time::Duration;

/// Signed recovery pivot in wheel degrees for the given attempt (1-based).
///
/// `calibration × 90 × ceil(attempt / 2) × (-1)^attempt`. Positive is
/// anticlockwise.
pub fn recovery_pivot_degrees(calibration: f32, attempt: u32) -> f32 {
    let magnitude = calibration * 90.0 * attempt.div_ceil(2) as f32;
    if attempt % 2 == 0 { magnitude } else { -magnitude }
}

impl MotionController {
    /// Handle a timed-out advance. The caller has already reverted the
    /// optimistic position update.
    pub(super) fn recover(&mut self, speed: f32, travelled: Duration) -> Result<()> {
        self.stats.timeouts += 1;
        log::warn!(
            "No boundary after {:?} heading {} from {}",
            travelled,
            self.state.heading(),
            self.state.position()
        );

        if !self.move_back_to_previous_tile(speed, travelled)? {
            log::debug!("Recovering from {} without the previous marker", self.state.position());
        }

        if let Some(max) = self.config.max_recovery_attempts {
            if self.missed >= max {
                let attempts = self.missed;
                self.missed = 0;
                log::error!(
                    "Giving up on tile ahead of {} after {} recovery attempt(s)",
                    self.state.position(),
                    attempts
                );
                return Err(Error::TileNotReached { attempts });
            }
        }

        self.missed += 1;
        self.stats.recoveries += 1;
        self.stats.peak_missed_attempts = self.stats.peak_missed_attempts.max(self.missed);

        let wheel_degrees = recovery_pivot_degrees(self.config.recovery_calibration, self.missed);
        log::warn!(
            "Recovery attempt {}: pivot {:.1} wheel degrees",
            self.missed,
            wheel_degrees
        );

        let turn_speed = self.config.turn_speed;
        self.pivot_wheel_degrees(wheel_degrees, turn_speed)?;
        self.pivot_wheel_degrees(-wheel_degrees, turn_speed)?;
        Ok(())
    }
}
