//! Tower probe between markers
//!
//! Towers stand half way between two markers. A probe first sweeps the
//! ultrasonic sensor across the cell ahead, then creeps forward half a tile at
//! a time so the bumper or a close echo stops the robot before the next
//! marker.

use super::controller::{Arrival, MotionController};
use crate::error::Result;
use crate::navigation::GridPoint;

/// Result of probing the cell ahead
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Tower detected; `position` is the half-unit cell it occupies
    Found { position: GridPoint },
    /// No tower: the robot now stands on the next marker
    Clear,
}

impl MotionController {
    /// Probe the cell ahead and, if it is empty, move onto the next marker.
    pub fn probe_adjacent_tile(&mut self, speed: f32) -> Result<ProbeOutcome> {
        if self.config.sweep_arc_deg > 0.0 && self.sweep_for_tower()? {
            let position = self.state.position().offset(self.state.heading(), 1);
            log::info!("Tower detected by ranging at {}", position);
            return Ok(ProbeOutcome::Found { position });
        }

        let profile = self.sensing.probe.clone();
        loop {
            self.state.step_half();
            let (arrival, elapsed) = match self.drive_to_boundary(speed, &profile, true) {
                Ok(outcome) => outcome,
                Err(e) => {
                    self.state.unstep_half();
                    return Err(e);
                }
            };
            match arrival {
                Arrival::Contact => {
                    let position = self.state.position();
                    log::info!("Tower contact at {}", position);
                    self.missed = 0;
                    return Ok(ProbeOutcome::Found { position });
                }
                Arrival::Reached => {
                    self.state.step_half();
                    self.tile_reached()?;
                    return Ok(ProbeOutcome::Clear);
                }
                Arrival::TimedOut => {
                    self.state.unstep_half();
                    self.recover(speed, elapsed)?;
                }
            }
        }
    }

    /// Step-pivot through `±sweep_arc_deg` reading the ranger after every
    /// step. Always ends facing the starting heading.
    fn sweep_for_tower(&mut self) -> Result<bool> {
        let step = self.config.sweep_step_deg;
        let steps = (self.config.sweep_arc_deg / step).round().max(1.0) as u32;
        let speed = self.config.turn_speed;

        if self.range_detects()? {
            return Ok(true);
        }

        for direction in [1.0_f32, -1.0] {
            let mut turned = 0;
            let mut found = false;
            while turned < steps && !found {
                self.pivot_robot_degrees(direction * step, speed)?;
                turned += 1;
                found = self.range_detects()?;
            }

            self.pivot_robot_degrees(-direction * step * turned as f32, speed)?;
            if found {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn range_detects(&mut self) -> Result<bool> {
        let distance = self.range.distance_cm()?;
        log::trace!("Sweep echo {:.1} cm", distance);
        Ok(distance < self.config.detect_distance_cm)
    }
}
