//! Heading correction on a marker
//!
//! With the light sensor on a marker, the robot pivots anticlockwise until the
//! sensor leaves the marker and times how long that took, returns, and does
//! the same clockwise. A robot aligned with the marker line sees equal times;
//! any difference is heading drift. Half the difference, damped through
//! `atan`, is applied as a final pivot.

use super::controller::{Arrival, MotionController, Until};
use crate::error::Result;

/// Damped correction in robot degrees for a raw deviation in robot degrees.
///
/// `gain × atan(raw)`, computed in radians. Small deviations pass through
/// scaled by `gain`; large (likely bogus) ones are compressed.
pub fn damp_correction(raw_degrees: f32, gain: f32) -> f32 {
    gain * raw_degrees.to_radians().atan().to_degrees()
}

impl MotionController {
    /// Re-centre the heading on the marker under the light sensor.
    ///
    /// Returns the correction applied, in robot degrees (positive =
    /// anticlockwise).
    pub fn correct_heading(&mut self) -> Result<f32> {
        let speed = self.config.correction_speed;

        let left = self.measure_deviation(1.0)?;
        self.pivot_robot_degrees(-left, speed)?;

        let right = self.measure_deviation(-1.0)?;
        self.pivot_robot_degrees(right, speed)?;

        let raw = (left - right) / 2.0;
        let correction = damp_correction(raw, self.config.correction_gain);
        log::debug!(
            "Heading correction: left {:.1}, right {:.1}, applying {:.2} deg",
            left,
            right,
            correction
        );

        self.pivot_robot_degrees(correction, speed)?;
        self.stats.corrections += 1;
        Ok(correction)
    }

    /// Pivot in `direction` (+1 anticlockwise, -1 clockwise) with a
    /// dark-primed buffer until the sensor is back on the floor. Returns the
    /// angle turned, in robot degrees, estimated from the pivot time.
    fn measure_deviation(&mut self, direction: f32) -> Result<f32> {
        let profile = self.sensing.correction.clone();
        self.sensor.start_reading(
            profile.samples,
            self.sensing.dark_prime,
            profile.interval(),
            profile.warmup(),
        )?;

        let speed = self.config.correction_speed * direction;
        let limit = self.config.correction_timeout();
        let result = match self.drive.run(-speed, speed) {
            Ok(()) => self.wait_until(Until::Floor, limit, false),
            Err(e) => Err(e),
        };
        let (arrival, elapsed) = self.halt(result)?;

        if arrival != Arrival::Reached {
            log::warn!(
                "Marker edge not found within {:?} pivoting {}",
                limit,
                if direction > 0.0 { "left" } else { "right" }
            );
        }
        Ok(self.config.turn_rate_deg_per_sec * elapsed.as_secs_f32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_damping_is_odd_and_bounded() {
        assert_eq!(damp_correction(0.0, 0.75), 0.0);
        assert_relative_eq!(
            damp_correction(10.0, 0.75),
            -damp_correction(-10.0, 0.75),
            epsilon = 1e-6
        );
        // atan never exceeds 90 degrees
        assert!(damp_correction(10_000.0, 0.75) < 0.75 * 90.0);
    }

    #[test]
    fn test_damping_is_near_linear_for_small_angles() {
        assert_relative_eq!(damp_correction(2.0, 0.75), 1.5, epsilon = 0.01);
        assert_relative_eq!(damp_correction(-4.0, 1.0), -4.0, epsilon = 0.05);
    }

    #[test]
    fn test_positive_deviation_turns_anticlockwise() {
        assert!(damp_correction(5.0, 0.75) > 0.0);
    }
}
