//! Kinematic robot on a tile grid
//!
//! Units are tiles and radians. Dark square markers sit on every integer grid
//! point; towers are cylinders between markers. The pose is the axle centre,
//! the light sensor and bumper sit `sensor_offset` ahead of it.

use super::noise::NoiseGenerator;
use crate::config::SimulationConfig;
use crate::navigation::{GridPoint, Heading};
use std::f32::consts::FRAC_PI_2;
use std::time::{Duration, Instant};

/// Integration step for continuous runs
const MAX_STEP: Duration = Duration::from_millis(5);

/// Axle pose in tiles, heading anticlockwise from +x
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub x: f32,
    pub y: f32,
    pub theta: f32,
}

pub struct SimWorld {
    config: SimulationConfig,
    pose: Pose,
    /// Commanded wheel speeds (percent)
    left: f32,
    right: f32,
    last_update: Instant,
    noise: NoiseGenerator,
}

impl SimWorld {
    /// Place the robot facing `heading` with its light sensor `start_depth`
    /// inside the near edge of the marker at `position`, where an advance
    /// onto that marker would have stopped
    pub fn new(config: SimulationConfig, position: GridPoint, heading: Heading) -> Self {
        let theta = heading.index() as f32 * FRAC_PI_2;
        let back = config.sensor_offset + config.marker_half_size - config.start_depth;
        let pose = Pose {
            x: position.x() as f32 - back * theta.cos(),
            y: position.y() as f32 - back * theta.sin(),
            theta,
        };
        let noise = NoiseGenerator::new(config.seed);

        Self {
            config,
            pose,
            left: 0.0,
            right: 0.0,
            last_update: Instant::now(),
            noise,
        }
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Change the continuous wheel speeds (percent)
    pub fn set_wheels(&mut self, left: f32, right: f32) {
        self.sync();
        self.left = left;
        self.right = right;
    }

    /// Roll each wheel a signed distance in tiles, as an encoder-controlled
    /// move would. Continuous motion stops.
    pub fn move_wheels(&mut self, left_tiles: f32, right_tiles: f32) {
        self.sync();
        self.left = 0.0;
        self.right = 0.0;
        let forward = (left_tiles + right_tiles) / 2.0;
        let turn = (right_tiles - left_tiles) / self.config.track_width;
        self.integrate(forward, turn, 1.0);
    }

    /// Bring the pose up to the current wall-clock time
    pub fn sync(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update);
        self.last_update = now;
        self.step(elapsed);
    }

    /// Advance the simulation by `dt` at the current wheel speeds
    pub fn step(&mut self, dt: Duration) {
        if self.left == 0.0 && self.right == 0.0 {
            return;
        }
        let left = self.wheel_speed(self.left);
        let right = self.wheel_speed(self.right) * (1.0 - self.config.wheel_bias);
        let linear = (left + right) / 2.0;
        let angular = (right - left) / self.config.track_width;

        let mut remaining = dt;
        while !remaining.is_zero() {
            let slice = remaining.min(MAX_STEP);
            remaining -= slice;
            self.integrate(linear, angular, slice.as_secs_f32());
        }
    }

    /// Wheel surface speed in tiles per second
    fn wheel_speed(&self, percent: f32) -> f32 {
        percent.clamp(-100.0, 100.0) / 100.0 * self.config.max_wheel_speed
    }

    fn integrate(&mut self, linear: f32, angular: f32, dt: f32) {
        let Pose { x, y, theta } = self.pose;
        let new_theta = theta + angular * dt;
        let (new_x, new_y) = if angular.abs() < 1e-6 {
            (x + linear * theta.cos() * dt, y + linear * theta.sin() * dt)
        } else {
            let r = linear / angular;
            (
                x + r * (new_theta.sin() - theta.sin()),
                y + r * (theta.cos() - new_theta.cos()),
            )
        };
        self.pose = Pose {
            x: new_x,
            y: new_y,
            theta: normalize_angle(new_theta),
        };
    }

    /// Light sensor / bumper position
    pub fn sensor_point(&self) -> (f32, f32) {
        let Pose { x, y, theta } = self.pose;
        let offset = self.config.sensor_offset;
        (x + offset * theta.cos(), y + offset * theta.sin())
    }

    /// Whether the light sensor is over a dark marker
    pub fn on_marker(&self) -> bool {
        let (sx, sy) = self.sensor_point();
        let half = self.config.marker_half_size;
        (sx - sx.round()).abs() <= half && (sy - sy.round()).abs() <= half
    }

    /// Noisy reflectance reading, 0-100
    pub fn reflectance(&mut self) -> f32 {
        self.sync();
        let level = if self.on_marker() {
            self.config.marker_level
        } else {
            self.config.floor_level
        };
        (level + self.noise.gaussian(self.config.light_noise)).clamp(0.0, 100.0)
    }

    /// Bumper inside a tower
    pub fn touching(&mut self) -> bool {
        self.sync();
        let (sx, sy) = self.sensor_point();
        let radius = self.config.tower_radius;
        self.config
            .towers
            .iter()
            .any(|[tx, ty]| (tx - sx).hypot(ty - sy) <= radius)
    }

    /// Noisy distance to the nearest tower inside the ultrasonic cone (cm)
    pub fn range_cm(&mut self) -> f32 {
        self.sync();
        let (sx, sy) = self.sensor_point();
        let (dir_x, dir_y) = (self.pose.theta.cos(), self.pose.theta.sin());
        let spread = self.config.beam_half_angle_deg.to_radians().tan();
        let radius = self.config.tower_radius;

        let nearest = self
            .config
            .towers
            .iter()
            .filter_map(|[tx, ty]| {
                let (rx, ry) = (tx - sx, ty - sy);
                let along = rx * dir_x + ry * dir_y;
                let lateral = (rx * dir_y - ry * dir_x).abs();
                (along > 0.0 && lateral <= radius + along * spread)
                    .then(|| (along - radius).max(0.0))
            })
            .fold(f32::INFINITY, f32::min);

        if nearest.is_finite() {
            let cm = nearest * self.config.tile_size_cm + self.noise.gaussian(self.config.range_noise_cm);
            cm.clamp(0.0, self.config.max_range_cm)
        } else {
            self.config.max_range_cm
        }
    }
}

/// Wrap to (-pi, pi]
fn normalize_angle(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(std::f32::consts::TAU);
    if wrapped > std::f32::consts::PI {
        wrapped - std::f32::consts::TAU
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Noise-free world starting with the sensor on the marker centre
    fn quiet_config() -> SimulationConfig {
        SimulationConfig {
            light_noise: 0.0,
            range_noise_cm: 0.0,
            wheel_bias: 0.0,
            start_depth: 0.15,
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn test_default_start_rests_inside_near_edge() {
        let config = SimulationConfig::default();
        let depth = config.start_depth;
        let mut world = SimWorld::new(config, GridPoint::new(3, 1), Heading::PosY);
        let (sx, sy) = world.sensor_point();
        assert_relative_eq!(sx, 3.0, epsilon = 1e-5);
        assert_relative_eq!(sy, 1.0 - 0.15 + depth, epsilon = 1e-5);
        assert!(world.on_marker());
        assert!(world.reflectance() < 30.0);
    }

    #[test]
    fn test_starts_with_sensor_on_marker() {
        let mut world = SimWorld::new(quiet_config(), GridPoint::new(0, 0), Heading::NegY);
        let (sx, sy) = world.sensor_point();
        assert_relative_eq!(sx, 0.0, epsilon = 1e-5);
        assert_relative_eq!(sy, 0.0, epsilon = 1e-5);
        assert!(world.on_marker());
        assert_eq!(world.reflectance(), world.config().marker_level);
    }

    #[test]
    fn test_straight_run_reaches_next_marker() {
        let mut world = SimWorld::new(quiet_config(), GridPoint::new(2, 2), Heading::PosX);
        world.move_wheels(0.5, 0.5);
        assert!(!world.on_marker());
        assert_eq!(world.reflectance(), world.config().floor_level);

        world.move_wheels(0.5, 0.5);
        let (sx, sy) = world.sensor_point();
        assert_relative_eq!(sx, 3.0, epsilon = 1e-4);
        assert_relative_eq!(sy, 2.0, epsilon = 1e-4);
        assert!(world.on_marker());
    }

    #[test]
    fn test_pivot_matches_calibration() {
        let config = quiet_config();
        // Wheel degrees per robot degree implied by the geometry
        let calibration =
            config.track_width * std::f32::consts::PI * config.wheel_degrees_per_tile / 360.0;
        let wheel_tiles = calibration * 90.0 / config.wheel_degrees_per_tile;

        let mut world = SimWorld::new(config, GridPoint::new(0, 0), Heading::PosX);
        world.move_wheels(-wheel_tiles, wheel_tiles);
        assert_relative_eq!(world.pose().theta, FRAC_PI_2, epsilon = 1e-4);
    }

    #[test]
    fn test_touch_and_range_see_tower() {
        let mut config = quiet_config();
        config.towers = vec![[2.0, 0.5]];
        let mut world = SimWorld::new(config, GridPoint::new(2, 0), Heading::PosY);

        let expected = (0.5 - 0.12) * 30.0;
        assert_relative_eq!(world.range_cm(), expected, epsilon = 1e-3);
        assert!(!world.touching());

        world.move_wheels(0.4, 0.4);
        assert!(world.touching());

        // Facing away there is no echo
        let mut world = SimWorld::new(quiet_config(), GridPoint::new(2, 0), Heading::NegY);
        assert_eq!(world.range_cm(), world.config().max_range_cm);
    }

    #[test]
    fn test_normalize_angle() {
        assert_relative_eq!(normalize_angle(5.0 * FRAC_PI_2), FRAC_PI_2, epsilon = 1e-5);
        assert_relative_eq!(normalize_angle(-FRAC_PI_2), -FRAC_PI_2, epsilon = 1e-6);
    }
}
