//! Peripheral trait implementations backed by [`SimWorld`]

use super::world::SimWorld;
use crate::error::Result;
use crate::hardware::{DriveActuator, LightSensor, RangeSensor, TouchSensor};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

pub(super) type SharedWorld = Arc<Mutex<SimWorld>>;

/// Simulated differential drive
pub struct SimDrive {
    world: SharedWorld,
}

impl SimDrive {
    pub(super) fn new(world: SharedWorld) -> Self {
        Self { world }
    }

    /// Encoder-controlled move; blocks for as long as the real motors would
    fn run_for_wheel_degrees(&mut self, left: f32, right: f32, degrees: f32) {
        let (left_tiles, right_tiles, duration) = {
            let mut world = self.world.lock();
            let config = world.config();
            let per_tile = config.wheel_degrees_per_tile;
            let max_speed = config.max_wheel_speed;

            let distance = |speed: f32| {
                if speed == 0.0 {
                    0.0
                } else {
                    speed.signum() * degrees / per_tile
                }
            };
            let seconds = |speed: f32, tiles: f32| {
                let v = speed.abs().min(100.0) / 100.0 * max_speed;
                if v > 0.0 { tiles.abs() / v } else { 0.0 }
            };

            let (left_tiles, right_tiles) = (distance(left), distance(right));
            let duration = seconds(left, left_tiles).max(seconds(right, right_tiles));
            world.move_wheels(left_tiles, right_tiles);
            (left_tiles, right_tiles, duration)
        };

        log::trace!(
            "Sim move: left {:.3} right {:.3} tiles in {:.2}s",
            left_tiles,
            right_tiles,
            duration
        );
        thread::sleep(Duration::from_secs_f32(duration));
    }
}

impl DriveActuator for SimDrive {
    fn run(&mut self, left: f32, right: f32) -> Result<()> {
        self.world.lock().set_wheels(left, right);
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.world.lock().set_wheels(0.0, 0.0);
        Ok(())
    }

    fn run_for_rotations(&mut self, left: f32, right: f32, rotations: f32) -> Result<()> {
        self.run_for_wheel_degrees(left, right, rotations * 360.0);
        Ok(())
    }

    fn run_for_degrees(&mut self, left: f32, right: f32, degrees: f32) -> Result<()> {
        self.run_for_wheel_degrees(left, right, degrees);
        Ok(())
    }
}

/// Simulated reflectance sensor
pub struct SimLight {
    world: SharedWorld,
}

impl SimLight {
    pub(super) fn new(world: SharedWorld) -> Self {
        Self { world }
    }
}

impl LightSensor for SimLight {
    fn reflected_light(&mut self) -> Result<f32> {
        Ok(self.world.lock().reflectance())
    }
}

/// Simulated bumper
pub struct SimTouch {
    world: SharedWorld,
}

impl SimTouch {
    pub(super) fn new(world: SharedWorld) -> Self {
        Self { world }
    }
}

impl TouchSensor for SimTouch {
    fn is_pressed(&mut self) -> Result<bool> {
        Ok(self.world.lock().touching())
    }
}

/// Simulated ultrasonic ranger
pub struct SimRange {
    world: SharedWorld,
}

impl SimRange {
    pub(super) fn new(world: SharedWorld) -> Self {
        Self { world }
    }
}

impl RangeSensor for SimRange {
    fn distance_cm(&mut self) -> Result<f32> {
        Ok(self.world.lock().range_cm())
    }
}
