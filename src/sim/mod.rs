//! Grid simulator
//!
//! A kinematic two-wheeled robot on a floor of dark square markers, with
//! towers between markers. Light, touch and ranging readings are derived from
//! the simulated pose and carry Gaussian noise. Continuous runs advance with
//! wall-clock time; encoder-controlled moves are applied at once and then
//! block for their nominal duration.
//!
//! The geometry must agree with the motion calibration: with the default
//! track width and wheel gearing one robot degree costs
//! `track_width × π × wheel_degrees_per_tile / 360 ≈ 1.885` wheel degrees.

mod devices;
mod noise;
mod world;

pub use devices::{SimDrive, SimLight, SimRange, SimTouch};
pub use noise::NoiseGenerator;
pub use world::{Pose, SimWorld};

use crate::config::SimulationConfig;
use crate::hardware::{LightSensor, LogAnnouncer, Peripherals};
use crate::navigation::{GridPoint, Heading};
use devices::SharedWorld;
use parking_lot::Mutex;
use std::sync::Arc;

/// Handle to a simulated robot; hands out peripherals sharing one world
#[derive(Clone)]
pub struct SimRobot {
    world: SharedWorld,
}

impl SimRobot {
    /// Robot resting on the marker at `position`, facing `heading`
    pub fn new(config: SimulationConfig, position: GridPoint, heading: Heading) -> Self {
        log::info!(
            "Simulated robot at {} heading {}, {} tower(s)",
            position,
            heading,
            config.towers.len()
        );
        Self {
            world: Arc::new(Mutex::new(SimWorld::new(config, position, heading))),
        }
    }

    pub fn light(&self) -> Box<dyn LightSensor> {
        Box::new(SimLight::new(Arc::clone(&self.world)))
    }

    /// Drive, bumper and ranger; announcements go to the log
    pub fn peripherals(&self) -> Peripherals {
        Peripherals {
            drive: Box::new(SimDrive::new(Arc::clone(&self.world))),
            touch: Box::new(SimTouch::new(Arc::clone(&self.world))),
            range: Box::new(SimRange::new(Arc::clone(&self.world))),
            announcer: Box::new(LogAnnouncer),
        }
    }

    /// Current axle pose
    pub fn pose(&self) -> Pose {
        let mut world = self.world.lock();
        world.sync();
        world.pose()
    }

    /// Light sensor position
    pub fn sensor_point(&self) -> (f32, f32) {
        let mut world = self.world.lock();
        world.sync();
        world.sensor_point()
    }
}
