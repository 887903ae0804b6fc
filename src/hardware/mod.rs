//! Peripheral traits
//!
//! The robot is driven through a small set of capability traits. Real
//! bindings, the grid simulator ([`crate::sim`]) and the scripted test rig
//! ([`mock`]) all implement the same interfaces.
//!
//! Every call returns [`Result`]; a peripheral error is treated as fatal by
//! the motion layer and propagated to the caller.

pub mod mock;

use crate::error::Result;

/// Differential drive with independently commanded wheels.
///
/// Speeds are signed percentages of full motor speed (-100 to 100). The
/// drive is open loop: nothing is reported back.
pub trait DriveActuator: Send {
    /// Run both wheels continuously until the next command
    fn run(&mut self, left: f32, right: f32) -> Result<()>;

    /// Stop both wheels
    fn stop(&mut self) -> Result<()>;

    /// Turn each wheel `rotations` full turns at the given speeds, blocking
    /// until done. The direction of each wheel is the product of the signs of
    /// its speed and `rotations`.
    fn run_for_rotations(&mut self, left: f32, right: f32, rotations: f32) -> Result<()>;

    /// Turn each wheel `degrees` wheel degrees at the given speeds, blocking
    /// until done. Signs combine as in [`DriveActuator::run_for_rotations`].
    fn run_for_degrees(&mut self, left: f32, right: f32, degrees: f32) -> Result<()>;
}

/// Downward facing reflectance sensor
pub trait LightSensor: Send {
    /// Instantaneous reflected light intensity, nominally 0-100
    fn reflected_light(&mut self) -> Result<f32>;
}

/// Front contact switch
pub trait TouchSensor: Send {
    fn is_pressed(&mut self) -> Result<bool>;
}

/// Forward facing ultrasonic ranger
pub trait RangeSensor: Send {
    /// Distance to the nearest echo in centimetres
    fn distance_cm(&mut self) -> Result<f32>;
}

/// Audio cue played alongside an announcement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cue {
    Silent,
    Beep,
    Speak(String),
}

/// Display + speaker sink. Fire and forget.
pub trait Announcer: Send {
    fn announce(&mut self, label: &str, cue: Cue) -> Result<()>;
}

/// Blocks until the operator confirms the start (e.g. a button press)
pub trait StartTrigger: Send {
    fn wait_for_start(&mut self) -> Result<()>;
}

/// Peripherals consumed by the motion controller.
///
/// The light sensor is not part of this bundle: it is owned by the
/// [`TileBoundarySensor`](crate::sensing::TileBoundarySensor), which samples
/// it from a background thread.
pub struct Peripherals {
    pub drive: Box<dyn DriveActuator>,
    pub touch: Box<dyn TouchSensor>,
    pub range: Box<dyn RangeSensor>,
    pub announcer: Box<dyn Announcer>,
}

/// Announcer that writes to the log. Used when no display is attached.
#[derive(Debug, Default)]
pub struct LogAnnouncer;

impl Announcer for LogAnnouncer {
    fn announce(&mut self, label: &str, cue: Cue) -> Result<()> {
        match cue {
            Cue::Silent => log::info!("Display: {}", label),
            Cue::Beep => log::info!("Display: {} (beep)", label),
            Cue::Speak(text) => log::info!("Display: {} (say \"{}\")", label, text),
        }
        Ok(())
    }
}

/// Trigger that starts immediately
#[derive(Debug, Default)]
pub struct ImmediateStart;

impl StartTrigger for ImmediateStart {
    fn wait_for_start(&mut self) -> Result<()> {
        Ok(())
    }
}
