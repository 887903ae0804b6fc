//! Scripted peripherals for hardware-free testing
//!
//! [`MockRig`] ties a fake drive to fake sensors so sensor readings follow the
//! commanded motion without depending on wall-clock timing:
//!
//! | Motion | Light reading |
//! |--------|---------------|
//! | Idle (stopped on a marker) | dark |
//! | Forward | light for the scripted number of reads, then dark (or never) |
//! | Backward | light for `backward_light_reads`, then dark |
//! | Pivot | dark for `pivot_dark_reads`, then light |
//!
//! Every drive command and announcement is recorded for inspection.

use super::{Announcer, Cue, DriveActuator, LightSensor, Peripherals, RangeSensor, TouchSensor};
use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Light sensor returning a settable level
#[derive(Clone)]
pub struct SharedLight {
    inner: Arc<Mutex<SharedLightState>>,
}

struct SharedLightState {
    level: f32,
    reads: u64,
    fail: bool,
}

impl SharedLight {
    pub fn new(level: f32) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SharedLightState {
                level,
                reads: 0,
                fail: false,
            })),
        }
    }

    /// Change the level returned by subsequent reads
    pub fn set(&self, level: f32) {
        self.inner.lock().level = level;
    }

    /// Number of reads so far
    pub fn reads(&self) -> u64 {
        self.inner.lock().reads
    }

    /// Make every subsequent read fail
    pub fn fail_reads(&self) {
        self.inner.lock().fail = true;
    }
}

impl LightSensor for SharedLight {
    fn reflected_light(&mut self) -> Result<f32> {
        let mut state = self.inner.lock();
        if state.fail {
            return Err(Error::Hardware("mock light sensor disconnected".to_string()));
        }
        state.reads += 1;
        Ok(state.level)
    }
}

/// Drive command as recorded by the rig
#[derive(Debug, Clone, PartialEq)]
pub enum DriveCommand {
    Run { left: f32, right: f32 },
    Stop,
    Rotations { left: f32, right: f32, rotations: f32 },
    Degrees { left: f32, right: f32, degrees: f32 },
}

impl DriveCommand {
    /// Signed in-place pivot in wheel degrees (positive = anticlockwise),
    /// or None if this is not a pivot
    pub fn pivot_degrees(&self) -> Option<f32> {
        match *self {
            DriveCommand::Degrees {
                left,
                right,
                degrees,
            } if left * right < 0.0 => Some(if right > 0.0 { degrees } else { -degrees }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum RigMotion {
    Idle,
    Forward,
    Backward,
    Pivot,
}

/// Script for a [`MockRig`]
#[derive(Debug, Clone)]
pub struct RigScript {
    /// Reading on light floor
    pub light_level: f32,
    /// Reading on a dark marker
    pub dark_level: f32,
    /// Light reads before the boundary, one entry per forward run
    /// (`None` = the boundary never appears)
    pub forward_segments: VecDeque<Option<usize>>,
    /// Used once `forward_segments` is exhausted
    pub default_forward: Option<usize>,
    /// Light reads before the previous marker is seen when reversing
    pub backward_light_reads: usize,
    /// Dark reads before a pivot leaves the marker
    pub pivot_dark_reads: usize,
    /// Touch pressed during the matching forward run
    pub touch_segments: VecDeque<bool>,
    /// Successive ranging readings; `far_range_cm` once exhausted
    pub range_readings: VecDeque<f32>,
    pub far_range_cm: f32,
}

impl Default for RigScript {
    fn default() -> Self {
        Self {
            light_level: 100.0,
            dark_level: 0.0,
            forward_segments: VecDeque::new(),
            default_forward: Some(2),
            backward_light_reads: 1,
            pivot_dark_reads: 1,
            touch_segments: VecDeque::new(),
            range_readings: VecDeque::new(),
            far_range_cm: 255.0,
        }
    }
}

struct RigState {
    script: RigScript,
    motion: RigMotion,
    reads_in_motion: usize,
    current_forward: Option<usize>,
    current_touch: bool,
    forward_runs: usize,
    light_reads: u64,
    commands: Vec<DriveCommand>,
    announcements: Vec<(String, Cue)>,
}

impl RigState {
    fn set_motion(&mut self, motion: RigMotion) {
        if motion == RigMotion::Forward {
            let default = self.script.default_forward;
            self.current_forward = self.script.forward_segments.pop_front().unwrap_or(default);
            self.current_touch = self.script.touch_segments.pop_front().unwrap_or(false);
            self.forward_runs += 1;
        }
        self.motion = motion;
        self.reads_in_motion = 0;
    }

    fn light(&mut self) -> f32 {
        let reads = self.reads_in_motion;
        self.reads_in_motion += 1;
        self.light_reads += 1;

        let (light, dark) = (self.script.light_level, self.script.dark_level);
        match self.motion {
            RigMotion::Idle => dark,
            RigMotion::Forward => match self.current_forward {
                Some(n) if reads >= n => dark,
                _ => light,
            },
            RigMotion::Backward => {
                if reads >= self.script.backward_light_reads {
                    dark
                } else {
                    light
                }
            }
            RigMotion::Pivot => {
                if reads >= self.script.pivot_dark_reads {
                    light
                } else {
                    dark
                }
            }
        }
    }
}

/// Scripted robot: drive, light, touch, range and announcer sharing one state
#[derive(Clone)]
pub struct MockRig {
    state: Arc<Mutex<RigState>>,
}

impl MockRig {
    pub fn new(script: RigScript) -> Self {
        Self {
            state: Arc::new(Mutex::new(RigState {
                script,
                motion: RigMotion::Idle,
                reads_in_motion: 0,
                current_forward: None,
                current_touch: false,
                forward_runs: 0,
                light_reads: 0,
                commands: Vec::new(),
                announcements: Vec::new(),
            })),
        }
    }

    pub fn light(&self) -> Box<dyn LightSensor> {
        Box::new(RigLight(self.clone()))
    }

    pub fn peripherals(&self) -> Peripherals {
        Peripherals {
            drive: Box::new(RigDrive(self.clone())),
            touch: Box::new(RigTouch(self.clone())),
            range: Box::new(RigRange(self.clone())),
            announcer: Box::new(RigAnnouncer(self.clone())),
        }
    }

    /// All drive commands in order
    pub fn commands(&self) -> Vec<DriveCommand> {
        self.state.lock().commands.clone()
    }

    /// All announcements in order
    pub fn announcements(&self) -> Vec<(String, Cue)> {
        self.state.lock().announcements.clone()
    }

    /// Number of forward runs started
    pub fn forward_runs(&self) -> usize {
        self.state.lock().forward_runs
    }

    /// Number of light sensor reads
    pub fn light_reads(&self) -> u64 {
        self.state.lock().light_reads
    }
}

struct RigDrive(MockRig);
struct RigLight(MockRig);
struct RigTouch(MockRig);
struct RigRange(MockRig);
struct RigAnnouncer(MockRig);

impl DriveActuator for RigDrive {
    fn run(&mut self, left: f32, right: f32) -> Result<()> {
        let mut state = self.0.state.lock();
        state.commands.push(DriveCommand::Run { left, right });
        let motion = if left > 0.0 && right > 0.0 {
            RigMotion::Forward
        } else if left < 0.0 && right < 0.0 {
            RigMotion::Backward
        } else if left == 0.0 && right == 0.0 {
            RigMotion::Idle
        } else {
            RigMotion::Pivot
        };
        state.set_motion(motion);
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        let mut state = self.0.state.lock();
        state.commands.push(DriveCommand::Stop);
        state.set_motion(RigMotion::Idle);
        Ok(())
    }

    fn run_for_rotations(&mut self, left: f32, right: f32, rotations: f32) -> Result<()> {
        let mut state = self.0.state.lock();
        state.commands.push(DriveCommand::Rotations {
            left,
            right,
            rotations,
        });
        state.set_motion(RigMotion::Idle);
        Ok(())
    }

    fn run_for_degrees(&mut self, left: f32, right: f32, degrees: f32) -> Result<()> {
        let mut state = self.0.state.lock();
        state.commands.push(DriveCommand::Degrees {
            left,
            right,
            degrees,
        });
        state.set_motion(RigMotion::Idle);
        Ok(())
    }
}

impl LightSensor for RigLight {
    fn reflected_light(&mut self) -> Result<f32> {
        Ok(self.0.state.lock().light())
    }
}

impl TouchSensor for RigTouch {
    fn is_pressed(&mut self) -> Result<bool> {
        let state = self.0.state.lock();
        Ok(state.motion == RigMotion::Forward && state.current_touch)
    }
}

impl RangeSensor for RigRange {
    fn distance_cm(&mut self) -> Result<f32> {
        let mut state = self.0.state.lock();
        let far = state.script.far_range_cm;
        Ok(state.script.range_readings.pop_front().unwrap_or(far))
    }
}

impl Announcer for RigAnnouncer {
    fn announce(&mut self, label: &str, cue: Cue) -> Result<()> {
        self.0.state.lock().announcements.push((label.to_string(), cue));
        Ok(())
    }
}
