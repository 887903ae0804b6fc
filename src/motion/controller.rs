//! Motion controller: advance, move back and rotate

use crate::config::{AppConfig, MotionConfig, SamplingProfile, SensorConfig};
use crate::error::{Error, Result};
use crate::hardware::{Announcer, Cue, DriveActuator, LightSensor, Peripherals, RangeSensor, TouchSensor};
use crate::navigation::{GridNumbering, GridPoint, Heading, NavigationState};
use crate::sensing::TileBoundarySensor;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Pivots smaller than this many wheel degrees are skipped
const MIN_PIVOT_WHEEL_DEGREES: f32 = 0.5;

/// Counters for observability and tests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MotionStats {
    /// Boundaries confirmed (whole tiles entered)
    pub tiles_reached: u32,
    /// Heading corrections performed
    pub corrections: u32,
    /// Advances that ran out of travel time
    pub timeouts: u32,
    /// Recovery pivots performed
    pub recoveries: u32,
    /// Highest consecutive missed-tile count seen
    pub peak_missed_attempts: u32,
    /// Reverses that ran out of time before finding a marker
    pub move_back_misses: u32,
}

/// What ended a wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Arrival {
    /// The sensor reached the surface being waited for
    Reached,
    /// Touch or ranging contact (probes only)
    Contact,
    /// The time limit expired first
    TimedOut,
}

/// Surface a wait is looking for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Until {
    /// Average at or below the threshold
    Boundary,
    /// Average above the threshold
    Floor,
}

/// Drives the robot one grid operation at a time
pub struct MotionController {
    pub(super) config: MotionConfig,
    pub(super) sensing: SensorConfig,
    numbering: GridNumbering,
    pub(super) state: NavigationState,
    pub(super) sensor: TileBoundarySensor,
    pub(super) drive: Box<dyn DriveActuator>,
    touch: Box<dyn TouchSensor>,
    pub(super) range: Box<dyn RangeSensor>,
    announcer: Box<dyn Announcer>,
    /// Consecutive missed boundaries in the current operation
    pub(super) missed: u32,
    pub(super) stats: MotionStats,
    interrupt: Arc<AtomicBool>,
}

impl MotionController {
    /// Build a controller at the configured start pose
    pub fn new(
        config: &AppConfig,
        light: Box<dyn LightSensor>,
        peripherals: Peripherals,
    ) -> Result<Self> {
        config.validate()?;
        let position = config.search.start_position()?;
        let heading = config.search.start_heading()?;

        Ok(Self {
            config: config.motion.clone(),
            sensing: config.sensor.clone(),
            numbering: config.numbering.clone(),
            state: NavigationState::new(position, heading),
            sensor: TileBoundarySensor::new(light, config.sensor.threshold),
            drive: peripherals.drive,
            touch: peripherals.touch,
            range: peripherals.range,
            announcer: peripherals.announcer,
            missed: 0,
            stats: MotionStats::default(),
            interrupt: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Use an externally owned interrupt flag (e.g. set from a Ctrl-C handler)
    pub fn with_interrupt(mut self, interrupt: Arc<AtomicBool>) -> Self {
        self.interrupt = interrupt;
        self
    }

    /// Flag that aborts the current wait with [`Error::Interrupted`] when set
    pub fn interrupt_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.interrupt)
    }

    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    pub fn position(&self) -> GridPoint {
        self.state.position()
    }

    pub fn heading(&self) -> Heading {
        self.state.heading()
    }

    pub fn numbering(&self) -> &GridNumbering {
        &self.numbering
    }

    pub fn motion_config(&self) -> &MotionConfig {
        &self.config
    }

    pub fn stats(&self) -> MotionStats {
        self.stats
    }

    /// Consecutive missed boundaries (0 outside a recovery)
    pub fn missed_attempts(&self) -> u32 {
        self.missed
    }

    /// Show a label on the robot's display
    pub fn announce(&mut self, label: &str, cue: Cue) -> Result<()> {
        self.announcer.announce(label, cue)
    }

    /// Advance exactly one tile along the current heading.
    ///
    /// The position is updated optimistically before driving and reverted if
    /// the next boundary does not show up in time; the controller then backs
    /// up, performs a recovery pivot and tries again until the boundary is
    /// found or the configured retry budget is spent.
    pub fn advance_one_tile(&mut self, speed: f32) -> Result<()> {
        let profile = self.sensing.advance.clone();
        loop {
            self.state.step_tile();
            log::debug!(
                "Advancing to {} heading {}",
                self.state.position(),
                self.state.heading()
            );

            let (arrival, elapsed) = match self.drive_to_boundary(speed, &profile, false) {
                Ok(outcome) => outcome,
                Err(e) => {
                    self.state.unstep_tile();
                    return Err(e);
                }
            };
            match arrival {
                Arrival::Reached => return self.tile_reached(),
                Arrival::Contact | Arrival::TimedOut => {
                    self.state.unstep_tile();
                    self.recover(speed, elapsed)?;
                }
            }
        }
    }

    /// Reverse onto the marker the robot just left.
    ///
    /// Drives backwards with a light-primed buffer until a boundary is seen or
    /// `limit` (normally the forward travel time) is spent. Returns whether
    /// the marker was found.
    pub fn move_back_to_previous_tile(&mut self, speed: f32, limit: Duration) -> Result<bool> {
        let profile = self.sensing.advance.clone();
        self.sensor.start_reading(
            profile.samples,
            self.sensing.light_prime,
            profile.interval(),
            Duration::ZERO,
        )?;

        let result = match self.drive.run(-speed, -speed) {
            Ok(()) => self.wait_until(Until::Boundary, limit, false),
            Err(e) => Err(e),
        };
        let (arrival, elapsed) = self.halt(result)?;

        let found = arrival == Arrival::Reached;
        if found {
            log::debug!("Back on previous marker after {:?}", elapsed);
        } else {
            self.stats.move_back_misses += 1;
            log::warn!("Previous marker not seen within {:?}", limit);
        }
        Ok(found)
    }

    /// Turn in place by `quarter_turns` (positive = anticlockwise).
    ///
    /// The light sensor rests just inside the near edge of a marker. The
    /// robot rolls forward until its axle is over the marker centre, pivots,
    /// then rolls back past the marker and creeps forward onto its new near
    /// edge so the heading correction sees the same geometry as after an
    /// advance.
    pub fn rotate(&mut self, quarter_turns: i32, speed: f32) -> Result<()> {
        if quarter_turns == 0 {
            return Ok(());
        }

        self.state.rotate(quarter_turns);
        log::info!(
            "Rotating {} quarter turn(s), now heading {}",
            quarter_turns,
            self.state.heading()
        );

        let offset = self.config.rotation_axis_offset;
        self.drive
            .run_for_rotations(speed, speed, offset + self.config.settle_rotations)?;
        let wheel_degrees = self.config.pivot_calibration * 90.0 * quarter_turns as f32;
        self.pivot_wheel_degrees(wheel_degrees, speed)?;
        self.drive
            .run_for_rotations(speed, speed, -(offset + self.config.reacquire_rotations))?;
        self.reacquire_marker(speed)?;

        self.correct_heading()?;
        Ok(())
    }

    /// Creep forward with a light-primed buffer until the light sensor is
    /// back on the marker. Backs up onto it if the edge is not found in time.
    fn reacquire_marker(&mut self, speed: f32) -> Result<()> {
        let profile = self.sensing.advance.clone();
        self.sensor.start_reading(
            profile.samples,
            self.sensing.light_prime,
            profile.interval(),
            Duration::ZERO,
        )?;

        let limit = self.config.reacquire_timeout();
        let result = match self.drive.run(speed, speed) {
            Ok(()) => self.wait_until(Until::Boundary, limit, false),
            Err(e) => Err(e),
        };
        let (arrival, elapsed) = self.halt(result)?;

        if arrival == Arrival::Reached {
            log::debug!("Marker edge reacquired after {:?}", elapsed);
        } else {
            log::warn!("Marker edge not found after turning, backing up");
            self.move_back_to_previous_tile(speed, elapsed)?;
        }
        Ok(())
    }

    /// Book-keeping once a boundary is confirmed: report, correct, reset
    pub(super) fn tile_reached(&mut self) -> Result<()> {
        self.stats.tiles_reached += 1;
        let position = self.state.position();
        let tile = self.numbering.tile_number(position);
        log::info!(
            "Tile {} reached at {} heading {}",
            tile,
            position,
            self.state.heading()
        );
        self.announcer.announce(&tile.to_string(), Cue::Silent)?;

        self.correct_heading()?;

        if self.missed > 0 {
            log::info!("Recovered after {} missed attempt(s)", self.missed);
        }
        self.missed = 0;
        Ok(())
    }

    /// Drive forward with a light-primed buffer until a boundary, a contact
    /// (when `watch_contact`) or the travel limit for the current heading.
    pub(super) fn drive_to_boundary(
        &mut self,
        speed: f32,
        profile: &SamplingProfile,
        watch_contact: bool,
    ) -> Result<(Arrival, Duration)> {
        self.sensor.start_reading(
            profile.samples,
            self.sensing.light_prime,
            profile.interval(),
            profile.warmup(),
        )?;

        let limit = self.travel_limit();
        let result = match self.drive.run(speed, speed) {
            Ok(()) => self.wait_until(Until::Boundary, limit, watch_contact),
            Err(e) => Err(e),
        };
        self.halt(result)
    }

    /// Travel time allowed along the current heading
    pub(super) fn travel_limit(&self) -> Duration {
        let (hx, hy) = self.state.heading().vector();
        let [tx, ty] = self.config.max_travel_times();
        tx * hx.unsigned_abs() + ty * hy.unsigned_abs()
    }

    /// Wait for the sampler to report `until`, a contact or the time limit.
    ///
    /// Blocks on the sampler's notification in slices of at most
    /// `poll_interval`. All timing is measured from a single start instant.
    pub(super) fn wait_until(
        &mut self,
        until: Until,
        limit: Duration,
        watch_contact: bool,
    ) -> Result<(Arrival, Duration)> {
        let start = Instant::now();
        let poll = self.config.poll_interval();

        loop {
            if self.interrupt.load(Ordering::SeqCst) {
                return Err(Error::Interrupted);
            }
            self.sensor.check_fault()?;

            let on_floor = self.sensor.above_threshold();
            let reached = match until {
                Until::Boundary => !on_floor,
                Until::Floor => on_floor,
            };
            if reached {
                return Ok((Arrival::Reached, start.elapsed()));
            }

            if watch_contact && self.contact()? {
                return Ok((Arrival::Contact, start.elapsed()));
            }

            let elapsed = start.elapsed();
            if elapsed >= limit {
                return Ok((Arrival::TimedOut, elapsed));
            }
            self.sensor.wait_for_sample((limit - elapsed).min(poll));
        }
    }

    /// Touch pressed or an echo inside the contact distance
    fn contact(&mut self) -> Result<bool> {
        if self.touch.is_pressed()? {
            log::debug!("Touch sensor pressed");
            return Ok(true);
        }
        let distance = self.range.distance_cm()?;
        if distance < self.config.contact_distance_cm {
            log::debug!("Echo at {:.1} cm", distance);
            return Ok(true);
        }
        Ok(false)
    }

    /// Stop the wheels and the sampler whatever happened, then hand back the
    /// result. The first error wins.
    pub(super) fn halt<T>(&mut self, result: Result<T>) -> Result<T> {
        let stopped = self.drive.stop();
        self.sensor.stop_reading();
        let value = result?;
        stopped?;
        Ok(value)
    }

    /// Pivot in place by a signed wheel angle (positive = anticlockwise)
    pub(super) fn pivot_wheel_degrees(&mut self, wheel_degrees: f32, speed: f32) -> Result<()> {
        if wheel_degrees.abs() < MIN_PIVOT_WHEEL_DEGREES {
            return Ok(());
        }
        let magnitude = wheel_degrees.abs();
        if wheel_degrees > 0.0 {
            self.drive.run_for_degrees(-speed, speed, magnitude)
        } else {
            self.drive.run_for_degrees(speed, -speed, magnitude)
        }
    }

    /// Pivot in place by a signed robot heading angle
    pub(super) fn pivot_robot_degrees(&mut self, robot_degrees: f32, speed: f32) -> Result<()> {
        self.pivot_wheel_degrees(robot_degrees * self.config.pivot_calibration, speed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::mock::{DriveCommand, MockRig, RigScript};

    fn test_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.sensor.threshold = 50.0;
        config.sensor.advance = SamplingProfile {
            samples: 2,
            interval_ms: 1,
            warmup_ms: 20,
        };
        config.sensor.correction = SamplingProfile {
            samples: 2,
            interval_ms: 1,
            warmup_ms: 0,
        };
        config.motion.max_travel_times_ms = [400, 200];
        config.motion.poll_interval_ms = 2;
        config
    }

    #[test]
    fn test_travel_limit_follows_heading() {
        let rig = MockRig::new(RigScript::default());
        let mut controller =
            MotionController::new(&test_config(), rig.light(), rig.peripherals()).unwrap();

        // Start heading is (0, -1)
        assert_eq!(controller.travel_limit(), Duration::from_millis(200));
        controller.state.rotate(1);
        assert_eq!(controller.travel_limit(), Duration::from_millis(400));
    }

    #[test]
    fn test_small_pivots_are_skipped() {
        let rig = MockRig::new(RigScript::default());
        let mut controller =
            MotionController::new(&test_config(), rig.light(), rig.peripherals()).unwrap();

        controller.pivot_wheel_degrees(0.2, 20.0).unwrap();
        controller.pivot_wheel_degrees(-10.0, 20.0).unwrap();
        assert_eq!(
            rig.commands(),
            vec![DriveCommand::Degrees {
                left: 20.0,
                right: -20.0,
                degrees: 10.0
            }]
        );
    }

    #[test]
    fn test_interrupt_aborts_wait_and_stops_drive() {
        let rig = MockRig::new(RigScript {
            default_forward: None,
            ..RigScript::default()
        });
        let mut controller =
            MotionController::new(&test_config(), rig.light(), rig.peripherals()).unwrap();
        controller.interrupt_flag().store(true, Ordering::SeqCst);

        let result = controller.advance_one_tile(50.0);
        assert!(matches!(result, Err(Error::Interrupted)));
        assert_eq!(rig.commands().last(), Some(&DriveCommand::Stop));
        assert!(!controller.sensor.is_sampling());
        // Never reached the tile ahead
        assert_eq!(controller.position(), GridPoint::new(0, 0));
        assert_eq!(controller.stats().tiles_reached, 0);
    }

    #[test]
    fn test_interrupted_probe_keeps_position() {
        let rig = MockRig::new(RigScript::default());
        let mut config = test_config();
        config.motion.sweep_arc_deg = 0.0;
        let mut controller =
            MotionController::new(&config, rig.light(), rig.peripherals()).unwrap();
        controller.interrupt_flag().store(true, Ordering::SeqCst);

        let result = controller.probe_adjacent_tile(30.0);
        assert!(matches!(result, Err(Error::Interrupted)));
        assert_eq!(controller.position(), GridPoint::new(0, 0));
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let rig = MockRig::new(RigScript::default());
        let mut config = test_config();
        config.motion.sweep_arc_deg = 30.0;
        config.motion.sweep_step_deg = 0.0;

        let result = MotionController::new(&config, rig.light(), rig.peripherals());
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_rotate_zero_is_noop() {
        let rig = MockRig::new(RigScript::default());
        let mut controller =
            MotionController::new(&test_config(), rig.light(), rig.peripherals()).unwrap();

        controller.rotate(0, 30.0).unwrap();
        assert!(rig.commands().is_empty());
        assert_eq!(controller.heading(), Heading::NegY);
    }
}
