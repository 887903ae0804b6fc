//! Configuration for Rekha
//!
//! Loads configuration from a TOML file. Every field has a default, so a
//! file only needs the values that differ from the stock EV3 build:
//!
//! ```toml
//! [sensor]
//! threshold = 30.0
//!
//! [motion]
//! pivot_calibration = 1.87
//! max_recovery_attempts = 6
//! ```
//!
//! Calibration constants (wheel-degree factors, correction gain, turn rate)
//! depend on the individual robot and floor, so they live here rather than in
//! the code.

use crate::error::{Error, Result};
use crate::navigation::{GridNumbering, GridPoint, Heading};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Top-level application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub sensor: SensorConfig,
    #[serde(default)]
    pub motion: MotionConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub numbering: GridNumbering,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Sampling parameters for one kind of manoeuvre
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SamplingProfile {
    /// Rolling window length
    pub samples: usize,
    /// Time between samples (ms)
    pub interval_ms: u64,
    /// Delay before the first sample (ms)
    pub warmup_ms: u64,
}

impl SamplingProfile {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn warmup(&self) -> Duration {
        Duration::from_millis(self.warmup_ms)
    }
}

/// Reflectance sensing
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SensorConfig {
    /// Average reflectance above this is floor, at or below is a marker
    #[serde(default = "default_threshold")]
    pub threshold: f32,

    /// Buffer fill meaning "certainly on floor"
    #[serde(default = "default_light_prime")]
    pub light_prime: f32,

    /// Buffer fill meaning "certainly on a marker"
    #[serde(default = "default_dark_prime")]
    pub dark_prime: f32,

    /// Whole-tile advances. The warmup must cover leaving the current marker.
    #[serde(default = "default_advance_profile")]
    pub advance: SamplingProfile,

    /// Half-tile probes (slower, so a longer warmup)
    #[serde(default = "default_probe_profile")]
    pub probe: SamplingProfile,

    /// Heading correction pivots
    #[serde(default = "default_correction_profile")]
    pub correction: SamplingProfile,
}

/// Drive speeds, timeouts and calibration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MotionConfig {
    /// Tile advance speed (percent)
    #[serde(default = "default_speed")]
    pub speed: f32,

    /// Probe advance speed (percent)
    #[serde(default = "default_probe_speed")]
    pub probe_speed: f32,

    /// Quarter-turn speed (percent)
    #[serde(default = "default_turn_speed")]
    pub turn_speed: f32,

    /// Correction pivot speed (percent)
    #[serde(default = "default_correction_speed")]
    pub correction_speed: f32,

    /// Longest expected travel between markers along x and y (ms)
    #[serde(default = "default_max_travel_times_ms")]
    pub max_travel_times_ms: [u64; 2],

    /// Upper bound on one wait slice while polling (ms)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Longest a correction pivot may search for the marker edge (ms)
    #[serde(default = "default_correction_timeout_ms")]
    pub correction_timeout_ms: u64,

    /// Robot heading change per second while pivoting at `correction_speed`
    #[serde(default = "default_turn_rate")]
    pub turn_rate_deg_per_sec: f32,

    /// Wheel degrees per robot degree for an in-place pivot
    #[serde(default = "default_pivot_calibration")]
    pub pivot_calibration: f32,

    /// Wheel degrees per robot degree for recovery pivots
    #[serde(default = "default_recovery_calibration")]
    pub recovery_calibration: f32,

    /// Damping gain applied to the measured correction
    #[serde(default = "default_correction_gain")]
    pub correction_gain: f32,

    /// Wheel rotations from the light sensor to the rotation axis
    #[serde(default = "default_rotation_axis_offset")]
    pub rotation_axis_offset: f32,

    /// Wheel rotations from where an advance stops (just inside the near
    /// edge of a marker) to the marker centre. Added to the roll onto the
    /// rotation axis so the robot pivots about the marker centre.
    #[serde(default = "default_settle_rotations")]
    pub settle_rotations: f32,

    /// Extra wheel rotations rolled back after a pivot so the light sensor
    /// ends behind the marker and can find its near edge again
    #[serde(default = "default_reacquire_rotations")]
    pub reacquire_rotations: f32,

    /// Longest the forward search for the near edge may take after a pivot (ms)
    #[serde(default = "default_reacquire_timeout_ms")]
    pub reacquire_timeout_ms: u64,

    /// Recovery attempts before a missed marker becomes an error.
    /// Unset means retry forever.
    #[serde(default)]
    pub max_recovery_attempts: Option<u32>,

    /// Half-arc of the ranging sweep before a probe (robot degrees, 0 = off)
    #[serde(default = "default_sweep_arc")]
    pub sweep_arc_deg: f32,

    /// Sweep step (robot degrees)
    #[serde(default = "default_sweep_step")]
    pub sweep_step_deg: f32,

    /// Range below which the sweep reports a tower in the next cell
    #[serde(default = "default_detect_distance")]
    pub detect_distance_cm: f32,

    /// Range below which a probe advance stops as if touched
    #[serde(default = "default_contact_distance")]
    pub contact_distance_cm: f32,
}

impl MotionConfig {
    pub fn max_travel_times(&self) -> [Duration; 2] {
        self.max_travel_times_ms.map(Duration::from_millis)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn correction_timeout(&self) -> Duration {
        Duration::from_millis(self.correction_timeout_ms)
    }

    pub fn reacquire_timeout(&self) -> Duration {
        Duration::from_millis(self.reacquire_timeout_ms)
    }
}

/// One straight leg of the approach: turn, then advance
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Leg {
    #[serde(default)]
    pub quarter_turns: i32,
    pub tiles: u32,
}

/// Fixed search script
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    #[serde(default = "default_start_position")]
    pub start_position: [f64; 2],

    /// Unit vector; must be cardinal
    #[serde(default = "default_start_heading")]
    pub start_heading: [i32; 2],

    /// Legs from the start tile to the first search column
    #[serde(default = "default_approach")]
    pub approach: Vec<Leg>,

    /// Number of columns to sweep
    #[serde(default = "default_columns")]
    pub columns: u32,

    /// Probes per column
    #[serde(default = "default_cells_per_column")]
    pub cells_per_column: u32,

    /// Tiles between columns
    #[serde(default = "default_column_spacing")]
    pub column_spacing: u32,

    /// Quarter turns used to leave the first column (sign flips every column)
    #[serde(default = "default_first_column_turn")]
    pub first_column_turn: i32,
}

impl SearchConfig {
    pub fn start_position(&self) -> Result<GridPoint> {
        GridPoint::from_f64(self.start_position[0], self.start_position[1])
    }

    pub fn start_heading(&self) -> Result<Heading> {
        Heading::from_vector(self.start_heading[0], self.start_heading[1])
    }
}

/// Grid simulator used by the binary when no hardware is attached
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulationConfig {
    /// Noise seed (0 = random each run)
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Wheel surface speed at 100% (tiles/s)
    #[serde(default = "default_max_wheel_speed")]
    pub max_wheel_speed: f32,

    /// Wheel degrees to roll one tile
    #[serde(default = "default_wheel_degrees_per_tile")]
    pub wheel_degrees_per_tile: f32,

    /// Distance between the wheels (tiles)
    #[serde(default = "default_track_width")]
    pub track_width: f32,

    /// Light sensor ahead of the axle (tiles)
    #[serde(default = "default_sensor_offset")]
    pub sensor_offset: f32,

    /// Half the side of a dark marker (tiles)
    #[serde(default = "default_marker_half_size")]
    pub marker_half_size: f32,

    /// How far past the near edge of the start marker the light sensor
    /// starts (tiles). The default matches where an advance comes to rest.
    #[serde(default = "default_start_depth")]
    pub start_depth: f32,

    #[serde(default = "default_floor_level")]
    pub floor_level: f32,

    #[serde(default = "default_marker_level")]
    pub marker_level: f32,

    /// Reflectance noise standard deviation
    #[serde(default = "default_light_noise")]
    pub light_noise: f32,

    /// Fractional speed deficit of the right wheel (causes veer)
    #[serde(default = "default_wheel_bias")]
    pub wheel_bias: f32,

    /// Tower centres (tiles)
    #[serde(default = "default_towers")]
    pub towers: Vec<[f32; 2]>,

    /// Tower radius (tiles)
    #[serde(default = "default_tower_radius")]
    pub tower_radius: f32,

    /// Tile edge length (cm) for the ranging sensor
    #[serde(default = "default_tile_size_cm")]
    pub tile_size_cm: f32,

    /// Ranging reading with no echo
    #[serde(default = "default_max_range_cm")]
    pub max_range_cm: f32,

    /// Half-angle of the ultrasonic cone (degrees)
    #[serde(default = "default_beam_half_angle")]
    pub beam_half_angle_deg: f32,

    /// Ranging noise standard deviation (cm)
    #[serde(default = "default_range_noise")]
    pub range_noise_cm: f32,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Default log level (trace, debug, info, warn, error); RUST_LOG overrides
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
fn default_threshold() -> f32 {
    30.0
}
fn default_light_prime() -> f32 {
    100.0
}
fn default_dark_prime() -> f32 {
    0.0
}
fn default_advance_profile() -> SamplingProfile {
    SamplingProfile {
        samples: 5,
        interval_ms: 10,
        warmup_ms: 700,
    }
}
fn default_probe_profile() -> SamplingProfile {
    SamplingProfile {
        samples: 5,
        interval_ms: 10,
        warmup_ms: 1000,
    }
}
fn default_correction_profile() -> SamplingProfile {
    SamplingProfile {
        samples: 3,
        interval_ms: 5,
        warmup_ms: 0,
    }
}

fn default_speed() -> f32 {
    50.0
}
fn default_probe_speed() -> f32 {
    30.0
}
fn default_turn_speed() -> f32 {
    30.0
}
fn default_correction_speed() -> f32 {
    20.0
}
fn default_max_travel_times_ms() -> [u64; 2] {
    [3000, 3000]
}
fn default_poll_interval_ms() -> u64 {
    10
}
fn default_correction_timeout_ms() -> u64 {
    2000
}
fn default_turn_rate() -> f32 {
    115.0
}
fn default_pivot_calibration() -> f32 {
    1.885
}
fn default_recovery_calibration() -> f32 {
    1.87
}
fn default_correction_gain() -> f32 {
    0.75
}
fn default_rotation_axis_offset() -> f32 {
    0.6
}
fn default_settle_rotations() -> f32 {
    0.25
}
fn default_reacquire_rotations() -> f32 {
    0.6
}
fn default_reacquire_timeout_ms() -> u64 {
    1500
}
fn default_sweep_arc() -> f32 {
    30.0
}
fn default_sweep_step() -> f32 {
    5.0
}
fn default_detect_distance() -> f32 {
    15.0
}
fn default_contact_distance() -> f32 {
    4.0
}

fn default_start_position() -> [f64; 2] {
    [0.0, 0.0]
}
fn default_start_heading() -> [i32; 2] {
    [0, -1]
}
fn default_approach() -> Vec<Leg> {
    vec![
        Leg {
            quarter_turns: 1,
            tiles: 10,
        },
        Leg {
            quarter_turns: 1,
            tiles: 3,
        },
    ]
}
fn default_columns() -> u32 {
    3
}
fn default_cells_per_column() -> u32 {
    3
}
fn default_column_spacing() -> u32 {
    2
}
fn default_first_column_turn() -> i32 {
    -1
}

fn default_seed() -> u64 {
    42
}
fn default_max_wheel_speed() -> f32 {
    1.5
}
fn default_wheel_degrees_per_tile() -> f32 {
    720.0
}
fn default_track_width() -> f32 {
    0.30
}
fn default_sensor_offset() -> f32 {
    0.30
}
fn default_marker_half_size() -> f32 {
    0.15
}
fn default_start_depth() -> f32 {
    0.025
}
fn default_floor_level() -> f32 {
    62.0
}
fn default_marker_level() -> f32 {
    8.0
}
fn default_light_noise() -> f32 {
    1.5
}
fn default_wheel_bias() -> f32 {
    0.01
}
fn default_towers() -> Vec<[f32; 2]> {
    vec![[12.0, 4.5]]
}
fn default_tower_radius() -> f32 {
    0.12
}
fn default_tile_size_cm() -> f32 {
    30.0
}
fn default_max_range_cm() -> f32 {
    255.0
}
fn default_beam_half_angle() -> f32 {
    15.0
}
fn default_range_noise() -> f32 {
    0.5
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            light_prime: default_light_prime(),
            dark_prime: default_dark_prime(),
            advance: default_advance_profile(),
            probe: default_probe_profile(),
            correction: default_correction_profile(),
        }
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            speed: default_speed(),
            probe_speed: default_probe_speed(),
            turn_speed: default_turn_speed(),
            correction_speed: default_correction_speed(),
            max_travel_times_ms: default_max_travel_times_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            correction_timeout_ms: default_correction_timeout_ms(),
            turn_rate_deg_per_sec: default_turn_rate(),
            pivot_calibration: default_pivot_calibration(),
            recovery_calibration: default_recovery_calibration(),
            correction_gain: default_correction_gain(),
            rotation_axis_offset: default_rotation_axis_offset(),
            settle_rotations: default_settle_rotations(),
            reacquire_rotations: default_reacquire_rotations(),
            reacquire_timeout_ms: default_reacquire_timeout_ms(),
            max_recovery_attempts: None,
            sweep_arc_deg: default_sweep_arc(),
            sweep_step_deg: default_sweep_step(),
            detect_distance_cm: default_detect_distance(),
            contact_distance_cm: default_contact_distance(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            start_position: default_start_position(),
            start_heading: default_start_heading(),
            approach: default_approach(),
            columns: default_columns(),
            cells_per_column: default_cells_per_column(),
            column_spacing: default_column_spacing(),
            first_column_turn: default_first_column_turn(),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            max_wheel_speed: default_max_wheel_speed(),
            wheel_degrees_per_tile: default_wheel_degrees_per_tile(),
            track_width: default_track_width(),
            sensor_offset: default_sensor_offset(),
            marker_half_size: default_marker_half_size(),
            start_depth: default_start_depth(),
            floor_level: default_floor_level(),
            marker_level: default_marker_level(),
            light_noise: default_light_noise(),
            wheel_bias: default_wheel_bias(),
            towers: default_towers(),
            tower_radius: default_tower_radius(),
            tile_size_cm: default_tile_size_cm(),
            max_range_cm: default_max_range_cm(),
            beam_half_angle_deg: default_beam_half_angle(),
            range_noise_cm: default_range_noise(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    ///
    /// # Example
    /// ```no_run
    /// use rekha::config::AppConfig;
    ///
    /// let config = AppConfig::load("rekha.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Check values the motion layer cannot work with
    pub fn validate(&self) -> Result<()> {
        for (name, profile) in [
            ("advance", &self.sensor.advance),
            ("probe", &self.sensor.probe),
            ("correction", &self.sensor.correction),
        ] {
            if profile.samples == 0 {
                return Err(Error::Config(format!(
                    "sensor.{}.samples must be at least 1",
                    name
                )));
            }
        }

        let m = &self.motion;
        for (name, speed) in [
            ("speed", m.speed),
            ("probe_speed", m.probe_speed),
            ("turn_speed", m.turn_speed),
            ("correction_speed", m.correction_speed),
        ] {
            if !(speed > 0.0 && speed <= 100.0) {
                return Err(Error::Config(format!(
                    "motion.{} must be in (0, 100], got {}",
                    name, speed
                )));
            }
        }
        if m.pivot_calibration <= 0.0 || m.recovery_calibration <= 0.0 {
            return Err(Error::Config(
                "motion calibration factors must be positive".to_string(),
            ));
        }
        if m.turn_rate_deg_per_sec <= 0.0 {
            return Err(Error::Config(
                "motion.turn_rate_deg_per_sec must be positive".to_string(),
            ));
        }
        if m.poll_interval_ms == 0 {
            return Err(Error::Config(
                "motion.poll_interval_ms must be at least 1".to_string(),
            ));
        }
        for (name, rotations) in [
            ("rotation_axis_offset", m.rotation_axis_offset),
            ("settle_rotations", m.settle_rotations),
            ("reacquire_rotations", m.reacquire_rotations),
        ] {
            if !(rotations >= 0.0) {
                return Err(Error::Config(format!(
                    "motion.{} must not be negative, got {}",
                    name, rotations
                )));
            }
        }
        if m.sweep_arc_deg > 0.0 && m.sweep_step_deg <= 0.0 {
            return Err(Error::Config(
                "motion.sweep_step_deg must be positive when sweeping".to_string(),
            ));
        }

        self.search
            .start_position()
            .map_err(|e| Error::Config(format!("search.start_position: {}", e)))?;
        self.search
            .start_heading()
            .map_err(|e| Error::Config(format!("search.start_heading: {}", e)))?;

        if self.numbering.object_spacing == 0 {
            return Err(Error::Config(
                "numbering.object_spacing must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.sensor.threshold, 30.0);
        assert_eq!(config.sensor.advance.samples, 5);
        assert_eq!(config.motion.recovery_calibration, 1.87);
        assert_eq!(config.motion.correction_gain, 0.75);
        assert_eq!(config.motion.max_recovery_attempts, None);
        assert_eq!(config.search.start_heading().unwrap(), Heading::NegY);
        assert_eq!(config.numbering.object_origin, [10, 3]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_serialization() {
        let config = AppConfig::default();
        let toml_string = toml::to_string_pretty(&config).unwrap();

        assert!(toml_string.contains("[sensor]"));
        assert!(toml_string.contains("[motion]"));
        assert!(toml_string.contains("[search]"));
        assert!(toml_string.contains("[numbering]"));
        assert!(toml_string.contains("first_column_turn = -1"));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let toml_content = r#"
[sensor]
threshold = 42.5

[motion]
pivot_calibration = 1.9
max_recovery_attempts = 4

[search]
start_heading = [1, 0]
approach = [{ tiles = 2 }, { quarter_turns = -1, tiles = 1 }]

[logging]
level = "debug"
"#;

        let config: AppConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.sensor.threshold, 42.5);
        assert_eq!(config.sensor.correction.samples, 3);
        assert_eq!(config.motion.pivot_calibration, 1.9);
        assert_eq!(config.motion.max_recovery_attempts, Some(4));
        assert_eq!(config.motion.speed, 50.0);
        assert_eq!(config.search.start_heading().unwrap(), Heading::PosX);
        assert_eq!(config.search.approach.len(), 2);
        assert_eq!(config.search.approach[0].quarter_turns, 0);
        assert_eq!(config.search.approach[1].quarter_turns, -1);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.search.start_heading = [1, 1];
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = AppConfig::default();
        config.sensor.probe.samples = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.motion.speed = 0.0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.search.start_position = [0.25, 0.0];
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.motion.sweep_step_deg = 0.0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.motion.reacquire_rotations = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rekha.toml");

        let mut config = AppConfig::default();
        config.motion.max_recovery_attempts = Some(3);
        config.simulation.towers = vec![[14.0, 5.5]];
        config.to_file(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded.motion.max_recovery_attempts, Some(3));
        assert_eq!(loaded.simulation.towers, vec![[14.0, 5.5]]);
        assert_eq!(loaded.search.approach, config.search.approach);
    }
}
