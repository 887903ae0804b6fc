//! Grid position and navigation state

use super::heading::Heading;
use crate::error::{Error, Result};

/// A grid position stored exactly as half-units.
///
/// Positions move by whole tiles during traversal and by half tiles while
/// probing, so both coordinates are always multiples of 0.5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct GridPoint {
    x_halves: i32,
    y_halves: i32,
}

impl GridPoint {
    /// Point at whole tile coordinates
    pub fn new(x: i32, y: i32) -> Self {
        Self {
            x_halves: x * 2,
            y_halves: y * 2,
        }
    }

    /// Point from half-unit counts
    pub fn from_halves(x_halves: i32, y_halves: i32) -> Self {
        Self { x_halves, y_halves }
    }

    /// Point from real coordinates; each must be a multiple of 0.5
    pub fn from_f64(x: f64, y: f64) -> Result<Self> {
        let to_halves = |v: f64| -> Result<i32> {
            let halves = v * 2.0;
            if halves.fract() != 0.0 || !halves.is_finite() {
                return Err(Error::InvalidParameter(format!(
                    "grid coordinate {} is not a multiple of 0.5",
                    v
                )));
            }
            Ok(halves as i32)
        };
        Ok(Self {
            x_halves: to_halves(x)?,
            y_halves: to_halves(y)?,
        })
    }

    pub fn x(&self) -> f64 {
        self.x_halves as f64 / 2.0
    }

    pub fn y(&self) -> f64 {
        self.y_halves as f64 / 2.0
    }

    pub fn x_halves(&self) -> i32 {
        self.x_halves
    }

    pub fn y_halves(&self) -> i32 {
        self.y_halves
    }

    /// True when both coordinates are whole tiles
    pub fn is_whole(&self) -> bool {
        self.x_halves % 2 == 0 && self.y_halves % 2 == 0
    }

    /// Move `halves` half-units along `heading` (negative moves backwards)
    pub fn offset(self, heading: Heading, halves: i32) -> Self {
        let (dx, dy) = heading.vector();
        Self {
            x_halves: self.x_halves + dx * halves,
            y_halves: self.y_halves + dy * halves,
        }
    }
}

impl std::fmt::Display for GridPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x(), self.y())
    }
}

/// Dead-reckoned grid pose of the robot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationState {
    position: GridPoint,
    heading: Heading,
}

impl NavigationState {
    pub fn new(position: GridPoint, heading: Heading) -> Self {
        Self { position, heading }
    }

    pub fn position(&self) -> GridPoint {
        self.position
    }

    pub fn heading(&self) -> Heading {
        self.heading
    }

    /// Advance one whole tile along the heading
    pub fn step_tile(&mut self) {
        self.position = self.position.offset(self.heading, 2);
    }

    /// Undo [`NavigationState::step_tile`]
    pub fn unstep_tile(&mut self) {
        self.position = self.position.offset(self.heading, -2);
    }

    /// Advance half a tile along the heading
    pub fn step_half(&mut self) {
        self.position = self.position.offset(self.heading, 1);
    }

    /// Undo [`NavigationState::step_half`]
    pub fn unstep_half(&mut self) {
        self.position = self.position.offset(self.heading, -1);
    }

    /// Rotate by `quarter_turns` (positive = anticlockwise)
    pub fn rotate(&mut self, quarter_turns: i32) {
        self.heading = self.heading.rotated(quarter_turns);
    }
}
