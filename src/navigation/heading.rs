//! Cardinal headings
//!
//! The robot only ever travels along one of four unit vectors. Rotation is an
//! index shift in a fixed cycle; no angle is ever stored.
//!
//! # Sign convention
//!
//! Positive quarter turns are **anticlockwise**: +x turns toward +y.
//! The physical pivot in [`crate::motion`] uses the same sign, so a positive
//! robot angle always means "turn left".

use crate::error::{Error, Result};

/// One of the four cardinal unit vectors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Heading {
    /// (1, 0)
    PosX,
    /// (0, 1)
    PosY,
    /// (-1, 0)
    NegX,
    /// (0, -1)
    NegY,
}

impl Heading {
    /// Direction cycle in anticlockwise order
    pub const CYCLE: [Heading; 4] = [Heading::PosX, Heading::PosY, Heading::NegX, Heading::NegY];

    /// Position of this heading in [`Heading::CYCLE`]
    pub fn index(self) -> usize {
        match self {
            Heading::PosX => 0,
            Heading::PosY => 1,
            Heading::NegX => 2,
            Heading::NegY => 3,
        }
    }

    /// Heading at `index` (taken modulo 4)
    pub fn from_index(index: i64) -> Self {
        Self::CYCLE[index.rem_euclid(4) as usize]
    }

    /// Unit vector components
    pub fn vector(self) -> (i32, i32) {
        match self {
            Heading::PosX => (1, 0),
            Heading::PosY => (0, 1),
            Heading::NegX => (-1, 0),
            Heading::NegY => (0, -1),
        }
    }

    /// Parse a unit vector; anything that is not cardinal is rejected
    pub fn from_vector(x: i32, y: i32) -> Result<Self> {
        match (x, y) {
            (1, 0) => Ok(Heading::PosX),
            (0, 1) => Ok(Heading::PosY),
            (-1, 0) => Ok(Heading::NegX),
            (0, -1) => Ok(Heading::NegY),
            _ => Err(Error::InvalidParameter(format!(
                "heading ({}, {}) is not a cardinal unit vector",
                x, y
            ))),
        }
    }

    /// Heading after `quarter_turns` anticlockwise quarter turns
    pub fn rotated(self, quarter_turns: i32) -> Self {
        Self::from_index(self.index() as i64 + quarter_turns as i64)
    }
}

impl std::fmt::Display for Heading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (x, y) = self.vector();
        write!(f, "({}, {})", x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_round_trip() {
        for heading in Heading::CYCLE {
            let (x, y) = heading.vector();
            assert_eq!(Heading::from_vector(x, y).unwrap(), heading);
        }
        assert!(Heading::from_vector(1, 1).is_err());
        assert!(Heading::from_vector(0, 0).is_err());
    }

    #[test]
    fn test_positive_turn_is_anticlockwise() {
        assert_eq!(Heading::PosX.rotated(1), Heading::PosY);
        assert_eq!(Heading::PosY.rotated(1), Heading::NegX);
        assert_eq!(Heading::PosX.rotated(-1), Heading::NegY);
    }

    #[test]
    fn test_rotation_sums_modulo_four() {
        let turns = [1, -3, 2, 2, -1, 5, -7];
        for start in Heading::CYCLE {
            let mut heading = start;
            let mut total = 0i64;
            for &t in &turns {
                heading = heading.rotated(t);
                total += t as i64;
                assert_eq!(heading, Heading::from_index(start.index() as i64 + total));
            }
        }
    }

    #[test]
    fn test_four_quarter_turns_are_identity() {
        for start in Heading::CYCLE {
            let mut left = start;
            let mut right = start;
            for _ in 0..4 {
                left = left.rotated(1);
                right = right.rotated(-1);
            }
            assert_eq!(left, start);
            assert_eq!(right, start);
        }
    }
}
