//! Board numbering schemes
//!
//! Two numbering schemes are printed on the board:
//!
//! - **Tile numbers** are dense: every dark tile is numbered row by row,
//!   `(x + 1) + y * tile_stride`.
//! - **Object numbers** are sparse: only the tower slots in the search area are
//!   numbered, `objects_per_row * (floor(y) - y0) + floor((x - x0) / spacing) + 1`.
//!
//! The defaults describe the 14 x 7 competition board with the tower area
//! starting at tile (10, 3).

use super::state::GridPoint;
use serde::{Deserialize, Serialize};

/// Affine numbering parameters
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GridNumbering {
    /// Tiles per board row in the dense numbering (board width + 1)
    #[serde(default = "default_tile_stride")]
    pub tile_stride: i32,

    /// Grid position of object number 1
    #[serde(default = "default_object_origin")]
    pub object_origin: [i32; 2],

    /// Tower slots per row of the search area
    #[serde(default = "default_objects_per_row")]
    pub objects_per_row: i32,

    /// Tiles between neighbouring tower columns
    #[serde(default = "default_object_spacing")]
    pub object_spacing: i32,
}

fn default_tile_stride() -> i32 {
    15
}
fn default_object_origin() -> [i32; 2] {
    [10, 3]
}
fn default_objects_per_row() -> i32 {
    3
}
fn default_object_spacing() -> i32 {
    2
}

impl Default for GridNumbering {
    fn default() -> Self {
        Self {
            tile_stride: default_tile_stride(),
            object_origin: default_object_origin(),
            objects_per_row: default_objects_per_row(),
            object_spacing: default_object_spacing(),
        }
    }
}

impl GridNumbering {
    /// Dense tile number of the tile at `position` (half-units are floored)
    pub fn tile_number(&self, position: GridPoint) -> i64 {
        let x = position.x().floor() as i64;
        let y = position.y().floor() as i64;
        (x + 1) + y * self.tile_stride as i64
    }

    /// Sparse object number for a tower found at `position`
    pub fn object_number(&self, position: GridPoint) -> i64 {
        let [x0, y0] = self.object_origin;
        let row = position.y().floor() as i64 - y0 as i64;
        let column = ((position.x() - x0 as f64) / self.object_spacing as f64).floor() as i64;
        self.objects_per_row as i64 * row + column + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_number_at_origin() {
        let numbering = GridNumbering::default();
        assert_eq!(numbering.object_number(GridPoint::new(10, 3)), 1);
    }

    #[test]
    fn test_object_number_formula() {
        let numbering = GridNumbering::default();
        for (x, y) in [(10.0, 3.5), (12.0, 3.5), (14.0, 4.5), (12.5, 5.0), (11.0, 6.5)] {
            let p = GridPoint::from_f64(x, y).unwrap();
            let expected = 3 * (y.floor() as i64 - 3) + ((x - 10.0) / 2.0).floor() as i64 + 1;
            assert_eq!(numbering.object_number(p), expected, "at ({}, {})", x, y);
        }
        assert_eq!(numbering.object_number(GridPoint::from_f64(14.0, 5.5).unwrap()), 9);
    }

    #[test]
    fn test_tile_number() {
        let numbering = GridNumbering::default();
        assert_eq!(numbering.tile_number(GridPoint::new(0, 0)), 1);
        assert_eq!(numbering.tile_number(GridPoint::new(13, 0)), 14);
        assert_eq!(numbering.tile_number(GridPoint::new(10, 3)), 56);
    }
}
