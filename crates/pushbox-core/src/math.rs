//! Grid math primitives.
//!
//! The engine distinguishes *tile indices* (integer column/row coordinates on
//! the puzzle grid) from *pixel positions* (floating-point stage coordinates).
//! Conversion between the two always goes through the configured tile size.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// TileIndex
// ---------------------------------------------------------------------------

/// An integer (column, row) coordinate on the tile grid.
///
/// Distinct from a pixel position; multiply by the tile size to place the
/// tile on the stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TileIndex {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl TileIndex {
    /// Create a tile index from a column and row.
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The tile index offset by `(dx, dy)` tiles.
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// The pixel position of this tile's top-left corner for a given tile size.
    pub fn to_pixels(self, tile_size: f32) -> (f32, f32) {
        (self.x as f32 * tile_size, self.y as f32 * tile_size)
    }
}

impl std::fmt::Display for TileIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_moves_by_tiles() {
        let t = TileIndex::new(3, 2);
        assert_eq!(t.offset(1, 0), TileIndex::new(4, 2));
        assert_eq!(t.offset(0, -2), TileIndex::new(3, 0));
    }

    #[test]
    fn pixel_conversion_uses_tile_size() {
        let t = TileIndex::new(2, 5);
        assert_eq!(t.to_pixels(32.0), (64.0, 160.0));
    }

    #[test]
    fn serde_round_trip() {
        let t = TileIndex::new(-1, 7);
        let json = serde_json::to_string(&t).unwrap();
        let back: TileIndex = serde_json::from_str(&json).unwrap();
        assert_eq!(t, back);
    }
}
