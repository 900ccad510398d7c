pub mod board;
pub mod error;
pub mod graph;
pub mod grid;
pub mod map_types;
pub mod raster;
pub mod region;
pub mod room;
pub mod sampling;
pub mod seed;

pub use board::Board;
pub use error::GenerateError;
pub use grid::Grid;
pub use map_types::cave::{CaveMapSpec, CaveMeta};

use serde::{Deserialize, Serialize};

/// Raw cell value. The generator itself only writes `WALL` and `FLOOR`, but refill noise may
/// produce any value in `[min_value, max_value)`.
pub type Tile = i32;

pub const FLOOR: Tile = 0;
pub const WALL: Tile = 1;

/// Implement this to receive the non-empty cells of a finished map.
pub trait TileEncoder {
    /// `tile` is the cell value stored at `coord`.
    fn encode_tile(&mut self, coord: &Coord, tile: Tile);

    /// Called before a new map is encoded.
    fn clear_tiles(&mut self) {}
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub const fn new(x: i32, y: i32) -> Self {
        Coord { x, y }
    }

    pub fn offset(&self, dx: i32, dy: i32) -> Self {
        Coord::new(self.x + dx, self.y + dy)
    }

    pub fn distance_squared(&self, other: &Coord) -> i64 {
        let dx = i64::from(self.x - other.x);
        let dy = i64::from(self.y - other.y);

        dx * dx + dy * dy
    }

    /// The four cardinal neighbors, in scan order.
    pub fn orthogonal_neighbors(&self) -> [Coord; 4] {
        [
            self.offset(-1, 0),
            self.offset(0, -1),
            self.offset(0, 1),
            self.offset(1, 0),
        ]
    }
}

impl From<(i32, i32)> for Coord {
    fn from((x, y): (i32, i32)) -> Self {
        Coord::new(x, y)
    }
}
