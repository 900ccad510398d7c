use crate::{Coord, Tile, WALL};

use serde::{Deserialize, Serialize};

/// A fixed-size 2D array of tiles. Cells are addressed by `Coord` with `x` in `[0, width)` and `y`
/// in `[0, height)`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Grid {
    width: usize,
    height: usize,
    tiles: Vec<Tile>,
}

impl Grid {
    pub fn filled(width: usize, height: usize, tile: Tile) -> Self {
        Grid {
            width,
            height,
            tiles: vec![tile; width * height],
        }
    }

    /// Builds a grid from rows of equal length, `rows[y][x]`. Returns `None` if the rows are
    /// ragged.
    pub fn from_rows(rows: &[Vec<Tile>]) -> Option<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, |r| r.len());
        if rows.iter().any(|r| r.len() != width) {
            return None;
        }

        Some(Grid {
            width,
            height,
            tiles: rows.iter().flatten().cloned().collect(),
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn contains(&self, c: Coord) -> bool {
        c.x >= 0 && c.y >= 0 && (c.x as usize) < self.width && (c.y as usize) < self.height
    }

    fn index(&self, c: Coord) -> Option<usize> {
        if self.contains(c) {
            Some(c.y as usize * self.width + c.x as usize)
        } else {
            None
        }
    }

    pub fn get(&self, c: Coord) -> Option<Tile> {
        self.index(c).map(|i| self.tiles[i])
    }

    /// Returns false and leaves the grid untouched if `c` is out of bounds.
    pub fn set(&mut self, c: Coord, tile: Tile) -> bool {
        match self.index(c) {
            Some(i) => {
                self.tiles[i] = tile;
                true
            }
            None => false,
        }
    }

    /// Out-of-bounds cells read as walls.
    pub fn is_wall(&self, c: Coord) -> bool {
        self.get(c).map_or(true, |t| t == WALL)
    }

    /// Every coordinate, column by column (`x` outer, `y` inner).
    pub fn coords(&self) -> impl Iterator<Item = Coord> {
        let (width, height) = (self.width as i32, self.height as i32);

        (0..width).flat_map(move |x| (0..height).map(move |y| Coord::new(x, y)))
    }

    pub fn is_on_edge(&self, c: Coord) -> bool {
        c.x == 0 || c.y == 0 || c.x as usize == self.width - 1 || c.y as usize == self.height - 1
    }

    /// Number of walls among the 8 neighbors of `c`, where out-of-bounds neighbors count as walls.
    pub fn wall_neighbor_count(&self, c: Coord) -> u32 {
        let mut count = 0;
        for dx in -1..=1 {
            for dy in -1..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                if self.is_wall(c.offset(dx, dy)) {
                    count += 1;
                }
            }
        }

        count
    }

    pub fn count(&self, tile: Tile) -> usize {
        self.tiles.iter().filter(|t| **t == tile).count()
    }
}
