use crate::{grid::Grid, Coord, Tile};

use serde::{Deserialize, Serialize};
use stats::OnlineStats;
use std::collections::VecDeque;

/// A maximal set of same-valued cells joined by orthogonal steps.
pub type Region = Vec<Coord>;

/// Splits every cell holding `tile` into disjoint regions. Regions are discovered in column-major
/// scan order and their cells are listed in breadth-first order from the first cell found.
pub fn regions_of(grid: &Grid, tile: Tile) -> Vec<Region> {
    let mut visited = Grid::filled(grid.width(), grid.height(), 0);
    let mut regions = Vec::new();
    for c in grid.coords() {
        if visited.get(c) == Some(0) && grid.get(c) == Some(tile) {
            regions.push(flood_fill(grid, c, &mut visited));
        }
    }

    regions
}

fn flood_fill(grid: &Grid, start: Coord, visited: &mut Grid) -> Region {
    let tile = grid.get(start);
    let mut region = Vec::new();
    let mut queue = VecDeque::new();
    visited.set(start, 1);
    queue.push_back(start);
    while let Some(c) = queue.pop_front() {
        region.push(c);
        for n in c.orthogonal_neighbors().iter() {
            if visited.get(*n) == Some(0) && grid.get(*n) == tile {
                visited.set(*n, 1);
                queue.push_back(*n);
            }
        }
    }

    region
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct RegionStats {
    pub count: usize,
    /// Regions smaller than the survival threshold.
    pub pruned: usize,
    pub mean_size: f64,
    pub stddev_size: f64,
}

pub fn region_stats(regions: &[Region], threshold: usize) -> RegionStats {
    let mut sizes = OnlineStats::new();
    for r in regions.iter() {
        sizes.add(r.len());
    }

    RegionStats {
        count: regions.len(),
        pruned: regions.iter().filter(|r| r.len() < threshold).count(),
        mean_size: if regions.is_empty() { 0.0 } else { sizes.mean() },
        stddev_size: if regions.is_empty() { 0.0 } else { sizes.stddev() },
    }
}
