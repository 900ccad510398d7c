use crate::{
    grid::Grid,
    raster::{disc, line},
    region::{region_stats, regions_of, RegionStats},
    room::{Passage, Room, RoomGraph, RoomLink},
    sampling::{small_rng, FillRoll, TileNoise},
    seed::{hash_seed, SeedPool},
    Coord, GenerateError, Tile, FLOOR, WALL,
};

use rand_distr::Distribution;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct CaveMapSpec {
    /// Interior size, before the border ring is added.
    pub width: usize,
    pub height: usize,
    /// Refill noise and border cells are drawn from `[min_value, max_value)`.
    pub min_value: Tile,
    pub max_value: Tile,
    pub smoothing_passes: usize,
    /// Wall regions smaller than this are refilled with noise.
    pub wall_threshold: usize,
    /// Floor regions smaller than this are refilled with noise instead of becoming rooms.
    pub room_threshold: usize,
    pub passage_radius: i32,
    pub border_size: usize,
    pub seeds: SeedPool,
}

impl Default for CaveMapSpec {
    fn default() -> Self {
        CaveMapSpec {
            width: 64,
            height: 48,
            min_value: 0,
            max_value: 1,
            smoothing_passes: 5,
            wall_threshold: 50,
            room_threshold: 50,
            passage_radius: 5,
            border_size: 1,
            seeds: SeedPool::default(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct CaveMeta {
    pub level: usize,
    pub seed: String,
    /// Largest first.
    pub room_sizes: Vec<usize>,
    /// In the order they were carved.
    pub passages: Vec<Passage>,
    pub wall_regions: RegionStats,
    pub floor_regions: RegionStats,
}

/// The processed interior before the border ring is added.
struct CaveInterior {
    grid: Grid,
    rooms: RoomGraph,
    seed: String,
    seed_hash: u64,
    wall_regions: RegionStats,
    floor_regions: RegionStats,
}

impl CaveMapSpec {
    pub fn from_ron(text: &str) -> Result<Self, GenerateError> {
        let spec: CaveMapSpec = ron::de::from_str(text)?;
        spec.validate()?;

        Ok(spec)
    }

    pub fn validate(&self) -> Result<(), GenerateError> {
        if self.width == 0 || self.height == 0 {
            return Err(GenerateError::EmptyGrid {
                width: self.width,
                height: self.height,
            });
        }
        if self.seeds.is_empty() {
            return Err(GenerateError::EmptySeedPool);
        }
        TileNoise::new(self.min_value, self.max_value)?;

        Ok(())
    }

    pub fn level_count(&self) -> usize {
        self.seeds.len()
    }

    /// Size of the grid returned by `generate`.
    pub fn bordered_dimensions(&self) -> (usize, usize) {
        (
            self.width + 2 * self.border_size,
            self.height + 2 * self.border_size,
        )
    }

    pub fn generate(&self, level: usize, random_fill_percent: u32) -> Result<Grid, GenerateError> {
        self.generate_with_meta(level, random_fill_percent)
            .map(|(grid, _)| grid)
    }

    pub fn generate_with_meta(
        &self,
        level: usize,
        random_fill_percent: u32,
    ) -> Result<(Grid, CaveMeta), GenerateError> {
        let interior = self.generate_interior(level, random_fill_percent)?;
        let noise = TileNoise::new(self.min_value, self.max_value)?;
        let grid = self.add_border(&interior.grid, interior.seed_hash, &noise);
        log::debug!("Map generation for level {} completed", level);

        let meta = CaveMeta {
            level,
            seed: interior.seed,
            room_sizes: interior.rooms.rooms().iter().map(Room::size).collect(),
            passages: interior.rooms.passages(),
            wall_regions: interior.wall_regions,
            floor_regions: interior.floor_regions,
        };

        Ok((grid, meta))
    }

    fn generate_interior(
        &self,
        level: usize,
        random_fill_percent: u32,
    ) -> Result<CaveInterior, GenerateError> {
        self.validate()?;
        let roll = FillRoll::new(random_fill_percent)?;
        let noise = TileNoise::new(self.min_value, self.max_value)?;
        let seed = self.seeds.seed_for_level(level)?.to_string();
        let seed_hash = hash_seed(&seed);
        log::debug!(
            "Starting map generation for level {} (seed {:?}) with random fill percent {}",
            level,
            seed,
            random_fill_percent
        );

        let mut grid = self.random_fill(seed_hash, &roll);
        for pass in 0..self.smoothing_passes {
            grid = smooth(&grid);
            log::trace!("Smoothing pass {} completed", pass + 1);
        }

        let (rooms, wall_regions, floor_regions) = self.process_regions(&mut grid, seed_hash, &noise);
        let mut rooms = RoomGraph::new(rooms);
        connect_closest_rooms(&mut rooms, &mut grid, self.passage_radius);

        Ok(CaveInterior {
            grid,
            rooms,
            seed,
            seed_hash,
            wall_regions,
            floor_regions,
        })
    }

    /// The outer ring of the interior is always wall. Each remaining cell is wall with
    /// probability `percent / 100`.
    fn random_fill(&self, seed_hash: u64, roll: &FillRoll) -> Grid {
        let mut rng = small_rng(seed_hash);
        let mut grid = Grid::filled(self.width, self.height, WALL);
        for c in grid.coords().collect::<Vec<_>>() {
            if grid.is_on_edge(c) {
                continue;
            }
            let tile = if roll.sample(&mut rng) { WALL } else { FLOOR };
            grid.set(c, tile);
        }

        grid
    }

    /// Refills small wall regions, then small floor regions, with noise from a stream restarted
    /// at `seed_hash`. Floor regions that survive become rooms, in discovery order.
    ///
    /// Refill may put floor back into a pruned floor region. Such cells are not part of any room
    /// and stay smaller than `room_threshold`.
    fn process_regions(
        &self,
        grid: &mut Grid,
        seed_hash: u64,
        noise: &TileNoise,
    ) -> (Vec<Room>, RegionStats, RegionStats) {
        let mut rng = small_rng(seed_hash);

        let wall_regions = regions_of(grid, WALL);
        let wall_stats = region_stats(&wall_regions, self.wall_threshold);
        log::debug!("Wall regions: {:?}", wall_stats);
        for region in wall_regions.iter() {
            if region.len() < self.wall_threshold {
                for c in region.iter() {
                    grid.set(*c, noise.sample(&mut rng));
                }
                log::debug!("Removed small wall region of size {}", region.len());
            }
        }

        let floor_regions = regions_of(grid, FLOOR);
        let floor_stats = region_stats(&floor_regions, self.room_threshold);
        log::debug!("Floor regions: {:?}", floor_stats);
        let mut rooms = Vec::new();
        for region in floor_regions.into_iter() {
            if region.len() < self.room_threshold {
                for c in region.iter() {
                    grid.set(*c, noise.sample(&mut rng));
                }
                log::debug!("Removed small room region of size {}", region.len());
            } else {
                rooms.push(Room::new(region, grid));
            }
        }

        (rooms, wall_stats, floor_stats)
    }

    /// Surrounds `interior` with a ring of noise drawn from a stream restarted at `seed_hash`.
    fn add_border(&self, interior: &Grid, seed_hash: u64, noise: &TileNoise) -> Grid {
        let mut rng = small_rng(seed_hash);
        let (width, height) = self.bordered_dimensions();
        let b = self.border_size as i32;
        let mut bordered = Grid::filled(width, height, FLOOR);
        for c in bordered.coords().collect::<Vec<_>>() {
            let tile = match interior.get(c.offset(-b, -b)) {
                Some(t) => t,
                None => noise.sample(&mut rng),
            };
            bordered.set(c, tile);
        }

        bordered
    }
}

/// One cellular automata pass. A cell with more than 4 wall neighbors becomes wall, fewer than 4
/// becomes floor, exactly 4 keeps its value. Out-of-bounds neighbors count as walls.
pub fn smooth(grid: &Grid) -> Grid {
    let mut next = grid.clone();
    for c in grid.coords() {
        let walls = grid.wall_neighbor_count(c);
        if walls > 4 {
            next.set(c, WALL);
        } else if walls < 4 {
            next.set(c, FLOOR);
        }
    }

    next
}

/// First gives every unconnected room a passage to its nearest room, then keeps joining the
/// closest unreachable room to the reachable set until every room is reachable from the main
/// room or no candidate pair is left.
pub fn connect_closest_rooms(rooms: &mut RoomGraph, grid: &mut Grid, radius: i32) {
    let all: Vec<usize> = (0..rooms.len()).collect();
    for a in 0..rooms.len() {
        if rooms.connection_count(a) > 0 {
            continue;
        }
        if let Some(link) = rooms.closest_link(&[a], &all) {
            create_passage(rooms, grid, &link, radius);
        }
    }

    loop {
        let (reachable, unreachable) = rooms.partition_by_access();
        match rooms.closest_link(&unreachable, &reachable) {
            Some(link) => create_passage(rooms, grid, &link, radius),
            None => break,
        }
    }

    if !rooms.all_accessible() {
        log::warn!("Some rooms could not be connected to the main room");
    }
}

fn create_passage(rooms: &mut RoomGraph, grid: &mut Grid, link: &RoomLink, radius: i32) {
    rooms.connect(link.room_a, link.room_b, link.passage);
    for p in line(link.passage.from, link.passage.to) {
        carve_disc(grid, p, radius);
    }
    log::debug!(
        "Passage drawn between rooms at {:?} and {:?}",
        link.passage.from,
        link.passage.to
    );
}

fn carve_disc(grid: &mut Grid, center: Coord, radius: i32) {
    for c in disc(center, radius) {
        grid.set(c, FLOOR);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    fn small_spec() -> CaveMapSpec {
        CaveMapSpec {
            width: 48,
            height: 36,
            ..CaveMapSpec::default()
        }
    }

    fn grid(rows: &[&str]) -> Grid {
        let rows: Vec<Vec<Tile>> = rows
            .iter()
            .map(|r| r.chars().map(|ch| if ch == '#' { WALL } else { FLOOR }).collect())
            .collect();

        Grid::from_rows(&rows).unwrap()
    }

    fn rooms_of(grid: &Grid) -> RoomGraph {
        let rooms = regions_of(grid, FLOOR)
            .into_iter()
            .map(|r| Room::new(r, grid))
            .collect();

        RoomGraph::new(rooms)
    }

    fn carve_blocks(grid: &mut Grid, blocks: &[(i32, i32, i32, i32)]) {
        for &(x0, y0, w, h) in blocks.iter() {
            for x in x0..x0 + w {
                for y in y0..y0 + h {
                    grid.set(Coord::new(x, y), FLOOR);
                }
            }
        }
    }

    #[test]
    fn test_smooth_open_3x3() {
        let smoothed = smooth(&grid(&["...", "...", "..."]));

        assert_eq!(smoothed, grid(&["#.#", "...", "#.#"]));
    }

    #[test]
    fn test_smooth_keeps_cells_with_exactly_four_walls() {
        // The center sees exactly four walls.
        assert_eq!(smooth(&grid(&["##.", "#..", "#.."])).get(Coord::new(1, 1)), Some(FLOOR));
        assert_eq!(smooth(&grid(&["##.", "##.", "#.."])).get(Coord::new(1, 1)), Some(WALL));

        // Top edge cell: three out-of-bounds neighbors plus one wall.
        assert_eq!(smooth(&grid(&["#..", "...", "..."])).get(Coord::new(1, 0)), Some(FLOOR));
        assert_eq!(smooth(&grid(&["##.", "...", "..."])).get(Coord::new(1, 0)), Some(WALL));
    }

    #[test]
    fn test_smooth_reads_previous_pass_only() {
        // Updating in place would let the new wall at (0, 0) feed into (1, 0).
        let g = grid(&[".#..", "....", "#..."]);
        let smoothed = smooth(&g);

        assert_eq!(smoothed.get(Coord::new(0, 0)), Some(WALL));
        assert_eq!(smoothed.get(Coord::new(1, 0)), Some(FLOOR));
    }

    proptest! {
        #[test]
        fn smooth_follows_neighbor_rule(
            cells in proptest::collection::vec(proptest::bool::ANY, 1..64),
            width in 1usize..9,
        ) {
            let height = (cells.len() + width - 1) / width;
            let mut g = Grid::filled(width, height, FLOOR);
            for (i, wall) in cells.iter().enumerate() {
                if *wall {
                    g.set(Coord::new((i % width) as i32, (i / width) as i32), WALL);
                }
            }

            let smoothed = smooth(&g);
            for c in g.coords() {
                let walls = g.wall_neighbor_count(c);
                let expected = if walls > 4 {
                    WALL
                } else if walls < 4 {
                    FLOOR
                } else {
                    g.get(c).unwrap()
                };
                prop_assert_eq!(smoothed.get(c), Some(expected));
            }
        }
    }

    #[test]
    fn test_random_fill_extremes() {
        let spec = small_spec();
        let empty = spec.random_fill(hash_seed("sas"), &FillRoll::new(0).unwrap());
        let full = spec.random_fill(hash_seed("sas"), &FillRoll::new(100).unwrap());

        let ring = 2 * (spec.width + spec.height) - 4;
        assert_eq!(empty.count(WALL), ring);
        assert!(empty.coords().filter(|c| empty.is_on_edge(*c)).all(|c| empty.is_wall(c)));
        assert_eq!(full.count(WALL), spec.width * spec.height);
    }

    #[test]
    fn test_generation_is_deterministic() {
        let spec = small_spec();
        for level in 0..3 {
            let (a, meta_a) = spec.generate_with_meta(level, 45).unwrap();
            let (b, meta_b) = spec.generate_with_meta(level, 45).unwrap();
            assert_eq!(a, b);
            assert_eq!(meta_a, meta_b);
        }

        assert_ne!(spec.generate(0, 45).unwrap(), spec.generate(1, 45).unwrap());
    }

    #[test]
    fn test_border_ring_holds_noise_in_range() {
        let spec = CaveMapSpec {
            min_value: 1,
            max_value: 4,
            ..small_spec()
        };
        let map = spec.generate(2, 45).unwrap();
        let (width, height) = spec.bordered_dimensions();

        assert_eq!(map.dimensions(), (width, height));
        for c in map.coords() {
            let in_ring = c.x < 1 || c.y < 1 || c.x >= width as i32 - 1 || c.y >= height as i32 - 1;
            if in_ring {
                let t = map.get(c).unwrap();
                assert!(t >= 1 && t < 4, "{:?} holds {}", c, t);
            }
        }
    }

    #[test]
    fn test_border_wraps_interior_verbatim() {
        let spec = small_spec();
        let interior = spec.generate_interior(4, 45).unwrap();
        let map = spec.generate(4, 45).unwrap();

        for c in interior.grid.coords() {
            assert_eq!(map.get(c.offset(1, 1)), interior.grid.get(c));
        }
    }

    #[test]
    fn test_empty_fill_yields_one_room() {
        let spec = CaveMapSpec::default();
        let interior = spec.generate_interior(0, 0).unwrap();

        assert_eq!(interior.rooms.len(), 1);
        assert!(interior.rooms.passages().is_empty());
        assert!(interior.rooms.room(0).is_main);
        assert_eq!(regions_of(&interior.grid, FLOOR).len(), 1);
        assert_eq!(regions_of(&interior.grid, WALL).len(), 1);
        let g = &interior.grid;
        assert!(g.coords().filter(|c| g.is_on_edge(*c)).all(|c| g.is_wall(c)));
        assert_eq!(interior.rooms.room(0).size(), g.count(FLOOR));
    }

    #[test]
    fn test_full_fill_yields_solid_rock() {
        let spec = small_spec();
        let interior = spec.generate_interior(0, 100).unwrap();
        let (map, meta) = spec.generate_with_meta(0, 100).unwrap();

        assert!(interior.rooms.is_empty());
        assert_eq!(interior.grid.count(WALL), spec.width * spec.height);
        assert!(meta.room_sizes.is_empty());
        assert!(meta.passages.is_empty());
        assert!(regions_of(&map, FLOOR).iter().all(|r| r.len() < 50 || r.iter().any(|c| {
            c.x == 0 || c.y == 0 || c.x as usize == map.width() - 1 || c.y as usize == map.height() - 1
        })));
    }

    #[test]
    fn test_every_room_is_reachable_after_connecting() {
        let spec = CaveMapSpec::default();
        for level in 0..spec.level_count() {
            let interior = spec.generate_interior(level, 45).unwrap();
            let rooms = &interior.rooms;
            if rooms.is_empty() {
                continue;
            }

            assert!(rooms.all_accessible(), "level {}", level);
            assert_eq!(rooms.component_count(), 1, "level {}", level);

            let main_tile = rooms.room(0).tiles[0];
            let floor_regions = regions_of(&interior.grid, FLOOR);
            let main_region = floor_regions
                .iter()
                .find(|r| r.contains(&main_tile))
                .unwrap();
            for room in rooms.rooms() {
                for t in room.tiles.iter() {
                    assert!(main_region.contains(t), "level {}: {:?} is cut off", level, t);
                }
            }
        }
    }

    #[test]
    fn test_floor_outside_the_main_cave_is_a_pruned_leftover() {
        let spec = CaveMapSpec::default();
        for level in 0..spec.level_count() {
            let interior = spec.generate_interior(level, 45).unwrap();
            let floor_regions = regions_of(&interior.grid, FLOOR);
            let main_tile = interior.rooms.rooms().first().map(|r| r.tiles[0]);

            let mut covered = 0;
            for region in floor_regions.iter() {
                covered += region.len();
                if main_tile.map_or(false, |t| region.contains(&t)) {
                    continue;
                }
                assert!(
                    region.len() < spec.room_threshold,
                    "level {}: detached floor region of size {} at {:?}",
                    level,
                    region.len(),
                    region[0]
                );
            }
            assert_eq!(covered, interior.grid.count(FLOOR), "level {}", level);
        }
    }

    #[test]
    fn test_border_ring_restarts_the_seed_stream() {
        let spec = CaveMapSpec {
            min_value: 2,
            max_value: 9,
            ..small_spec()
        };
        let map = spec.generate(0, 45).unwrap();
        let (width, height) = spec.bordered_dimensions();
        let ring: Vec<Tile> = map
            .coords()
            .filter(|c| {
                c.x == 0 || c.y == 0 || c.x as usize == width - 1 || c.y as usize == height - 1
            })
            .map(|c| map.get(c).unwrap())
            .collect();

        let noise = TileNoise::new(2, 9).unwrap();
        let draws: Vec<Tile> = noise
            .sample_iter(small_rng(hash_seed("sas")))
            .take(ring.len())
            .collect();
        assert_eq!(ring, draws);
    }

    #[test]
    fn test_prune_refill_restarts_once_and_continues_into_floor_pass() {
        // Left half open with a small wall blob; right half rock with a small floor pocket.
        let mut g = Grid::filled(30, 20, WALL);
        carve_blocks(&mut g, &[(0, 0, 15, 20), (20, 8, 3, 3)]);
        for &(x, y) in [(5, 5), (5, 6), (6, 5), (6, 6)].iter() {
            g.set(Coord::new(x, y), WALL);
        }
        let blob = regions_of(&g, WALL).remove(0);
        let pocket = regions_of(&g, FLOOR).remove(1);
        assert_eq!((blob.len(), pocket.len()), (4, 9));

        let spec = CaveMapSpec {
            min_value: 2,
            max_value: 9,
            ..CaveMapSpec::default()
        };
        let seed_hash = hash_seed("sas");
        let noise = TileNoise::new(2, 9).unwrap();
        let (rooms, _, _) = spec.process_regions(&mut g, seed_hash, &noise);

        let draws: Vec<Tile> = noise.sample_iter(small_rng(seed_hash)).take(13).collect();
        let refilled: Vec<Tile> = blob
            .iter()
            .chain(pocket.iter())
            .map(|c| g.get(*c).unwrap())
            .collect();
        assert_eq!(refilled, draws);
        assert_eq!(rooms.len(), 1);
        assert_eq!(rooms[0].size(), 15 * 20 - 4);
    }

    #[test]
    fn test_no_small_wall_regions_survive_pruning() {
        let spec = CaveMapSpec::default();
        for level in 0..4 {
            let seed_hash = hash_seed(spec.seeds.seed_for_level(level).unwrap());
            let mut g = spec.random_fill(seed_hash, &FillRoll::new(45).unwrap());
            for _ in 0..spec.smoothing_passes {
                g = smooth(&g);
            }
            let noise = TileNoise::new(spec.min_value, spec.max_value).unwrap();
            let (rooms, _, _) = spec.process_regions(&mut g, seed_hash, &noise);

            assert!(regions_of(&g, WALL).iter().all(|r| r.len() >= spec.wall_threshold));
            assert!(rooms.iter().all(|r| r.size() >= spec.room_threshold));
        }
    }

    #[test]
    fn test_greedy_pass_links_each_unconnected_room_once() {
        let mut g = Grid::filled(40, 12, WALL);
        carve_blocks(&mut g, &[(1, 1, 5, 5), (12, 1, 5, 5), (30, 1, 5, 5)]);
        let mut rooms = rooms_of(&g);

        connect_closest_rooms(&mut rooms, &mut g, 1);

        let passages = rooms.passages();
        assert_eq!(passages.len(), 2);
        assert_eq!((passages[0].from.x, passages[0].to.x), (5, 12));
        assert_eq!(passages[0].from.y, passages[0].to.y);
        assert_eq!((passages[1].from.x, passages[1].to.x), (30, 16));
        assert!(rooms.all_accessible());
        assert_eq!(regions_of(&g, FLOOR).len(), 1);
    }

    #[test]
    fn test_forced_pass_joins_separate_clusters() {
        let mut g = Grid::filled(60, 12, WALL);
        carve_blocks(
            &mut g,
            &[(1, 1, 6, 6), (10, 1, 5, 5), (35, 1, 5, 5), (44, 1, 5, 5)],
        );
        let mut rooms = rooms_of(&g);

        connect_closest_rooms(&mut rooms, &mut g, 5);

        let passages = rooms.passages();
        assert_eq!(passages.len(), 3);
        assert_eq!((passages[1].from.x, passages[1].to.x), (39, 44));
        assert_eq!((passages[2].from.x, passages[2].to.x), (35, 14));
        assert!(rooms.all_accessible());
        assert_eq!(rooms.component_count(), 1);
        assert_eq!(regions_of(&g, FLOOR).len(), 1);
    }

    #[test]
    fn test_single_room_needs_no_passage() {
        let mut g = Grid::filled(20, 20, WALL);
        carve_blocks(&mut g, &[(2, 2, 10, 10)]);
        let before = g.clone();
        let mut rooms = rooms_of(&g);

        connect_closest_rooms(&mut rooms, &mut g, 5);

        assert!(rooms.passages().is_empty());
        assert_eq!(g, before);
    }

    #[test]
    fn test_bad_inputs_are_rejected() {
        let spec = small_spec();

        match spec.generate(spec.level_count(), 40) {
            Err(GenerateError::LevelOutOfRange { .. }) => {}
            other => panic!("expected LevelOutOfRange, got {:?}", other),
        }
        match spec.generate(0, 101) {
            Err(GenerateError::FillPercentOutOfRange(101)) => {}
            other => panic!("expected FillPercentOutOfRange, got {:?}", other),
        }

        let flat = CaveMapSpec {
            height: 0,
            ..small_spec()
        };
        assert!(matches!(flat.generate(0, 40), Err(GenerateError::EmptyGrid { .. })));

        let inverted = CaveMapSpec {
            min_value: 3,
            max_value: 1,
            ..small_spec()
        };
        assert!(matches!(
            inverted.generate(0, 40),
            Err(GenerateError::InvalidTileRange { .. })
        ));
    }

    #[test]
    fn test_spec_from_ron_fills_defaults() {
        let spec = CaveMapSpec::from_ron("(width: 30, height: 20, seeds: [\"abc\"])").unwrap();

        assert_eq!((spec.width, spec.height), (30, 20));
        assert_eq!(spec.smoothing_passes, 5);
        assert_eq!(spec.passage_radius, 5);
        assert_eq!(spec.level_count(), 1);
        assert_eq!(spec.bordered_dimensions(), (32, 22));

        assert!(matches!(
            CaveMapSpec::from_ron("(width: \"wide\")"),
            Err(GenerateError::Config(_))
        ));
        assert!(matches!(
            CaveMapSpec::from_ron("(width: 0)"),
            Err(GenerateError::EmptyGrid { .. })
        ));
    }
}
