use crate::{grid::Grid, CaveMapSpec, GenerateError, TileEncoder, FLOOR};

/// Wall probability used whenever the board generates a fresh map.
pub const DEFAULT_FILL_PERCENT: u32 = 40;

/// Owns the map for the current level and hands its occupied cells to a `TileEncoder`.
pub struct Board {
    spec: CaveMapSpec,
    level: usize,
    current_map: Option<Grid>,
}

impl Board {
    pub fn new(spec: CaveMapSpec, level: usize) -> Self {
        Board {
            spec,
            level,
            current_map: None,
        }
    }

    pub fn spec(&self) -> &CaveMapSpec {
        &self.spec
    }

    pub fn level(&self) -> usize {
        self.level
    }

    /// Takes effect on the next `create_map(None, ..)`.
    pub fn set_level(&mut self, level: usize) {
        self.level = level;
    }

    pub fn current_map(&self) -> Option<&Grid> {
        self.current_map.as_ref()
    }

    /// Uses `existing` verbatim when loading a saved map, otherwise generates one for the current
    /// level. Every non-floor cell of the result is then written into `encoder`.
    pub fn create_map(
        &mut self,
        existing: Option<Grid>,
        encoder: &mut impl TileEncoder,
    ) -> Result<&Grid, GenerateError> {
        let map = match existing {
            Some(map) => {
                let expected = self.spec.bordered_dimensions();
                if map.dimensions() != expected {
                    return Err(GenerateError::MapSizeMismatch {
                        expected,
                        found: map.dimensions(),
                    });
                }
                log::debug!("Using existing map for level {}", self.level);
                map
            }
            None => {
                log::debug!("Generating new map for level {}", self.level);
                self.spec.generate(self.level, DEFAULT_FILL_PERCENT)?
            }
        };

        encoder.clear_tiles();
        for c in map.coords() {
            match map.get(c) {
                Some(tile) if tile != FLOOR => encoder.encode_tile(&c, tile),
                _ => {}
            }
        }

        Ok(self.current_map.insert(map))
    }
}
