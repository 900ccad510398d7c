use crate::{GenerateError, Tile};

use rand::{rngs::SmallRng, SeedableRng};
use rand_distr::{Distribution, Uniform};

/// Every random stream used by one generation call is built here, so two calls with the same
/// seed hash see the same numbers.
pub fn small_rng(seed_hash: u64) -> SmallRng {
    SmallRng::seed_from_u64(seed_hash)
}

/// Rolls whether an interior cell starts as a wall, with probability `percent / 100`.
pub struct FillRoll {
    percent: u32,
    roll: Uniform<u32>,
}

impl FillRoll {
    pub fn new(percent: u32) -> Result<Self, GenerateError> {
        if percent > 100 {
            return Err(GenerateError::FillPercentOutOfRange(percent));
        }

        Ok(FillRoll {
            percent,
            roll: Uniform::from(0..100),
        })
    }
}

impl Distribution<bool> for FillRoll {
    fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> bool {
        self.roll.sample(rng) < self.percent
    }
}

/// Uniform tile values in `[min, max)`. An empty range always yields `min`.
#[derive(Clone, Copy, Debug)]
pub struct TileNoise {
    min: Tile,
    range: Option<Uniform<Tile>>,
}

impl TileNoise {
    pub fn new(min: Tile, max: Tile) -> Result<Self, GenerateError> {
        if max < min {
            return Err(GenerateError::InvalidTileRange { min, max });
        }

        let range = if max > min {
            Some(Uniform::new(min, max))
        } else {
            None
        };

        Ok(TileNoise { min, range })
    }
}

impl Distribution<Tile> for TileNoise {
    fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> Tile {
        match &self.range {
            Some(range) => range.sample(rng),
            None => self.min,
        }
    }
}
