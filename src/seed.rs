use crate::GenerateError;

use fnv::FnvHasher;
use serde::{Deserialize, Serialize};
use std::hash::Hasher;

pub const DEFAULT_SEEDS: [&str; 11] = [
    "sas", "a2", "sa2", "sd4", "23", "43", "123", "34", "vc", "czd", "trw",
];

/// One seed string per level.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SeedPool(pub Vec<String>);

impl Default for SeedPool {
    fn default() -> Self {
        SeedPool(DEFAULT_SEEDS.iter().map(|s| s.to_string()).collect())
    }
}

impl SeedPool {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn seed_for_level(&self, level: usize) -> Result<&str, GenerateError> {
        self.0
            .get(level)
            .map(String::as_str)
            .ok_or(GenerateError::LevelOutOfRange {
                level,
                levels: self.len(),
            })
    }
}

/// 64-bit FNV-1a over the UTF-8 bytes of `seed`. Stable across runs and platforms.
pub fn hash_seed(seed: &str) -> u64 {
    let mut hasher = FnvHasher::default();
    hasher.write(seed.as_bytes());

    hasher.finish()
}
