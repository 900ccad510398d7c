use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("level {level} is outside the seed pool (0..{levels})")]
    LevelOutOfRange { level: usize, levels: usize },

    #[error("random fill percent {0} is not in 0..=100")]
    FillPercentOutOfRange(u32),

    #[error("grid must have a nonzero size, got {width}x{height}")]
    EmptyGrid { width: usize, height: usize },

    #[error("tile noise range is empty: max {max} < min {min}")]
    InvalidTileRange { min: i32, max: i32 },

    #[error("seed pool is empty")]
    EmptySeedPool,

    #[error("map is {found:?} but this board expects {expected:?}")]
    MapSizeMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("bad cave map spec: {0}")]
    Config(#[from] ron::Error),
}
