use thiserror::Error;

use crate::grid::Pos;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("grid size {0} is too small (need at least 3)")]
    GridTooSmall(usize),
    #[error("grid size {size} exceeds the limit of {max}")]
    GridTooLarge { size: usize, max: usize },
    #[error("time step budget {0} is too small (need at least 2)")]
    StepBudget(usize),
    #[error("time step budget {steps} exceeds the limit of {max}")]
    StepBudgetTooLarge { steps: usize, max: usize },
    #[error("{name} must be finite and non-negative, got {value}")]
    InvalidFactor { name: &'static str, value: f32 },
    #[error("path tracing would need {bytes} bytes, limit is {max}")]
    TraceTooLarge { bytes: usize, max: usize },
    #[error("ship threshold must lie in (0, 1], got {0}")]
    ShipThreshold(f32),
    #[error("malformed parameters: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ProblemError {
    #[error("{what} is {w}x{h}, expected {n}x{n}")]
    Dimensions {
        what: &'static str,
        w: usize,
        h: usize,
        n: usize,
    },
    #[error("{what} {pos:?} lies outside the {n}x{n} grid")]
    OutOfBounds { what: &'static str, pos: Pos, n: usize },
    #[error("{what} contains a non-finite value at ({x}, {y})")]
    NonFinite { what: &'static str, x: usize, y: usize },
}

#[derive(Debug, Error)]
pub enum SolveError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Problem(#[from] ProblemError),
    #[error("failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}
