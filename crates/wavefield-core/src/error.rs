//! Error types for wavefield-core.

use thiserror::Error;

/// Errors raised while constructing or configuring the simulation.
#[derive(Error, Debug)]
pub enum CoreError {
    /// The particle pool was configured with zero capacity.
    #[error("particle pool capacity must be greater than zero")]
    ZeroCapacity,

    /// The pool does not fit in the configured particle grid.
    #[error("pool capacity {capacity} exceeds particle grid capacity {grid_capacity}")]
    PoolExceedsGrid {
        capacity: usize,
        grid_capacity: usize,
    },

    /// A texture dimension was configured as zero.
    #[error("{name} must be greater than zero")]
    ZeroDimension { name: &'static str },

    /// A kinematic bound was configured as non-positive.
    #[error("{name} must be positive, got {value}")]
    NonPositiveBound { name: &'static str, value: f32 },

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// A specialized Result type for wavefield-core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
