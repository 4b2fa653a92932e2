use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Errors {
    #[error("Match threshold must lay in (0.0, 1.0], got {0}.")]
    InvalidThreshold(f32),
    #[error("Counting strip ({0}, {1}) must lay in [0.0, 1.0] and be ordered.")]
    InvalidStrip(f32, f32),
    #[error("Image size {0}x{1} must be positive.")]
    InvalidImageSize(f32, f32),
    #[error("Recognition engine failed: {0}")]
    EngineFailure(String),
    #[error("Recognition engine result cannot be decoded: {0}")]
    MalformedEngineResult(String),
}

pub(crate) const EPS: f32 = 0.00001;

/// Geometry utilities
pub mod utils;

/// Vehicle tracking and counting
pub mod trackers;

/// Recognition engine results to detections
pub mod adapter;

/// Frame loop with limits, interruption and final flush
pub mod session;

pub mod prelude;

/// Synthetic detections for tests and benchmarks
pub mod test_stuff;
