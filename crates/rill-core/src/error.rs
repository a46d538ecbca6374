use thiserror::Error;

/// Configuration errors detected before any simulation state is touched.
///
/// The simulator itself has no recoverable failure modes once running;
/// everything here is a caller bug surfaced at `reset` time instead of as
/// NaNs several thousand ticks later.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("grid dimensions must be at least 2×2 and at most 2^26 cells, got {width}×{height}")]
    InvalidDimensions { width: usize, height: usize },
    #[error("parameter `{name}` must be finite, got {value}")]
    NonFinite { name: &'static str, value: f64 },
    #[error("parameter `{name}` = {value} is outside {expected}")]
    OutOfRange {
        name: &'static str,
        value: f64,
        expected: &'static str,
    },
    #[error("grid `{name}` has {actual} cells, expected {expected}")]
    GridMismatch {
        name: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("invalid parameter JSON: {0}")]
    Json(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Json(e.to_string())
    }
}
