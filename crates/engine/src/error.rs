//! Error types for the engine crate.

use data_loader::DataLoadError;
use pipeline::NutritionError;
use thiserror::Error;

/// Errors surfaced by the recommendation engine.
///
/// "Unknown user" and "no signal" are not errors; they come back as
/// `scorers::Outcome` markers.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Catalog could not be loaded or failed validation
    #[error(transparent)]
    Data(#[from] DataLoadError),

    /// Calorie ceiling rejected before scoring
    #[error(transparent)]
    Nutrition(#[from] NutritionError),

    /// Engine configuration is inconsistent
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Request cannot be served as asked, e.g. a personalized strategy with no user
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Snapshot or config file could not be read or written
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Snapshot or config file is not valid JSON for the expected shape
    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Snapshot written by an incompatible format version
    #[error("Unsupported snapshot version {found} (expected {expected})")]
    SnapshotVersion { found: u32, expected: u32 },

    /// Building the user context or a request filter failed
    #[error("Request pipeline failed: {0}")]
    Pipeline(#[from] anyhow::Error),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, EngineError>;
