//! Error types for the roas_forecast crate

use crate::registry::ModelKey;
use polars::prelude::PolarsError;
use thiserror::Error;

/// Custom error types for the roas_forecast crate
#[derive(Debug, Error)]
pub enum RoasError {
    /// No recognized ROAS observation column present in the input (fatal)
    #[error("no ROAS observation columns found in the input data")]
    NoObservationWindow,

    /// A mandatory input column is absent, or preprocessing left no rows (fatal)
    #[error("mandatory input missing: {0}")]
    MissingMandatoryColumn(String),

    /// No predictor registered for a model key (recoverable per target)
    #[error("no model registered for key {0}")]
    ModelNotFound(ModelKey),

    /// Feature column(s) required by a predictor are absent (recoverable per target)
    #[error("missing feature column(s): {}", .columns.join(", "))]
    MissingFeature {
        /// Names of the absent columns
        columns: Vec<String>,
    },

    /// Error related to data validation or processing
    #[error("data error: {0}")]
    Data(String),

    /// Error from invalid parameters
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from model artifact deserialization
    #[error("artifact error: {0}")]
    Artifact(#[from] serde_json::Error),

    /// Error from Polars operations
    #[error("polars error: {0}")]
    Polars(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, RoasError>;

impl From<PolarsError> for RoasError {
    fn from(err: PolarsError) -> Self {
        RoasError::Polars(err.to_string())
    }
}
