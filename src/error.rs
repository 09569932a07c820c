//! Error types for the car price pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, CarPriceError>;

/// Main error type for cleaning, encoding replay and prediction
#[derive(Error, Debug)]
pub enum CarPriceError {
    /// A raw field could not be converted to its numeric form
    #[error("Parse error in '{field}': cannot interpret {value:?}")]
    Parse { field: String, value: String },

    /// A nominal value was not part of the vocabulary learned at fit time
    #[error("Unknown category in '{field}': {value:?} was not seen during training")]
    UnknownCategory { field: String, value: String },

    /// The assembled feature row does not match the model schema
    #[error("Schema mismatch: expected {expected}, got {actual}")]
    SchemaMismatch { expected: String, actual: String },

    /// A fitted artifact failed to load or is inconsistent
    #[error("Failed to load artifact {path}: {reason}")]
    ArtifactLoad { path: String, reason: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Column not found: {0}")]
    MissingColumn(String),

    #[error("Data error: {0}")]
    Data(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CarPriceError {
    /// Build a parse error for a field/value pair
    pub fn parse(field: impl Into<String>, value: impl Into<String>) -> Self {
        CarPriceError::Parse {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Build an unknown-category error for a field/value pair
    pub fn unknown_category(field: impl Into<String>, value: impl Into<String>) -> Self {
        CarPriceError::UnknownCategory {
            field: field.into(),
            value: value.into(),
        }
    }

    /// True when the error was caused by the caller's input rather than by
    /// a broken training/inference contract.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            CarPriceError::Parse { .. }
                | CarPriceError::UnknownCategory { .. }
                | CarPriceError::Validation(_)
                | CarPriceError::MissingColumn(_)
        )
    }
}

impl From<polars::error::PolarsError> for CarPriceError {
    fn from(err: polars::error::PolarsError) -> Self {
        CarPriceError::Data(err.to_string())
    }
}

impl From<serde_json::Error> for CarPriceError {
    fn from(err: serde_json::Error) -> Self {
        CarPriceError::Serialization(err.to_string())
    }
}

impl From<ndarray::ShapeError> for CarPriceError {
    fn from(err: ndarray::ShapeError) -> Self {
        CarPriceError::SchemaMismatch {
            expected: "valid feature matrix shape".to_string(),
            actual: err.to_string(),
        }
    }
}
