//! Error types for grid processing.

use netcdf_parser::NetCdfError;
use thiserror::Error;

/// Errors that can occur while building geometry from a dataset.
///
/// Per-cell projection failures are not errors: the affected cell simply has
/// no polygon.
#[derive(Error, Debug)]
pub enum GridProcessorError {
    /// Decoding failed or a named variable/attribute is missing.
    #[error(transparent)]
    NetCdf(#[from] NetCdfError),

    /// The request cannot be satisfied by the dataset's layout.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A required axis, variable or value is absent.
    #[error("not found: {0}")]
    Lookup(String),

    /// Projection could not produce usable output for the whole dataset.
    #[error("projection error: {0}")]
    Projection(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Serialization of a transferable structure failed.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl GridProcessorError {
    /// Create a Validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a Lookup error.
    pub fn lookup(msg: impl Into<String>) -> Self {
        Self::Lookup(msg.into())
    }

    /// Create a Projection error.
    pub fn projection(msg: impl Into<String>) -> Self {
        Self::Projection(msg.into())
    }

    /// Whether this error is a validation failure.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<serde_json::Error> for GridProcessorError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type for grid processor operations.
pub type Result<T> = std::result::Result<T, GridProcessorError>;
