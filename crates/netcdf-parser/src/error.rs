//! Error types for NetCDF decoding.

use thiserror::Error;

/// Result type for NetCDF parser operations.
pub type NetCdfResult<T> = Result<T, NetCdfError>;

/// Errors raised while decoding a NetCDF-3 buffer.
#[derive(Error, Debug)]
pub enum NetCdfError {
    /// Malformed file: bad magic, version, tag, type code or truncated buffer.
    #[error("invalid NetCDF format: {0}")]
    Format(String),

    /// A size or offset the decoder cannot represent.
    #[error("value out of supported range: {0}")]
    Range(String),

    /// Named variable or attribute is absent.
    #[error("not found: {0}")]
    Lookup(String),

    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl NetCdfError {
    pub fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    pub fn range(msg: impl Into<String>) -> Self {
        Self::Range(msg.into())
    }

    pub fn lookup(msg: impl Into<String>) -> Self {
        Self::Lookup(msg.into())
    }
}
