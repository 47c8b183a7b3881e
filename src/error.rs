use std::io;

use thiserror::Error;

/// Result alias used throughout the cache.
pub type Result<T> = std::result::Result<T, CacheError>;

/// Errors surfaced to callers of the cache.
///
/// Structural anomalies in result data (mixed lists, half-formed entities) are
/// never errors; they degrade locally and are reported as
/// [`crate::NormalizeWarning`]s instead.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Variables or an entity identifier could not be canonically encoded.
    #[error("cannot build cache key: {0}")]
    Unserializable(String),
    /// The top-level result data was not a field-keyed record.
    #[error("invalid result data: {0}")]
    InvalidResultData(&'static str),
    /// Options file or TOML payload was rejected.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// I/O failure while reading configuration.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl CacheError {
    pub(crate) fn unserializable(detail: impl Into<String>) -> Self {
        CacheError::Unserializable(detail.into())
    }

    /// Returns a machine-readable code for the error variant.
    pub fn code(&self) -> &'static str {
        match self {
            CacheError::Unserializable(_) => "Unserializable",
            CacheError::InvalidResultData(_) => "InvalidResultData",
            CacheError::Config(_) => "Config",
            CacheError::Io(_) => "Io",
        }
    }
}
