//! Error types for the rimeflow aggregation pipeline.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`SourceError`] - Record source (fetch + decode) errors
//! - [`ConfigError`] - Field configuration errors
//! - [`ViewerError`] - Viewer orchestration errors
//! - [`ServerError`] - HTTP server errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.
//!
//! Per-record conditions (a row missing its endpoint fields, or missing its
//! label field) are deliberately *not* errors: the engine skips or
//! substitutes per row and never aborts a run for them.

use thiserror::Error;

// =============================================================================
// Record Source Errors
// =============================================================================

/// Errors while fetching and decoding a table.
///
/// All variants are fatal to the load attempt: no partial record
/// sequence is ever produced.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Failed to read the underlying bytes from disk.
    #[error("Failed to read table: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to fetch the underlying bytes over HTTP.
    #[error("Failed to fetch table: {0}")]
    Http(#[from] reqwest::Error),

    /// Bytes retrieved but not a valid table.
    #[error("Invalid table format: {0}")]
    Decode(String),

    /// Table has a header but no data rows, or no content at all.
    #[error("Table is empty")]
    EmptyTable,

    /// No header row found.
    #[error("No headers found in table")]
    NoHeaders,
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors in the field-name configuration handed to the engine.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required field name is empty.
    #[error("Field name for '{0}' must not be empty")]
    EmptyFieldName(&'static str),

    /// Source and target read from the same column.
    #[error("Source and target fields must differ (both are '{0}')")]
    SameEndpointFields(String),

    /// Identical role suffixes would collapse the two node namespaces.
    #[error("Source and target suffixes must differ (both are '{0}')")]
    SameSuffixes(String),
}

// =============================================================================
// Viewer Errors
// =============================================================================

/// Errors surfaced by the viewer when a data source selection fails.
#[derive(Debug, Error)]
pub enum ViewerError {
    /// The record source failed; previous visuals stay on screen.
    #[error("Load failed: {0}")]
    Source(#[from] SourceError),

    /// The requested location is not one of the known data sources.
    #[error("Unknown data source: {0}")]
    UnknownSource(String),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Record source error while serving a chart request.
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// The requested data source is not registered.
    #[error("Unknown data source: {0}")]
    UnknownSource(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for record source operations.
pub type SourceResult<T> = Result<T, SourceError>;

/// Result type for configuration validation.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for viewer operations.
pub type ViewerResult<T> = Result<T, ViewerError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // SourceError -> ViewerError
        let src_err = SourceError::EmptyTable;
        let viewer_err: ViewerError = src_err.into();
        assert!(viewer_err.to_string().contains("empty"));

        // SourceError -> ServerError
        let src_err = SourceError::NoHeaders;
        let server_err: ServerError = src_err.into();
        assert!(server_err.to_string().contains("headers"));
    }

    #[test]
    fn test_config_error_format() {
        let err = ConfigError::SameEndpointFields("上古韵部".into());
        let msg = err.to_string();
        assert!(msg.contains("must differ"));
        assert!(msg.contains("上古韵部"));
    }
}
