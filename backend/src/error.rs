//! Error types for the csvmap pipeline.
//!
//! Malformed CSV content never produces an error: it is reported as warning
//! strings on the [`crate::models::Table`] and as skip counters on the derived
//! feature set. The types below only cover the outer surfaces:
//!
//! - [`SourceError`] - reading raw text from a file or URL
//! - [`ConfigError`] - environment and timeline configuration
//! - [`SessionError`] - multi-file session bookkeeping
//! - [`PipelineError`] - top-level orchestration
//!
//! Conversion is automatic via `From` implementations, so `?` works across
//! boundaries.

use thiserror::Error;

// =============================================================================
// Source Errors
// =============================================================================

/// Errors while obtaining the raw CSV text.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Network request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status.
    #[error("HTTP {status} while fetching {url}")]
    HttpStatus { url: String, status: u16 },
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable holds an unusable value.
    #[error("Invalid value for {name}: '{value}'")]
    InvalidEnv { name: String, value: String },

    /// Timeline file could not be read.
    #[error("Cannot read timeline file: {0}")]
    Io(#[from] std::io::Error),

    /// Timeline JSON is malformed.
    #[error("Invalid timeline JSON: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Session Errors
// =============================================================================

/// Errors from the multi-file session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Session already holds the maximum number of files.
    #[error("Session already holds {limit} files")]
    TooManyFiles { limit: usize },

    /// No file with this id.
    #[error("File not found in session: {0}")]
    UnknownFile(String),

    /// Field override names a column the file does not have.
    #[error("Column '{column}' does not exist in '{file}'")]
    UnknownColumn { file: String, column: String },
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline errors.
///
/// Returned by the async entry points in [`crate::transform::pipeline`] and
/// by the CLI. Parsing and derivation themselves are infallible.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Source read error.
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Session error.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for source operations.
pub type SourceResult<T> = Result<T, SourceError>;

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // SessionError -> PipelineError
        let session_err = SessionError::TooManyFiles { limit: 10 };
        let pipeline_err: PipelineError = session_err.into();
        assert!(pipeline_err.to_string().contains("10 files"));

        // SourceError -> PipelineError
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.csv");
        let pipeline_err: PipelineError = SourceError::from(io).into();
        assert!(pipeline_err.to_string().contains("missing.csv"));
    }

    #[test]
    fn test_unknown_column_format() {
        let err = SessionError::UnknownColumn {
            file: "sites.csv".into(),
            column: "breddgrad".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("sites.csv"));
        assert!(msg.contains("breddgrad"));
    }

    #[test]
    fn test_invalid_env_format() {
        let err = ConfigError::InvalidEnv {
            name: "CSVMAP_MAX_FILES".into(),
            value: "many".into(),
        };
        assert_eq!(err.to_string(), "Invalid value for CSVMAP_MAX_FILES: 'many'");
    }
}
