//! Core error types for serendipity-core.
//!
//! Only [`CoreError::ProfileNotFound`] aborts a ranking run. Fetch and parse
//! failures are recovered where they happen and reported through `tracing`.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for serendipity-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// The requested user has no profile in the store
    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    /// Network or HTTP failure while fetching an event source
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Parse failure on a scraped field
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// One or more sources failed; the run still carries what succeeded
    #[error("{failed} of {total} event sources failed")]
    AggregationPartialFailure { failed: usize, total: usize },

    /// Profile store failure (lock poisoned, persistence failed)
    #[error("Profile store error: {0}")]
    Store(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by the fetch collaborator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    /// Server answered with a non-2xx status
    #[error("HTTP {status} from {url}")]
    Http { url: String, status: u16 },

    /// Connection, TLS or body read failure
    #[error("Transport failure for {url}: {message}")]
    Transport { url: String, message: String },

    /// Source did not answer within the per-source timeout
    #[error("Timed out after {secs}s fetching {url}")]
    Timeout { url: String, secs: u64 },

    /// The scraping task itself failed (panicked or was cancelled)
    #[error("Extraction failed for {url}: {message}")]
    Extract { url: String, message: String },
}

impl FetchError {
    /// URL of the source that failed.
    pub fn url(&self) -> &str {
        match self {
            FetchError::Http { url, .. }
            | FetchError::Transport { url, .. }
            | FetchError::Timeout { url, .. }
            | FetchError::Extract { url, .. } => url,
        }
    }
}

/// Field-level parse failures. Always recovered locally.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// No known date format matched
    #[error("Unrecognized datetime: {0:?}")]
    Datetime(String),

    /// Scraped row had no usable title
    #[error("Empty title")]
    EmptyTitle,
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Event source URL could not be parsed
    #[error("Invalid URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    /// Required string field was empty
    #[error("Field '{0}' must not be empty")]
    Empty(String),

    /// Timeframe end precedes its start
    #[error("Invalid timeframe: end ({end}) must not precede start ({start})")]
    InvalidTimeframe {
        start: chrono::DateTime<chrono::Utc>,
        end: chrono::DateTime<chrono::Utc>,
    },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
