//! Error types for nytimes-mcp.
//!
//! # Security Note
//!
//! Error messages are carefully crafted to NEVER include the API key.
//! Variants that could carry a request URL (which holds the key as a query
//! parameter) are built from URL-stripped sources only.

use std::error::Error as _;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("failed to read configuration file: {path}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be parsed.
    #[error("failed to parse configuration file: {path}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Configuration file not found.
    #[error("configuration file not found: {path}")]
    NotFound {
        /// Path where the configuration file was expected.
        path: PathBuf,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation failure.
        message: String,
    },

    /// The API key environment variable is unset or empty.
    #[error("{var} environment variable is required")]
    MissingApiKey {
        /// Name of the environment variable that was checked.
        var: &'static str,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client")]
    HttpClient {
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
}

/// A failed call to the Article Search API.
///
/// Covers both non-2xx responses and transport failures (timeouts, DNS,
/// refused connections, undecodable bodies). `status` is `None` when no
/// HTTP response was received.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct UpstreamError {
    /// Human-readable description, never containing the API key.
    pub message: String,
    /// HTTP status code, if the upstream answered.
    pub status: Option<u16>,
}

impl UpstreamError {
    /// Creates an error for a non-2xx response.
    #[must_use]
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: Some(status),
        }
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        let status = err.status().map(|s| s.as_u16());
        // The request URL carries the api-key query parameter.
        let err = err.without_url();
        let mut message = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        Self { message, status }
    }
}

/// Tool arguments that failed schema validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArgumentError {
    /// Arguments were not a JSON object.
    #[error("arguments must be an object")]
    NotAnObject,

    /// A required field was absent.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// A field had the wrong JSON type.
    #[error("field {field} must be a {expected}")]
    WrongType {
        /// Field name.
        field: &'static str,
        /// Expected JSON type name.
        expected: &'static str,
    },
}
