//! Configuration file loading and credential lookup.
//!
//! This module handles loading the optional configuration file from disk,
//! parsing it into validated, type-safe structures, and reading the API key
//! from the process environment.
//!
//! # Configuration File Locations
//!
//! The configuration file is searched in the following order:
//!
//! 1. Path given as the `CONFIG_FILE` CLI argument (must exist)
//! 2. Default location, if present:
//!    - **Linux/macOS:** `~/.nytimes-mcp/config.json`
//!    - **Windows:** `%USERPROFILE%\.nytimes-mcp\config.json`
//! 3. Built-in defaults
//!
//! # Credential
//!
//! The API key is never read from the configuration file. It comes from the
//! `NYTIMES_API_KEY` environment variable, optionally populated from a `.env`
//! file in the working directory.

mod settings;

pub use settings::{ApiConfig, Config, LoggingConfig, DEFAULT_BASE_URL};

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Environment variable holding the Article Search API key.
pub const API_KEY_ENV: &str = "NYTIMES_API_KEY";

/// Returns the default configuration directory.
///
/// - **Linux/macOS:** `~/.nytimes-mcp/`
/// - **Windows:** `%USERPROFILE%\.nytimes-mcp\`
#[must_use]
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|p| p.join(".nytimes-mcp"))
}

/// Returns the platform-specific default configuration file path.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    default_config_dir().map(|p| p.join("config.json"))
}

/// Loads and parses the configuration file.
///
/// If `path` is `None`, uses the platform-specific default location, falling
/// back to built-in defaults when no file exists there.
///
/// # Errors
///
/// Returns an error if:
/// - An explicitly given configuration file cannot be found
/// - The file cannot be read
/// - The JSON is malformed
/// - Fields are invalid
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ConfigError::NotFound {
                    path: p.to_path_buf(),
                });
            }
            p.to_path_buf()
        }
        None => match default_config_path() {
            Some(p) if p.exists() => p,
            _ => {
                let config = Config::default();
                config.validate()?;
                return Ok(config);
            }
        },
    };

    let contents = std::fs::read_to_string(&config_path).map_err(|e| ConfigError::ReadError {
        path: config_path.clone(),
        source: e,
    })?;

    let config: Config = serde_json::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: config_path.clone(),
        source: e,
    })?;

    config.validate()?;

    Ok(config)
}

/// The Article Search API key.
///
/// `Debug` output is redacted so the key cannot leak through logging.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wraps a raw key.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the raw key for attaching to requests.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

/// Reads the API key using `lookup` to resolve environment variables.
///
/// An unset or empty variable is a configuration error.
///
/// # Errors
///
/// Returns [`ConfigError::MissingApiKey`] if no usable key is available.
pub fn api_key_from<F>(lookup: F) -> Result<ApiKey, ConfigError>
where
    F: FnOnce(&str) -> Option<String>,
{
    match lookup(API_KEY_ENV) {
        Some(key) if !key.trim().is_empty() => Ok(ApiKey(key)),
        _ => Err(ConfigError::MissingApiKey { var: API_KEY_ENV }),
    }
}

/// Reads the API key from the process environment, loading `.env` first.
///
/// # Errors
///
/// Returns [`ConfigError::MissingApiKey`] if the variable is unset or empty.
pub fn load_api_key() -> Result<ApiKey, ConfigError> {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "Loaded environment from .env file");
    }
    api_key_from(|var| std::env::var(var).ok())
}
