//! API client configuration.
//!
//! Provides configuration for the LaunchDarkly REST endpoint, access token,
//! and timeout settings. Configuration is loaded from environment variables,
//! optionally seeded from a `.env` file, with defaults pointing at the public
//! LaunchDarkly API.

use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Default LaunchDarkly v2 API base URL.
pub const DEFAULT_BASE_URL: &str = "https://app.launchdarkly.com/api/v2";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Missing required environment variable.
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue {
        /// Configuration key.
        key: String,
        /// Error message.
        message: String,
    },

    /// A `.env` file could not be read or parsed.
    #[error("Failed to load {path}: {message}")]
    EnvFile {
        /// File path.
        path: String,
        /// Error message.
        message: String,
    },
}

/// LaunchDarkly API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL for the API (e.g., "https://app.launchdarkly.com/api/v2").
    pub base_url: String,

    /// API access token, sent verbatim in the `Authorization` header.
    #[serde(skip_serializing)]
    pub api_token: Option<String>,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    /// Returns configuration for the public API without a token.
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_token: None,
            timeout_secs: 30,
        }
    }
}

impl ApiConfig {
    /// Create a configuration for the public API with the given token.
    pub fn with_token(api_token: impl Into<String>) -> Self {
        Self {
            api_token: Some(api_token.into()),
            ..Self::default()
        }
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory (or a parent), if present, is
    /// loaded into the process environment first. Variables already set are
    /// not overridden.
    ///
    /// Environment variables:
    /// - `LAUNCHDARKLY_API_TOKEN`: API access token
    /// - `LAUNCHDARKLY_API_URL`: API base URL (default: https://app.launchdarkly.com/api/v2)
    /// - `LAUNCHDARKLY_TIMEOUT_SECS`: Request timeout in seconds (default: 30)
    pub fn from_env() -> Self {
        // Load .env file if it exists
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from a specific `.env` file.
    ///
    /// The file is read without modifying the process environment. Process
    /// variables take precedence over the file's values.
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let load_error = |e: dotenvy::Error| ConfigError::EnvFile {
            path: path.display().to_string(),
            message: e.to_string(),
        };

        let vars = dotenvy::from_path_iter(path)
            .map_err(load_error)?
            .collect::<Result<HashMap<String, String>, _>>()
            .map_err(load_error)?;

        Ok(Self::from_lookup(|key| {
            std::env::var(key).ok().or_else(|| vars.get(key).cloned())
        }))
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let default = Self::default();

        Self {
            base_url: lookup("LAUNCHDARKLY_API_URL").unwrap_or(default.base_url),
            api_token: lookup("LAUNCHDARKLY_API_TOKEN"),
            timeout_secs: lookup("LAUNCHDARKLY_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.timeout_secs),
        }
    }

    /// Get the request timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Build an endpoint URL by appending path segments to the base URL.
    ///
    /// Each segment is percent-encoded, so keys containing `/`, `?`, `#` or
    /// spaces stay within their own segment.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: "base_url".to_string(),
            message,
        };

        let mut url = Url::parse(&self.base_url).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid(format!("'{}' cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Validate that the configuration can be used to reach the API.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.api_token.as_deref() {
            None | Some("") => {
                return Err(ConfigError::MissingEnvVar("LAUNCHDARKLY_API_TOKEN".to_string()))
            }
            Some(_) => {}
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "timeout_secs".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                key: "base_url".to_string(),
                message: format!("'{}' is not an http(s) URL", self.base_url),
            });
        }
        Ok(())
    }
}
