//! Client Configuration

use thiserror::Error;
use url::Url;

use crate::CRATE_VERSION;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid base URL {0}: {1}")]
    InvalidBaseUrl(String, String),

    #[error("Unsupported base URL scheme: {0}")]
    UnsupportedScheme(String),
}

/// Shared by both channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: Url,
    pub user_agent: String,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ConfigError::InvalidBaseUrl(base_url.to_string(), e.to_string()))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ConfigError::UnsupportedScheme(base_url.scheme().to_string()));
        }
        Ok(Self {
            base_url,
            user_agent: format!("canvas-admin-core/{CRATE_VERSION}"),
        })
    }

    /// Absolute URL for an API path such as `/login`.
    ///
    /// Appends to the base path instead of replacing it, so
    /// `.../api/v1` + `/login` gives `.../api/v1/login`.
    pub fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
        let joined = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&joined).map_err(|e| ConfigError::InvalidBaseUrl(joined, e.to_string()))
    }
}
