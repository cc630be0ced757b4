//! Client configuration.

use std::path::PathBuf;
use std::time::Duration;

use kademy_session::SessionConfig;
use url::Url;

use crate::KademyError;

/// Environment variable overriding the API base URL.
pub const API_URL_ENV: &str = "KADEMY_API_URL";

/// Base URL used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

/// Everything needed to build a [`KademyClient`](crate::KademyClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend root; request paths such as `/api/v1/books/` are appended.
    pub base_url: Url,

    /// Per-request timeout. `None` (the default) waits indefinitely.
    pub request_timeout: Option<Duration>,

    /// Directory holding `tokens.json`. `None` uses the platform config
    /// directory (`~/.config/kademy` on Linux).
    pub token_dir: Option<PathBuf>,

    pub session: SessionConfig,
}

impl ClientConfig {
    /// Defaults, with the base URL taken from `KADEMY_API_URL` when set.
    ///
    /// # Errors
    /// [`KademyError::Config`] if the variable is set but isn't a URL.
    pub fn from_env() -> Result<Self, KademyError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, KademyError> {
        let mut config = Self::default();
        if let Some(raw) = lookup(API_URL_ENV).filter(|v| !v.trim().is_empty()) {
            config.base_url = Url::parse(raw.trim())
                .map_err(|e| KademyError::Config(format!("{API_URL_ENV}={raw:?}: {e}")))?;
            tracing::debug!(base_url = %config.base_url, "API URL from environment");
        }
        Ok(config)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            // DEFAULT_API_URL is a constant, valid URL.
            base_url: Url::parse(DEFAULT_API_URL).expect("default API URL is valid"),
            request_timeout: None,
            token_dir: None,
            session: SessionConfig::default(),
        }
    }
}
