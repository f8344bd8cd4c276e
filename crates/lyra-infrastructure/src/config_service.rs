//! Client configuration service.
//!
//! Loads the client configuration from config.toml under the Lyra config
//! directory, with environment overrides for ad-hoc use.

use crate::paths::LyraPaths;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};

fn default_api_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_request_timeout_secs() -> u64 {
    60
}

/// Client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the backend, without a trailing slash.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Configuration service that loads and caches the client configuration.
///
/// The configuration is loaded lazily on first access and cached to avoid
/// repeated file I/O.
#[derive(Debug, Clone, Default)]
pub struct ConfigService {
    config: Arc<RwLock<Option<ClientConfig>>>,
}

impl ConfigService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the client configuration, loading from file if not cached.
    ///
    /// The `LYRA_API_URL` environment variable overrides the configured base
    /// URL.
    pub fn get_config(&self) -> ClientConfig {
        {
            let read_lock = self.config.read().unwrap();
            if let Some(ref cached) = *read_lock {
                return cached.clone();
            }
        }

        let mut loaded = Self::load_config().unwrap_or_default();
        if let Ok(url) = std::env::var("LYRA_API_URL") {
            if !url.trim().is_empty() {
                loaded.api_base_url = url.trim().to_string();
            }
        }

        {
            let mut write_lock = self.config.write().unwrap();
            *write_lock = Some(loaded.clone());
        }

        loaded
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        let mut write_lock = self.config.write().unwrap();
        *write_lock = None;
    }

    fn load_config() -> Option<ClientConfig> {
        let path = LyraPaths::config_file().ok()?;
        let content = std::fs::read_to_string(&path).ok()?;
        match toml::from_str(&content) {
            Ok(config) => Some(config),
            Err(err) => {
                tracing::warn!(
                    target: "config",
                    "Ignoring unparseable config file {}: {}",
                    path.display(),
                    err
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let config: ClientConfig = toml::from_str("").unwrap();
        assert_eq!(config.api_base_url, "http://127.0.0.1:8000");
        assert_eq!(config.request_timeout_secs, 60);

        let config: ClientConfig =
            toml::from_str("api_base_url = \"https://chat.example.com\"").unwrap();
        assert_eq!(config.api_base_url, "https://chat.example.com");
        assert_eq!(config.request_timeout_secs, 60);
    }
}
