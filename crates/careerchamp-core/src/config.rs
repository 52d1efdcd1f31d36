//! Client configuration management.
//!
//! This module handles loading and saving the client configuration, which
//! includes the backend URL, where the token is kept, the expiry check
//! interval and the last email used to log in.
//!
//! Configuration is stored at `~/.config/careerchamp/config.json`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::auth::{
    FileTokenStore, KeyringTokenStore, MemoryTokenStore, SessionConfig, TokenStore,
    DEFAULT_EXPIRY_CHECK_INTERVAL,
};

/// Application name used for config/cache directory paths
pub const APP_NAME: &str = "careerchamp";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable that overrides the backend URL
pub const API_URL_ENV: &str = "CAREERCHAMP_API_URL";

/// Backend URL when nothing else is configured
pub const DEFAULT_API_URL: &str = "http://localhost:3000";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenBackend {
    #[default]
    File,
    Keyring,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: Option<String>,
    pub token_backend: TokenBackend,
    pub expiry_check_secs: u64,
    pub last_email: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: None,
            token_backend: TokenBackend::default(),
            expiry_check_secs: DEFAULT_EXPIRY_CHECK_INTERVAL.as_secs(),
            last_email: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Backend URL: environment first, then the config file, then the default.
    pub fn api_base_url(&self) -> String {
        let from_env = std::env::var(API_URL_ENV).ok();
        Self::resolve_api_url(from_env.as_deref(), self.api_base_url.as_deref())
    }

    fn resolve_api_url(from_env: Option<&str>, from_file: Option<&str>) -> String {
        [from_env, from_file]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|url| !url.is_empty())
            .unwrap_or(DEFAULT_API_URL)
            .trim_end_matches('/')
            .to_string()
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            expiry_check_interval: Duration::from_secs(self.expiry_check_secs.max(1)),
        }
    }

    /// Build the token store selected by `token_backend`.
    pub fn token_store(&self) -> Result<Arc<dyn TokenStore>> {
        Ok(match self.token_backend {
            TokenBackend::File => Arc::new(FileTokenStore::new(self.cache_dir()?)),
            TokenBackend::Keyring => Arc::new(KeyringTokenStore::new()?),
            TokenBackend::Memory => Arc::new(MemoryTokenStore::new()),
        })
    }
}
