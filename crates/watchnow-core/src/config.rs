//! Application configuration management.
//!
//! This module handles loading and saving the application configuration:
//! the backend URL, where the session credential is kept, and the last
//! email used to sign in.
//!
//! Configuration is stored at `~/.config/watchnow/config.json`.
//! `WATCHNOW_SERVER_URL` overrides the stored server URL.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::auth::{FileStorage, KeyringStorage, Storage};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "watchnow";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Backend used when nothing is configured.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8080";

/// Environment variable overriding `server_url`.
pub const SERVER_URL_ENV: &str = "WATCHNOW_SERVER_URL";

/// Where the session credential is persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Keyring,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub server_url: Option<String>,
    #[serde(default)]
    pub storage: StorageBackend,
    pub last_email: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&contents).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
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

    /// Effective server URL: environment, then config file, then default.
    pub fn server_url(&self) -> String {
        let env = std::env::var(SERVER_URL_ENV).ok();
        resolve_server_url(env.as_deref(), self.server_url.as_deref())
    }

    /// Open the configured credential storage.
    pub fn open_storage(&self) -> Result<Arc<dyn Storage>> {
        debug!(backend = ?self.storage, "Opening credential storage");
        Ok(match self.storage {
            StorageBackend::File => Arc::new(FileStorage::new(self.cache_dir()?)),
            StorageBackend::Keyring => Arc::new(KeyringStorage::new()),
        })
    }
}

fn resolve_server_url(env: Option<&str>, configured: Option<&str>) -> String {
    [env, configured]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|url| !url.is_empty())
        .unwrap_or(DEFAULT_SERVER_URL)
        .trim_end_matches('/')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_server_url_precedence() {
        assert_eq!(resolve_server_url(None, None), DEFAULT_SERVER_URL);
        assert_eq!(
            resolve_server_url(None, Some("https://movies.example.com/")),
            "https://movies.example.com"
        );
        assert_eq!(
            resolve_server_url(Some("http://env:9000"), Some("https://file")),
            "http://env:9000"
        );
        assert_eq!(resolve_server_url(Some(" "), Some("https://file")), "https://file");
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("watchnow").join(CONFIG_FILE);

        let config = Config {
            server_url: Some("http://localhost:9090".to_string()),
            storage: StorageBackend::Keyring,
            last_email: Some("neo@example.com".to_string()),
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.storage, StorageBackend::Keyring);
        assert_eq!(loaded.last_email.as_deref(), Some("neo@example.com"));
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        let loaded = Config::load_from(&dir.path().join("absent.json")).unwrap();
        assert_eq!(loaded.storage, StorageBackend::File);
        assert!(loaded.server_url.is_none());
    }

    #[test]
    fn test_storage_backend_names() {
        let config: Config = serde_json::from_str(r#"{"storage":"keyring"}"#).unwrap();
        assert_eq!(config.storage, StorageBackend::Keyring);
    }
}
