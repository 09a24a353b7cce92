//! Configuration for Javelin
//!
//! Configuration lives at `~/.javelin/config.json`. A missing file means
//! defaults; a present but malformed file is a hard error so typos do not
//! silently disable configured behavior.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::plugins::types::PluginConfig;

/// Top-level configuration, stored as `config.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Plugin system configuration.
    pub plugins: PluginConfig,
}

impl Config {
    /// The Javelin state directory (`~/.javelin`).
    pub fn dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".javelin")
    }

    /// The configuration file path (`~/.javelin/config.json`).
    pub fn path() -> PathBuf {
        Self::dir().join("config.json")
    }

    /// Load configuration from the default location.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path())
    }

    /// Load configuration from an explicit path. A missing file yields the
    /// default configuration.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_file_is_default() {
        let config = Config::load_from(Path::new("/nonexistent/config.json")).unwrap();
        assert!(config.plugins.enabled);
        assert!(config.plugins.dirs.is_none());
    }

    #[test]
    fn test_load_parses_plugin_section() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(
            &path,
            r#"{
                "plugins": {
                    "enabled": false,
                    "dirs": "/opt/javelin/plugins;/srv/plugins",
                    "blocked_plugins": ["shady"]
                }
            }"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert!(!config.plugins.enabled);
        assert_eq!(
            config.plugins.dirs.as_deref(),
            Some("/opt/javelin/plugins;/srv/plugins")
        );
        assert!(!config.plugins.is_plugin_permitted("shady"));
    }

    #[test]
    fn test_load_malformed_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
