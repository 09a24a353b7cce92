//! Plugin installation and the installed-plugin manifest.
//!
//! `plugin add` validates a package, copies it into the first configured
//! plugin directory and records it in `~/.javelin/plugins-manifest.json`
//! with its SHA-256 digest and install time.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;

use crate::error::{JavelinError, Result};

use super::artifact::PluginArtifact;
use super::validator;

/// One record in the installed-plugin manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstalledPlugin {
    /// Plugin display name.
    pub name: String,
    /// Plugin version string.
    pub version: String,
    /// Package file name inside the plugin directory.
    pub file: String,
    /// SHA-256 digest of the package at install time, hex-encoded.
    pub sha256: String,
    /// When the package was installed.
    pub installed_at: DateTime<Utc>,
}

/// The installed-plugin manifest, persisted as JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstallManifest {
    #[serde(default)]
    pub plugins: Vec<InstalledPlugin>,
}

impl InstallManifest {
    /// Load the manifest from disk; a missing file is an empty manifest.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Persist the manifest, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Insert or replace the record for a plugin name.
    pub fn upsert(&mut self, record: InstalledPlugin) {
        self.plugins.retain(|p| p.name != record.name);
        self.plugins.push(record);
    }
}

/// Default manifest path: `~/.javelin/plugins-manifest.json`.
pub fn default_manifest_path() -> PathBuf {
    crate::config::Config::dir().join("plugins-manifest.json")
}

/// Validate a package and install it into the plugin directory.
///
/// The package must pass validation (loadable extension with complete
/// identity); an invalid package is rejected without touching the plugin
/// directory. The copy keeps the source file name.
pub fn install_artifact(
    source: &Path,
    plugin_dir: &Path,
    manifest_path: &Path,
) -> Result<InstalledPlugin> {
    if !source.is_file() {
        return Err(JavelinError::NotFound(format!(
            "package file {}",
            source.display()
        )));
    }

    let artifact = PluginArtifact::new(source);
    if !validator::is_valid(&artifact) {
        return Err(JavelinError::Plugin(format!(
            "{} is not a valid plugin package",
            source.display()
        )));
    }

    let identity = artifact.identity().ok_or_else(|| {
        JavelinError::Plugin(format!("{} exposes no identity", source.display()))
    })?;
    let name = identity.name.clone().ok_or_else(|| {
        JavelinError::Plugin(format!("{} exposes no plugin name", source.display()))
    })?;
    let version = identity.version.clone().ok_or_else(|| {
        JavelinError::Plugin(format!("{} exposes no plugin version", source.display()))
    })?;

    let file_name = source
        .file_name()
        .ok_or_else(|| JavelinError::Plugin(format!("{} has no file name", source.display())))?
        .to_string_lossy()
        .to_string();

    let bytes = fs::read(source)?;
    let sha256 = hex::encode(Sha256::digest(&bytes));

    fs::create_dir_all(plugin_dir)?;
    fs::write(plugin_dir.join(&file_name), &bytes)?;

    let record = InstalledPlugin {
        name: name.clone(),
        version: version.clone(),
        file: file_name,
        sha256,
        installed_at: Utc::now(),
    };

    let mut manifest = InstallManifest::load(manifest_path)?;
    manifest.upsert(record.clone());
    manifest.save(manifest_path)?;

    info!(plugin = %name, version = %version, dir = %plugin_dir.display(), "Installed plugin");
    Ok(record)
}
