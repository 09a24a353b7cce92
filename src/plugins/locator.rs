//! Plugin package discovery for Javelin
//!
//! This module resolves the configured plugin directories into a flat,
//! deduplicated list of candidate `.jpk` package files. Discovery never
//! fails: missing directories are a normal state (a fresh install has no
//! plugin directory yet) and unreadable directories only produce a warning.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::artifact::PluginArtifact;

/// File extension of Javelin plugin packages.
pub const PACKAGE_EXTENSION: &str = "jpk";

/// Resolves plugin directories into candidate package files.
///
/// Constructed either from an explicit directory list or from the
/// semicolon-delimited directory property (`dirs` in config.json or the
/// `JAVELIN_PLUGIN_DIRS` environment variable). When the property is absent
/// the default user-scoped directory `~/.javelin/plugins` is used.
#[derive(Debug, Clone)]
pub struct ArtifactLocator {
    dirs: Vec<PathBuf>,
}

impl ArtifactLocator {
    /// Create a locator over an explicit list of directories.
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    /// Create a locator from the semicolon-delimited directory property.
    ///
    /// `None` or an all-whitespace value falls back to the default
    /// user-scoped plugin directory. Empty segments are ignored and `~` is
    /// expanded to the user's home directory.
    pub fn from_spec(spec: Option<&str>) -> Self {
        let dirs = match spec {
            Some(s) if !s.trim().is_empty() => s
                .split(';')
                .map(str::trim)
                .filter(|seg| !seg.is_empty())
                .map(expand_tilde)
                .collect(),
            _ => vec![default_plugin_dir()],
        };
        Self { dirs }
    }

    /// The directories this locator scans.
    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Scan all directories for plugin packages.
    ///
    /// Returns every regular file with the `.jpk` extension found directly
    /// under the configured directories, deduplicated across overlapping
    /// directories. Never fails; an empty vector means nothing was found.
    pub fn locate(&self) -> Vec<PluginArtifact> {
        let mut seen: HashSet<PathBuf> = HashSet::new();
        let mut artifacts = Vec::new();

        for dir in &self.dirs {
            if !dir.exists() {
                info!(dir = %dir.display(), "Plugin directory does not exist, skipping");
                continue;
            }

            if !dir.is_dir() {
                warn!(path = %dir.display(), "Plugin path is not a directory, skipping");
                continue;
            }

            let entries = match fs::read_dir(dir) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(
                        dir = %dir.display(),
                        error = %e,
                        "Failed to read plugin directory, skipping"
                    );
                    continue;
                }
            };

            for entry in entries.flatten() {
                let path = entry.path();
                if !is_package_file(&path) {
                    continue;
                }
                if seen.insert(path.clone()) {
                    artifacts.push(PluginArtifact::new(path));
                }
            }
        }

        artifacts
    }
}

impl Default for ArtifactLocator {
    fn default() -> Self {
        Self::from_spec(None)
    }
}

/// Whether a path is a regular file with the package extension.
fn is_package_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(PACKAGE_EXTENSION))
}

/// The default user-scoped plugin directory (`~/.javelin/plugins`).
pub fn default_plugin_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".javelin")
        .join("plugins")
}

/// Expand a leading `~/` to the user's home directory.
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_locate_finds_package_files() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("hello.jpk"), b"pkg").unwrap();
        fs::write(tmp.path().join("deploy.jpk"), b"pkg").unwrap();

        let locator = ArtifactLocator::new(vec![tmp.path().to_path_buf()]);
        let artifacts = locator.locate();
        assert_eq!(artifacts.len(), 2);
        for artifact in &artifacts {
            assert!(artifact.path().is_file());
            assert_eq!(
                artifact.path().extension().unwrap().to_str().unwrap(),
                "jpk"
            );
        }
    }

    #[test]
    fn test_locate_skips_other_extensions_and_dirs() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("notes.txt"), b"x").unwrap();
        fs::write(tmp.path().join("archive.tar.gz"), b"x").unwrap();
        fs::create_dir(tmp.path().join("subdir.jpk")).unwrap();
        fs::write(tmp.path().join("real.jpk"), b"pkg").unwrap();

        let locator = ArtifactLocator::new(vec![tmp.path().to_path_buf()]);
        let artifacts = locator.locate();
        assert_eq!(artifacts.len(), 1);
        assert!(artifacts[0].path().ends_with("real.jpk"));
    }

    #[test]
    fn test_locate_nonexistent_directory_is_empty() {
        let locator = ArtifactLocator::new(vec![PathBuf::from("/nonexistent/path/plugins")]);
        assert!(locator.locate().is_empty());
    }

    #[test]
    fn test_locate_deduplicates_overlapping_directories() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("dup.jpk"), b"pkg").unwrap();

        let locator = ArtifactLocator::new(vec![
            tmp.path().to_path_buf(),
            tmp.path().to_path_buf(),
        ]);
        assert_eq!(locator.locate().len(), 1);
    }

    #[test]
    fn test_from_spec_splits_on_semicolons() {
        let locator = ArtifactLocator::from_spec(Some("/a/plugins;/b/plugins; ;/c"));
        let dirs: Vec<_> = locator
            .dirs()
            .iter()
            .map(|d| d.to_string_lossy().to_string())
            .collect();
        assert_eq!(dirs, vec!["/a/plugins", "/b/plugins", "/c"]);
    }

    #[test]
    fn test_from_spec_none_uses_default_dir() {
        let locator = ArtifactLocator::from_spec(None);
        assert_eq!(locator.dirs(), &[default_plugin_dir()]);

        let blank = ArtifactLocator::from_spec(Some("   "));
        assert_eq!(blank.dirs(), &[default_plugin_dir()]);
    }

    #[test]
    fn test_locate_multiple_directories() {
        let tmp1 = TempDir::new().unwrap();
        let tmp2 = TempDir::new().unwrap();
        fs::write(tmp1.path().join("a.jpk"), b"pkg").unwrap();
        fs::write(tmp2.path().join("b.jpk"), b"pkg").unwrap();

        let locator =
            ArtifactLocator::new(vec![tmp1.path().to_path_buf(), tmp2.path().to_path_buf()]);
        assert_eq!(locator.locate().len(), 2);
    }
}
