//! Plugin package value object with lazy identity resolution.

use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use tracing::debug;

use super::loader::ArtifactContext;
use super::types::PluginIdentity;

/// One plugin package file on disk.
///
/// Wraps the package path and resolves the declared identity lazily:
/// the first call to [`identity`](PluginArtifact::identity) opens the
/// package just far enough to read metadata and memoizes the outcome
/// (including failure), so identity-only queries (such as `plugin list`)
/// never reopen the archive.
#[derive(Debug)]
pub struct PluginArtifact {
    path: PathBuf,
    identity: OnceCell<Option<PluginIdentity>>,
}

impl PluginArtifact {
    /// Wrap a package path. No I/O happens until identity is requested.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            identity: OnceCell::new(),
        }
    }

    /// The package file location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The declared identity of the package, if it can be resolved.
    ///
    /// Performs a one-time load attempt on first call and returns the
    /// memoized result thereafter. `None` means the package could not be
    /// opened or declares no loadable extension; a `Some` identity may
    /// still be incomplete (missing name or version); completeness is
    /// checked by the validator, not here.
    pub fn identity(&self) -> Option<&PluginIdentity> {
        self.identity
            .get_or_init(|| match ArtifactContext::open(&self.path) {
                Ok(context) => context.first_identity(),
                Err(e) => {
                    debug!(
                        package = %self.path.display(),
                        error = %e,
                        "Identity resolution failed"
                    );
                    None
                }
            })
            .as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::testutil::{command_descriptor, write_package};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_identity_resolves_from_package() {
        let tmp = TempDir::new().unwrap();
        let pkg = tmp.path().join("hello.jpk");
        write_package(
            &pkg,
            &[
                ("extensions.json", r#"{"command": ["HelloCommand"]}"#),
                (
                    "ext/HelloCommand.json",
                    &command_descriptor("hello", "1.0.0", "hello", "echo hi"),
                ),
            ],
        );

        let artifact = PluginArtifact::new(&pkg);
        let identity = artifact.identity().unwrap();
        assert_eq!(identity.name.as_deref(), Some("hello"));
        assert_eq!(identity.version.as_deref(), Some("1.0.0"));
    }

    #[test]
    fn test_identity_is_memoized_across_calls() {
        let tmp = TempDir::new().unwrap();
        let pkg = tmp.path().join("hello.jpk");
        write_package(
            &pkg,
            &[
                ("extensions.json", r#"{"command": ["HelloCommand"]}"#),
                (
                    "ext/HelloCommand.json",
                    &command_descriptor("hello", "1.0.0", "hello", "echo hi"),
                ),
            ],
        );

        let artifact = PluginArtifact::new(&pkg);
        assert!(artifact.identity().is_some());

        // Remove the file; the memoized identity must still be served.
        fs::remove_file(&pkg).unwrap();
        let identity = artifact.identity().unwrap();
        assert_eq!(identity.name.as_deref(), Some("hello"));
    }

    #[test]
    fn test_failed_resolution_is_memoized() {
        let tmp = TempDir::new().unwrap();
        let pkg = tmp.path().join("corrupt.jpk");
        fs::write(&pkg, b"not an archive").unwrap();

        let artifact = PluginArtifact::new(&pkg);
        assert!(artifact.identity().is_none());

        // Replacing the file with a valid package must not change the
        // memoized outcome within this process.
        write_package(
            &pkg,
            &[
                ("extensions.json", r#"{"command": ["HelloCommand"]}"#),
                (
                    "ext/HelloCommand.json",
                    &command_descriptor("hello", "1.0.0", "hello", "echo hi"),
                ),
            ],
        );
        assert!(artifact.identity().is_none());
    }

    #[test]
    fn test_no_io_before_first_identity_call() {
        // Wrapping a nonexistent path must not fail.
        let artifact = PluginArtifact::new("/nonexistent/ghost.jpk");
        assert_eq!(artifact.path(), Path::new("/nonexistent/ghost.jpk"));
        assert!(artifact.identity().is_none());
    }
}
