//! Isolated package loading and extension discovery for Javelin
//!
//! Each `.jpk` package is loaded through its own [`ArtifactContext`], a
//! load context scoped to exactly one package. The context owns the
//! package's extension index and descriptor entries and shares nothing with
//! other packages; the only common surface between contexts is the host's
//! capability schema (the descriptor types in [`super::types`]) that the
//! entries deserialize against.
//!
//! A package is a gzip-compressed tar archive. Opening a context performs a
//! single streaming pass that reads only the extension index
//! (`extensions.json`) and the descriptor entries (`ext/*.json`); all other
//! entries (scaffold payloads, scripts, resources) are skipped unread.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use regex::Regex;
use tracing::warn;

use crate::error::{JavelinError, Result};

use super::types::{
    CapabilityKind, ExtensionDescriptor, ExtensionIndex, ExtensionPayload, LoadedExtension,
    PluginIdentity,
};

/// Well-known path of the extension index inside a package.
pub const INDEX_ENTRY: &str = "extensions.json";

/// Directory inside a package holding extension descriptors.
pub const DESCRIPTOR_DIR: &str = "ext";

/// An isolated load context scoped to one plugin package.
#[derive(Debug)]
pub struct ArtifactContext {
    path: PathBuf,
    index: ExtensionIndex,
    entries: HashMap<String, Vec<u8>>,
}

impl ArtifactContext {
    /// Open a package and read its extension index and descriptor entries.
    ///
    /// # Errors
    /// - `JavelinError::Io` if the file cannot be opened
    /// - `JavelinError::Plugin` if the archive is malformed or has no
    ///   extension index
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mut archive = tar::Archive::new(GzDecoder::new(file));

        let mut entries: HashMap<String, Vec<u8>> = HashMap::new();

        let iter = archive.entries().map_err(|e| {
            JavelinError::Plugin(format!("{}: not a valid package: {}", path.display(), e))
        })?;

        for entry in iter {
            let mut entry = entry.map_err(|e| {
                JavelinError::Plugin(format!("{}: not a valid package: {}", path.display(), e))
            })?;

            let name = match entry.path() {
                Ok(p) => normalize_entry_path(&p),
                Err(_) => continue,
            };

            if name != INDEX_ENTRY && !is_descriptor_entry(&name) {
                // Payload entries stay unread.
                continue;
            }

            let mut buf = Vec::new();
            entry.read_to_end(&mut buf).map_err(|e| {
                JavelinError::Plugin(format!(
                    "{}: failed to read entry '{}': {}",
                    path.display(),
                    name,
                    e
                ))
            })?;
            entries.insert(name, buf);
        }

        let index_bytes = entries.remove(INDEX_ENTRY).ok_or_else(|| {
            JavelinError::Plugin(format!(
                "{}: package has no {} entry",
                path.display(),
                INDEX_ENTRY
            ))
        })?;

        let index: ExtensionIndex = serde_json::from_slice(&index_bytes).map_err(|e| {
            JavelinError::Plugin(format!(
                "{}: invalid extension index: {}",
                path.display(),
                e
            ))
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            index,
            entries,
        })
    }

    /// The package file this context is scoped to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The extension index declared by the package.
    pub fn index(&self) -> &ExtensionIndex {
        &self.index
    }

    /// Discover and instantiate all implementations of one capability.
    ///
    /// Walks the type names the index declares for `kind`, resolves each to
    /// its `ext/<TypeName>.json` descriptor entry and deserializes it. A
    /// failure for an individual type (missing entry, malformed JSON, wrong
    /// or absent payload, unsafe exec template) is logged and that type is
    /// excluded; siblings in the same package are still attempted.
    pub fn load(&self, kind: CapabilityKind) -> Vec<LoadedExtension> {
        let mut loaded = Vec::new();

        for type_name in self.index.declared(kind) {
            match self.instantiate(type_name, kind) {
                Ok(ext) => loaded.push(ext),
                Err(e) => {
                    warn!(
                        package = %self.path.display(),
                        type_name = %type_name,
                        capability = %kind,
                        error = %e,
                        "Failed to load declared extension, skipping"
                    );
                }
            }
        }

        loaded
    }

    /// Resolve the identity of the first extension the package can
    /// instantiate, trying each capability in declaration order.
    ///
    /// This loads only as much of the package as is needed to answer an
    /// identity query; the result may still be incomplete (missing name or
    /// version); completeness is the validator's concern.
    pub fn first_identity(&self) -> Option<PluginIdentity> {
        CapabilityKind::ALL
            .iter()
            .find_map(|kind| self.load(*kind).into_iter().next())
            .map(|ext| ext.identity)
    }

    /// Instantiate one declared type for one capability.
    fn instantiate(&self, type_name: &str, kind: CapabilityKind) -> Result<LoadedExtension> {
        validate_type_name(type_name)?;

        let entry_name = format!("{}/{}.json", DESCRIPTOR_DIR, type_name);
        let bytes = self.entries.get(&entry_name).ok_or_else(|| {
            JavelinError::Plugin(format!("descriptor entry '{}' missing", entry_name))
        })?;

        let descriptor: ExtensionDescriptor = serde_json::from_slice(bytes)
            .map_err(|e| JavelinError::Plugin(format!("invalid descriptor: {}", e)))?;

        let payload = match kind {
            CapabilityKind::Command => {
                let spec = descriptor.command.clone().ok_or_else(|| {
                    JavelinError::Plugin("descriptor declares no command payload".to_string())
                })?;
                validate_command_name(&spec.name)?;
                validate_exec_safety(&spec.exec.command, type_name)?;
                ExtensionPayload::Command(spec)
            }
            CapabilityKind::Template => {
                let spec = descriptor.template.clone().ok_or_else(|| {
                    JavelinError::Plugin("descriptor declares no template payload".to_string())
                })?;
                validate_exec_safety(&spec.exec.command, type_name)?;
                ExtensionPayload::Template(spec)
            }
        };

        Ok(LoadedExtension {
            type_name: type_name.to_string(),
            artifact: self.path.clone(),
            identity: descriptor.identity(),
            payload,
        })
    }
}

/// Discover implementations of one capability inside one package.
///
/// Convenience wrapper over [`ArtifactContext`]: a package that cannot be
/// opened (unreadable, malformed archive, missing extension index)
/// contributes nothing: the failure is logged at warn level and an empty
/// list is returned, never an error.
pub fn load_extensions(path: &Path, kind: CapabilityKind) -> Vec<LoadedExtension> {
    match ArtifactContext::open(path) {
        Ok(context) => context.load(kind),
        Err(e) => {
            warn!(
                package = %path.display(),
                capability = %kind,
                error = %e,
                "Skipping unloadable plugin package"
            );
            Vec::new()
        }
    }
}

/// Strip tar path decorations (`./` prefixes) from an entry path.
fn normalize_entry_path(path: &Path) -> String {
    path.to_string_lossy()
        .trim_start_matches("./")
        .to_string()
}

/// Whether an entry path names an extension descriptor.
fn is_descriptor_entry(name: &str) -> bool {
    name.starts_with("ext/") && name.ends_with(".json") && !name[4..].contains('/')
}

/// Validate a declared type name before resolving it to an archive entry.
///
/// Type names resolve to paths inside the package, so anything that could
/// escape the descriptor directory is rejected.
fn validate_type_name(type_name: &str) -> Result<()> {
    let re = Regex::new(r"^[a-zA-Z][a-zA-Z0-9_.\-]{0,127}$").unwrap();
    if !re.is_match(type_name) || type_name.contains("..") {
        return Err(JavelinError::Plugin(format!(
            "invalid extension type name '{}'",
            type_name
        )));
    }
    Ok(())
}

/// Validate a contributed command name.
fn validate_command_name(name: &str) -> Result<()> {
    let re = Regex::new(r"^[a-zA-Z][a-zA-Z0-9_\-]{0,63}$").unwrap();
    if !re.is_match(name) {
        return Err(JavelinError::Plugin(format!(
            "invalid command name '{}': must be 1-64 alphanumeric characters, hyphens and underscores, starting with a letter",
            name
        )));
    }
    Ok(())
}

/// Check an exec template for dangerous shell operators.
///
/// Rejects templates containing `&&`, `||`, `;`, `|`, or backticks to
/// prevent shell injection through plugin descriptors.
fn validate_exec_safety(command: &str, type_name: &str) -> Result<()> {
    let dangerous_patterns: &[(&str, &str)] = &[
        ("&&", "command chaining (&&)"),
        ("||", "conditional chaining (||)"),
        (";", "command separator (;)"),
        ("`", "backtick execution"),
    ];

    for (pattern, description) in dangerous_patterns {
        if command.contains(pattern) {
            return Err(JavelinError::SecurityViolation(format!(
                "extension '{}' exec template contains dangerous pattern: {}",
                type_name, description
            )));
        }
    }

    // The `||` pattern is already caught above, so any remaining `|` is a
    // single pipe operator.
    if command.contains('|') {
        return Err(JavelinError::SecurityViolation(format!(
            "extension '{}' exec template contains dangerous pattern: pipe operator (|)",
            type_name
        )));
    }

    Ok(())
}
