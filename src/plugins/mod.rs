//! Plugin system for Javelin
//!
//! This module lets third-party packages extend Javelin's command surface
//! at runtime without recompiling the tool. A plugin is a single `.jpk`
//! package (a gzip-compressed tar archive) containing an extension index
//! and one descriptor per implemented capability. Packages are discovered
//! on disk, loaded in isolation, validated without crashing the host, and
//! their commands merged into the live command tree with interactive
//! conflict resolution.
//!
//! # Architecture
//!
//! - **types**: Capability model, extension index/descriptor structures,
//!   identity metadata, plugin configuration
//! - **locator**: Resolves configured directories into candidate packages
//! - **artifact**: One package path with lazily memoized identity
//! - **loader**: Per-package isolated load context and extension discovery
//! - **validator**: Decides whether a package is a usable plugin
//! - **registry**: Process-lifetime per-capability cache of loaded extensions
//! - **registrar**: Merges command extensions into the command tree,
//!   confirming before overwriting existing commands
//! - **install**: `plugin add` and the installed-plugin manifest
//! - **builders**: Scaffolding for new plugin projects (write-only)
//!
//! # Package layout
//!
//! ```text
//! hello.jpk
//! ├── extensions.json          # {"command": ["HelloCommand"]}
//! ├── ext/
//! │   └── HelloCommand.json    # identity + command payload
//! └── scripts/…                # opaque payload, never read at discovery
//! ```
//!
//! # Lifecycle
//!
//! An artifact moves through `DISCOVERED → VALIDATED → LOADED → REGISTERED`,
//! or stops early as rejected (failed validation) or failed (load/IO
//! error). No failure in this pipeline ever aborts startup; the worst
//! outcome is that a package contributes nothing, with a log line naming
//! the skipped package and the reason.

pub mod artifact;
pub mod builders;
pub mod install;
pub mod loader;
pub mod locator;
pub mod registrar;
pub mod registry;
pub mod types;
pub mod validator;

pub use artifact::PluginArtifact;
pub use loader::{load_extensions, ArtifactContext};
pub use locator::ArtifactLocator;
pub use registrar::{register_commands, DecisionSource, InteractivePrompt, ScriptedDecisions};
pub use registry::PluginRegistry;
pub use types::{CapabilityKind, LoadedExtension, PluginConfig, PluginIdentity};

#[cfg(test)]
pub(crate) mod testutil {
    //! Helpers for building `.jpk` fixtures in tests.

    use std::fs::File;
    use std::path::Path;

    use flate2::write::GzEncoder;
    use flate2::Compression;

    /// Write a gzip-compressed tar package with the given entries.
    pub fn write_package(path: &Path, entries: &[(&str, &str)]) {
        let file = File::create(path).unwrap();
        let encoder = GzEncoder::new(file, Compression::default());
        let mut builder = tar::Builder::new(encoder);

        for (name, content) in entries {
            let bytes = content.as_bytes();
            let mut header = tar::Header::new_gnu();
            header.set_size(bytes.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, bytes).unwrap();
        }

        builder.into_inner().unwrap().finish().unwrap();
    }

    /// A descriptor JSON with a command payload.
    pub fn command_descriptor(plugin: &str, version: &str, command: &str, exec: &str) -> String {
        format!(
            r#"{{
                "name": "{plugin}",
                "version": "{version}",
                "command": {{
                    "name": "{command}",
                    "exec": {{ "command": "{exec}" }}
                }}
            }}"#
        )
    }

    /// A descriptor JSON with a template payload.
    pub fn template_descriptor(plugin: &str, version: &str, kind: &str, exec: &str) -> String {
        format!(
            r#"{{
                "name": "{plugin}",
                "version": "{version}",
                "template": {{
                    "kind": "{kind}",
                    "exec": {{ "command": "{exec}" }}
                }}
            }}"#
        )
    }

    /// A command descriptor missing its version (incomplete identity).
    pub fn descriptor_without_version(plugin: &str, command: &str) -> String {
        format!(
            r#"{{
                "name": "{plugin}",
                "command": {{
                    "name": "{command}",
                    "exec": {{ "command": "true" }}
                }}
            }}"#
        )
    }
}
