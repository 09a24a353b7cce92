//! Plugin registry for Javelin
//!
//! Process-lifetime cache of loaded extensions, keyed by capability. The
//! first query for a capability triggers the full locate-and-load sequence:
//! scan the plugin directories, load that capability from each package,
//! drop entries with incomplete identity or names the config does not
//! permit, and store the result. Every later query for the same capability
//! returns the cached list without touching the filesystem.
//!
//! Plugin directories are assumed static for the duration of one command
//! invocation, so there is no invalidation operation; the cache's lifecycle
//! equals the process's lifecycle.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use super::loader::load_extensions;
use super::locator::ArtifactLocator;
use super::types::{CapabilityKind, LoadedExtension, PluginConfig};

/// Per-capability populate-once cache of loaded plugin extensions.
///
/// Owned by the process's composition root and passed by reference to
/// whichever component needs plugins; there is no global state. The cache
/// mutex doubles as the single-writer barrier: only one thread performs the
/// scan for a capability, and concurrent readers block until it completes.
pub struct PluginRegistry {
    locator: ArtifactLocator,
    config: PluginConfig,
    cache: Mutex<HashMap<CapabilityKind, Arc<Vec<LoadedExtension>>>>,
}

impl PluginRegistry {
    /// Create a registry over the given locator and plugin configuration.
    pub fn new(locator: ArtifactLocator, config: PluginConfig) -> Self {
        Self {
            locator,
            config,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Create a registry from the plugin configuration alone, deriving the
    /// locator from its directory property.
    pub fn from_config(config: PluginConfig) -> Self {
        let locator = ArtifactLocator::from_spec(config.dir_spec().as_deref());
        Self::new(locator, config)
    }

    /// All successfully loaded extensions for one capability.
    ///
    /// The first call per capability scans and loads; subsequent calls
    /// return the same shared list with zero additional filesystem reads.
    pub fn plugins(&self, kind: CapabilityKind) -> Arc<Vec<LoadedExtension>> {
        let mut cache = self
            .cache
            .lock()
            .expect("plugin registry cache mutex poisoned");

        if let Some(hit) = cache.get(&kind) {
            return Arc::clone(hit);
        }

        // Populate while holding the lock so concurrent readers block until
        // the one scan completes instead of racing a second scan.
        let loaded = Arc::new(self.scan(kind));
        cache.insert(kind, Arc::clone(&loaded));
        loaded
    }

    /// Locate every package and load one capability from each.
    fn scan(&self, kind: CapabilityKind) -> Vec<LoadedExtension> {
        let artifacts = self.locator.locate();
        let mut out = Vec::new();

        for artifact in &artifacts {
            for ext in load_extensions(artifact.path(), kind) {
                if !ext.identity.is_complete() {
                    warn!(
                        package = %artifact.path().display(),
                        type_name = %ext.type_name,
                        "Skipping extension with incomplete identity"
                    );
                    continue;
                }
                let name = ext.name().unwrap_or_default();
                if !self.config.is_plugin_permitted(name) {
                    info!(plugin = %name, "Plugin not permitted by config, skipping");
                    continue;
                }
                out.push(ext);
            }
        }

        info!(
            capability = %kind,
            packages = artifacts.len(),
            loaded = out.len(),
            "Plugin scan complete"
        );
        out
    }
}
