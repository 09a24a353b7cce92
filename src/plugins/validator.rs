//! Plugin package validation.
//!
//! A package is valid iff, for at least one known capability, the isolated
//! loader finds a non-empty implementation list whose first entry exposes a
//! non-empty name and version. Validation is re-derivable at any time; no
//! "valid" flag is persisted across process runs.

use tracing::{debug, warn};

use super::artifact::PluginArtifact;
use super::loader::ArtifactContext;
use super::types::CapabilityKind;

/// Check whether a package is a valid Javelin plugin.
///
/// Never fails: a package that cannot be opened, declares no recognized
/// capability, or exposes incomplete identity metadata is simply invalid.
pub fn is_valid(artifact: &PluginArtifact) -> bool {
    let context = match ArtifactContext::open(artifact.path()) {
        Ok(context) => context,
        Err(e) => {
            warn!(
                package = %artifact.path().display(),
                error = %e,
                "Package failed validation"
            );
            return false;
        }
    };

    for kind in CapabilityKind::ALL {
        let loaded = context.load(kind);
        let Some(first) = loaded.first() else {
            continue;
        };
        if first.identity.is_complete() {
            return true;
        }
        warn!(
            package = %artifact.path().display(),
            capability = %kind,
            type_name = %first.type_name,
            "Extension has incomplete identity (missing name or version)"
        );
    }

    debug!(
        package = %artifact.path().display(),
        "Package declares no valid capability implementation"
    );
    false
}
