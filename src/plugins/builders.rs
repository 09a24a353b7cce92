//! Plugin project scaffolding.
//!
//! Write-only generators, not part of the runtime loading path:
//! `init_plugin` lays out a new plugin source directory for either
//! capability, and `pack_plugin` turns a source directory into a `.jpk`
//! package the locator can discover.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use tracing::info;

use crate::error::{JavelinError, Result};

use super::locator::PACKAGE_EXTENSION;
use super::types::CapabilityKind;

/// Scaffold a new plugin source directory under `parent`.
///
/// Writes `extensions.json`, a starter descriptor for the requested
/// capability and a README. Refuses to overwrite an existing directory.
pub fn init_plugin(parent: &Path, name: &str, kind: CapabilityKind) -> Result<PathBuf> {
    let root = parent.join(name);
    if root.exists() {
        return Err(JavelinError::Plugin(format!(
            "directory {} already exists",
            root.display()
        )));
    }

    let type_name = match kind {
        CapabilityKind::Command => format!("{}Command", camel_case(name)),
        CapabilityKind::Template => format!("{}Template", camel_case(name)),
    };

    fs::create_dir_all(root.join("ext"))?;

    let index = match kind {
        CapabilityKind::Command => format!("{{\n  \"command\": [\"{}\"]\n}}\n", type_name),
        CapabilityKind::Template => format!("{{\n  \"template\": [\"{}\"]\n}}\n", type_name),
    };
    fs::write(root.join("extensions.json"), index)?;

    let descriptor = match kind {
        CapabilityKind::Command => format!(
            r#"{{
  "name": "{name}",
  "version": "0.1.0",
  "description": "TODO: describe the {name} plugin",
  "command": {{
    "name": "{name}",
    "aliases": [],
    "exec": {{ "command": "echo {name} {{{{args}}}}", "timeout_secs": 30 }}
  }}
}}
"#
        ),
        CapabilityKind::Template => format!(
            r#"{{
  "name": "{name}",
  "version": "0.1.0",
  "description": "TODO: describe the {name} template",
  "template": {{
    "kind": "quickstart",
    "exec": {{ "command": "sh scaffold.sh {{{{name}}}} {{{{dir}}}}", "timeout_secs": 60 }}
  }}
}}
"#
        ),
    };
    fs::write(root.join("ext").join(format!("{}.json", type_name)), descriptor)?;

    fs::write(
        root.join("README.md"),
        format!(
            "# {name}\n\nA Javelin {kind} plugin. Edit `ext/{type_name}.json`, then run\n`javelin plugin pack {name}` and `javelin plugin add {name}.{ext}`.\n",
            name = name,
            kind = kind,
            type_name = type_name,
            ext = PACKAGE_EXTENSION,
        ),
    )?;

    info!(plugin = %name, dir = %root.display(), "Scaffolded plugin project");
    Ok(root)
}

/// Pack a plugin source directory into a `.jpk` package.
///
/// The output defaults to `<dir-name>.jpk` next to the source directory.
/// All regular files in the directory are included; the extension index is
/// required to be present so the result is discoverable.
pub fn pack_plugin(source_dir: &Path, output: Option<&Path>) -> Result<PathBuf> {
    if !source_dir.is_dir() {
        return Err(JavelinError::NotFound(format!(
            "plugin source directory {}",
            source_dir.display()
        )));
    }
    if !source_dir.join("extensions.json").is_file() {
        return Err(JavelinError::Plugin(format!(
            "{} has no extensions.json; not a plugin source directory",
            source_dir.display()
        )));
    }

    let out_path = match output {
        Some(path) => path.to_path_buf(),
        None => {
            let stem = source_dir
                .file_name()
                .ok_or_else(|| {
                    JavelinError::Plugin(format!("{} has no directory name", source_dir.display()))
                })?
                .to_string_lossy()
                .to_string();
            source_dir.with_file_name(format!("{}.{}", stem, PACKAGE_EXTENSION))
        }
    };

    let file = File::create(&out_path)?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = tar::Builder::new(encoder);
    builder.append_dir_all(".", source_dir)?;
    builder.into_inner()?.finish()?;

    info!(package = %out_path.display(), "Packed plugin");
    Ok(out_path)
}

/// `my-plugin` → `MyPlugin`.
fn camel_case(name: &str) -> String {
    name.split(['-', '_'])
        .filter(|seg| !seg.is_empty())
        .map(|seg| {
            let mut chars = seg.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}
