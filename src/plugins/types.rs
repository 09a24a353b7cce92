//! Plugin types for Javelin
//!
//! This module defines all types used by the plugin system: the capability
//! roles a loaded extension can fulfill, the extension index and descriptor
//! structures parsed out of `.jpk` packages, plugin identity metadata, and
//! the plugin section of the main configuration file.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Description shown when an extension does not declare one.
pub const NO_DESCRIPTION: &str = "No description provided";

/// The capability roles a loaded extension may satisfy.
///
/// This is a closed set: a descriptor that declares none of these payloads
/// cannot be loaded. `Command` extensions contribute invocable commands to
/// the CLI tree; `Template` extensions contribute project scaffolds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapabilityKind {
    /// An invocable command merged into the host command tree.
    Command,
    /// A project scaffold generator selected by template kind.
    Template,
}

impl CapabilityKind {
    /// All known capabilities, in validation/lookup order.
    pub const ALL: [CapabilityKind; 2] = [CapabilityKind::Command, CapabilityKind::Template];

    /// The key under which implementations are declared in `extensions.json`.
    pub fn key(&self) -> &'static str {
        match self {
            CapabilityKind::Command => "command",
            CapabilityKind::Template => "template",
        }
    }
}

impl std::fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// The dynamic extension index read from `extensions.json` at the package
/// root.
///
/// Maps each capability key to the list of implementing type names bundled
/// in the package. Each declared type name `T` must have a descriptor entry
/// at `ext/T.json` inside the same package.
///
/// # Example
///
/// ```json
/// {
///   "command": ["HelloCommand", "DeployCommand"],
///   "template": ["QuickstartTemplate"]
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtensionIndex {
    /// Type names implementing the `Command` capability.
    #[serde(default)]
    pub command: Vec<String>,

    /// Type names implementing the `Template` capability.
    #[serde(default)]
    pub template: Vec<String>,
}

impl ExtensionIndex {
    /// Type names declared for the given capability.
    pub fn declared(&self, kind: CapabilityKind) -> &[String] {
        match kind {
            CapabilityKind::Command => &self.command,
            CapabilityKind::Template => &self.template,
        }
    }

    /// Whether the index declares no implementations at all.
    pub fn is_empty(&self) -> bool {
        self.command.is_empty() && self.template.is_empty()
    }
}

/// Identity metadata an extension exposes.
///
/// All fields are optional until resolved from a descriptor. An extension
/// whose resolved identity is missing `name` or `version` is treated as
/// invalid regardless of whether its capability payload parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginIdentity {
    /// Display name of the plugin.
    pub name: Option<String>,

    /// Version string (e.g., "1.0.0").
    pub version: Option<String>,

    /// Optional human-readable description.
    pub description: Option<String>,
}

impl PluginIdentity {
    /// Whether both name and version are present and non-empty.
    pub fn is_complete(&self) -> bool {
        self.name.as_deref().is_some_and(|n| !n.trim().is_empty())
            && self
                .version
                .as_deref()
                .is_some_and(|v| !v.trim().is_empty())
    }

    /// The description, falling back to a placeholder when absent.
    pub fn display_description(&self) -> &str {
        self.description.as_deref().unwrap_or(NO_DESCRIPTION)
    }
}

/// A shell exec specification carried by command and template extensions.
///
/// The command template uses `{{param_name}}` syntax for parameter
/// interpolation. Templates must not contain dangerous shell operators
/// (`&&`, `||`, `;`, `|`, backticks); the loader rejects descriptors that do.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecSpec {
    /// Shell command template. Uses `{{param_name}}` for parameter interpolation.
    pub command: String,

    /// Optional working directory for command execution.
    #[serde(default)]
    pub working_dir: Option<String>,

    /// Optional timeout in seconds. Defaults to 30 if not specified.
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Optional environment variables to set during command execution.
    #[serde(default)]
    pub env: Option<HashMap<String, String>>,
}

impl ExecSpec {
    /// Returns the effective timeout in seconds, defaulting to 30.
    pub fn effective_timeout(&self) -> u64 {
        self.timeout_secs.unwrap_or(30)
    }
}

/// The `command` capability payload of an extension descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandSpec {
    /// Command name as it appears in the CLI tree. Alphanumeric characters,
    /// hyphens and underscores only, starting with a letter.
    pub name: String,

    /// Alternative names for the command, unique within the parent node.
    #[serde(default)]
    pub aliases: Vec<String>,

    /// Optional `/`-separated path of an existing command group to nest
    /// under (e.g., `"deps"` or `"remote/sync"`). Absent means top level.
    #[serde(default)]
    pub parent: Option<String>,

    /// What the command does when invoked.
    pub exec: ExecSpec,
}

/// The fixed set of scaffold kinds a template extension may provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateKind {
    Pipeline,
    Project,
    Docker,
    Kubernetes,
    Quickstart,
}

impl std::fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TemplateKind::Pipeline => "pipeline",
            TemplateKind::Project => "project",
            TemplateKind::Docker => "docker",
            TemplateKind::Kubernetes => "kubernetes",
            TemplateKind::Quickstart => "quickstart",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for TemplateKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pipeline" => Ok(TemplateKind::Pipeline),
            "project" => Ok(TemplateKind::Project),
            "docker" => Ok(TemplateKind::Docker),
            "kubernetes" => Ok(TemplateKind::Kubernetes),
            "quickstart" => Ok(TemplateKind::Quickstart),
            other => Err(format!(
                "unknown template kind '{}' (expected pipeline, project, docker, kubernetes or quickstart)",
                other
            )),
        }
    }
}

/// The `template` capability payload of an extension descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateSpec {
    /// Which scaffold this template provides.
    pub kind: TemplateKind,

    /// The scaffold action. Receives `{{name}}` and `{{dir}}` parameters.
    pub exec: ExecSpec,
}

/// An extension descriptor as stored at `ext/<TypeName>.json` inside a
/// package.
///
/// Carries the identity fields plus exactly one capability payload. The
/// loader deserializes this into a [`LoadedExtension`], the equivalent of
/// instantiating the declared type.
///
/// # Example
///
/// ```json
/// {
///   "name": "hello",
///   "version": "1.0.0",
///   "description": "Friendly greeting command",
///   "command": {
///     "name": "hello",
///     "aliases": ["hi"],
///     "exec": { "command": "echo Hello {{name}}", "timeout_secs": 10 }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionDescriptor {
    /// Plugin display name.
    #[serde(default)]
    pub name: Option<String>,

    /// Plugin version string.
    #[serde(default)]
    pub version: Option<String>,

    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,

    /// Command capability payload, if this type implements `Command`.
    #[serde(default)]
    pub command: Option<CommandSpec>,

    /// Template capability payload, if this type implements `Template`.
    #[serde(default)]
    pub template: Option<TemplateSpec>,
}

impl ExtensionDescriptor {
    /// The identity fields of this descriptor.
    pub fn identity(&self) -> PluginIdentity {
        PluginIdentity {
            name: self.name.clone(),
            version: self.version.clone(),
            description: self.description.clone(),
        }
    }
}

/// The capability payload of a successfully loaded extension.
#[derive(Debug, Clone)]
pub enum ExtensionPayload {
    Command(CommandSpec),
    Template(TemplateSpec),
}

impl ExtensionPayload {
    /// Which capability this payload satisfies.
    pub fn kind(&self) -> CapabilityKind {
        match self {
            ExtensionPayload::Command(_) => CapabilityKind::Command,
            ExtensionPayload::Template(_) => CapabilityKind::Template,
        }
    }
}

/// A successfully instantiated extension: one declared type from one
/// package, loaded for one capability.
#[derive(Debug, Clone)]
pub struct LoadedExtension {
    /// The type name this extension was declared under in the index.
    pub type_name: String,

    /// The package file the extension was loaded from.
    pub artifact: PathBuf,

    /// Identity metadata resolved from the descriptor.
    pub identity: PluginIdentity,

    /// The capability payload.
    pub payload: ExtensionPayload,
}

impl LoadedExtension {
    /// The plugin display name, if declared.
    pub fn name(&self) -> Option<&str> {
        self.identity.name.as_deref()
    }

    /// The command spec, if this extension satisfies `Command`.
    pub fn command(&self) -> Option<&CommandSpec> {
        match &self.payload {
            ExtensionPayload::Command(spec) => Some(spec),
            ExtensionPayload::Template(_) => None,
        }
    }

    /// The template spec, if this extension satisfies `Template`.
    pub fn template(&self) -> Option<&TemplateSpec> {
        match &self.payload {
            ExtensionPayload::Template(spec) => Some(spec),
            ExtensionPayload::Command(_) => None,
        }
    }
}

/// Plugin system configuration, stored within the main config.json.
///
/// Controls whether plugin commands are merged into the CLI tree, which
/// directories are scanned for packages, and which plugins are allowed or
/// blocked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginConfig {
    /// Whether plugin commands are merged into the command tree at startup.
    /// Defaults to true. Identity-only queries (`plugin list`) work either way.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Semicolon-delimited list of directories to scan for `.jpk` packages.
    /// Absent means the default user-scoped directory (`~/.javelin/plugins`).
    /// The `JAVELIN_PLUGIN_DIRS` environment variable takes precedence.
    #[serde(default)]
    pub dirs: Option<String>,

    /// Allowlist of plugin names. If empty, all discovered plugins are allowed.
    #[serde(default)]
    pub allowed_plugins: Vec<String>,

    /// Blocklist of plugin names. If empty, no plugins are blocked.
    /// Blocklist takes precedence over allowlist.
    #[serde(default)]
    pub blocked_plugins: Vec<String>,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dirs: None,
            allowed_plugins: Vec::new(),
            blocked_plugins: Vec::new(),
        }
    }
}

impl PluginConfig {
    /// Check whether a plugin name is permitted by the allow/block lists.
    ///
    /// A plugin is permitted if:
    /// - It is not in the blocked list, AND
    /// - The allowed list is empty (all plugins allowed) OR the plugin is in the allowed list.
    pub fn is_plugin_permitted(&self, name: &str) -> bool {
        if self.blocked_plugins.iter().any(|b| b == name) {
            return false;
        }
        if self.allowed_plugins.is_empty() {
            return true;
        }
        self.allowed_plugins.iter().any(|a| a == name)
    }

    /// The effective directory property: environment override first, then
    /// the config value, then `None` (meaning the default directory).
    pub fn dir_spec(&self) -> Option<String> {
        std::env::var("JAVELIN_PLUGIN_DIRS")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.dirs.clone())
    }
}

fn default_enabled() -> bool {
    true
}
