//! The host command tree.
//!
//! [`CommandNode`] is the hierarchical structure of invocable commands the
//! dispatcher walks when parsing operator input. The tree is owned by the
//! dispatcher; the plugin registrar only inserts or replaces leaf nodes and
//! never restructures the tree shape. Command names and aliases are unique
//! within a parent node.

use std::collections::BTreeMap;

use crate::plugins::types::{ExecSpec, PluginIdentity};

/// Builtin commands, dispatched directly by the CLI layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinCommand {
    /// Delegate to the project's Maven/Gradle wrapper.
    Build,
    /// Scaffold a new Java project (builtin or template plugin).
    New,
    /// Install a plugin package into the plugin directory.
    PluginAdd,
    /// List discovered command plugins.
    PluginList,
    /// Scaffold a new plugin source directory.
    PluginInit,
    /// Pack a plugin source directory into a `.jpk` package.
    PluginPack,
    /// Print version information.
    Version,
}

/// What a tree node does when invoked.
#[derive(Debug, Clone)]
pub enum CommandAction {
    /// A builtin handled by the CLI layer.
    Builtin(BuiltinCommand),
    /// A plugin-contributed command: interpolate and run its exec template.
    Plugin(PluginCommand),
    /// A pure namespace; invoking it prints help for its children.
    Group,
}

/// A plugin-contributed command bound into the tree.
#[derive(Debug, Clone)]
pub struct PluginCommand {
    /// Identity of the contributing plugin (complete by construction:
    /// the registry filters incomplete identities before registration).
    pub identity: PluginIdentity,
    /// The exec template to run.
    pub exec: ExecSpec,
}

/// One node of the command tree.
#[derive(Debug, Clone)]
pub struct CommandNode {
    /// Command name, unique within the parent.
    pub name: String,
    /// Help text shown by the dispatcher.
    pub about: String,
    /// Alternative names, unique within the parent.
    pub aliases: Vec<String>,
    /// What invoking this node does.
    pub action: CommandAction,
    /// Child commands by name. Ordered for deterministic help output.
    pub children: BTreeMap<String, CommandNode>,
}

impl CommandNode {
    /// Create a namespace node.
    pub fn group(name: &str, about: &str) -> Self {
        Self {
            name: name.to_string(),
            about: about.to_string(),
            aliases: Vec::new(),
            action: CommandAction::Group,
            children: BTreeMap::new(),
        }
    }

    /// Create a leaf node.
    pub fn leaf(name: &str, about: &str, action: CommandAction) -> Self {
        Self {
            name: name.to_string(),
            about: about.to_string(),
            aliases: Vec::new(),
            action,
            children: BTreeMap::new(),
        }
    }

    /// Set aliases, builder-style.
    pub fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = aliases.iter().map(|a| a.to_string()).collect();
        self
    }

    /// Add a child, builder-style. Panics on duplicate names in builtin
    /// tree construction; runtime insertion goes through
    /// [`insert_child`](CommandNode::insert_child).
    pub fn with_child(mut self, child: CommandNode) -> Self {
        assert!(
            !self.children.contains_key(&child.name),
            "duplicate builtin command '{}'",
            child.name
        );
        self.children.insert(child.name.clone(), child);
        self
    }

    /// Look up a direct child by name or alias.
    pub fn child(&self, name: &str) -> Option<&CommandNode> {
        self.children.get(name).or_else(|| {
            self.children
                .values()
                .find(|c| c.aliases.iter().any(|a| a == name))
        })
    }

    /// Whether a direct child with this name or alias exists.
    pub fn has_child(&self, name: &str) -> bool {
        self.child(name).is_some()
    }

    /// Every name and alias claimed by direct children.
    pub fn claimed_names(&self) -> Vec<&str> {
        self.children
            .values()
            .flat_map(|c| std::iter::once(c.name.as_str()).chain(c.aliases.iter().map(String::as_str)))
            .collect()
    }

    /// Insert or replace a direct child, returning the replaced node if any.
    pub fn insert_child(&mut self, child: CommandNode) -> Option<CommandNode> {
        self.children.insert(child.name.clone(), child)
    }

    /// Remove a direct child by name.
    pub fn remove_child(&mut self, name: &str) -> Option<CommandNode> {
        self.children.remove(name)
    }

    /// Resolve a `/`-separated path (e.g. `"remote/sync"`) to a node.
    pub fn find_path_mut(&mut self, path: &str) -> Option<&mut CommandNode> {
        let mut node = self;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            node = node.children.get_mut(segment)?;
        }
        Some(node)
    }
}

/// Build the builtin command tree.
///
/// This is the static portion of the command surface; the registrar merges
/// plugin commands into it before the dispatcher parses arguments.
pub fn builtin_tree() -> CommandNode {
    CommandNode::group("javelin", "Java project lifecycle manager")
        .with_child(CommandNode::leaf(
            "build",
            "Build the project with its Maven/Gradle wrapper",
            CommandAction::Builtin(BuiltinCommand::Build),
        ))
        .with_child(CommandNode::leaf(
            "new",
            "Scaffold a new Java project",
            CommandAction::Builtin(BuiltinCommand::New),
        ))
        .with_child(
            CommandNode::group("plugin", "Manage Javelin plugins")
                .with_child(CommandNode::leaf(
                    "add",
                    "Install a plugin package",
                    CommandAction::Builtin(BuiltinCommand::PluginAdd),
                ))
                .with_child(
                    CommandNode::leaf(
                        "list",
                        "List discovered command plugins",
                        CommandAction::Builtin(BuiltinCommand::PluginList),
                    )
                    .with_aliases(&["ls"]),
                )
                .with_child(CommandNode::leaf(
                    "init",
                    "Scaffold a new plugin source directory",
                    CommandAction::Builtin(BuiltinCommand::PluginInit),
                ))
                .with_child(CommandNode::leaf(
                    "pack",
                    "Pack a plugin source directory into a .jpk package",
                    CommandAction::Builtin(BuiltinCommand::PluginPack),
                )),
        )
        .with_child(CommandNode::leaf(
            "version",
            "Show version information",
            CommandAction::Builtin(BuiltinCommand::Version),
        ))
}
