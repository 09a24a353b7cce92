//! Conflict-aware registration of plugin commands into the command tree.
//!
//! The registrar consumes the registry's command-capable extensions and
//! mutates the live command tree in place. It runs exactly once,
//! synchronously, at process startup, before any command dispatch begins.
//! It blocks on interactive operator confirmation per collision, so it must
//! stay on the main execution path.
//!
//! The merge logic itself is deterministic: collision decisions come from
//! an injected [`DecisionSource`] (an interactive prompt in production,
//! scripted answers in tests).

use std::collections::VecDeque;
use std::io::{BufRead, Write};

use tracing::{info, warn};

use crate::cli::tree::{CommandAction, CommandNode, PluginCommand};

use super::types::{ExtensionPayload, LoadedExtension};

/// Supplies override decisions when a plugin command collides with an
/// existing command.
pub trait DecisionSource {
    /// Whether the existing command `name` should be replaced by the
    /// command contributed by `plugin` (a `name@version` label).
    fn confirm_override(&mut self, name: &str, plugin: &str) -> bool;
}

/// Interactive y/N prompt on the operator's terminal.
///
/// Anything other than an explicit yes (including a cancelled or failed
/// read) declines the override.
#[derive(Debug, Default)]
pub struct InteractivePrompt;

impl DecisionSource for InteractivePrompt {
    fn confirm_override(&mut self, name: &str, plugin: &str) -> bool {
        let mut stdout = std::io::stdout();
        if write!(
            stdout,
            "Command '{}' already exists. Replace it with the one from plugin '{}'? [y/N] ",
            name, plugin
        )
        .and_then(|_| stdout.flush())
        .is_err()
        {
            return false;
        }

        let mut answer = String::new();
        if std::io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        let answer = answer.trim();
        answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes")
    }
}

/// Scripted decisions for tests and non-interactive runs.
///
/// Pops one answer per collision; when the script runs dry every further
/// collision is declined.
#[derive(Debug, Default)]
pub struct ScriptedDecisions {
    answers: VecDeque<bool>,
}

impl ScriptedDecisions {
    pub fn new(answers: impl IntoIterator<Item = bool>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
        }
    }
}

impl DecisionSource for ScriptedDecisions {
    fn confirm_override(&mut self, _name: &str, _plugin: &str) -> bool {
        self.answers.pop_front().unwrap_or(false)
    }
}

/// Outcome counts of one registration pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RegistrationSummary {
    /// Commands inserted without conflict.
    pub added: usize,
    /// Commands that replaced an existing entry after confirmation.
    pub replaced: usize,
    /// Commands dropped (declined override, missing parent, bad payload).
    pub skipped: usize,
}

/// Merge command-capable extensions into the command tree.
///
/// Extensions are processed in list order (filesystem enumeration order;
/// documented, not load-bearing). For each contributed command: a free name
/// is inserted directly, at top level or nested under its `parent` path. A
/// name collision is put to the decision source; confirmation replaces the
/// existing entry, anything else leaves the tree untouched and drops the
/// plugin's contribution for this run. Aliases that collide with sibling
/// names or aliases are dropped individually with a warning.
pub fn register_commands(
    tree: &mut CommandNode,
    plugins: &[LoadedExtension],
    decisions: &mut dyn DecisionSource,
) -> RegistrationSummary {
    let mut summary = RegistrationSummary::default();

    for ext in plugins {
        let ExtensionPayload::Command(spec) = &ext.payload else {
            continue;
        };

        let plugin_label = format!(
            "{}@{}",
            ext.identity.name.as_deref().unwrap_or("?"),
            ext.identity.version.as_deref().unwrap_or("?")
        );

        let parent = match &spec.parent {
            Some(path) => match tree.find_path_mut(path) {
                Some(node) if matches!(node.action, CommandAction::Group) => node,
                Some(_) => {
                    warn!(
                        command = %spec.name,
                        plugin = %plugin_label,
                        parent = %path,
                        "Parent is not a command group, dropping plugin command"
                    );
                    summary.skipped += 1;
                    continue;
                }
                None => {
                    warn!(
                        command = %spec.name,
                        plugin = %plugin_label,
                        parent = %path,
                        "Parent command group not found, dropping plugin command"
                    );
                    summary.skipped += 1;
                    continue;
                }
            },
            None => &mut *tree,
        };

        // Aliases must stay unique within the parent; drop offenders
        // individually rather than the whole command.
        let claimed: Vec<String> = parent
            .claimed_names()
            .into_iter()
            .filter(|n| *n != spec.name)
            .map(String::from)
            .collect();
        let mut aliases = Vec::new();
        for alias in &spec.aliases {
            if claimed.iter().any(|c| c == alias) {
                warn!(
                    command = %spec.name,
                    alias = %alias,
                    plugin = %plugin_label,
                    "Alias already claimed, dropping alias"
                );
            } else {
                aliases.push(alias.clone());
            }
        }

        let node = CommandNode {
            name: spec.name.clone(),
            about: ext.identity.display_description().to_string(),
            aliases,
            action: CommandAction::Plugin(PluginCommand {
                identity: ext.identity.clone(),
                exec: spec.exec.clone(),
            }),
            children: Default::default(),
        };

        if parent.children.contains_key(&spec.name) {
            if decisions.confirm_override(&spec.name, &plugin_label) {
                parent.insert_child(node);
                info!(
                    command = %spec.name,
                    plugin = %plugin_label,
                    "Replaced existing command with plugin command"
                );
                summary.replaced += 1;
            } else {
                info!(
                    command = %spec.name,
                    plugin = %plugin_label,
                    "Override declined, keeping existing command"
                );
                summary.skipped += 1;
            }
        } else {
            parent.insert_child(node);
            info!(command = %spec.name, plugin = %plugin_label, "Registered plugin command");
            summary.added += 1;
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::tree::{builtin_tree, BuiltinCommand};
    use crate::plugins::types::{
        CommandSpec, ExecSpec, ExtensionPayload, PluginIdentity,
    };
    use std::path::PathBuf;

    fn command_ext(plugin: &str, command: &str, parent: Option<&str>) -> LoadedExtension {
        command_ext_with_aliases(plugin, command, parent, &[])
    }

    fn command_ext_with_aliases(
        plugin: &str,
        command: &str,
        parent: Option<&str>,
        aliases: &[&str],
    ) -> LoadedExtension {
        LoadedExtension {
            type_name: format!("{}Command", command),
            artifact: PathBuf::from(format!("/tmp/{}.jpk", plugin)),
            identity: PluginIdentity {
                name: Some(plugin.to_string()),
                version: Some("1.0.0".to_string()),
                description: None,
            },
            payload: ExtensionPayload::Command(CommandSpec {
                name: command.to_string(),
                aliases: aliases.iter().map(|a| a.to_string()).collect(),
                parent: parent.map(String::from),
                exec: ExecSpec {
                    command: format!("echo {}", command),
                    working_dir: None,
                    timeout_secs: None,
                    env: None,
                },
            }),
        }
    }

    #[test]
    fn test_new_command_is_inserted_at_top_level() {
        let mut tree = builtin_tree();
        let plugins = vec![command_ext("hello", "hello", None)];
        let summary =
            register_commands(&mut tree, &plugins, &mut ScriptedDecisions::default());

        assert_eq!(summary.added, 1);
        let node = tree.child("hello").unwrap();
        assert!(matches!(node.action, CommandAction::Plugin(_)));
    }

    #[test]
    fn test_nested_insert_under_parent_path() {
        let mut tree = builtin_tree();
        let plugins = vec![command_ext("extras", "audit", Some("plugin"))];
        let summary =
            register_commands(&mut tree, &plugins, &mut ScriptedDecisions::default());

        assert_eq!(summary.added, 1);
        assert!(tree.child("plugin").unwrap().has_child("audit"));
        assert!(!tree.has_child("audit"));
    }

    #[test]
    fn test_leaf_parent_drops_command() {
        let mut tree = builtin_tree();
        // "version" is a leaf, not a group.
        let plugins = vec![command_ext("extras", "audit", Some("version"))];
        let summary =
            register_commands(&mut tree, &plugins, &mut ScriptedDecisions::default());

        assert_eq!(summary.skipped, 1);
        assert!(tree.child("version").unwrap().children.is_empty());
    }

    #[test]
    fn test_missing_parent_drops_command() {
        let mut tree = builtin_tree();
        let plugins = vec![command_ext("extras", "audit", Some("remote/sync"))];
        let summary =
            register_commands(&mut tree, &plugins, &mut ScriptedDecisions::default());

        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.added, 0);
    }

    #[test]
    fn test_confirmed_override_replaces_builtin() {
        let mut tree = builtin_tree();
        let plugins = vec![command_ext("builder", "build", None)];
        let mut decisions = ScriptedDecisions::new([true]);
        let summary = register_commands(&mut tree, &plugins, &mut decisions);

        assert_eq!(summary.replaced, 1);
        let node = tree.child("build").unwrap();
        assert!(matches!(node.action, CommandAction::Plugin(_)));
    }

    #[test]
    fn test_declined_override_keeps_existing_and_drops_plugin() {
        let mut tree = builtin_tree();
        let plugins = vec![command_ext("builder", "build", None)];
        let mut decisions = ScriptedDecisions::new([false]);
        let summary = register_commands(&mut tree, &plugins, &mut decisions);

        assert_eq!(summary.skipped, 1);
        let node = tree.child("build").unwrap();
        assert!(matches!(
            node.action,
            CommandAction::Builtin(BuiltinCommand::Build)
        ));
    }

    #[test]
    fn test_confirm_first_decline_second_collision() {
        // Two plugins claim the same name: the first override is confirmed
        // (replacing the builtin), the second is declined (first plugin's
        // command survives, second contributes nothing).
        let mut tree = builtin_tree();
        let plugins = vec![
            command_ext("first", "build", None),
            command_ext("second", "build", None),
        ];
        let mut decisions = ScriptedDecisions::new([true, false]);
        let summary = register_commands(&mut tree, &plugins, &mut decisions);

        assert_eq!(summary.replaced, 1);
        assert_eq!(summary.skipped, 1);
        match &tree.child("build").unwrap().action {
            CommandAction::Plugin(cmd) => {
                assert_eq!(cmd.identity.name.as_deref(), Some("first"));
            }
            other => panic!("expected plugin command, got {:?}", other),
        }
    }

    #[test]
    fn test_plugin_vs_plugin_collision_is_resolved_like_any_other() {
        let mut tree = builtin_tree();
        let plugins = vec![
            command_ext("first", "deploy", None),
            command_ext("second", "deploy", None),
        ];
        let mut decisions = ScriptedDecisions::new([true]);
        let summary = register_commands(&mut tree, &plugins, &mut decisions);

        assert_eq!(summary.added, 1);
        assert_eq!(summary.replaced, 1);
        match &tree.child("deploy").unwrap().action {
            CommandAction::Plugin(cmd) => {
                assert_eq!(cmd.identity.name.as_deref(), Some("second"));
            }
            other => panic!("expected plugin command, got {:?}", other),
        }
    }

    #[test]
    fn test_colliding_alias_is_dropped_but_command_registers() {
        let mut tree = builtin_tree();
        // "version" is a builtin name; the alias collides, the command does not.
        let plugins = vec![command_ext_with_aliases(
            "greeter",
            "greet",
            None,
            &["version", "hi"],
        )];
        let summary =
            register_commands(&mut tree, &plugins, &mut ScriptedDecisions::default());

        assert_eq!(summary.added, 1);
        let node = tree.child("greet").unwrap();
        assert_eq!(node.aliases, vec!["hi"]);
    }

    #[test]
    fn test_template_extensions_are_ignored() {
        use crate::plugins::types::{TemplateKind, TemplateSpec};

        let mut tree = builtin_tree();
        let ext = LoadedExtension {
            type_name: "Tpl".to_string(),
            artifact: PathBuf::from("/tmp/tpl.jpk"),
            identity: PluginIdentity {
                name: Some("tpl".to_string()),
                version: Some("1.0".to_string()),
                description: None,
            },
            payload: ExtensionPayload::Template(TemplateSpec {
                kind: TemplateKind::Quickstart,
                exec: ExecSpec {
                    command: "sh gen.sh".to_string(),
                    working_dir: None,
                    timeout_secs: None,
                    env: None,
                },
            }),
        };
        let summary = register_commands(&mut tree, &[ext], &mut ScriptedDecisions::default());
        assert_eq!(summary, RegistrationSummary::default());
    }

    #[test]
    fn test_second_invocation_does_not_crash() {
        // A second pass against an already-mutated tree is out of contract;
        // it only needs to not panic.
        let mut tree = builtin_tree();
        let plugins = vec![command_ext("hello", "hello", None)];
        register_commands(&mut tree, &plugins, &mut ScriptedDecisions::default());
        register_commands(&mut tree, &plugins, &mut ScriptedDecisions::new([true]));
    }

    #[test]
    fn test_description_becomes_about_text() {
        let mut tree = builtin_tree();
        let mut ext = command_ext("hello", "hello", None);
        ext.identity.description = Some("Says hello".to_string());
        register_commands(&mut tree, &[ext], &mut ScriptedDecisions::default());
        assert_eq!(tree.child("hello").unwrap().about, "Says hello");
    }
}
