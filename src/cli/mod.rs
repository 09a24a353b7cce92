//! CLI dispatch for Javelin.
//!
//! The command tree (see [`tree`]) is assembled at startup: builtins first,
//! then the registrar merges plugin commands into it. The finished tree is
//! bridged into a `clap::Command` so plugin commands get the same help and
//! parsing treatment as builtins, and dispatch walks the matched path back
//! through the tree to the node's action.
//!
//! Plugin-loading failures never affect the exit code; only the invoked
//! command's own outcome does.

pub mod tree;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use clap::{Arg, ArgMatches, Command};
use tracing::warn;

use crate::config::Config;
use crate::error::{JavelinError, Result};
use crate::exec;
use crate::plugins::install::{default_manifest_path, install_artifact};
use crate::plugins::registrar::{register_commands, InteractivePrompt};
use crate::plugins::types::TemplateKind;
use crate::plugins::{builders, ArtifactLocator, CapabilityKind, PluginRegistry};
use crate::toolchain;

use tree::{builtin_tree, BuiltinCommand, CommandAction, CommandNode};

/// Assemble the command tree, parse arguments and run the matched command.
///
/// Returns the process exit code.
pub async fn run(config: Config) -> i32 {
    let registry = PluginRegistry::from_config(config.plugins.clone());

    let mut root = builtin_tree();
    if config.plugins.enabled {
        let command_plugins = registry.plugins(CapabilityKind::Command);
        register_commands(&mut root, &command_plugins, &mut InteractivePrompt);
    }

    let matches = build_clap(&root).get_matches();
    match dispatch(&root, &matches, &registry, &config).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {}", e);
            1
        }
    }
}

/// Bridge a command tree into a `clap::Command`.
pub fn build_clap(root: &CommandNode) -> Command {
    build_node(root, true)
}

fn build_node(node: &CommandNode, is_root: bool) -> Command {
    let mut cmd = Command::new(node.name.clone()).about(node.about.clone());

    if !node.aliases.is_empty() {
        cmd = cmd.visible_aliases(node.aliases.clone());
    }

    match &node.action {
        CommandAction::Group => {
            // Root stays invocable without a subcommand (prints version,
            // like any bare tool invocation); nested groups require one.
            if !is_root {
                cmd = cmd.subcommand_required(true).arg_required_else_help(true);
            }
        }
        CommandAction::Builtin(builtin) => {
            cmd = decorate_builtin(cmd, *builtin);
        }
        CommandAction::Plugin(_) => {
            cmd = cmd.arg(
                Arg::new("params")
                    .value_name("PARAMS")
                    .help("key=value exec parameters; bare words are joined into {{args}}")
                    .num_args(0..)
                    .allow_hyphen_values(true)
                    .trailing_var_arg(true),
            );
        }
    }

    for child in node.children.values() {
        cmd = cmd.subcommand(build_node(child, false));
    }

    cmd
}

/// Attach builtin-specific arguments.
fn decorate_builtin(cmd: Command, builtin: BuiltinCommand) -> Command {
    match builtin {
        BuiltinCommand::Build => cmd.arg(
            Arg::new("args")
                .value_name("ARGS")
                .help("Arguments passed through to the build tool")
                .num_args(0..)
                .allow_hyphen_values(true)
                .trailing_var_arg(true),
        ),
        BuiltinCommand::New => cmd
            .arg(
                Arg::new("name")
                    .value_name("NAME")
                    .help("Project name")
                    .required(true),
            )
            .arg(
                Arg::new("template")
                    .long("template")
                    .value_name("KIND")
                    .help("Scaffold via a template plugin (pipeline, project, docker, kubernetes, quickstart)"),
            ),
        BuiltinCommand::PluginAdd => cmd.arg(
            Arg::new("file")
                .value_name("FILE")
                .help("Plugin package to install")
                .required(true),
        ),
        BuiltinCommand::PluginInit => cmd
            .arg(
                Arg::new("name")
                    .value_name("NAME")
                    .help("Plugin name")
                    .required(true),
            )
            .arg(
                Arg::new("kind")
                    .long("kind")
                    .value_parser(["command", "template"])
                    .default_value("command")
                    .help("Capability the plugin implements"),
            ),
        BuiltinCommand::PluginPack => cmd
            .arg(
                Arg::new("dir")
                    .value_name("DIR")
                    .help("Plugin source directory")
                    .required(true),
            )
            .arg(
                Arg::new("output")
                    .long("output")
                    .short('o')
                    .value_name("FILE")
                    .help("Output package path"),
            ),
        BuiltinCommand::PluginList | BuiltinCommand::Version => cmd,
    }
}

/// Walk the matched subcommand path and run the node's action.
pub async fn dispatch(
    root: &CommandNode,
    matches: &ArgMatches,
    registry: &PluginRegistry,
    config: &Config,
) -> Result<i32> {
    let mut node = root;
    let mut m = matches;
    while let Some((name, sub)) = m.subcommand() {
        node = node.child(name).ok_or_else(|| {
            JavelinError::NotFound(format!("command '{}'", name))
        })?;
        m = sub;
    }

    match &node.action {
        CommandAction::Group => {
            // Bare `javelin` (clap enforces subcommands on nested groups).
            println!("javelin {}", env!("CARGO_PKG_VERSION"));
            Ok(0)
        }
        CommandAction::Builtin(builtin) => run_builtin(*builtin, m, registry, config).await,
        CommandAction::Plugin(cmd) => {
            let params = parse_plugin_params(
                m.get_many::<String>("params")
                    .map(|vals| vals.cloned().collect())
                    .unwrap_or_default(),
            );
            let outcome = exec::run_exec(&cmd.exec, &params).await?;
            print!("{}", outcome.stdout);
            eprint!("{}", outcome.stderr);
            Ok(outcome.status)
        }
    }
}

async fn run_builtin(
    builtin: BuiltinCommand,
    m: &ArgMatches,
    registry: &PluginRegistry,
    config: &Config,
) -> Result<i32> {
    match builtin {
        BuiltinCommand::Version => {
            println!("javelin {}", env!("CARGO_PKG_VERSION"));
            Ok(0)
        }
        BuiltinCommand::Build => {
            let args: Vec<String> = m
                .get_many::<String>("args")
                .map(|vals| vals.cloned().collect())
                .unwrap_or_default();
            toolchain::run_build(&std::env::current_dir()?, &args).await
        }
        BuiltinCommand::New => {
            let name = required_arg(m, "name")?;
            let template = m.get_one::<String>("template");
            scaffold_project(&std::env::current_dir()?, &name, template.map(String::as_str), registry)
                .await?;
            Ok(0)
        }
        BuiltinCommand::PluginAdd => {
            let file = PathBuf::from(required_arg(m, "file")?);
            let locator = ArtifactLocator::from_spec(config.plugins.dir_spec().as_deref());
            let plugin_dir = locator
                .dirs()
                .first()
                .cloned()
                .unwrap_or_else(crate::plugins::locator::default_plugin_dir);
            let record = install_artifact(&file, &plugin_dir, &default_manifest_path())?;
            println!(
                "Installed {} {} into {}",
                record.name,
                record.version,
                plugin_dir.display()
            );
            Ok(0)
        }
        BuiltinCommand::PluginList => {
            let plugins = registry.plugins(CapabilityKind::Command);
            if plugins.is_empty() {
                println!("No command plugins installed");
            } else {
                for ext in plugins.iter() {
                    println!(
                        "{} {} - {}",
                        ext.identity.name.as_deref().unwrap_or("?"),
                        ext.identity.version.as_deref().unwrap_or("?"),
                        ext.identity.display_description()
                    );
                }
            }
            Ok(0)
        }
        BuiltinCommand::PluginInit => {
            let name = required_arg(m, "name")?;
            let kind = match m.get_one::<String>("kind").map(String::as_str) {
                Some("template") => CapabilityKind::Template,
                _ => CapabilityKind::Command,
            };
            let root = builders::init_plugin(&std::env::current_dir()?, &name, kind)?;
            println!("Scaffolded plugin project at {}", root.display());
            Ok(0)
        }
        BuiltinCommand::PluginPack => {
            let dir = PathBuf::from(required_arg(m, "dir")?);
            let output = m.get_one::<String>("output").map(PathBuf::from);
            let pkg = builders::pack_plugin(&dir, output.as_deref())?;
            println!("Packed {}", pkg.display());
            Ok(0)
        }
    }
}

/// Split trailing plugin arguments into exec parameters.
///
/// `key=value` words become named parameters; everything else is joined
/// with spaces into the `args` parameter.
fn parse_plugin_params(raw: Vec<String>) -> HashMap<String, String> {
    let mut params = HashMap::new();
    let mut rest = Vec::new();

    for word in raw {
        match word.split_once('=') {
            Some((key, value)) if !key.is_empty() => {
                params.insert(key.to_string(), value.to_string());
            }
            _ => rest.push(word),
        }
    }

    params.insert("args".to_string(), rest.join(" "));
    params
}

/// Scaffold a new Java project, via a template plugin when requested.
async fn scaffold_project(
    parent: &Path,
    name: &str,
    template: Option<&str>,
    registry: &PluginRegistry,
) -> Result<()> {
    let target = parent.join(name);
    if target.exists() {
        return Err(JavelinError::Config(format!(
            "directory {} already exists",
            target.display()
        )));
    }

    if let Some(kind_str) = template {
        let kind = TemplateKind::from_str(kind_str).map_err(JavelinError::Config)?;
        let templates = registry.plugins(CapabilityKind::Template);
        let ext = templates
            .iter()
            .find(|e| e.template().is_some_and(|t| t.kind == kind))
            .ok_or_else(|| {
                JavelinError::NotFound(format!("no template plugin provides '{}'", kind))
            })?;

        let spec = ext
            .template()
            .ok_or_else(|| JavelinError::Plugin("template payload vanished".to_string()))?;
        let mut params = HashMap::new();
        params.insert("name".to_string(), name.to_string());
        params.insert("dir".to_string(), target.display().to_string());

        let outcome = exec::run_exec(&spec.exec, &params).await?;
        if !outcome.success() {
            warn!(status = outcome.status, "Template scaffold exited non-zero");
            return Err(JavelinError::Exec(format!(
                "template '{}' scaffold failed: {}",
                kind,
                outcome.stderr.trim()
            )));
        }
        println!("Scaffolded {} from '{}' template", target.display(), kind);
        return Ok(());
    }

    // Builtin bare scaffold: a minimal Maven layout.
    let java_dir = target.join("src").join("main").join("java");
    std::fs::create_dir_all(&java_dir)?;
    std::fs::write(
        java_dir.join("Main.java"),
        "public class Main {\n    public static void main(String[] args) {\n        System.out.println(\"Hello from javelin\");\n    }\n}\n",
    )?;
    std::fs::write(
        target.join("pom.xml"),
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0">
  <modelVersion>4.0.0</modelVersion>
  <groupId>com.example</groupId>
  <artifactId>{name}</artifactId>
  <version>0.1.0-SNAPSHOT</version>
  <properties>
    <maven.compiler.release>17</maven.compiler.release>
  </properties>
</project>
"#
        ),
    )?;
    println!("Scaffolded {}", target.display());
    Ok(())
}

fn required_arg(m: &ArgMatches, name: &str) -> Result<String> {
    m.get_one::<String>(name)
        .cloned()
        .ok_or_else(|| JavelinError::Config(format!("missing required argument '{}'", name)))
}
