//! Exec-template execution for plugin actions.
//!
//! Plugin commands and template scaffolds carry shell command templates
//! with `{{param_name}}` interpolation. This module interpolates the
//! template from caller-supplied parameters and runs it through the shell
//! with the descriptor's working directory, environment and timeout.

use std::collections::HashMap;
use std::process::Stdio;
use std::time::Duration;

use tracing::debug;

use crate::error::{JavelinError, Result};
use crate::plugins::types::ExecSpec;

/// Captured outcome of one exec-template run.
#[derive(Debug)]
pub struct ExecOutcome {
    /// Process exit code (`-1` if terminated by a signal).
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutcome {
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// Interpolate `{{param_name}}` placeholders in a template.
///
/// Unknown placeholders are left intact so the failure is visible in the
/// executed command rather than silently swallowed.
pub fn interpolate(template: &str, params: &HashMap<String, String>) -> String {
    let mut out = template.to_string();
    for (key, value) in params {
        out = out.replace(&format!("{{{{{}}}}}", key), value);
    }
    out
}

/// Interpolate and run an exec spec.
///
/// The command runs via `sh -c` (descriptors are screened for shell
/// metacharacters at load time), with the spec's environment, working
/// directory and timeout applied.
pub async fn run_exec(spec: &ExecSpec, params: &HashMap<String, String>) -> Result<ExecOutcome> {
    let command = interpolate(&spec.command, params);
    debug!(command = %command, "Running exec template");

    let mut cmd = tokio::process::Command::new("sh");
    cmd.arg("-c")
        .arg(&command)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    if let Some(dir) = &spec.working_dir {
        cmd.current_dir(dir);
    }
    if let Some(env) = &spec.env {
        for (key, value) in env {
            cmd.env(key, value);
        }
    }

    let child = cmd
        .spawn()
        .map_err(|e| JavelinError::Exec(format!("Failed to spawn '{}': {}", command, e)))?;

    let timeout = Duration::from_secs(spec.effective_timeout());
    let output = tokio::time::timeout(timeout, child.wait_with_output())
        .await
        .map_err(|_| {
            JavelinError::Exec(format!(
                "Command '{}' timed out after {}s",
                command,
                timeout.as_secs()
            ))
        })?
        .map_err(|e| JavelinError::Exec(format!("Failed to run '{}': {}", command, e)))?;

    Ok(ExecOutcome {
        status: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn spec(command: &str) -> ExecSpec {
        ExecSpec {
            command: command.to_string(),
            working_dir: None,
            timeout_secs: None,
            env: None,
        }
    }

    #[test]
    fn test_interpolate_replaces_known_params() {
        let result = interpolate(
            "git -C {{path}} checkout {{branch}}",
            &params(&[("path", "/repo"), ("branch", "main")]),
        );
        assert_eq!(result, "git -C /repo checkout main");
    }

    #[test]
    fn test_interpolate_leaves_unknown_params() {
        let result = interpolate("echo {{missing}}", &params(&[]));
        assert_eq!(result, "echo {{missing}}");
    }

    #[test]
    fn test_interpolate_repeated_placeholder() {
        let result = interpolate("{{x}} and {{x}}", &params(&[("x", "a")]));
        assert_eq!(result, "a and a");
    }

    #[tokio::test]
    async fn test_run_exec_captures_stdout() {
        let outcome = run_exec(&spec("echo hello {{who}}"), &params(&[("who", "world")]))
            .await
            .unwrap();
        assert!(outcome.success());
        assert_eq!(outcome.stdout.trim(), "hello world");
    }

    #[tokio::test]
    async fn test_run_exec_nonzero_status() {
        let outcome = run_exec(&spec("exit 3"), &params(&[])).await.unwrap();
        assert!(!outcome.success());
        assert_eq!(outcome.status, 3);
    }

    #[tokio::test]
    async fn test_run_exec_env_and_timeout() {
        let mut s = spec("printenv GREETING");
        s.env = Some(params(&[("GREETING", "hi")]));
        s.timeout_secs = Some(5);
        let outcome = run_exec(&s, &params(&[])).await.unwrap();
        assert_eq!(outcome.stdout.trim(), "hi");
    }

    #[tokio::test]
    async fn test_run_exec_times_out() {
        let mut s = spec("sleep 5");
        s.timeout_secs = Some(1);
        let err = run_exec(&s, &params(&[])).await.unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }
}
