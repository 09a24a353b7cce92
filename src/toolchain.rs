//! Build-tool delegation.
//!
//! `javelin build` is thin process orchestration: detect the project's
//! build tool (wrapper scripts first, then whatever is on PATH) and pass
//! the operator's arguments straight through.

use std::path::Path;
use std::process::Stdio;

use tracing::{debug, info};

use crate::error::{JavelinError, Result};

/// A detected build tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildTool {
    /// `./mvnw` wrapper in the project directory.
    MavenWrapper,
    /// `./gradlew` wrapper in the project directory.
    GradleWrapper,
    /// `mvn` from PATH (project has a `pom.xml`).
    Maven,
    /// `gradle` from PATH (project has a `build.gradle[.kts]`).
    Gradle,
}

impl BuildTool {
    /// The program to invoke.
    pub fn program(&self) -> &'static str {
        match self {
            BuildTool::MavenWrapper => "./mvnw",
            BuildTool::GradleWrapper => "./gradlew",
            BuildTool::Maven => "mvn",
            BuildTool::Gradle => "gradle",
        }
    }
}

/// Detect the build tool for a project directory.
///
/// Wrapper scripts win over PATH tools; Maven wins ties, matching the
/// order most Java shops expect.
pub fn detect_build_tool(project_dir: &Path) -> Option<BuildTool> {
    if project_dir.join("mvnw").is_file() {
        return Some(BuildTool::MavenWrapper);
    }
    if project_dir.join("gradlew").is_file() {
        return Some(BuildTool::GradleWrapper);
    }
    if project_dir.join("pom.xml").is_file() {
        return Some(BuildTool::Maven);
    }
    if project_dir.join("build.gradle").is_file()
        || project_dir.join("build.gradle.kts").is_file()
    {
        return Some(BuildTool::Gradle);
    }
    None
}

/// Run the project's build tool with the given arguments, inheriting
/// stdio, and return its exit code.
pub async fn run_build(project_dir: &Path, args: &[String]) -> Result<i32> {
    let tool = detect_build_tool(project_dir).ok_or_else(|| {
        JavelinError::NotFound(format!(
            "no Maven or Gradle project in {}",
            project_dir.display()
        ))
    })?;

    info!(tool = %tool.program(), args = ?args, "Delegating build");

    let status = tokio::process::Command::new(tool.program())
        .args(args)
        .current_dir(project_dir)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .await
        .map_err(|e| JavelinError::Exec(format!("Failed to run {}: {}", tool.program(), e)))?;

    let code = status.code().unwrap_or(-1);
    debug!(code, "Build tool exited");
    Ok(code)
}
