//! External collaborator execution.
//!
//! Feed acquisition and artifact derivation are black boxes behind a command
//! line: they are spawned as child processes with captured output and an
//! optional timeout. Any failure is fatal to the run (no retry here).

use std::process::Stdio;
use std::time::Instant;

use tokio::process::Command;
use tracing::info;

use crate::error::{BastionError, Result};

/// One external pipeline stage (fetch or derive).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalStage {
    /// Stage name used in logs and error messages.
    pub name: String,

    /// Command to execute; first element is the executable.
    pub command: Vec<String>,

    /// Timeout in seconds; 0 disables the timeout.
    pub timeout_secs: u64,
}

impl ExternalStage {
    pub fn new(name: impl Into<String>, command: Vec<String>, timeout_secs: u64) -> Self {
        Self {
            name: name.into(),
            command,
            timeout_secs,
        }
    }

    /// Parse a whitespace-separated command line, as supplied via CLI or env.
    pub fn from_command_line(name: impl Into<String>, line: &str, timeout_secs: u64) -> Self {
        Self::new(
            name,
            line.split_whitespace().map(str::to_string).collect(),
            timeout_secs,
        )
    }
}

/// Captured output of a successful stage execution.
#[derive(Debug, Clone)]
pub struct StageOutput {
    pub stage_name: String,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
}

/// Execute one external stage to completion.
///
/// Non-zero exit or spawn failure maps to `Upstream`; an elapsed timeout maps
/// to `StageTimeout`. Both abort the run.
pub async fn run_stage(stage: &ExternalStage) -> Result<StageOutput> {
    let start = Instant::now();

    if stage.command.is_empty() {
        return Err(BastionError::Upstream {
            stage: stage.name.clone(),
            exit_code: -1,
            stderr: "empty command".to_string(),
        });
    }

    let exe = &stage.command[0];
    let args = &stage.command[1..];

    let child = Command::new(exe)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| BastionError::Upstream {
            stage: stage.name.clone(),
            exit_code: -1,
            stderr: format!("failed to spawn {exe}: {e}"),
        })?;

    let output = if stage.timeout_secs > 0 {
        tokio::time::timeout(
            std::time::Duration::from_secs(stage.timeout_secs),
            child.wait_with_output(),
        )
        .await
        .map_err(|_| BastionError::StageTimeout {
            stage: stage.name.clone(),
            timeout_secs: stage.timeout_secs,
        })??
    } else {
        child.wait_with_output().await?
    };

    let duration_ms = start.elapsed().as_millis() as u64;
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    if !output.status.success() {
        return Err(BastionError::Upstream {
            stage: stage.name.clone(),
            exit_code: output.status.code().unwrap_or(-1),
            stderr,
        });
    }

    info!(
        event = "stage.completed",
        stage = %stage.name,
        duration_ms = duration_ms,
    );

    Ok(StageOutput {
        stage_name: stage.name.clone(),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr,
        duration_ms,
    })
}
