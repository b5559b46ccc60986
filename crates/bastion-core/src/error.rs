//! Error taxonomy for the Bastion Codex pipeline.

use std::path::PathBuf;

/// Bastion pipeline errors.
///
/// `MissingArtifact`, `MalformedArtifact`, `Upstream` and `StageTimeout` are
/// fatal and abort the run. `Export` is produced by sinks and caught by the
/// orchestrator: export is best-effort and never fails a run.
#[derive(Debug, thiserror::Error)]
pub enum BastionError {
    #[error("missing required artifact: {}", .0.display())]
    MissingArtifact(PathBuf),

    #[error("malformed artifact {}: {source}", .path.display())]
    MalformedArtifact {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{stage} stage failed with exit code {exit_code}: {stderr}")]
    Upstream {
        stage: String,
        exit_code: i32,
        stderr: String,
    },

    #[error("{stage} stage timed out after {timeout_secs}s")]
    StageTimeout { stage: String, timeout_secs: u64 },

    #[error("export sink {sink} failed: {reason}")]
    Export { sink: String, reason: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for Bastion pipeline operations.
pub type Result<T> = std::result::Result<T, BastionError>;
