//! Bastion Codex Core Library
//!
//! The snapshot history, delta and brief-synthesis engine of the weekly
//! threat-intelligence pipeline. Feed acquisition and artifact derivation run
//! as external child processes; everything here operates on their JSON
//! outputs under an explicit run context.

pub mod artifact;
pub mod brief;
pub mod context;
pub mod delta;
pub mod error;
pub mod export;
pub mod pipeline;
pub mod snapshot;
pub mod stage;
pub mod telemetry;

pub use artifact::{
    ArtifactSet, NameCount, PriorityItem, Severity, SeverityCounts, TrendSummary, ARTIFACT_FILES,
    PRIORITY_ITEMS_FILE, TRENDS_30D_FILE, TRENDS_7D_FILE,
};
pub use brief::{rank_priority_items, Brief, BriefComposer, DESC_MAX_CHARS, TOP_ENTRIES};
pub use context::RunContext;
pub use delta::{compute as compute_delta, Delta, MetricChange, SeverityDeltas};
pub use error::{BastionError, Result};
pub use export::{ExportConfig, ExportSink, SiteSink, VaultSink};
pub use pipeline::{ExportOutcome, Pipeline, PipelineConfig, PipelineState, RunReport};
pub use snapshot::{SnapshotMeta, SnapshotPaths, SnapshotRef, SnapshotStore, META_FILE};
pub use stage::{run_stage, ExternalStage, StageOutput};
pub use telemetry::init_tracing;

/// Bastion Codex version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
