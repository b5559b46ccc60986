//! Pipeline orchestration: fetch, derive, snapshot, compare, compose, export.
//!
//! Strictly sequential; one run at a time. Every fatal error aborts the whole
//! run immediately, leaving no partial snapshot or brief visible. Export is
//! best-effort and never fails the run.

use std::path::PathBuf;
use std::time::Instant;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::brief::BriefComposer;
use crate::context::RunContext;
use crate::delta::{self, Delta};
use crate::error::Result;
use crate::export::ExportSink;
use crate::snapshot::SnapshotStore;
use crate::stage::{run_stage, ExternalStage};

/// Pipeline stages in execution order, plus the two terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Fetching,
    Deriving,
    Snapshotting,
    DeltaComputing,
    Composing,
    Exporting,
    Done,
    Failed,
}

impl PipelineState {
    pub fn name(&self) -> &'static str {
        match self {
            PipelineState::Fetching => "fetching",
            PipelineState::Deriving => "deriving",
            PipelineState::Snapshotting => "snapshotting",
            PipelineState::DeltaComputing => "delta_computing",
            PipelineState::Composing => "composing",
            PipelineState::Exporting => "exporting",
            PipelineState::Done => "done",
            PipelineState::Failed => "failed",
        }
    }
}

/// External collaborator commands. An unset stage is skipped with an info
/// log: the artifacts may already be present, or the collaborator runs on its
/// own schedule.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub fetch: Option<ExternalStage>,
    pub derive: Option<ExternalStage>,
}

/// Per-sink export result recorded in the run report.
#[derive(Debug, Clone)]
pub struct ExportOutcome {
    pub sink: String,
    pub destination: Option<PathBuf>,
    pub error: Option<String>,
}

impl ExportOutcome {
    pub fn published(&self) -> bool {
        self.destination.is_some()
    }
}

/// Result of a completed pipeline run.
#[derive(Debug)]
pub struct RunReport {
    pub run_id: Uuid,
    pub snapshot_date: NaiveDate,
    pub snapshot_dir: PathBuf,
    /// False on the first run, when there is no history to compare.
    pub delta_computed: bool,
    pub brief_path: PathBuf,
    pub exports: Vec<ExportOutcome>,
    pub duration_ms: u64,
}

impl RunReport {
    pub fn published_count(&self) -> usize {
        self.exports.iter().filter(|e| e.published()).count()
    }
}

/// Sequences one pipeline run against a run context.
pub struct Pipeline {
    ctx: RunContext,
    config: PipelineConfig,
    sinks: Vec<Box<dyn ExportSink>>,
}

impl Pipeline {
    pub fn new(ctx: RunContext, config: PipelineConfig) -> Self {
        Self {
            ctx,
            config,
            sinks: Vec::new(),
        }
    }

    pub fn with_sink(mut self, sink: Box<dyn ExportSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn with_sinks(mut self, sinks: Vec<Box<dyn ExportSink>>) -> Self {
        self.sinks.extend(sinks);
        self
    }

    /// Run the pipeline to completion or first fatal error.
    pub async fn run(&self) -> Result<RunReport> {
        let run_id = Uuid::new_v4();
        let mut state = PipelineState::Fetching;

        info!(event = "run.started", run_id = %run_id, run_date = %self.ctx.run_date);
        let result = self.run_stages(run_id, &mut state).await;
        match &result {
            Ok(report) => {
                info!(
                    event = "run.finished",
                    run_id = %run_id,
                    duration_ms = report.duration_ms,
                    delta_computed = report.delta_computed,
                    published = report.published_count(),
                );
            }
            Err(e) => {
                error!(
                    event = "run.aborted",
                    run_id = %run_id,
                    state = PipelineState::Failed.name(),
                    failed_in = state.name(),
                    error = %e,
                );
            }
        }
        result
    }

    async fn run_stages(&self, run_id: Uuid, state: &mut PipelineState) -> Result<RunReport> {
        let start = Instant::now();

        // Fetching
        self.enter(run_id, state, PipelineState::Fetching);
        match &self.config.fetch {
            Some(stage) => {
                run_stage(stage).await?;
            }
            None => info!(run_id = %run_id, "no fetch command configured; skipping"),
        }

        // Deriving
        self.enter(run_id, state, PipelineState::Deriving);
        match &self.config.derive {
            Some(stage) => {
                run_stage(stage).await?;
            }
            None => info!(run_id = %run_id, "no derive command configured; skipping"),
        }

        // Snapshotting
        self.enter(run_id, state, PipelineState::Snapshotting);
        let store = SnapshotStore::open(&self.ctx);
        let snapshot = store.create(self.ctx.run_date, &self.ctx.derived_dir())?;
        info!(
            run_id = %run_id,
            snapshot_date = %snapshot.date,
            "snapshot published"
        );

        // DeltaComputing: only with at least two snapshots, comparing the
        // second-most-recent against the most recent.
        let history = store.list()?;
        let delta: Option<Delta> = if history.len() >= 2 {
            self.enter(run_id, state, PipelineState::DeltaComputing);
            let previous = &history[history.len() - 2];
            let current = &history[history.len() - 1];
            let previous_set = previous.load()?;
            let current_set = current.load()?;
            info!(
                run_id = %run_id,
                previous = %previous.date,
                current = %current.date,
                "comparing snapshots"
            );
            Some(delta::compute(
                &previous_set.trends_7d,
                &current_set.trends_7d,
            ))
        } else {
            info!(run_id = %run_id, "fewer than 2 snapshots; skipping delta");
            None
        };

        // Composing, from the published snapshot's artifact copies
        self.enter(run_id, state, PipelineState::Composing);
        let artifacts = snapshot.load()?;
        let mut composer = BriefComposer::new(self.ctx.run_date, &artifacts);
        if let Some(d) = &delta {
            composer = composer.with_delta(d);
        }
        let brief = composer.compose();
        let brief_path = self.ctx.brief_path();
        brief.write_to(&brief_path)?;

        // Exporting: best-effort, never fatal
        self.enter(run_id, state, PipelineState::Exporting);
        let mut exports = Vec::new();
        for sink in &self.sinks {
            match sink.publish(&brief_path) {
                Ok(dest) => {
                    info!(run_id = %run_id, sink = sink.name(), dest = %dest.display(), "brief exported");
                    exports.push(ExportOutcome {
                        sink: sink.name().to_string(),
                        destination: Some(dest),
                        error: None,
                    });
                }
                Err(e) => {
                    warn!(run_id = %run_id, sink = sink.name(), error = %e, "export failed; continuing");
                    exports.push(ExportOutcome {
                        sink: sink.name().to_string(),
                        destination: None,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        *state = PipelineState::Done;
        Ok(RunReport {
            run_id,
            snapshot_date: snapshot.date,
            snapshot_dir: snapshot.dir,
            delta_computed: delta.is_some(),
            brief_path,
            exports,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    fn enter(&self, run_id: Uuid, state: &mut PipelineState, next: PipelineState) {
        *state = next;
        info!(event = "pipeline.stage", run_id = %run_id, state = next.name());
    }
}
