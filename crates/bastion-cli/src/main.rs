//! Bastion Codex - weekly threat-intelligence pipeline CLI
//!
//! The `bastion` command drives the reporting pipeline.
//!
//! ## Commands
//!
//! - `run`: execute the full pipeline (fetch, derive, snapshot, compare,
//!   compose, export)
//! - `history`: list captured snapshots, oldest first
//! - `compose`: regenerate the brief for an existing snapshot date

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::Level;

use bastion_core::{
    BriefComposer, ExportConfig, ExternalStage, Pipeline, PipelineConfig, RunContext,
    SnapshotStore,
};

#[derive(Parser)]
#[command(name = "bastion")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Bastion Codex weekly threat-intelligence pipeline", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full weekly pipeline
    Run {
        /// Pipeline root (default: current directory)
        #[arg(long, default_value = ".")]
        root: PathBuf,

        /// Run date override, ISO format (default: today UTC)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Feed acquisition command, whitespace-separated (skipped if unset)
        #[arg(long, env = "BASTION_FETCH_CMD")]
        fetch_cmd: Option<String>,

        /// Derivation engine command, whitespace-separated (skipped if unset)
        #[arg(long, env = "BASTION_DERIVE_CMD")]
        derive_cmd: Option<String>,

        /// Timeout for external stages, in seconds (0 disables)
        #[arg(long, default_value = "900")]
        stage_timeout_secs: u64,

        /// Note-vault root to export the brief into
        #[arg(long, env = "BASTION_VAULT_ROOT")]
        vault_root: Option<PathBuf>,

        /// Subdirectory inside the vault
        #[arg(long, env = "BASTION_VAULT_SUBDIR", default_value = "Briefs")]
        vault_subdir: String,

        /// Static-site root to export the brief into
        #[arg(long, env = "BASTION_SITE_ROOT")]
        site_root: Option<PathBuf>,

        /// Subdirectory inside the site
        #[arg(long, env = "BASTION_SITE_SUBDIR", default_value = "content/briefs")]
        site_subdir: String,
    },

    /// List captured snapshots, oldest first
    History {
        /// Pipeline root (default: current directory)
        #[arg(long, default_value = ".")]
        root: PathBuf,
    },

    /// Regenerate the brief for an existing snapshot date
    Compose {
        /// Snapshot date, ISO format
        date: NaiveDate,

        /// Pipeline root (default: current directory)
        #[arg(long, default_value = ".")]
        root: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    bastion_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Run {
            root,
            date,
            fetch_cmd,
            derive_cmd,
            stage_timeout_secs,
            vault_root,
            vault_subdir,
            site_root,
            site_subdir,
        } => {
            let ctx = match date {
                Some(d) => RunContext::new(d, root),
                None => RunContext::today(root),
            };
            let config = PipelineConfig {
                fetch: fetch_cmd
                    .map(|c| ExternalStage::from_command_line("fetch", &c, stage_timeout_secs)),
                derive: derive_cmd
                    .map(|c| ExternalStage::from_command_line("derive", &c, stage_timeout_secs)),
            };
            let exports = ExportConfig {
                vault_root,
                vault_subdir,
                site_root,
                site_subdir,
            };
            cmd_run(ctx, config, exports).await
        }
        Commands::History { root } => cmd_history(&root),
        Commands::Compose { date, root } => cmd_compose(&root, date),
    }
}

/// Run the full pipeline and print a run summary.
async fn cmd_run(ctx: RunContext, config: PipelineConfig, exports: ExportConfig) -> Result<()> {
    let report = Pipeline::new(ctx, config)
        .with_sinks(exports.sinks())
        .run()
        .await
        .context("pipeline run failed")?;

    println!("Run {} complete", report.run_id);
    println!("Snapshot:  {}", report.snapshot_dir.display());
    println!("Brief:     {}", report.brief_path.display());
    println!(
        "Movement:  {}",
        if report.delta_computed {
            "compared against previous snapshot"
        } else {
            "skipped (no prior snapshot)"
        }
    );
    for export in &report.exports {
        match (&export.destination, &export.error) {
            (Some(dest), _) => println!("Exported:  {} -> {}", export.sink, dest.display()),
            (None, Some(err)) => println!("Export:    {} failed ({err})", export.sink),
            (None, None) => {}
        }
    }
    println!("Duration:  {}ms", report.duration_ms);
    Ok(())
}

/// List captured snapshots, oldest first.
fn cmd_history(root: &PathBuf) -> Result<()> {
    let ctx = RunContext::today(root);
    let snapshots = SnapshotStore::open(&ctx).list()?;

    if snapshots.is_empty() {
        println!("No snapshots found under {}", ctx.history_dir().display());
        return Ok(());
    }

    for snap in snapshots {
        let meta = snap
            .meta()
            .with_context(|| format!("failed to read metadata for {}", snap.date))?;
        println!(
            "{}  captured {}  ({})",
            snap.date,
            meta.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
            snap.dir.display()
        );
    }
    Ok(())
}

/// Recompose the brief for a snapshot date, with movement against the
/// preceding snapshot when one exists.
fn cmd_compose(root: &PathBuf, date: NaiveDate) -> Result<()> {
    let ctx = RunContext::new(date, root);
    let store = SnapshotStore::open(&ctx);

    let snapshot = store
        .get(date)?
        .with_context(|| format!("no snapshot for {date}; run the pipeline first"))?;
    let artifacts = snapshot.load()?;

    let history = store.list()?;
    let previous = history
        .iter()
        .rev()
        .find(|s| s.date < date)
        .map(|s| s.load())
        .transpose()?;

    let delta = previous
        .as_ref()
        .map(|prev| bastion_core::compute_delta(&prev.trends_7d, &artifacts.trends_7d));

    let mut composer = BriefComposer::new(date, &artifacts);
    if let Some(d) = &delta {
        composer = composer.with_delta(d);
    }
    let brief = composer.compose();
    let path = ctx.brief_path();
    brief.write_to(&path)?;

    println!("Recomposed {}", path.display());
    if delta.is_none() {
        println!("No earlier snapshot; movement section omitted");
    }
    Ok(())
}
