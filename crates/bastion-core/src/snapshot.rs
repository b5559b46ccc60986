//! Dated snapshot history for derived artifacts.
//!
//! Layout: `<history>/<YYYY-MM-DD>/{trends_7d.json,trends_30d.json,priority_items.json,meta.json}`
//!
//! Snapshot creation is all-or-nothing: the three artifact copies and the
//! metadata record are staged into a hidden temp directory inside the history
//! root, then published with a single rename. A snapshot claimed by `list()`
//! is always complete.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::artifact::{read_json, ArtifactSet, ARTIFACT_FILES};
use crate::context::RunContext;
use crate::error::{BastionError, Result};

pub const META_FILE: &str = "meta.json";

/// Relative file names recorded in a snapshot's metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotPaths {
    pub trends_7d: String,
    pub trends_30d: String,
    pub priority_items: String,
}

impl Default for SnapshotPaths {
    fn default() -> Self {
        Self {
            trends_7d: ARTIFACT_FILES[0].to_string(),
            trends_30d: ARTIFACT_FILES[1].to_string(),
            priority_items: ARTIFACT_FILES[2].to_string(),
        }
    }
}

/// Capture metadata persisted as `meta.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMeta {
    pub snapshot_date: NaiveDate,
    pub generated_at: DateTime<Utc>,
    pub paths: SnapshotPaths,
}

/// Handle to one published snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotRef {
    pub date: NaiveDate,
    pub dir: PathBuf,
}

impl SnapshotRef {
    /// Load the captured artifact triple.
    pub fn load(&self) -> Result<ArtifactSet> {
        ArtifactSet::load_dir(&self.dir)
    }

    /// Load the capture metadata.
    pub fn meta(&self) -> Result<SnapshotMeta> {
        read_json(&self.dir.join(META_FILE))
    }
}

/// Filesystem-backed snapshot history. The only writer to the history area.
pub struct SnapshotStore {
    history_dir: PathBuf,
}

impl SnapshotStore {
    pub fn open(ctx: &RunContext) -> Self {
        Self {
            history_dir: ctx.history_dir(),
        }
    }

    /// Store rooted at an explicit history directory.
    pub fn at(history_dir: impl Into<PathBuf>) -> Self {
        Self {
            history_dir: history_dir.into(),
        }
    }

    /// Capture a dated snapshot of the three derived artifacts in
    /// `derived_dir`.
    ///
    /// Fails with `MissingArtifact` if any required file is absent at call
    /// time; nothing is published in that case. A second capture on the same
    /// date replaces the prior one (last-write-wins).
    pub fn create(&self, date: NaiveDate, derived_dir: &Path) -> Result<SnapshotRef> {
        // Verify the full triple up front so a partial input never stages.
        for file in ARTIFACT_FILES {
            let path = derived_dir.join(file);
            if !path.is_file() {
                return Err(BastionError::MissingArtifact(path));
            }
        }

        fs::create_dir_all(&self.history_dir)?;

        // Stage, then publish atomically. Staging dirs start with '.' so an
        // interrupted run never shows up in list().
        let staging = tempfile::Builder::new()
            .prefix(".staging-")
            .tempdir_in(&self.history_dir)?;
        for file in ARTIFACT_FILES {
            fs::copy(derived_dir.join(file), staging.path().join(file))?;
        }

        let meta = SnapshotMeta {
            snapshot_date: date,
            generated_at: Utc::now(),
            paths: SnapshotPaths::default(),
        };
        fs::write(
            staging.path().join(META_FILE),
            serde_json::to_string_pretty(&meta)?,
        )?;

        let final_dir = self.history_dir.join(date.to_string());
        if final_dir.exists() {
            fs::remove_dir_all(&final_dir)?;
        }
        let staged = staging.into_path();
        fs::rename(&staged, &final_dir)?;

        Ok(SnapshotRef {
            date,
            dir: final_dir,
        })
    }

    /// All published snapshots, ascending by date. Empty when the history
    /// root does not exist yet.
    pub fn list(&self) -> Result<Vec<SnapshotRef>> {
        if !self.history_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut snapshots = Vec::new();
        for entry in fs::read_dir(&self.history_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            let Ok(date) = NaiveDate::parse_from_str(name, "%Y-%m-%d") else {
                continue;
            };
            // A dir without meta.json is an unpublished leftover; skip it.
            if !entry.path().join(META_FILE).is_file() {
                continue;
            }
            snapshots.push(SnapshotRef {
                date,
                dir: entry.path(),
            });
        }

        snapshots.sort_by_key(|s| s.date);
        Ok(snapshots)
    }

    /// Snapshot for an exact date, if one was published.
    pub fn get(&self, date: NaiveDate) -> Result<Option<SnapshotRef>> {
        let dir = self.history_dir.join(date.to_string());
        if dir.join(META_FILE).is_file() {
            Ok(Some(SnapshotRef { date, dir }))
        } else {
            Ok(None)
        }
    }
}
