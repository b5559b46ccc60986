//! Explicit run context: the run date and root directory every component
//! receives instead of reading the ambient clock or working directory.

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};

/// Per-run context shared by every core component.
///
/// All pipeline paths derive from `root`; the run date names both the
/// snapshot directory and the brief file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    /// Calendar date this run captures (snapshot identity).
    pub run_date: NaiveDate,

    /// Pipeline root directory; `data/` lives underneath it.
    pub root: PathBuf,
}

impl RunContext {
    pub fn new(run_date: NaiveDate, root: impl Into<PathBuf>) -> Self {
        Self {
            run_date,
            root: root.into(),
        }
    }

    /// Context for a run dated today (UTC). The single place the clock is
    /// consulted for run identity.
    pub fn today(root: impl Into<PathBuf>) -> Self {
        Self::new(Utc::now().date_naive(), root)
    }

    /// Directory the external derivation engine writes into.
    pub fn derived_dir(&self) -> PathBuf {
        self.root.join("data").join("derived")
    }

    /// Snapshot history root.
    pub fn history_dir(&self) -> PathBuf {
        self.root.join("data").join("history")
    }

    /// Brief output directory.
    pub fn briefs_dir(&self) -> PathBuf {
        self.root.join("data").join("briefs")
    }

    /// Output path for this run's brief: `data/briefs/weekly-<ISO-date>.md`.
    pub fn brief_path(&self) -> PathBuf {
        self.briefs_dir().join(format!("weekly-{}.md", self.run_date))
    }
}

impl AsRef<Path> for RunContext {
    fn as_ref(&self) -> &Path {
        &self.root
    }
}
