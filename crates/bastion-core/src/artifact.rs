//! Derived artifact model: trend summaries and the priority item list
//! produced by the external derivation engine.
//!
//! All fields are serde-defaulted: an absent severity bucket is 0, an absent
//! CVSS score is `None`. Anything shape-incompatible beyond that is a
//! `MalformedArtifact` error, never silently defaulted.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{BastionError, Result};

/// Derived artifact file names, the stable contract with the external engine.
pub const TRENDS_7D_FILE: &str = "trends_7d.json";
pub const TRENDS_30D_FILE: &str = "trends_30d.json";
pub const PRIORITY_ITEMS_FILE: &str = "priority_items.json";

/// The three files a snapshot captures.
pub const ARTIFACT_FILES: [&str; 3] = [TRENDS_7D_FILE, TRENDS_30D_FILE, PRIORITY_ITEMS_FILE];

/// Closed severity vocabulary. Absent buckets count as 0 everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Unknown,
}

impl Severity {
    /// Fixed display order used by every report section.
    pub const ALL: [Severity; 5] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
        Severity::Unknown,
    ];

    /// Capitalized label for report tables.
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
            Severity::Unknown => "Unknown",
        }
    }
}

/// Per-bucket counts as a total mapping: one field per severity, so a missing
/// JSON key is a compile-time-checked default rather than a dictionary get.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    #[serde(default)]
    pub critical: u64,
    #[serde(default)]
    pub high: u64,
    #[serde(default)]
    pub medium: u64,
    #[serde(default)]
    pub low: u64,
    #[serde(default)]
    pub unknown: u64,
}

impl SeverityCounts {
    pub fn get(&self, severity: Severity) -> u64 {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
            Severity::Unknown => self.unknown,
        }
    }
}

/// A named count in the order the upstream engine ranked it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameCount {
    pub name: String,
    pub count: u64,
}

/// Aggregated counts over one trend window (7 or 30 days).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendSummary {
    #[serde(default)]
    pub total_items: u64,

    #[serde(default)]
    pub by_severity: SeverityCounts,

    /// Items present in the KEV catalog within the window.
    #[serde(default)]
    pub kev_items: u64,

    /// Count-sorted descending by the upstream engine; order is preserved.
    #[serde(default)]
    pub top_vendors: Vec<NameCount>,

    #[serde(default)]
    pub top_products: Vec<NameCount>,
}

/// One entry of the priority watchlist input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityItem {
    /// CVE identifier.
    pub id: String,

    #[serde(default)]
    pub cvss: Option<f64>,

    /// Listed in the KEV catalog.
    #[serde(default)]
    pub kev: bool,

    #[serde(default)]
    pub short_desc: String,
}

/// The per-run artifact triple read from a derived or snapshot directory.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactSet {
    pub trends_7d: TrendSummary,
    pub trends_30d: TrendSummary,
    pub priority_items: Vec<PriorityItem>,
}

impl ArtifactSet {
    /// Load the three artifact files from `dir`.
    ///
    /// A missing file is `MissingArtifact`; unparseable JSON is
    /// `MalformedArtifact`.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        Ok(Self {
            trends_7d: read_json(&dir.join(TRENDS_7D_FILE))?,
            trends_30d: read_json(&dir.join(TRENDS_30D_FILE))?,
            priority_items: read_json(&dir.join(PRIORITY_ITEMS_FILE))?,
        })
    }
}

/// Read and deserialize one JSON artifact, classifying the failure mode.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            BastionError::MissingArtifact(path.to_path_buf())
        } else {
            BastionError::Io(e)
        }
    })?;
    serde_json::from_slice(&bytes).map_err(|e| BastionError::MalformedArtifact {
        path: path.to_path_buf(),
        source: e,
    })
}
