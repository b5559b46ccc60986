//! Best-effort export sinks for finished briefs.
//!
//! Sinks are thin file copies behind a trait, so new destinations plug in
//! without touching the orchestrator. An unconfigured sink simply never gets
//! constructed; a failing sink is the orchestrator's problem to log, not to
//! die on.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{BastionError, Result};

/// A destination for a finished brief.
pub trait ExportSink {
    /// Sink name used in logs and run reports.
    fn name(&self) -> &str;

    /// Publish the brief file, returning the destination path.
    fn publish(&self, brief_path: &Path) -> Result<PathBuf>;
}

fn copy_into(sink: &str, brief_path: &Path, dest_dir: &Path) -> Result<PathBuf> {
    let file_name = brief_path
        .file_name()
        .ok_or_else(|| BastionError::Export {
            sink: sink.to_string(),
            reason: format!("brief path has no file name: {}", brief_path.display()),
        })?;
    fs::create_dir_all(dest_dir).map_err(|e| BastionError::Export {
        sink: sink.to_string(),
        reason: format!("create {}: {e}", dest_dir.display()),
    })?;
    let dest = dest_dir.join(file_name);
    fs::copy(brief_path, &dest).map_err(|e| BastionError::Export {
        sink: sink.to_string(),
        reason: format!("copy to {}: {e}", dest.display()),
    })?;
    Ok(dest)
}

/// Copies the brief into a note vault (e.g. an Obsidian folder).
pub struct VaultSink {
    vault_root: PathBuf,
    subdir: String,
}

impl VaultSink {
    pub fn new(vault_root: impl Into<PathBuf>, subdir: impl Into<String>) -> Self {
        Self {
            vault_root: vault_root.into(),
            subdir: subdir.into(),
        }
    }
}

impl ExportSink for VaultSink {
    fn name(&self) -> &str {
        "vault"
    }

    fn publish(&self, brief_path: &Path) -> Result<PathBuf> {
        copy_into(self.name(), brief_path, &self.vault_root.join(&self.subdir))
    }
}

/// Copies the brief into a static-site content directory.
pub struct SiteSink {
    site_root: PathBuf,
    subdir: String,
}

impl SiteSink {
    pub fn new(site_root: impl Into<PathBuf>, subdir: impl Into<String>) -> Self {
        Self {
            site_root: site_root.into(),
            subdir: subdir.into(),
        }
    }
}

impl ExportSink for SiteSink {
    fn name(&self) -> &str {
        "site"
    }

    fn publish(&self, brief_path: &Path) -> Result<PathBuf> {
        copy_into(self.name(), brief_path, &self.site_root.join(&self.subdir))
    }
}

/// Externally-supplied sink destinations. An absent root means the sink is
/// unconfigured, which is a normal, silent no-op.
#[derive(Debug, Clone, Default)]
pub struct ExportConfig {
    pub vault_root: Option<PathBuf>,
    pub vault_subdir: String,
    pub site_root: Option<PathBuf>,
    pub site_subdir: String,
}

impl ExportConfig {
    /// Build the configured sinks.
    pub fn sinks(&self) -> Vec<Box<dyn ExportSink>> {
        let mut sinks: Vec<Box<dyn ExportSink>> = Vec::new();
        if let Some(root) = &self.vault_root {
            sinks.push(Box::new(VaultSink::new(root, self.vault_subdir.clone())));
        }
        if let Some(root) = &self.site_root {
            sinks.push(Box::new(SiteSink::new(root, self.site_subdir.clone())));
        }
        sinks
    }
}
