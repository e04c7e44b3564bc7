//! Copying required libraries into the project and pruning stale ones.
//!
//! Syncing happens in two steps. [`SyncPlan::compute`] reads the SDK and the
//! destination directories and decides every copy and removal up front;
//! [`SyncPlan::execute`] then performs them. A dry run stops after the first
//! step.
//!
//! Only files the SDK could have put in a directory are ever removed: a file
//! is stale when its name is among all libraries the SDK declares for that
//! directory but not among those the build requires. Anything else in the
//! directory is left alone.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::builder::locator::LibraryMap;
use crate::util::fs as ace_fs;
use crate::util::hash;
use crate::util::shell::Progress;

/// Copying one library (a file or a bundle directory).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyOp {
    pub module: String,
    pub source: PathBuf,
    pub dest: PathBuf,
    /// Files that differ from the destination and will be written.
    pub files: Vec<(PathBuf, PathBuf)>,
    /// Files already identical at the destination.
    pub unchanged: usize,
    /// Paths inside a bundle destination the SDK bundle no longer has.
    pub stale: Vec<PathBuf>,
}

impl CopyOp {
    pub fn is_up_to_date(&self) -> bool {
        self.files.is_empty() && self.stale.is_empty()
    }
}

/// Every filesystem change one sync will make.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    /// Destination directories that do not exist yet.
    pub create_dirs: Vec<PathBuf>,
    pub copies: Vec<CopyOp>,
    /// Stale libraries to delete.
    pub removals: Vec<PathBuf>,
    /// Stale libraries left in place because removal is disabled.
    pub unused_kept: Vec<PathBuf>,
}

/// Counts from an executed plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub libraries_copied: usize,
    pub files_written: usize,
    pub files_unchanged: usize,
    pub removed: usize,
    pub removal_failures: usize,
}

impl SyncPlan {
    /// Decide what to copy and remove.
    ///
    /// `required` maps each destination directory to the libraries the build
    /// needs there; `all` maps it to every library the SDK can provide.
    pub fn compute(required: &LibraryMap, all: &LibraryMap, remove_unused: bool) -> Result<Self> {
        let mut plan = SyncPlan::default();

        for (dir, files) in required.iter() {
            if !dir.exists() {
                plan.create_dirs.push(dir.to_path_buf());
            }

            for (name, artifact) in files {
                if !artifact.exists {
                    continue;
                }
                let dest = dir.join(name);
                let mut op = CopyOp {
                    module: artifact.module.clone(),
                    source: artifact.source.clone(),
                    dest: dest.clone(),
                    files: Vec::new(),
                    unchanged: 0,
                    stale: ace_fs::mirror_extras(&artifact.source, &dest)?,
                };
                for (src, dst) in ace_fs::copy_plan(&artifact.source, &dest)? {
                    if hash::same_contents(&src, &dst) {
                        op.unchanged += 1;
                    } else {
                        op.files.push((src, dst));
                    }
                }
                plan.copies.push(op);
            }

            let managed: BTreeSet<&str> = match all.files(dir) {
                Some(files) => files.keys().map(String::as_str).collect(),
                None => {
                    tracing::warn!(
                        "the SDK provides no libraries for {}, nothing there is managed",
                        dir.display()
                    );
                    BTreeSet::new()
                }
            };

            for stale in stale_entries(dir, files.keys().map(String::as_str).collect(), &managed)? {
                if remove_unused {
                    plan.removals.push(stale);
                } else {
                    plan.unused_kept.push(stale);
                }
            }
        }

        Ok(plan)
    }

    pub fn is_empty(&self) -> bool {
        self.create_dirs.is_empty()
            && self.copies.iter().all(CopyOp::is_up_to_date)
            && self.removals.is_empty()
    }

    /// Number of files that will be written.
    pub fn file_count(&self) -> usize {
        self.copies.iter().map(|c| c.files.len()).sum()
    }

    /// Perform the plan.
    ///
    /// Copy failures abort. Removal failures are logged and counted; a stale
    /// library left behind does not break the project.
    pub fn execute(&self, progress: Option<&Progress>) -> Result<SyncReport> {
        let mut report = SyncReport::default();

        for dir in &self.create_dirs {
            ace_fs::ensure_dir(dir)?;
        }

        for op in &self.copies {
            report.files_unchanged += op.unchanged;
            if op.is_up_to_date() {
                tracing::debug!("{}: {} is up to date", op.module, op.dest.display());
                continue;
            }
            tracing::debug!(
                "{}: copy {} to {}",
                op.module,
                op.source.display(),
                op.dest.display()
            );
            for path in &op.stale {
                ace_fs::remove_path(path).with_context(|| {
                    format!("failed to mirror library for module `{}`", op.module)
                })?;
            }
            for (src, dst) in &op.files {
                ace_fs::copy_file(src, dst)
                    .with_context(|| format!("failed to copy library for module `{}`", op.module))?;
                report.files_written += 1;
            }
            report.libraries_copied += 1;
            if let Some(progress) = progress {
                progress.inc(1);
            }
        }

        for path in &self.removals {
            match ace_fs::remove_path(path) {
                Ok(()) => {
                    tracing::debug!("removed unused library {}", path.display());
                    report.removed += 1;
                }
                Err(e) => {
                    tracing::warn!("could not remove unused library: {:#}", e);
                    report.removal_failures += 1;
                }
            }
        }

        for path in &self.unused_kept {
            tracing::info!("unused library left in place: {}", path.display());
        }

        Ok(report)
    }
}

/// Entries of `dir` that are managed but not required.
fn stale_entries(
    dir: &Path,
    required: BTreeSet<&str>,
    managed: &BTreeSet<&str>,
) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut stale = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if managed.contains(name.as_str()) && !required.contains(name.as_str()) {
            stale.push(entry.path());
        }
    }
    stale.sort();
    Ok(stale)
}
