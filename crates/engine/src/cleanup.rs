// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-rule delivery ledger and local cleanup
//!
//! A file is removed only once every remote of its rule has seen it. A
//! file any remote deferred, or one that failed a data check before
//! dispatch, always stays on disk.

use srcdsup_core::{sidecar_path, CleanupPolicy, FileResult, MatchedFile, UploadRule};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Clone, Copy)]
struct Entry {
    delivered: usize,
    failed: usize,
    deferred: bool,
    data_error: bool,
}

/// Outcomes for one rule's files across all of its remotes
#[derive(Debug)]
pub(crate) struct Ledger {
    remotes: usize,
    entries: BTreeMap<PathBuf, Entry>,
}

impl Ledger {
    pub(crate) fn new(remotes: usize) -> Self {
        Self {
            remotes,
            entries: BTreeMap::new(),
        }
    }

    /// Record one remote's batch results
    ///
    /// Dispatched files missing from `results` count as deferred.
    pub(crate) fn record(&mut self, dispatched: &[MatchedFile], results: &[FileResult]) {
        for file in dispatched {
            let entry = self.entries.entry(file.path.clone()).or_default();
            match results.iter().find(|r| r.path == file.path) {
                Some(r) if r.outcome.is_delivered() => entry.delivered += 1,
                Some(_) => entry.failed += 1,
                None => entry.deferred = true,
            }
        }
    }

    /// A remote failed before attempting any file
    pub(crate) fn record_batch_failure(&mut self, dispatched: &[MatchedFile], reason: &str) {
        tracing::debug!(files = dispatched.len(), reason, "batch failure recorded");
        for file in dispatched {
            self.entries.entry(file.path.clone()).or_default().failed += 1;
        }
    }

    /// A file failed before dispatch and was never offered to a remote
    pub(crate) fn record_data_error(&mut self, path: &Path) {
        let entry = self.entries.entry(path.to_path_buf()).or_default();
        entry.data_error = true;
        entry.failed += 1;
    }

    pub(crate) fn delivered_count(&self) -> usize {
        self.entries.values().map(|e| e.delivered).sum()
    }

    pub(crate) fn failed_count(&self) -> usize {
        self.entries.values().map(|e| e.failed).sum()
    }

    pub(crate) fn deferred_count(&self) -> usize {
        self.entries.values().filter(|e| e.deferred).count()
    }

    /// Files the policy allows removing
    pub(crate) fn removable(&self, policy: CleanupPolicy) -> Vec<&Path> {
        self.entries
            .iter()
            .filter(|(_, e)| !e.deferred && !e.data_error)
            .filter(|(_, e)| match policy {
                CleanupPolicy::Attempted => e.delivered + e.failed >= self.remotes,
                CleanupPolicy::Delivered => e.delivered >= self.remotes,
            })
            .map(|(p, _)| p.as_path())
            .collect()
    }

    /// Remove removable files and their sidecars; returns files removed
    pub(crate) fn clean_up(&self, rule: &UploadRule, policy: CleanupPolicy) -> usize {
        let mut removed = 0;
        for path in self.removable(policy) {
            if !rule.owns(path) {
                tracing::warn!(
                    rule = %rule.name,
                    file = %path.display(),
                    "refusing to remove file outside rule root"
                );
                continue;
            }
            match remove(path) {
                Ok(()) => {
                    removed += 1;
                    tracing::info!(rule = %rule.name, file = %path.display(), "removed local copy");
                }
                Err(e) => {
                    tracing::warn!(
                        rule = %rule.name,
                        file = %path.display(),
                        error = %e,
                        "failed to remove local copy"
                    );
                    continue;
                }
            }
            let sidecar = sidecar_path(path);
            if let Err(e) = remove(&sidecar) {
                tracing::warn!(file = %sidecar.display(), error = %e, "failed to remove sidecar");
            }
        }
        removed
    }
}

/// Remove a file; one already gone is not an error
fn remove(path: &Path) -> io::Result<()> {
    match std::fs::remove_file(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

#[cfg(test)]
#[path = "cleanup_tests.rs"]
mod tests;
