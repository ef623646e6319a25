// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake upload handler for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{UploadError, UploadHandler};
use async_trait::async_trait;
use srcdsup_core::{BackendKind, FileResult, MatchedFile, RemoteDestination, UploadRule};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Recorded deliver call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadCall {
    pub rule: String,
    pub remote: String,
    pub files: Vec<PathBuf>,
}

#[derive(Default)]
struct Script {
    failing_remotes: HashSet<String>,
    failing_files: HashSet<PathBuf>,
    defer_at_or_below: Option<u64>,
}

/// Fake upload handler for testing
///
/// Delivers everything unless told otherwise.
#[derive(Clone)]
pub struct FakeUploadHandler {
    kind: BackendKind,
    script: Arc<Mutex<Script>>,
    calls: Arc<Mutex<Vec<UploadCall>>>,
}

impl FakeUploadHandler {
    pub fn new(kind: BackendKind) -> Self {
        Self {
            kind,
            script: Arc::default(),
            calls: Arc::default(),
        }
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<UploadCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Fail every batch sent to `remote` with a connect error
    pub fn fail_remote(&self, remote: &str) {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .failing_remotes
            .insert(remote.to_string());
    }

    /// Report `path` as failed on every remote
    pub fn fail_file(&self, path: &Path) {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .failing_files
            .insert(path.to_path_buf());
    }

    /// Leave files at or below `size` bytes out of results
    pub fn defer_at_or_below(&self, size: u64) {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .defer_at_or_below = Some(size);
    }
}

#[async_trait]
impl UploadHandler for FakeUploadHandler {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    async fn deliver(
        &self,
        rule: &UploadRule,
        remote: &RemoteDestination,
        files: &[MatchedFile],
    ) -> Result<Vec<FileResult>, UploadError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(UploadCall {
                rule: rule.name.clone(),
                remote: remote.name.clone(),
                files: files.iter().map(|f| f.path.clone()).collect(),
            });

        let script = self.script.lock().unwrap_or_else(|e| e.into_inner());
        if script.failing_remotes.contains(&remote.name) {
            return Err(UploadError::Connect {
                target: remote.name.clone(),
                reason: "scripted failure".to_string(),
            });
        }

        Ok(files
            .iter()
            .filter(|f| script.defer_at_or_below.map_or(true, |min| f.size > min))
            .map(|f| {
                if script.failing_files.contains(&f.path) {
                    FileResult::failed(&f.path, "scripted failure")
                } else {
                    FileResult::delivered(&f.path)
                }
            })
            .collect())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
