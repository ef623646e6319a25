// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! No-op upload handler for dry runs

use super::{UploadError, UploadHandler};
use async_trait::async_trait;
use srcdsup_core::{BackendKind, FileResult, MatchedFile, RemoteDestination, UploadRule};

/// Upload handler that sends nothing and defers every file.
///
/// Since nothing is reported, the orchestrator never removes a file a
/// dry run matched.
#[derive(Clone, Copy, Debug)]
pub struct NoOpUploadHandler {
    kind: BackendKind,
}

impl NoOpUploadHandler {
    pub fn new(kind: BackendKind) -> Self {
        Self { kind }
    }
}

#[async_trait]
impl UploadHandler for NoOpUploadHandler {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    async fn deliver(
        &self,
        rule: &UploadRule,
        remote: &RemoteDestination,
        files: &[MatchedFile],
    ) -> Result<Vec<FileResult>, UploadError> {
        for file in files {
            tracing::info!(
                rule = %rule.name,
                remote = %remote.name,
                file = %file.path.display(),
                size = file.size,
                "dry run, would upload"
            );
        }
        Ok(Vec::new())
    }
}
