// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::auth::{AuthError, TokenSource};
use crate::upload::{UploadError, UploadHandler};
use async_trait::async_trait;
use srcdsup_core::{BackendKind, FileResult, MatchedFile, RemoteDestination, UploadRule};
use tracing::Instrument;

/// Wrapper that adds tracing to any UploadHandler
#[derive(Clone)]
pub struct TracedUploadHandler<H> {
    inner: H,
}

impl<H> TracedUploadHandler<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<H: UploadHandler> UploadHandler for TracedUploadHandler<H> {
    fn kind(&self) -> BackendKind {
        self.inner.kind()
    }

    async fn deliver(
        &self,
        rule: &UploadRule,
        remote: &RemoteDestination,
        files: &[MatchedFile],
    ) -> Result<Vec<FileResult>, UploadError> {
        let span = tracing::info_span!(
            "upload.deliver",
            rule = %rule.name,
            remote = %remote.name,
            kind = %self.inner.kind()
        );

        async {
            tracing::info!(files = files.len(), "starting");

            let start = std::time::Instant::now();
            let result = self.inner.deliver(rule, remote, files).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            match &result {
                Ok(results) => {
                    let delivered = results.iter().filter(|r| r.outcome.is_delivered()).count();
                    tracing::info!(
                        elapsed_ms,
                        delivered,
                        failed = results.len() - delivered,
                        deferred = files.len().saturating_sub(results.len()),
                        "batch finished"
                    );
                }
                Err(e) => tracing::error!(elapsed_ms, error = %e, "batch failed"),
            }

            result
        }
        .instrument(span)
        .await
    }
}

/// Wrapper that adds tracing to any TokenSource
#[derive(Clone)]
pub struct TracedTokenSource<T> {
    inner: T,
}

impl<T> TracedTokenSource<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<T: TokenSource> TokenSource for TracedTokenSource<T> {
    async fn fetch_token(&self, remote: &RemoteDestination) -> Result<String, AuthError> {
        let span = tracing::info_span!("auth.fetch_token", remote = %remote.name);

        async {
            tracing::debug!("requesting token");

            let start = std::time::Instant::now();
            let result = self.inner.fetch_token(remote).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            // Never log the token itself
            match &result {
                Ok(_) => tracing::info!(elapsed_ms, "token refreshed"),
                Err(e) => tracing::warn!(elapsed_ms, error = %e, "token refresh failed"),
            }

            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
