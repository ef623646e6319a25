// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Upload handlers, one per backend kind

mod encode;
mod http;
mod noop;
mod sftp;

pub use encode::{compress, part_file_name, DemoPayload, EncodeError};
pub use http::HttpUploadHandler;
pub use noop::NoOpUploadHandler;
pub use sftp::SftpUploadHandler;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeUploadHandler, UploadCall};

use async_trait::async_trait;
use srcdsup_core::{BackendKind, FileResult, MatchedFile, RemoteDestination, UploadRule};
use thiserror::Error;

/// Batch-level upload failures
///
/// Per-file problems are reported as [`FileResult`] outcomes instead; an
/// error here means no file in the batch was attempted.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("remote {remote} is not a {expected} remote")]
    WrongBackend {
        remote: String,
        expected: BackendKind,
    },
    #[error("connect to {target} failed: {reason}")]
    Connect { target: String, reason: String },
    #[error("authentication as {user} failed: {reason}")]
    Auth { user: String, reason: String },
    #[error("ssh session error: {0}")]
    Session(String),
    #[error("http client error: {0}")]
    Client(String),
    #[error("upload task failed: {0}")]
    Task(String),
}

impl From<ssh2::Error> for UploadError {
    fn from(e: ssh2::Error) -> Self {
        UploadError::Session(e.to_string())
    }
}

/// Ships a batch of matched files to one remote
#[async_trait]
pub trait UploadHandler: Send + Sync + 'static {
    /// Backend this handler serves
    fn kind(&self) -> BackendKind;

    /// Attempt every file in `files`
    ///
    /// Files left out of the result were deferred (not attempted) and must
    /// stay on disk.
    async fn deliver(
        &self,
        rule: &UploadRule,
        remote: &RemoteDestination,
        files: &[MatchedFile],
    ) -> Result<Vec<FileResult>, UploadError>;
}
