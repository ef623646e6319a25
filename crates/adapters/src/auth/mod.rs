// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bearer token sources for HTTP sinks

mod http;

pub use http::HttpTokenSource;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeTokenSource;

use async_trait::async_trait;
use srcdsup_core::RemoteDestination;
use thiserror::Error;

/// Errors exchanging a shared secret for a token
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("remote {0} has no shared secret")]
    NotTokenAuth(String),
    #[error("auth request failed: {0}")]
    Request(String),
    #[error("auth rejected with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("invalid auth response: {0}")]
    InvalidResponse(String),
    #[error("auth response carried an empty token")]
    EmptyToken,
}

/// Exchanges a remote's long-lived secret for a short-lived bearer token
#[async_trait]
pub trait TokenSource: Send + Sync + 'static {
    async fn fetch_token(&self, remote: &RemoteDestination) -> Result<String, AuthError>;
}
