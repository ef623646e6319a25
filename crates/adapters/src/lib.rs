// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adapters for remote I/O: upload transports and token exchange

pub mod auth;
pub mod traced;
pub mod upload;

pub use auth::{AuthError, HttpTokenSource, TokenSource};
pub use traced::{TracedTokenSource, TracedUploadHandler};
pub use upload::{
    DemoPayload, EncodeError, HttpUploadHandler, NoOpUploadHandler, SftpUploadHandler,
    UploadError, UploadHandler,
};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use auth::FakeTokenSource;
#[cfg(any(test, feature = "test-support"))]
pub use upload::{FakeUploadHandler, UploadCall};
