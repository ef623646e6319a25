// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the dispatch engine

use srcdsup_core::{BackendKind, MatchError};
use thiserror::Error;

/// Errors that abort one rule for the current cycle
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("match error: {0}")]
    Match(#[from] MatchError),
    #[error("unknown remote {remote}")]
    UnknownRemote { remote: String },
    #[error("no handler registered for {kind} remote {remote}")]
    NoHandler { remote: String, kind: BackendKind },
}
