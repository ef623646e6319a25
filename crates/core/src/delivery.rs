// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-file delivery results and the cleanup policy built on them

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// What happened to one file sent to one remote
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    Failed(String),
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered)
    }
}

impl fmt::Display for DeliveryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryOutcome::Delivered => write!(f, "delivered"),
            DeliveryOutcome::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Outcome for a single file in a handler batch
///
/// Files a handler chose not to attempt (size gate) are absent from the
/// batch result rather than reported here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileResult {
    pub path: PathBuf,
    pub outcome: DeliveryOutcome,
}

impl FileResult {
    pub fn delivered(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            outcome: DeliveryOutcome::Delivered,
        }
    }

    pub fn failed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            outcome: DeliveryOutcome::Failed(reason.into()),
        }
    }
}

/// When local copies are removed after a rule's remotes were attempted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CleanupPolicy {
    /// Remove every attempted file once all remotes were tried
    #[default]
    Attempted,
    /// Remove only files every remote reported as delivered
    Delivered,
}

impl fmt::Display for CleanupPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CleanupPolicy::Attempted => write!(f, "attempted"),
            CleanupPolicy::Delivered => write!(f, "delivered"),
        }
    }
}
