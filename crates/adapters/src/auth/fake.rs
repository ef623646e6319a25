// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake token source for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{AuthError, TokenSource};
use async_trait::async_trait;
use srcdsup_core::RemoteDestination;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Fake token source for testing
///
/// Hands out `<remote>-<n>` tokens, counting per remote, unless a remote
/// is scripted to fail.
#[derive(Clone, Default)]
pub struct FakeTokenSource {
    issued: Arc<Mutex<HashMap<String, u32>>>,
    failing: Arc<Mutex<HashMap<String, u16>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl FakeTokenSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the remote names fetched so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Reject fetches for `remote` with the given HTTP status
    pub fn fail(&self, remote: &str, status: u16) {
        self.failing
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(remote.to_string(), status);
    }

    /// Let fetches for `remote` succeed again
    pub fn recover(&self, remote: &str) {
        self.failing
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(remote);
    }
}

#[async_trait]
impl TokenSource for FakeTokenSource {
    async fn fetch_token(&self, remote: &RemoteDestination) -> Result<String, AuthError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(remote.name.clone());

        if let Some(status) = self
            .failing
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&remote.name)
        {
            return Err(AuthError::Rejected {
                status: *status,
                body: "scripted failure".to_string(),
            });
        }

        let mut issued = self.issued.lock().unwrap_or_else(|e| e.into_inner());
        let n = issued.entry(remote.name.clone()).or_insert(0);
        *n += 1;
        Ok(format!("{}-{}", remote.name, n))
    }
}
