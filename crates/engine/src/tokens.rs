// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bearer token refresh for HTTP remotes
//!
//! A failed refresh keeps the previous token in place; a stale token may
//! still be accepted, and if not the upload fails on its own.

use crate::registry::RemoteRegistry;
use srcdsup_adapters::TokenSource;
use srcdsup_core::TokenStore;
use std::sync::Arc;

/// Outcome of refreshing every token remote once
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshReport {
    pub refreshed: Vec<String>,
    /// Remote name and error, for remotes that kept their old token
    pub failed: Vec<(String, String)>,
}

/// Owns the token store and the only code path that writes it
pub struct TokenManager {
    source: Arc<dyn TokenSource>,
    store: TokenStore,
}

impl TokenManager {
    pub fn new(source: Arc<dyn TokenSource>, store: TokenStore) -> Self {
        Self { source, store }
    }

    /// Read handle for upload handlers
    pub fn store(&self) -> TokenStore {
        self.store.clone()
    }

    /// Exchange secrets for every remote that needs a token
    pub async fn refresh_all(&self, remotes: &RemoteRegistry) -> RefreshReport {
        let mut report = RefreshReport::default();
        for remote in remotes.token_remotes() {
            match self.source.fetch_token(remote).await {
                Ok(token) => {
                    self.store.set(remote.name.clone(), token);
                    report.refreshed.push(remote.name.clone());
                }
                Err(e) => {
                    tracing::error!(
                        remote = %remote.name,
                        error = %e,
                        kept_previous = self.store.get(&remote.name).is_some(),
                        "failed to refresh token"
                    );
                    report.failed.push((remote.name.clone(), e.to_string()));
                }
            }
        }
        report
    }
}

#[cfg(test)]
#[path = "tokens_tests.rs"]
mod tests;
