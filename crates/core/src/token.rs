// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bearer token handle shared between the refresher and HTTP handlers
//!
//! The token manager is the only writer; upload handlers only read. Both run
//! on the daemon's single loop, so the lock is never contended.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::mpsc;

/// Current bearer token per remote name
#[derive(Clone, Default, Debug)]
pub struct TokenStore {
    tokens: Arc<RwLock<HashMap<String, String>>>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current token for a remote, if one was ever obtained
    pub fn get(&self, remote: &str) -> Option<String> {
        self.tokens
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(remote)
            .cloned()
    }

    /// Replace the token for a remote
    pub fn set(&self, remote: impl Into<String>, token: impl Into<String>) {
        self.tokens
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(remote.into(), token.into());
    }

    pub fn len(&self) -> usize {
        self.tokens.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Requests an out-of-schedule token refresh
///
/// Requests coalesce: while one is pending, further fires are dropped.
#[derive(Clone, Debug)]
pub struct RefreshTrigger {
    tx: mpsc::Sender<()>,
}

/// Receiving side of [`RefreshTrigger`], polled by the event loop
#[derive(Debug)]
pub struct RefreshSignal {
    rx: mpsc::Receiver<()>,
}

/// Create a connected trigger/signal pair
pub fn refresh_channel() -> (RefreshTrigger, RefreshSignal) {
    let (tx, rx) = mpsc::channel(1);
    (RefreshTrigger { tx }, RefreshSignal { rx })
}

impl RefreshTrigger {
    /// Ask for a refresh; returns false if one is already pending
    pub fn fire(&self) -> bool {
        self.tx.try_send(()).is_ok()
    }
}

impl RefreshSignal {
    /// Wait for the next refresh request
    ///
    /// Pends forever once every trigger is dropped, so it can sit in a
    /// `select!` without spinning.
    pub async fn recv(&mut self) {
        if self.rx.recv().await.is_none() {
            std::future::pending::<()>().await;
        }
    }

    /// Consume a pending request without waiting
    pub fn try_recv(&mut self) -> bool {
        self.rx.try_recv().is_ok()
    }
}

#[cfg(test)]
#[path = "token_tests.rs"]
mod tests;
