// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lookup tables for remotes by name and handlers by backend kind

use crate::error::DispatchError;
use srcdsup_adapters::UploadHandler;
use srcdsup_core::{BackendKind, RemoteDestination};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Remotes keyed by name
#[derive(Debug, Clone, Default)]
pub struct RemoteRegistry {
    remotes: BTreeMap<String, RemoteDestination>,
}

impl RemoteRegistry {
    pub fn new(remotes: impl IntoIterator<Item = RemoteDestination>) -> Self {
        Self {
            remotes: remotes
                .into_iter()
                .map(|r| (r.name.clone(), r))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&RemoteDestination> {
        self.remotes.get(name)
    }

    /// Resolve every name, failing on the first unknown one
    pub fn resolve_all<'a>(
        &'a self,
        names: &[String],
    ) -> Result<Vec<&'a RemoteDestination>, DispatchError> {
        names
            .iter()
            .map(|name| {
                self.get(name).ok_or_else(|| DispatchError::UnknownRemote {
                    remote: name.clone(),
                })
            })
            .collect()
    }

    /// Remotes that authenticate with a bearer token
    pub fn token_remotes(&self) -> impl Iterator<Item = &RemoteDestination> {
        self.remotes.values().filter(|r| r.needs_token())
    }

    pub fn iter(&self) -> impl Iterator<Item = &RemoteDestination> {
        self.remotes.values()
    }

    pub fn len(&self) -> usize {
        self.remotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.remotes.is_empty()
    }
}

/// Upload handlers keyed by the backend they serve
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<BackendKind, Arc<dyn UploadHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under its own kind, replacing any previous one
    pub fn with(mut self, handler: Arc<dyn UploadHandler>) -> Self {
        self.handlers.insert(handler.kind(), handler);
        self
    }

    /// Handler for a remote's backend
    pub fn for_remote(
        &self,
        remote: &RemoteDestination,
    ) -> Result<Arc<dyn UploadHandler>, DispatchError> {
        self.handlers
            .get(&remote.kind())
            .cloned()
            .ok_or_else(|| DispatchError::NoHandler {
                remote: remote.name.clone(),
                kind: remote.kind(),
            })
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
