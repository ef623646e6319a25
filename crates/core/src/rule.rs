// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Upload rules: bindings of a source directory pattern to remotes

use std::path::{Path, PathBuf};

/// A named binding of `root/pattern` to one or more remotes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRule {
    pub name: String,
    /// Absolute directory the pattern is resolved against
    pub root: PathBuf,
    /// Shell glob (`*`, `?`, `[...]`), never recursive
    pub pattern: String,
    /// Remote names in dispatch order, without duplicates
    pub remotes: Vec<String>,
    /// Label sent to HTTP sinks as the originating server
    pub server: String,
    /// Hold back the newest match, which may still be written to
    pub skip_newest: bool,
    /// Every file must have a sidecar metadata file next to it
    pub require_metadata: bool,
}

impl UploadRule {
    pub fn new(
        name: impl Into<String>,
        root: impl Into<PathBuf>,
        pattern: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
            pattern: pattern.into(),
            remotes: Vec::new(),
            server: String::new(),
            skip_newest: false,
            require_metadata: false,
        }
    }

    pub fn with_remote(mut self, remote: impl Into<String>) -> Self {
        let remote = remote.into();
        if !self.remotes.contains(&remote) {
            self.remotes.push(remote);
        }
        self
    }

    pub fn with_server(mut self, server: impl Into<String>) -> Self {
        self.server = server.into();
        self
    }

    pub fn skipping_newest(mut self) -> Self {
        self.skip_newest = true;
        self
    }

    pub fn requiring_metadata(mut self) -> Self {
        self.require_metadata = true;
        self
    }

    /// The glob expression this rule expands
    pub fn glob_expr(&self) -> PathBuf {
        self.root.join(&self.pattern)
    }

    /// Whether `path` lives under this rule's root
    pub fn owns(&self, path: &Path) -> bool {
        path.starts_with(&self.root)
    }
}
