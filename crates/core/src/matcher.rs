// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rule matching: expand a rule's glob into candidate files
//!
//! Matches are plain regular files with their stat info, ordered newest
//! first by modification time. A rule with `skip_newest` holds back the
//! most recent file, assuming the game server is still appending to it.

use crate::metadata::{sidecar_path, SIDECAR_SUFFIX};
use crate::rule::UploadRule;
use glob::{MatchOptions, Pattern};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;

/// Errors resolving a rule's pattern
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("invalid pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
    #[error("recursive pattern not supported: {0:?}")]
    Recursive(String),
}

/// A file found by a rule during one scan cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedFile {
    pub path: PathBuf,
    pub size: u64,
    pub modified: SystemTime,
    /// Sidecar metadata path, when one exists next to the file
    pub sidecar: Option<PathBuf>,
}

impl MatchedFile {
    /// Base file name, used as the remote file name
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

const OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Resolves rules against the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleMatcher;

impl RuleMatcher {
    pub fn new() -> Self {
        Self
    }

    /// Expand `rule.root/rule.pattern` into files ready for dispatch
    ///
    /// An empty result is not an error. Entries that cannot be read are
    /// logged and skipped; only an invalid pattern fails the whole rule.
    pub fn resolve(&self, rule: &UploadRule) -> Result<Vec<MatchedFile>, MatchError> {
        let expr = glob_expr(&rule.root, &rule.pattern)?;

        let paths = glob::glob_with(&expr, OPTIONS).map_err(|source| MatchError::Pattern {
            pattern: rule.pattern.clone(),
            source,
        })?;

        let mut candidates = Vec::new();
        for entry in paths {
            match entry {
                Ok(path) => candidates.push(path),
                Err(e) => {
                    tracing::warn!(rule = %rule.name, error = %e, "unreadable glob entry");
                }
            }
        }

        let primaries = drop_sidecars(candidates);
        let mut files = Vec::with_capacity(primaries.len());
        for path in primaries {
            match stat(&path) {
                Ok(Some(file)) => files.push(file),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(
                        rule = %rule.name,
                        path = %path.display(),
                        error = %e,
                        "could not stat match"
                    );
                }
            }
        }

        Ok(order_for_dispatch(files, rule.skip_newest))
    }
}

/// Sort newest first and apply the active-write hold back
pub fn order_for_dispatch(mut files: Vec<MatchedFile>, skip_newest: bool) -> Vec<MatchedFile> {
    files.sort_by(|a, b| {
        b.modified
            .cmp(&a.modified)
            .then_with(|| a.path.cmp(&b.path))
    });
    if skip_newest && !files.is_empty() {
        files.remove(0);
    }
    files
}

fn glob_expr(root: &Path, pattern: &str) -> Result<String, MatchError> {
    if pattern.contains("**") {
        return Err(MatchError::Recursive(pattern.to_string()));
    }
    Pattern::new(pattern).map_err(|source| MatchError::Pattern {
        pattern: pattern.to_string(),
        source,
    })?;
    let root = Pattern::escape(&root.to_string_lossy());
    Ok(format!("{}/{}", root.trim_end_matches('/'), pattern))
}

/// Remove `X.json` entries whose primary `X` also matched
fn drop_sidecars(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    let all: HashSet<PathBuf> = paths.iter().cloned().collect();
    paths
        .into_iter()
        .filter(|p| {
            let name = p.as_os_str().to_string_lossy();
            match name.strip_suffix(SIDECAR_SUFFIX) {
                Some(primary) => !all.contains(Path::new(primary)),
                None => true,
            }
        })
        .collect()
}

fn stat(path: &Path) -> std::io::Result<Option<MatchedFile>> {
    let meta = std::fs::metadata(path)?;
    if !meta.is_file() {
        return Ok(None);
    }
    let sidecar = sidecar_path(path);
    Ok(Some(MatchedFile {
        path: path.to_path_buf(),
        size: meta.len(),
        modified: meta.modified()?,
        sidecar: sidecar.is_file().then_some(sidecar),
    }))
}

#[cfg(test)]
#[path = "matcher_tests.rs"]
mod tests;
