// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sidecar metadata stored next to a recording
//!
//! A demo `foo.dem` may be accompanied by `foo.dem.json` carrying the map
//! name and per-player stats that HTTP sinks attach to the upload.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Suffix appended to a primary file name to find its sidecar
pub const SIDECAR_SUFFIX: &str = ".json";

/// Errors loading a sidecar file
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("sidecar metadata missing: {}", .0.display())]
    Missing(PathBuf),
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid sidecar metadata in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Per-player scoreboard entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    #[serde(default)]
    pub score: i32,
    #[serde(default, alias = "totalScore")]
    pub total_score: i32,
    #[serde(default)]
    pub deaths: i32,
}

/// Structured fields describing a recording
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SidecarMetadata {
    #[serde(default, alias = "mapName")]
    pub map_name: String,
    /// Keyed by player ID (SteamID64 as a string)
    #[serde(default, alias = "perPlayerStats")]
    pub scores: BTreeMap<String, PlayerStats>,
}

impl SidecarMetadata {
    /// Read and parse a sidecar file
    pub fn load(path: &Path) -> Result<Self, MetadataError> {
        let raw = match std::fs::read(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(MetadataError::Missing(path.to_path_buf()))
            }
            Err(source) => {
                return Err(MetadataError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        serde_json::from_slice(&raw).map_err(|source| MetadataError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The scores map as a raw JSON document
    pub fn scores_json(&self) -> String {
        serde_json::to_string(&self.scores).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Path of the sidecar for `primary` (`<primary>.json`)
pub fn sidecar_path(primary: &Path) -> PathBuf {
    let mut name: OsString = primary.as_os_str().to_owned();
    name.push(SIDECAR_SUFFIX);
    PathBuf::from(name)
}

#[cfg(test)]
#[path = "metadata_tests.rs"]
mod tests;
