// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! On-disk TOML shape, before validation

use crate::delivery::CleanupPolicy;
use crate::remote::{BackendKind, Compression};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

fn default_update_interval() -> Duration {
    Duration::from_secs(60)
}

fn default_token_refresh_interval() -> Duration {
    Duration::from_secs(6 * 60 * 60)
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawConfig {
    #[serde(default = "default_update_interval", with = "humantime_serde")]
    pub update_interval: Duration,
    #[serde(default = "default_token_refresh_interval", with = "humantime_serde")]
    pub token_refresh_interval: Duration,
    #[serde(default)]
    pub cleanup: CleanupPolicy,
    #[serde(default)]
    pub remotes: Vec<RawRemote>,
    #[serde(default)]
    pub rules: Vec<RawRule>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum RawEncoding {
    Json,
    Multipart,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawRemote {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: BackendKind,

    // ssh
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub private_key_path: Option<PathBuf>,
    pub root: Option<String>,

    // ssh password / key passphrase, or the http shared secret
    pub password: Option<String>,

    // http
    pub url: Option<String>,
    pub server_name: Option<String>,
    pub upload_path: Option<String>,
    pub encoding: Option<RawEncoding>,
    pub compression: Option<Compression>,
    pub min_size: Option<u64>,
    #[serde(default, with = "humantime_serde")]
    pub auth_timeout: Option<Duration>,

    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawRule {
    pub name: String,
    pub root: PathBuf,
    pub pattern: String,
    #[serde(default)]
    pub remotes: Vec<String>,
    #[serde(default)]
    pub server: String,
    #[serde(default)]
    pub skip_newest: bool,
    #[serde(default)]
    pub require_metadata: bool,
}
