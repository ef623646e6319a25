// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration loading and validation
//!
//! The TOML file is parsed into raw structs and then validated into the
//! typed rules and remotes the engine works with. Everything the engine
//! receives has already passed these checks.

mod raw;

use crate::delivery::CleanupPolicy;
use crate::remote::{
    BackendKind, Compression, Credentials, Encoding, Endpoint, RemoteDestination,
    DEFAULT_MIN_SIZE, DEFAULT_SSH_PORT, DEFAULT_UPLOAD_PATH,
};
use crate::rule::UploadRule;
use raw::{RawConfig, RawEncoding, RawRemote, RawRule};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const DEFAULT_SSH_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(120);
const DEFAULT_AUTH_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that can occur loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("remote {remote}: missing required field `{field}`")]
    MissingField { remote: String, field: &'static str },
    #[error("duplicate remote name: {0}")]
    DuplicateRemote(String),
    #[error("rule {rule}: unknown remote {remote}")]
    UnknownRemote { rule: String, remote: String },
    #[error("rule {0}: no remotes configured")]
    NoRemotes(String),
    #[error("rule {rule}: invalid pattern {pattern:?}: {reason}")]
    InvalidPattern {
        rule: String,
        pattern: String,
        reason: String,
    },
    #[error("invalid value: {0}")]
    InvalidValue(String),
}

/// Validated configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// How often rules are scanned
    pub update_interval: Duration,
    /// How often bearer tokens are exchanged again
    pub token_refresh_interval: Duration,
    pub cleanup: CleanupPolicy,
    pub remotes: Vec<RemoteDestination>,
    pub rules: Vec<UploadRule>,
}

impl Config {
    /// Load from a TOML file; relative rule roots resolve against its directory
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let base = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let base = base.canonicalize().unwrap_or(base);
        Self::parse(&content, &base)
    }

    /// Parse TOML content; relative rule roots resolve against `base`
    pub fn parse(content: &str, base: &Path) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(content)?;

        if raw.update_interval.is_zero() {
            return Err(ConfigError::InvalidValue(
                "update_interval must be greater than zero".to_string(),
            ));
        }
        if raw.token_refresh_interval.is_zero() {
            return Err(ConfigError::InvalidValue(
                "token_refresh_interval must be greater than zero".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        let mut remotes = Vec::with_capacity(raw.remotes.len());
        for remote in raw.remotes {
            if !seen.insert(remote.name.clone()) {
                return Err(ConfigError::DuplicateRemote(remote.name));
            }
            remotes.push(validate_remote(remote)?);
        }

        let rules = raw
            .rules
            .into_iter()
            .map(|r| validate_rule(r, base, &seen))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            update_interval: raw.update_interval,
            token_refresh_interval: raw.token_refresh_interval,
            cleanup: raw.cleanup,
            remotes,
            rules,
        })
    }

    /// Look up a remote by name
    pub fn remote(&self, name: &str) -> Option<&RemoteDestination> {
        self.remotes.iter().find(|r| r.name == name)
    }
}

fn required<T>(value: Option<T>, remote: &str, field: &'static str) -> Result<T, ConfigError> {
    value.ok_or_else(|| ConfigError::MissingField {
        remote: remote.to_string(),
        field,
    })
}

fn validate_remote(raw: RawRemote) -> Result<RemoteDestination, ConfigError> {
    let name = raw.name;
    if name.trim().is_empty() {
        return Err(ConfigError::InvalidValue(
            "remote name must not be empty".to_string(),
        ));
    }

    match raw.kind {
        BackendKind::Ssh => {
            let host = required(raw.host, &name, "host")?;
            let username = required(raw.username, &name, "username")?;
            let credentials = match raw.private_key_path {
                Some(key_path) => Credentials::PrivateKey {
                    username,
                    key_path,
                    passphrase: raw.password.filter(|p| !p.is_empty()),
                },
                None => Credentials::Password {
                    username,
                    password: required(raw.password, &name, "password")?,
                },
            };
            Ok(RemoteDestination {
                endpoint: Endpoint::Ssh {
                    host,
                    port: raw.port.unwrap_or(DEFAULT_SSH_PORT),
                    timeout: raw.timeout.unwrap_or(DEFAULT_SSH_TIMEOUT),
                },
                credentials,
                root: required(raw.root, &name, "root")?,
                name,
            })
        }
        BackendKind::Http => {
            let url = required(raw.url, &name, "url")?;
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::InvalidValue(format!(
                    "remote {}: url must start with http:// or https://",
                    name
                )));
            }
            let encoding = match (raw.encoding.unwrap_or(RawEncoding::Multipart), raw.compression)
            {
                (RawEncoding::Json, None | Some(Compression::None)) => Encoding::Json,
                (RawEncoding::Json, Some(_)) => {
                    return Err(ConfigError::InvalidValue(format!(
                        "remote {}: compression only applies to multipart encoding",
                        name
                    )))
                }
                (RawEncoding::Multipart, compression) => Encoding::Multipart {
                    compression: compression.unwrap_or_default(),
                },
            };
            Ok(RemoteDestination {
                endpoint: Endpoint::Http {
                    url,
                    upload_path: raw
                        .upload_path
                        .unwrap_or_else(|| DEFAULT_UPLOAD_PATH.to_string()),
                    encoding,
                    min_size: raw.min_size.unwrap_or(DEFAULT_MIN_SIZE),
                    timeout: raw.timeout.unwrap_or(DEFAULT_HTTP_TIMEOUT),
                    auth_timeout: raw.auth_timeout.unwrap_or(DEFAULT_AUTH_TIMEOUT),
                },
                credentials: Credentials::SharedSecret {
                    server_name: required(raw.server_name, &name, "server_name")?,
                    key: required(raw.password, &name, "password")?,
                },
                root: raw.root.unwrap_or_default(),
                name,
            })
        }
    }
}

fn validate_rule(
    raw: RawRule,
    base: &Path,
    remotes: &HashSet<String>,
) -> Result<UploadRule, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidPattern {
        rule: raw.name.clone(),
        pattern: raw.pattern.clone(),
        reason: reason.to_string(),
    };
    if raw.pattern.is_empty() {
        return Err(invalid("pattern must not be empty"));
    }
    if raw.pattern.contains("**") {
        return Err(invalid("recursive ** is not supported"));
    }
    if Path::new(&raw.pattern).is_absolute() {
        return Err(invalid("pattern must be relative to root"));
    }
    if let Err(e) = glob::Pattern::new(&raw.pattern) {
        return Err(invalid(&e.to_string()));
    }

    if raw.remotes.is_empty() {
        return Err(ConfigError::NoRemotes(raw.name));
    }
    if let Some(unknown) = raw.remotes.iter().find(|r| !remotes.contains(*r)) {
        return Err(ConfigError::UnknownRemote {
            rule: raw.name.clone(),
            remote: unknown.clone(),
        });
    }

    let root = if raw.root.is_absolute() {
        raw.root.clone()
    } else {
        base.join(&raw.root)
    };

    let mut rule = UploadRule::new(raw.name, root, raw.pattern).with_server(raw.server);
    for remote in raw.remotes {
        rule = rule.with_remote(remote);
    }
    rule.skip_newest = raw.skip_newest;
    rule.require_metadata = raw.require_metadata;
    Ok(rule)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
