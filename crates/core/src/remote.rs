// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Remote destinations: where matched files get shipped

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Default SSH port
pub const DEFAULT_SSH_PORT: u16 = 22;

/// Files at or below this many bytes are treated as incomplete by HTTP sinks
pub const DEFAULT_MIN_SIZE: u64 = 50_000;

/// Default upload endpoint path on HTTP sinks
pub const DEFAULT_UPLOAD_PATH: &str = "/api/demo";

/// Auth exchange endpoint path on HTTP sinks
pub const AUTH_PATH: &str = "/api/server/auth";

/// Transport used to reach a remote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// SSH session with SFTP file creation
    Ssh,
    /// HTTP POST authorized by a short-lived bearer token
    Http,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Ssh => write!(f, "ssh"),
            BackendKind::Http => write!(f, "http"),
        }
    }
}

/// How credentials are presented to a remote
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// SSH password authentication
    Password { username: String, password: String },
    /// SSH public key authentication, with an optional key passphrase
    PrivateKey {
        username: String,
        key_path: PathBuf,
        passphrase: Option<String>,
    },
    /// Long-lived secret exchanged for a bearer token
    SharedSecret { server_name: String, key: String },
}

impl Credentials {
    /// Username for SSH credentials
    pub fn username(&self) -> Option<&str> {
        match self {
            Credentials::Password { username, .. } | Credentials::PrivateKey { username, .. } => {
                Some(username)
            }
            Credentials::SharedSecret { .. } => None,
        }
    }
}

/// Container applied to a payload before multipart transmission
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    None,
    Gzip,
    Deflate,
    Xz,
    Zip,
}

impl Compression {
    /// File name suffix added to the uploaded part
    pub fn extension(self) -> Option<&'static str> {
        match self {
            Compression::None => None,
            Compression::Gzip => Some("gz"),
            Compression::Deflate => Some("zz"),
            Compression::Xz => Some("xz"),
            Compression::Zip => Some("zip"),
        }
    }
}

/// Request body shape accepted by an HTTP sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// `application/json` envelope with a base64 body
    Json,
    /// `multipart/form-data` with one binary part
    Multipart { compression: Compression },
}

impl Default for Encoding {
    fn default() -> Self {
        Encoding::Multipart {
            compression: Compression::None,
        }
    }
}

/// Backend specific endpoint settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Ssh {
        host: String,
        port: u16,
        timeout: Duration,
    },
    Http {
        url: String,
        upload_path: String,
        encoding: Encoding,
        min_size: u64,
        timeout: Duration,
        auth_timeout: Duration,
    },
}

/// A validated, named upload target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteDestination {
    pub name: String,
    pub endpoint: Endpoint,
    pub credentials: Credentials,
    /// Remote directory files are written into (SSH only)
    pub root: String,
}

impl RemoteDestination {
    pub fn kind(&self) -> BackendKind {
        match self.endpoint {
            Endpoint::Ssh { .. } => BackendKind::Ssh,
            Endpoint::Http { .. } => BackendKind::Http,
        }
    }

    /// Full URL for a path on an HTTP remote
    pub fn http_url(&self, path: &str) -> Option<String> {
        match &self.endpoint {
            Endpoint::Http { url, .. } => Some(format!(
                "{}/{}",
                url.trim_end_matches('/'),
                path.trim_start_matches('/')
            )),
            Endpoint::Ssh { .. } => None,
        }
    }

    /// Whether this remote needs a bearer token before uploads
    pub fn needs_token(&self) -> bool {
        matches!(self.credentials, Credentials::SharedSecret { .. })
    }
}

#[cfg(test)]
#[path = "remote_tests.rs"]
mod tests;
