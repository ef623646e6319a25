// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for engine tests

use filetime::FileTime;
use srcdsup_core::{Credentials, Encoding, Endpoint, RemoteDestination};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub fn ssh_remote(name: &str) -> RemoteDestination {
    RemoteDestination {
        name: name.to_string(),
        endpoint: Endpoint::Ssh {
            host: "files.example.com".to_string(),
            port: 22,
            timeout: Duration::from_secs(1),
        },
        credentials: Credentials::Password {
            username: "demos".to_string(),
            password: "hunter2".to_string(),
        },
        root: "/srv/demos".to_string(),
    }
}

pub fn http_remote(name: &str, url: &str) -> RemoteDestination {
    RemoteDestination {
        name: name.to_string(),
        endpoint: Endpoint::Http {
            url: url.to_string(),
            upload_path: "/api/demo".to_string(),
            encoding: Encoding::default(),
            min_size: 50_000,
            timeout: Duration::from_secs(5),
            auth_timeout: Duration::from_secs(5),
        },
        credentials: Credentials::SharedSecret {
            server_name: "us-1".to_string(),
            key: format!("{}-secret", name),
        },
        root: String::new(),
    }
}

/// Write `len` bytes to `dir/name` with mtime `secs` past the epoch
pub fn demo(dir: &Path, name: &str, len: usize, secs: i64) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, vec![b'd'; len]).unwrap();
    filetime::set_file_mtime(&path, FileTime::from_unix_time(secs, 0)).unwrap();
    path
}
