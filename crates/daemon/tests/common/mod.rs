// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test utilities for daemon integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::TempDir;

/// Temp directory with an empty `demos/` folder for rules to watch
pub fn setup_test_env() -> TempDir {
    let temp = TempDir::new().expect("Failed to create temp directory");
    fs::create_dir(temp.path().join("demos")).expect("Failed to create demos dir");
    temp
}

/// Write `srcdsup.toml` into the environment and return its path
pub fn write_config(temp: &TempDir, content: &str) -> PathBuf {
    let path = temp.path().join("srcdsup.toml");
    fs::write(&path, content).expect("Failed to write config");
    path
}

/// Write a demo of `len` bytes into `demos/`
pub fn write_demo(temp: &TempDir, name: &str, len: usize) -> PathBuf {
    let path = temp.path().join("demos").join(name);
    fs::write(&path, vec![b'd'; len]).expect("Failed to write demo");
    path
}

/// One HTTP sink, one rule over `demos/*.dem`
pub fn http_config(url: &str) -> String {
    format!(
        r#"
update_interval = "1h"

[[remotes]]
name = "gbans"
type = "http"
url = "{url}"
server_name = "us-1"
password = "s3cret"
min_size = 0
timeout = "5s"
auth_timeout = "5s"

[[rules]]
name = "stv"
root = "demos"
pattern = "*.dem"
remotes = ["gbans"]
server = "us-1"
"#
    )
}

/// One SSH remote that is never contacted while `demos/` stays empty
pub fn idle_config() -> String {
    r#"
update_interval = "1h"

[[remotes]]
name = "archive"
type = "ssh"
host = "127.0.0.1"
port = 1
username = "demos"
password = "hunter2"
root = "/srv/demos"

[[rules]]
name = "stv"
root = "demos"
pattern = "*.dem"
remotes = ["archive"]
"#
    .to_string()
}

/// Poll until `check` holds or the timeout elapses
pub fn wait_for(timeout: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if check() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    check()
}

/// Whether a PID file holds a process id
pub fn pid_written(path: &Path) -> bool {
    fs::read_to_string(path)
        .map(|s| s.trim().parse::<u32>().is_ok())
        .unwrap_or(false)
}
