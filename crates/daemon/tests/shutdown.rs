// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI integration tests for the long-running loop: PID lock and signals

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(deprecated)]

mod common;

use assert_cmd::Command;
use common::{idle_config, pid_written, setup_test_env, wait_for, write_config};
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use predicates::prelude::*;
use std::process::{Child, Stdio};
use std::time::Duration;

fn spawn_daemon(config: &std::path::Path, pid_file: &std::path::Path) -> Child {
    std::process::Command::new(assert_cmd::cargo::cargo_bin("srcdsup"))
        .arg("--config")
        .arg(config)
        .arg("--pid-file")
        .arg(pid_file)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("Failed to spawn daemon")
}

fn wait_exit(child: &mut Child) -> Option<std::process::ExitStatus> {
    let mut status = None;
    wait_for(Duration::from_secs(10), || {
        status = child.try_wait().unwrap();
        status.is_some()
    });
    status
}

#[test]
fn test_sigterm_stops_daemon_and_removes_pid_file() {
    let temp = setup_test_env();
    let config = write_config(&temp, &idle_config());
    let pid_file = temp.path().join("run").join("srcdsup.pid");

    let mut child = spawn_daemon(&config, &pid_file);
    assert!(wait_for(Duration::from_secs(10), || pid_written(&pid_file)));

    kill(Pid::from_raw(child.id() as i32), Signal::SIGTERM).unwrap();

    let status = wait_exit(&mut child).expect("daemon did not exit");
    assert!(status.success());
    assert!(!pid_file.exists());
}

#[test]
fn test_sigint_stops_daemon() {
    let temp = setup_test_env();
    let config = write_config(&temp, &idle_config());
    let pid_file = temp.path().join("srcdsup.pid");

    let mut child = spawn_daemon(&config, &pid_file);
    assert!(wait_for(Duration::from_secs(10), || pid_written(&pid_file)));

    kill(Pid::from_raw(child.id() as i32), Signal::SIGINT).unwrap();

    let status = wait_exit(&mut child).expect("daemon did not exit");
    assert!(status.success());
}

#[test]
fn test_second_instance_fails_on_held_pid_file() {
    let temp = setup_test_env();
    let config = write_config(&temp, &idle_config());
    let pid_file = temp.path().join("srcdsup.pid");

    let mut child = spawn_daemon(&config, &pid_file);
    assert!(wait_for(Duration::from_secs(10), || pid_written(&pid_file)));

    Command::cargo_bin("srcdsup")
        .unwrap()
        .arg("--config")
        .arg(&config)
        .arg("--pid-file")
        .arg(&pid_file)
        .arg("--once")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already running"));

    kill(Pid::from_raw(child.id() as i32), Signal::SIGTERM).unwrap();
    wait_exit(&mut child).expect("daemon did not exit");
}
