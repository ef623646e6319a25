// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use srcdsup_adapters::{FakeTokenSource, FakeUploadHandler};
use tempfile::TempDir;

fn config(dir: &Path) -> Config {
    let content = format!(
        r#"
[[remotes]]
name = "archive"
type = "ssh"
host = "files.example.com"
username = "demos"
password = "hunter2"
root = "/srv/demos"

[[remotes]]
name = "gbans"
type = "http"
url = "http://127.0.0.1:1"
server_name = "us-1"
password = "s3cret"
min_size = 0

[[rules]]
name = "stv"
root = "{}"
pattern = "*.dem"
remotes = ["archive", "gbans"]
"#,
        dir.display()
    );
    Config::parse(&content, dir).unwrap()
}

struct Fakes {
    ssh: FakeUploadHandler,
    http: FakeUploadHandler,
    source: FakeTokenSource,
}

fn fake_deps() -> (DaemonDeps, Fakes) {
    let fakes = Fakes {
        ssh: FakeUploadHandler::new(BackendKind::Ssh),
        http: FakeUploadHandler::new(BackendKind::Http),
        source: FakeTokenSource::new(),
    };
    let deps = DaemonDeps {
        handlers: HandlerRegistry::new()
            .with(Arc::new(fakes.ssh.clone()))
            .with(Arc::new(fakes.http.clone())),
        token_source: Arc::new(fakes.source.clone()),
        tokens: TokenStore::new(),
        refresh: refresh_channel(),
    };
    (deps, fakes)
}

#[test]
fn pid_lock_writes_pid_and_release_removes_it() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("run").join("srcdsup.pid");

    let lock = PidLock::acquire(&path).unwrap();
    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content.trim(), std::process::id().to_string());

    lock.release();
    assert!(!path.exists());
}

#[test]
fn second_pid_lock_fails_while_first_is_held() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("srcdsup.pid");

    let _first = PidLock::acquire(&path).unwrap();
    let second = PidLock::acquire(&path);

    assert!(matches!(second, Err(LifecycleError::LockFailed(..))));
    // the holder's PID is left intact
    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content.trim(), std::process::id().to_string());
}

#[tokio::test]
async fn assembled_daemon_refreshes_only_http_remotes() {
    let dir = TempDir::new().unwrap();
    let (deps, fakes) = fake_deps();
    let daemon = assemble(config(dir.path()), deps, None);

    let report = daemon.refresh_tokens().await;

    assert_eq!(daemon.remote_count(), 2);
    assert_eq!(report.refreshed, vec!["gbans"]);
    assert_eq!(fakes.source.calls(), vec!["gbans"]);
}

#[tokio::test]
async fn assembled_daemon_runs_a_cycle_through_both_handlers() {
    let dir = TempDir::new().unwrap();
    let demo = dir.path().join("match.dem");
    std::fs::write(&demo, b"demo").unwrap();
    let (deps, fakes) = fake_deps();
    let mut daemon = assemble(config(dir.path()), deps, None);

    let report = daemon.run_cycle().await;

    assert_eq!(report.delivered(), 2);
    assert_eq!(report.removed(), 1);
    assert_eq!(fakes.ssh.calls().len(), 1);
    assert_eq!(fakes.http.calls()[0].files, vec![demo.clone()]);
    assert!(!demo.exists());
}

#[tokio::test]
async fn dry_run_uploads_and_removes_nothing() {
    let dir = TempDir::new().unwrap();
    let demo = dir.path().join("match.dem");
    std::fs::write(&demo, b"demo").unwrap();
    let deps = DaemonDeps::production(true).unwrap();
    let mut daemon = assemble(config(dir.path()), deps, None);

    let report = daemon.run_cycle().await;

    let rule = report.rule("stv").unwrap();
    assert_eq!(rule.matched, 1);
    assert_eq!(rule.delivered, 0);
    assert_eq!(rule.deferred, 1);
    assert_eq!(rule.removed, 0);
    assert!(demo.exists());
}

#[test]
fn startup_takes_pid_lock_and_shutdown_releases_it() {
    let dir = TempDir::new().unwrap();
    let pid_file = dir.path().join("srcdsup.pid");
    let options = Options {
        pid_file: Some(pid_file.clone()),
        dry_run: true,
    };

    let daemon = startup(config(dir.path()), &options).unwrap();
    assert_eq!(daemon.pid_file(), Some(pid_file.as_path()));
    assert!(matches!(
        startup(config(dir.path()), &options),
        Err(LifecycleError::LockFailed(..))
    ));

    daemon.shutdown();
    assert!(!pid_file.exists());
}

#[test]
fn summary_lists_remotes_and_rules() {
    let dir = TempDir::new().unwrap();
    let text = summary(&config(dir.path()));

    assert!(text.contains("remotes: 2"));
    assert!(text.contains("  archive (ssh)"));
    assert!(text.contains("  gbans (http)"));
    assert!(text.contains("rules: 1"));
    assert!(text.contains("-> archive, gbans"));
    assert!(text.contains("cleanup: attempted"));
}
