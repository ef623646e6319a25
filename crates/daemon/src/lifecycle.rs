// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, one cycle, shutdown.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fs2::FileExt;
use srcdsup_adapters::{
    AuthError, HttpTokenSource, HttpUploadHandler, NoOpUploadHandler, SftpUploadHandler,
    TokenSource, TracedTokenSource, TracedUploadHandler, UploadError,
};
use srcdsup_core::{
    refresh_channel, BackendKind, Config, ConfigError, RefreshSignal, RefreshTrigger, TokenStore,
};
use srcdsup_engine::{
    CycleReport, HandlerRegistry, Orchestrator, RefreshReport, RemoteRegistry, TokenManager,
};
use thiserror::Error;
use tracing::{info, warn};

/// Startup switches taken from the command line
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Exclusive lock file holding the daemon's PID
    pub pid_file: Option<PathBuf>,
    /// Serve every backend with the no-op handler
    pub dry_run: bool,
}

/// Collaborators the daemon runs with
pub struct DaemonDeps {
    pub handlers: HandlerRegistry,
    pub token_source: Arc<dyn TokenSource>,
    pub tokens: TokenStore,
    pub refresh: (RefreshTrigger, RefreshSignal),
}

impl DaemonDeps {
    /// Production adapters, wrapped with tracing
    pub fn production(dry_run: bool) -> Result<Self, LifecycleError> {
        let tokens = TokenStore::new();
        let (trigger, signal) = refresh_channel();

        let handlers = if dry_run {
            HandlerRegistry::new()
                .with(Arc::new(NoOpUploadHandler::new(BackendKind::Ssh)))
                .with(Arc::new(NoOpUploadHandler::new(BackendKind::Http)))
        } else {
            let http = HttpUploadHandler::new(tokens.clone())?.with_refresh_trigger(trigger.clone());
            HandlerRegistry::new()
                .with(Arc::new(TracedUploadHandler::new(SftpUploadHandler::new())))
                .with(Arc::new(TracedUploadHandler::new(http)))
        };

        Ok(Self {
            handlers,
            token_source: Arc::new(TracedTokenSource::new(HttpTokenSource::new()?)),
            tokens,
            refresh: (trigger, signal),
        })
    }
}

/// Advisory lock on the PID file, held for the daemon's lifetime
#[derive(Debug)]
pub struct PidLock {
    path: PathBuf,
    // NOTE(lifetime): the lock is released when this handle is dropped
    _file: File,
}

impl PidLock {
    /// Take the lock and write our PID; fails if another process holds it
    pub fn acquire(path: &Path) -> Result<Self, LifecycleError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Truncate only after the lock is ours, so a running daemon's PID survives
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        file.try_lock_exclusive()
            .map_err(|e| LifecycleError::LockFailed(path.to_path_buf(), e))?;
        file.set_len(0)?;
        writeln!(file, "{}", std::process::id())?;

        Ok(Self {
            path: path.to_path_buf(),
            _file: file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the PID file, then drop the lock
    pub fn release(self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!("Failed to remove PID file: {}", e);
        }
    }
}

/// Daemon state during operation
pub struct Daemon {
    remotes: Arc<RemoteRegistry>,
    orchestrator: Orchestrator,
    tokens: TokenManager,
    /// Out-of-schedule refresh requests from upload handlers
    pub refresh_signal: RefreshSignal,
    // KEEP UNTIL: shutdown; dropping it closes the refresh channel
    _refresh_trigger: RefreshTrigger,
    pid_lock: Option<PidLock>,
}

impl Daemon {
    /// Number of remotes the daemon serves
    pub fn remote_count(&self) -> usize {
        self.remotes.len()
    }

    pub fn pid_file(&self) -> Option<&Path> {
        self.pid_lock.as_ref().map(PidLock::path)
    }

    /// Exchange secrets for fresh tokens on every HTTP remote
    pub async fn refresh_tokens(&self) -> RefreshReport {
        let report = self.tokens.refresh_all(&self.remotes).await;
        if !report.refreshed.is_empty() || !report.failed.is_empty() {
            info!(
                refreshed = report.refreshed.len(),
                failed = report.failed.len(),
                "token refresh finished"
            );
        }
        report
    }

    /// Run one scan cycle and log its outcome
    pub async fn run_cycle(&mut self) -> CycleReport {
        let report = self.orchestrator.run_cycle().await;
        for rule in &report.rules {
            if rule.matched == 0 && rule.aborted.is_none() {
                continue;
            }
            info!(
                rule = %rule.rule,
                matched = rule.matched,
                dispatched = rule.dispatched,
                delivered = rule.delivered,
                failed = rule.failed,
                deferred = rule.deferred,
                removed = rule.removed,
                "cycle finished for rule"
            );
        }
        report
    }

    /// Shutdown the daemon gracefully
    pub fn shutdown(self) {
        info!("Shutting down daemon...");
        if let Some(lock) = self.pid_lock {
            lock.release();
        }
        info!("Daemon shutdown complete");
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to lock {}: daemon already running?", .0.display())]
    LockFailed(PathBuf, #[source] std::io::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("upload handler setup failed: {0}")]
    Upload(#[from] UploadError),

    #[error("token source setup failed: {0}")]
    Auth(#[from] AuthError),
}

/// Start the daemon with production adapters
pub fn startup(config: Config, options: &Options) -> Result<Daemon, LifecycleError> {
    // Lock first so a second instance fails before touching anything
    let pid_lock = options
        .pid_file
        .as_deref()
        .map(PidLock::acquire)
        .transpose()?;
    let deps = DaemonDeps::production(options.dry_run)?;
    Ok(assemble(config, deps, pid_lock))
}

/// Wire a daemon from already built collaborators
pub fn assemble(config: Config, deps: DaemonDeps, pid_lock: Option<PidLock>) -> Daemon {
    let remotes = Arc::new(RemoteRegistry::new(config.remotes));

    for rule in &config.rules {
        info!(
            rule = %rule.name,
            root = %rule.root.display(),
            pattern = %rule.pattern,
            remotes = ?rule.remotes,
            "watching path"
        );
    }

    let (trigger, signal) = deps.refresh;
    let orchestrator = Orchestrator::new(
        config.rules,
        Arc::clone(&remotes),
        deps.handlers,
        config.cleanup,
    );

    Daemon {
        remotes,
        orchestrator,
        tokens: TokenManager::new(deps.token_source, deps.tokens),
        refresh_signal: signal,
        _refresh_trigger: trigger,
        pid_lock,
    }
}

/// One-line-per-item description of a loaded configuration
pub fn summary(config: &Config) -> String {
    let mut out = format!(
        "update interval: {:?}\ntoken refresh interval: {:?}\ncleanup: {}\n",
        config.update_interval, config.token_refresh_interval, config.cleanup
    );
    out.push_str(&format!("remotes: {}\n", config.remotes.len()));
    for remote in &config.remotes {
        out.push_str(&format!("  {} ({})\n", remote.name, remote.kind()));
    }
    out.push_str(&format!("rules: {}\n", config.rules.len()));
    for rule in &config.rules {
        out.push_str(&format!(
            "  {}: {} -> {}\n",
            rule.name,
            rule.glob_expr().display(),
            rule.remotes.join(", ")
        ));
    }
    out
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
