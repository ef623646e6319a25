// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SSH/SFTP upload handler
//!
//! libssh2 is blocking, so each batch runs on the blocking pool with one
//! session for the whole batch.

use super::{UploadError, UploadHandler};
use async_trait::async_trait;
use ssh2::{Session, Sftp};
use srcdsup_core::{
    BackendKind, Credentials, Endpoint, FileResult, MatchedFile, RemoteDestination, UploadRule,
};
use std::io::{self, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DIR_MODE: i32 = 0o755;

/// Uploads over SFTP into the remote's root directory
#[derive(Clone, Copy, Debug, Default)]
pub struct SftpUploadHandler;

impl SftpUploadHandler {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl UploadHandler for SftpUploadHandler {
    fn kind(&self) -> BackendKind {
        BackendKind::Ssh
    }

    async fn deliver(
        &self,
        _rule: &UploadRule,
        remote: &RemoteDestination,
        files: &[MatchedFile],
    ) -> Result<Vec<FileResult>, UploadError> {
        let Endpoint::Ssh {
            host,
            port,
            timeout,
        } = &remote.endpoint
        else {
            return Err(UploadError::WrongBackend {
                remote: remote.name.clone(),
                expected: BackendKind::Ssh,
            });
        };

        let target = SshTarget {
            host: host.clone(),
            port: *port,
            timeout: *timeout,
            credentials: remote.credentials.clone(),
            root: remote.root.clone(),
        };
        let files = files.to_vec();

        tokio::task::spawn_blocking(move || target.upload(&files))
            .await
            .map_err(|e| UploadError::Task(e.to_string()))?
    }
}

struct SshTarget {
    host: String,
    port: u16,
    timeout: Duration,
    credentials: Credentials,
    root: String,
}

/// Disconnects the session however the batch ends
struct SessionGuard(Session);

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if let Err(e) = self.0.disconnect(None, "upload complete", None) {
            tracing::debug!(error = %e, "ssh disconnect failed");
        }
    }
}

impl SshTarget {
    fn upload(&self, files: &[MatchedFile]) -> Result<Vec<FileResult>, UploadError> {
        let session = self.connect()?;
        let sftp = session.0.sftp()?;
        ensure_dir(&sftp, &self.root)?;

        let mut results = Vec::with_capacity(files.len());
        for file in files {
            let dest = remote_path(&self.root, &file.file_name());
            match put(&sftp, &file.path, &dest) {
                Ok(bytes) => {
                    tracing::info!(
                        file = %file.path.display(),
                        dest = %dest.display(),
                        bytes,
                        "uploaded"
                    );
                    results.push(FileResult::delivered(&file.path));
                }
                Err(e) => {
                    tracing::error!(
                        file = %file.path.display(),
                        dest = %dest.display(),
                        error = %e,
                        "sftp write failed"
                    );
                    results.push(FileResult::failed(&file.path, e.to_string()));
                }
            }
        }
        Ok(results)
    }

    fn connect(&self) -> Result<SessionGuard, UploadError> {
        let target = format!("{}:{}", self.host, self.port);
        let connect_err = |reason: String| UploadError::Connect {
            target: target.clone(),
            reason,
        };

        let addrs = (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| connect_err(e.to_string()))?;

        let mut last_err = None;
        let mut stream = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, self.timeout) {
                Ok(s) => {
                    stream = Some(s);
                    break;
                }
                Err(e) => last_err = Some(e),
            }
        }
        let stream = stream.ok_or_else(|| {
            connect_err(
                last_err
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "no addresses resolved".to_string()),
            )
        })?;

        let mut session = Session::new()?;
        session.set_tcp_stream(stream);
        session.set_timeout(u32::try_from(self.timeout.as_millis()).unwrap_or(u32::MAX));
        session
            .handshake()
            .map_err(|e| connect_err(e.to_string()))?;
        let session = SessionGuard(session);

        let user = self.credentials.username().unwrap_or_default().to_string();
        let auth = match &self.credentials {
            Credentials::PrivateKey {
                username,
                key_path,
                passphrase,
            } => session
                .0
                .userauth_pubkey_file(username, None, key_path, passphrase.as_deref()),
            Credentials::Password { username, password } => {
                session.0.userauth_password(username, password)
            }
            Credentials::SharedSecret { .. } => {
                return Err(UploadError::Auth {
                    user,
                    reason: "shared secret credentials cannot open an ssh session".to_string(),
                })
            }
        };
        auth.map_err(|e| UploadError::Auth {
            user: user.clone(),
            reason: e.to_string(),
        })?;
        if !session.0.authenticated() {
            return Err(UploadError::Auth {
                user,
                reason: "server rejected credentials".to_string(),
            });
        }

        tracing::debug!(addr = %target, "ssh session established");
        Ok(session)
    }
}

/// Create `root` and its parents if missing
fn ensure_dir(sftp: &Sftp, root: &str) -> Result<(), UploadError> {
    for dir in dir_prefixes(root) {
        if sftp.stat(&dir).is_ok() {
            continue;
        }
        if let Err(e) = sftp.mkdir(&dir, DIR_MODE) {
            // Lost a race with another writer
            if sftp.stat(&dir).is_err() {
                return Err(UploadError::Session(format!(
                    "mkdir {}: {}",
                    dir.display(),
                    e
                )));
            }
        }
    }
    Ok(())
}

/// Every directory from the top of `root` down to `root` itself
fn dir_prefixes(root: &str) -> Vec<PathBuf> {
    let mut current = PathBuf::new();
    Path::new(root)
        .components()
        .map(|component| {
            current.push(component);
            current.clone()
        })
        .collect()
}

fn remote_path(root: &str, name: &str) -> PathBuf {
    if root.is_empty() {
        PathBuf::from(name)
    } else {
        Path::new(root).join(name)
    }
}

/// Stream one file and confirm the remote size matches
fn put(sftp: &Sftp, local: &Path, dest: &Path) -> io::Result<u64> {
    let mut src = std::fs::File::open(local)?;
    let expected = src.metadata()?.len();
    let mut dst = sftp.create(dest).map_err(io::Error::from)?;
    let copied = io::copy(&mut src, &mut dst)?;
    dst.flush()?;
    drop(dst);

    let stat = sftp.stat(dest).map_err(io::Error::from)?;
    verify_written(expected, copied, stat.size)
}

/// A write is complete when the local size, bytes sent and remote size agree
fn verify_written(expected: u64, copied: u64, remote: Option<u64>) -> io::Result<u64> {
    if copied != expected {
        return Err(io::Error::other(format!(
            "file changed during copy: had {} bytes, sent {}",
            expected, copied
        )));
    }
    match remote {
        Some(size) if size == copied => Ok(copied),
        other => Err(io::Error::other(format!(
            "short write: sent {} bytes, remote has {:?}",
            copied, other
        ))),
    }
}

#[cfg(test)]
#[path = "sftp_tests.rs"]
mod tests;
