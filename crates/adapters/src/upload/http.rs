// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Authenticated HTTP upload handler

use super::encode::DemoPayload;
use super::{UploadError, UploadHandler};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use srcdsup_core::{
    BackendKind, Credentials, Encoding, Endpoint, FileResult, MatchedFile, RefreshTrigger,
    RemoteDestination, SidecarMetadata, TokenStore, UploadRule,
};
use std::time::Duration;

/// POSTs each file to the remote's upload endpoint with its bearer token
#[derive(Clone, Debug)]
pub struct HttpUploadHandler {
    client: reqwest::Client,
    tokens: TokenStore,
    refresh: Option<RefreshTrigger>,
}

impl HttpUploadHandler {
    pub fn new(tokens: TokenStore) -> Result<Self, UploadError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| UploadError::Client(e.to_string()))?;
        Ok(Self {
            client,
            tokens,
            refresh: None,
        })
    }

    /// Fire `trigger` when a sink rejects the current token
    pub fn with_refresh_trigger(mut self, trigger: RefreshTrigger) -> Self {
        self.refresh = Some(trigger);
        self
    }

    fn request_refresh(&self, remote: &str) {
        if let Some(trigger) = &self.refresh {
            if trigger.fire() {
                tracing::info!(remote, "token rejected, refresh requested");
            }
        }
    }

    async fn send_one(
        &self,
        rule: &UploadRule,
        remote: &RemoteDestination,
        target: &SinkTarget<'_>,
        file: &MatchedFile,
    ) -> FileResult {
        let metadata = match load_metadata(rule, file) {
            Ok(m) => m,
            Err(reason) => return FileResult::failed(&file.path, reason),
        };
        let body = match tokio::fs::read(&file.path).await {
            Ok(b) => b,
            Err(e) => return FileResult::failed(&file.path, format!("read failed: {}", e)),
        };

        let payload = DemoPayload {
            server_name: target.server_name.to_string(),
            demo_name: file.file_name(),
            body,
            metadata,
        };

        let request = self
            .client
            .post(&target.url)
            .header(AUTHORIZATION, target.token)
            .timeout(target.timeout);
        let request = match target.encoding {
            Encoding::Json => match payload.to_json() {
                Ok(json) => request.header(CONTENT_TYPE, "application/json").body(json),
                Err(e) => return FileResult::failed(&file.path, e.to_string()),
            },
            Encoding::Multipart { compression } => match payload.to_multipart(compression) {
                Ok(form) => request.multipart(form),
                Err(e) => return FileResult::failed(&file.path, e.to_string()),
            },
        };

        let response = match request.send().await {
            Ok(r) => r,
            Err(e) => return FileResult::failed(&file.path, format!("request failed: {}", e)),
        };

        let status = response.status();
        if matches!(status, StatusCode::CREATED | StatusCode::ACCEPTED) {
            tracing::info!(
                remote = %remote.name,
                file = %file.path.display(),
                size = file.size,
                "uploaded"
            );
            return FileResult::delivered(&file.path);
        }

        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            self.request_refresh(&remote.name);
        }
        let body = response.text().await.unwrap_or_default();
        tracing::error!(
            remote = %remote.name,
            file = %file.path.display(),
            status = status.as_u16(),
            body = %body,
            "upload rejected"
        );
        FileResult::failed(&file.path, format!("HTTP {}: {}", status.as_u16(), body))
    }
}

struct SinkTarget<'a> {
    url: String,
    token: &'a str,
    server_name: &'a str,
    encoding: Encoding,
    timeout: Duration,
}

#[async_trait]
impl UploadHandler for HttpUploadHandler {
    fn kind(&self) -> BackendKind {
        BackendKind::Http
    }

    async fn deliver(
        &self,
        rule: &UploadRule,
        remote: &RemoteDestination,
        files: &[MatchedFile],
    ) -> Result<Vec<FileResult>, UploadError> {
        let wrong_backend = || UploadError::WrongBackend {
            remote: remote.name.clone(),
            expected: BackendKind::Http,
        };
        let Endpoint::Http {
            upload_path,
            encoding,
            min_size,
            timeout,
            ..
        } = &remote.endpoint
        else {
            return Err(wrong_backend());
        };
        let url = remote.http_url(upload_path).ok_or_else(wrong_backend)?;

        // Size gate first: gated files are deferred whatever the token state
        let mut eligible = Vec::with_capacity(files.len());
        for file in files {
            if file.size <= *min_size {
                tracing::debug!(
                    remote = %remote.name,
                    file = %file.path.display(),
                    size = file.size,
                    min_size,
                    "below size gate, deferred"
                );
                continue;
            }
            eligible.push(file);
        }
        if eligible.is_empty() {
            return Ok(Vec::new());
        }

        // Nothing was attempted without a token, so the whole batch is deferred
        let Some(token) = self.tokens.get(&remote.name) else {
            self.request_refresh(&remote.name);
            tracing::warn!(
                remote = %remote.name,
                files = eligible.len(),
                "no token yet, deferring batch"
            );
            return Ok(Vec::new());
        };

        let server_name = match (&remote.credentials, rule.server.is_empty()) {
            (Credentials::SharedSecret { server_name, .. }, true) => server_name.as_str(),
            _ => rule.server.as_str(),
        };
        let target = SinkTarget {
            url,
            token: &token,
            server_name,
            encoding: *encoding,
            timeout: *timeout,
        };

        let mut results = Vec::with_capacity(eligible.len());
        for file in eligible {
            results.push(self.send_one(rule, remote, &target, file).await);
        }
        Ok(results)
    }
}

fn load_metadata(rule: &UploadRule, file: &MatchedFile) -> Result<SidecarMetadata, String> {
    match &file.sidecar {
        Some(path) => match SidecarMetadata::load(path) {
            Ok(m) => Ok(m),
            Err(e) if rule.require_metadata => Err(e.to_string()),
            Err(e) => {
                tracing::warn!(file = %file.path.display(), error = %e, "ignoring bad sidecar");
                Ok(SidecarMetadata::default())
            }
        },
        None if rule.require_metadata => Err(format!(
            "sidecar metadata missing: {}",
            srcdsup_core::sidecar_path(&file.path).display()
        )),
        None => Ok(SidecarMetadata::default()),
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
