// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Token exchange against an HTTP sink's auth endpoint

use super::{AuthError, TokenSource};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use srcdsup_core::remote::AUTH_PATH;
use srcdsup_core::{Credentials, Endpoint, RemoteDestination};

#[derive(Serialize)]
struct AuthRequest<'a> {
    server_name: &'a str,
    key: &'a str,
}

#[derive(Deserialize)]
struct TokenResult {
    token: String,
}

/// Current sinks wrap the token in a result envelope; older ones return it bare
#[derive(Deserialize)]
#[serde(untagged)]
enum AuthResponse {
    Wrapped { result: TokenResult },
    Bare { token: String },
}

impl AuthResponse {
    fn into_token(self) -> String {
        match self {
            AuthResponse::Wrapped { result } => result.token,
            AuthResponse::Bare { token } => token,
        }
    }
}

/// POSTs `{server_name, key}` to `{url}/api/server/auth`
#[derive(Clone, Debug)]
pub struct HttpTokenSource {
    client: reqwest::Client,
}

impl HttpTokenSource {
    pub fn new() -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| AuthError::Request(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl TokenSource for HttpTokenSource {
    async fn fetch_token(&self, remote: &RemoteDestination) -> Result<String, AuthError> {
        let (Credentials::SharedSecret { server_name, key }, Endpoint::Http { auth_timeout, .. }) =
            (&remote.credentials, &remote.endpoint)
        else {
            return Err(AuthError::NotTokenAuth(remote.name.clone()));
        };
        let url = remote
            .http_url(AUTH_PATH)
            .ok_or_else(|| AuthError::NotTokenAuth(remote.name.clone()))?;

        let response = self
            .client
            .post(&url)
            .json(&AuthRequest { server_name, key })
            .timeout(*auth_timeout)
            .send()
            .await
            .map_err(|e| AuthError::Request(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AuthError::Request(e.to_string()))?;
        if !status.is_success() {
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: AuthResponse = serde_json::from_str(&body)
            .map_err(|e| AuthError::InvalidResponse(e.to_string()))?;
        let token = parsed.into_token();
        if token.is_empty() {
            return Err(AuthError::EmptyToken);
        }
        Ok(token)
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
