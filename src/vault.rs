// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Vault credential exchange and token-bearing client.

use serde::Deserialize;
use tracing::{info, instrument};
use url::Url;

use crate::error::{Result, WatchtowerError};

/// Token-bearing Vault client. Only constructible through
/// [`authenticate`], so holding one means the credential exchange
/// succeeded. The token is set once and never refreshed here.
#[derive(Debug, Clone)]
pub struct VaultClient {
    endpoint: Url,
    http: reqwest::Client,
    token: String,
}

impl VaultClient {
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Read a logical path with the stored token.
    pub async fn read(&self, path: &str) -> Result<serde_json::Value> {
        let url = self
            .endpoint
            .join(&format!("v1/{}", path.trim_start_matches('/')))
            .map_err(|e| {
                WatchtowerError::ConnectionError(format!("invalid path '{}': {}", path, e))
            })?;

        let response = self
            .http
            .get(url)
            .header("X-Vault-Token", &self.token)
            .send()
            .await
            .map_err(|e| {
                WatchtowerError::ConnectionError(format!(
                    "Vault at {} unreachable: {}",
                    self.endpoint, e
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(WatchtowerError::AuthenticationError(format!(
                "read of '{}' rejected with status {}",
                path, status
            )));
        }

        response.json().await.map_err(|e| {
            WatchtowerError::DecodingError(format!("malformed Vault response: {}", e))
        })
    }
}

#[derive(Deserialize)]
struct LoginResponse {
    auth: Option<LoginAuth>,
}

#[derive(Deserialize)]
struct LoginAuth {
    client_token: Option<String>,
}

/// Exchange a directory-service credential for a short-lived Vault token.
///
/// `skip_verify` disables certificate verification for this client only,
/// never process-wide; it is an explicit opt-in for self-signed
/// infrastructure certificates. The auth mount ("ldap", "userpass", ...)
/// selects the login backend.
#[instrument(skip(password))]
pub async fn authenticate(
    addr: &str,
    skip_verify: bool,
    auth_mount: &str,
    username: &str,
    password: &str,
) -> Result<VaultClient> {
    if username.is_empty() || password.is_empty() {
        return Err(WatchtowerError::MissingCredentials);
    }

    let endpoint = Url::parse(addr).map_err(|e| {
        WatchtowerError::ConnectionError(format!("invalid Vault address '{}': {}", addr, e))
    })?;

    let http = reqwest::Client::builder()
        .danger_accept_invalid_certs(skip_verify)
        .build()
        .map_err(|e| {
            WatchtowerError::ConnectionError(format!("failed to build HTTP client: {}", e))
        })?;

    let login_url = endpoint
        .join(&format!("v1/auth/{}/login/{}", auth_mount, username))
        .map_err(|e| WatchtowerError::ConnectionError(format!("invalid login path: {}", e)))?;

    // Logical writes are PUTs; the password travels in the body, never in
    // the path.
    let response = http
        .put(login_url)
        .json(&serde_json::json!({ "password": password }))
        .send()
        .await
        .map_err(|e| {
            WatchtowerError::ConnectionError(format!("Vault at {} unreachable: {}", addr, e))
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(WatchtowerError::AuthenticationError(format!(
            "login for '{}' rejected with status {}",
            username, status
        )));
    }

    let body: LoginResponse = response.json().await.map_err(|e| {
        WatchtowerError::AuthenticationError(format!("malformed login response: {}", e))
    })?;

    let token = body
        .auth
        .and_then(|a| a.client_token)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            WatchtowerError::AuthenticationError("login response carried no client token".to_string())
        })?;

    info!("Vault login for '{}' succeeded", username);
    Ok(VaultClient {
        endpoint,
        http,
        token,
    })
}
