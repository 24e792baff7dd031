// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context, Result};
use std::env;

/// Provisioner configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Base address of the Vault API
    pub vault_addr: String,
    /// Auth mount used for the login exchange ("ldap", "userpass", ...)
    pub vault_auth_mount: String,
    pub vault_username: String,
    pub vault_password: String,
    /// Disables certificate verification for the Vault client only.
    /// Stays off unless explicitly opted in.
    pub vault_skip_verify: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let vault_addr =
            env::var("VAULT_ADDR").context("VAULT_ADDR environment variable not set")?;
        let vault_auth_mount =
            env::var("VAULT_AUTH_MOUNT").unwrap_or_else(|_| "ldap".to_string());
        // Empty credentials are rejected by the authentication
        // precondition, not here
        let vault_username = env::var("VAULT_LDAP_USERNAME").unwrap_or_default();
        let vault_password = env::var("VAULT_LDAP_PASSWORD").unwrap_or_default();
        let vault_skip_verify: bool = env::var("VAULT_SKIP_VERIFY")
            .unwrap_or("false".to_string())
            .parse()
            .unwrap_or(false);

        Ok(Config {
            vault_addr,
            vault_auth_mount,
            vault_username,
            vault_password,
            vault_skip_verify,
        })
    }
}
