// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatchtowerError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Failed to encode object: {0}")]
    EncodingError(String),

    #[error("Failed to decode manifest: {0}")]
    DecodingError(String),

    #[error("Failed to apply manifest: {0}")]
    ApplyError(String),

    #[error("Expected exactly one applied resource, engine returned {0}")]
    AmbiguousResult(usize),

    #[error("Vault username and password required")]
    MissingCredentials,

    #[error("Vault connection failed: {0}")]
    ConnectionError(String),

    #[error("Vault authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Namespace creation failed: {0}")]
    NamespaceError(String),

    #[error("Chart install failed: {0}")]
    HelmError(String),

    #[error("Command failed: {0}")]
    CommandError(String),
}

pub type Result<T> = std::result::Result<T, WatchtowerError>;
