// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::Result;
use kube::Client;
use tracing::info;

use watchtower::config::Config;
use watchtower::stack::PrometheusStack;
use watchtower::vault;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting Watchtower provisioner");

    // Load configuration
    let config = Config::from_env()?;

    // Exchange the directory credential for a Vault token; surrounding
    // tooling drives its authenticated calls through this client.
    let vault_client = vault::authenticate(
        &config.vault_addr,
        config.vault_skip_verify,
        &config.vault_auth_mount,
        &config.vault_username,
        &config.vault_password,
    )
    .await?;
    info!("Authenticated against Vault at {}", vault_client.endpoint());

    // Create Kubernetes client
    let client = Client::try_default().await?;
    info!("Connected to Kubernetes cluster");

    // Provision the monitoring stack; the first failure aborts the rest
    let stack = PrometheusStack::new(client);
    stack.install().await?;

    info!("Monitoring stack provisioned");
    Ok(())
}
