// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! CRD availability checking utilities

use crate::constants::crd::{POLL_INTERVAL_SECS, POLL_MAX_INTERVAL_SECS};
use crate::error::Result;
use kube::{discovery::Discovery, Client};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// API group served by the Prometheus operator
const MONITORING_GROUP: &str = "monitoring.coreos.com";

/// Wait for the Prometheus CRD to become available in the cluster.
/// The operator chart registers the CRD; instances can only be applied
/// once the API server serves the group. Uses exponential backoff
/// starting at POLL_INTERVAL_SECS seconds.
pub async fn wait_for_prometheus_crd(client: &Client) -> Result<()> {
    let mut interval = POLL_INTERVAL_SECS;

    loop {
        match check_prometheus_crd_exists(client).await {
            Ok(true) => {
                info!("Prometheus CRD ({}/v1) is available", MONITORING_GROUP);
                return Ok(());
            }
            Ok(false) => {
                info!(
                    "Prometheus CRD ({}/v1) not yet available, waiting {} seconds...",
                    MONITORING_GROUP, interval
                );
            }
            Err(e) => {
                warn!(
                    "Error checking for Prometheus CRD: {}, retrying in {} seconds...",
                    e, interval
                );
            }
        }

        sleep(Duration::from_secs(interval)).await;

        // Exponential backoff with max cap
        interval = (interval * 2).min(POLL_MAX_INTERVAL_SECS);
    }
}

/// Check if the Prometheus CRD exists by attempting to discover it.
async fn check_prometheus_crd_exists(client: &Client) -> Result<bool> {
    let discovery = Discovery::new(client.clone())
        .filter(&[MONITORING_GROUP])
        .run()
        .await?;

    for group in discovery.groups() {
        if group.name() == MONITORING_GROUP {
            for (ar, _) in group.recommended_resources() {
                if ar.kind == "Prometheus" && ar.version == "v1" {
                    return Ok(true);
                }
            }
        }
    }

    Ok(false)
}
