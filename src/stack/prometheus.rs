// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Prometheus stack installation: namespace, operator chart, and a
//! Prometheus instance served by the operator.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{PersistentVolumeClaimSpec, VolumeResourceRequirements};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use kube::{api::ObjectMeta, Client};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, instrument};

use crate::error::Result;
use crate::helm::{self, HelmChartSrc};
use crate::kubernetes::{
    apply_manifest, ensure_namespace_exists, wait_for_prometheus_crd, ScopeContext,
};
use crate::manifest::to_manifest;

/// Namespace the whole stack lives in
pub const NAMESPACE: &str = "prometheus";

/// Release and logical resource name
const RELEASE: &str = "prometheus";

const CHART: &str = "kube-prometheus-stack";
const CHART_REPO: &str = "https://prometheus-community.github.io/helm-charts";
const CHART_VERSION: &str = "51.2.0";

/// Prometheus custom resource as accepted by the operator. Only the
/// fields this stack sets; the operator defaults the rest.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PrometheusInstance {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: PrometheusSpec,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct PrometheusSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<StorageSpec>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct StorageSpec {
    pub volume_claim_template: VolumeClaimTemplate,
}

/// Embedded claim template; metadata is operator-managed
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct VolumeClaimTemplate {
    pub spec: PersistentVolumeClaimSpec,
}

pub struct PrometheusStack {
    client: Client,
    chart: HelmChartSrc,
}

impl PrometheusStack {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            chart: HelmChartSrc {
                chart: CHART.to_string(),
                repo: CHART_REPO.to_string(),
                version: CHART_VERSION.to_string(),
            },
        }
    }

    /// Provision the full stack. Steps run in order; the first failure
    /// aborts the remainder.
    pub async fn install(&self) -> Result<()> {
        self.install_namespace().await?;
        self.install_operator().await?;
        wait_for_prometheus_crd(&self.client).await?;
        self.install_instance().await?;
        Ok(())
    }

    async fn install_namespace(&self) -> Result<()> {
        ensure_namespace_exists(&self.client, NAMESPACE).await
    }

    #[instrument(skip(self))]
    async fn install_operator(&self) -> Result<()> {
        helm::upgrade_install(RELEASE, NAMESPACE, &self.chart, &operator_values()).await
    }

    #[instrument(skip(self))]
    async fn install_instance(&self) -> Result<()> {
        let manifest = to_manifest(&prometheus_instance())?;
        let scope = ScopeContext {
            namespace: Some(NAMESPACE.to_string()),
            name: RELEASE.to_string(),
        };
        let handle = apply_manifest(&self.client, &scope, &manifest).await?;
        info!(name = %handle.name, uid = ?handle.uid, "Prometheus instance applied");
        Ok(())
    }
}

/// The instance the operator reconciles: one replica, 5Gi of claimed
/// storage.
fn prometheus_instance() -> PrometheusInstance {
    PrometheusInstance {
        api_version: "monitoring.coreos.com/v1".to_string(),
        kind: "Prometheus".to_string(),
        metadata: ObjectMeta {
            name: Some(RELEASE.to_string()),
            namespace: Some(NAMESPACE.to_string()),
            ..Default::default()
        },
        spec: PrometheusSpec {
            replicas: Some(1),
            storage: Some(StorageSpec {
                volume_claim_template: VolumeClaimTemplate {
                    spec: PersistentVolumeClaimSpec {
                        resources: Some(VolumeResourceRequirements {
                            requests: Some(BTreeMap::from([(
                                "storage".to_string(),
                                Quantity("5Gi".to_string()),
                            )])),
                            ..Default::default()
                        }),
                        ..Default::default()
                    },
                },
            }),
        },
    }
}

/// Chart values for the operator install. Bundled sub-components the
/// stack does not use are switched off; resource requests follow the
/// upstream chart recommendations.
fn operator_values() -> Value {
    json!({
        "nameOverride": "prometheus-operator",
        "coreDns": { "enabled": false },
        "kubeEtcd": { "enabled": false },
        "kubeControllerManager": { "enabled": false },
        "kubeScheduler": { "enabled": false },
        "kubeProxy": { "enabled": false },
        "kubeApiServer": {
            "tlsConfig": { "insecureSkipVerify": true }
        },
        "alertmanager": { "enabled": false },
        "grafana": { "enabled": false },
        "prometheus": { "enabled": false },
        "nodeExporter": { "enabled": false },
        "kube-state-metrics": {
            "resources": {
                "limits": { "memory": "250Mi" },
                "requests": { "memory": "250Mi", "cpu": "100m" }
            }
        },
        "prometheus-node-exporter": {
            "resources": {
                "limits": { "memory": "64Mi" },
                "requests": { "memory": "64Mi", "cpu": "10m" }
            }
        },
        "prometheusOperator": {
            "logLevel": "all",
            "tls": { "enabled": false },
            "admissionWebhooks": {
                "enabled": false,
                "failurePolicy": "Ignore",
                "patch": { "enabled": false }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_manifest_is_self_describing() {
        let manifest = to_manifest(&prometheus_instance()).unwrap();

        assert_eq!(
            manifest.get("apiVersion").and_then(Value::as_str),
            Some("monitoring.coreos.com/v1")
        );
        assert_eq!(manifest.get("kind").and_then(Value::as_str), Some("Prometheus"));
        let metadata = manifest.get("metadata").unwrap();
        assert_eq!(metadata.get("name").and_then(Value::as_str), Some("prometheus"));
        assert_eq!(
            metadata.get("namespace").and_then(Value::as_str),
            Some("prometheus")
        );
    }

    #[test]
    fn test_instance_replicas_stay_numeric() {
        let manifest = to_manifest(&prometheus_instance()).unwrap();
        let replicas = manifest
            .get("spec")
            .and_then(|s| s.get("replicas"))
            .unwrap();
        assert!(replicas.is_number());
        assert_eq!(replicas, &Value::from(1));
    }

    #[test]
    fn test_instance_requests_five_gi_of_storage() {
        let manifest = to_manifest(&prometheus_instance()).unwrap();
        let request = Value::Object(manifest)
            .pointer("/spec/storage/volumeClaimTemplate/spec/resources/requests/storage")
            .cloned();
        assert_eq!(request.as_ref().and_then(Value::as_str), Some("5Gi"));
    }

    #[test]
    fn test_operator_values_disable_unused_subcomponents() {
        let values = operator_values();
        for component in [
            "coreDns",
            "kubeEtcd",
            "kubeControllerManager",
            "kubeScheduler",
            "kubeProxy",
            "alertmanager",
            "grafana",
            "prometheus",
            "nodeExporter",
        ] {
            assert_eq!(
                values[component]["enabled"],
                Value::Bool(false),
                "{} should be disabled",
                component
            );
        }
        assert_eq!(
            values["prometheusOperator"]["admissionWebhooks"]["enabled"],
            Value::Bool(false)
        );
    }
}
