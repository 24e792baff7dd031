// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Dynamic server-side application of generic manifests.

use std::collections::BTreeMap;

use kube::{
    api::{Api, DynamicObject, GroupVersionKind, Patch, PatchParams},
    discovery::{Discovery, Scope},
    Client, ResourceExt,
};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::constants::FIELD_MANAGER;
use crate::error::{Result, WatchtowerError};
use crate::manifest::Manifest;

/// Addressing context under which manifests are applied: the parent
/// namespace for manifests that carry none of their own, and the logical
/// name that prefixes engine-assigned result keys. Supplied by the
/// caller and passed through unchanged.
#[derive(Debug, Clone)]
pub struct ScopeContext {
    pub namespace: Option<String>,
    pub name: String,
}

/// Opaque reference to a resource the cluster accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceHandle {
    pub api_version: String,
    pub kind: String,
    pub namespace: Option<String>,
    pub name: String,
    pub uid: Option<String>,
}

/// Apply a set of generic manifests under the given scope.
///
/// Each manifest is resolved against API discovery and applied
/// server-side. The returned map is keyed by the engine-assigned resource
/// address; the key format is internal and callers must not depend on it.
#[instrument(skip(client, manifests), fields(scope = %scope.name, count = manifests.len()))]
pub async fn apply_manifests(
    client: &Client,
    scope: &ScopeContext,
    manifests: &[Manifest],
) -> Result<BTreeMap<String, ResourceHandle>> {
    let discovery = Discovery::new(client.clone()).run().await?;

    let mut handles = BTreeMap::new();
    for manifest in manifests {
        let (key, handle) = apply_one(client, &discovery, scope, manifest).await?;
        handles.insert(key, handle);
    }
    Ok(handles)
}

/// Apply exactly one manifest and return its handle.
///
/// The engine keys its results by an internal addressing scheme; with a
/// single manifest submitted there is exactly one entry to hand back, so
/// the key never leaks to the caller. Any other result cardinality has no
/// defined extraction and is rejected.
pub async fn apply_manifest(
    client: &Client,
    scope: &ScopeContext,
    manifest: &Manifest,
) -> Result<ResourceHandle> {
    let handles = apply_manifests(client, scope, std::slice::from_ref(manifest)).await?;
    single_handle(handles)
}

/// Extract the sole handle from an engine result map, whatever its key.
fn single_handle(handles: BTreeMap<String, ResourceHandle>) -> Result<ResourceHandle> {
    let count = handles.len();
    let mut values = handles.into_values();
    match (values.next(), values.next()) {
        (Some(handle), None) => Ok(handle),
        _ => Err(WatchtowerError::AmbiguousResult(count)),
    }
}

async fn apply_one(
    client: &Client,
    discovery: &Discovery,
    scope: &ScopeContext,
    manifest: &Manifest,
) -> Result<(String, ResourceHandle)> {
    let api_version = manifest
        .get("apiVersion")
        .and_then(Value::as_str)
        .ok_or_else(|| WatchtowerError::ApplyError("manifest has no apiVersion".to_string()))?;
    let kind = manifest
        .get("kind")
        .and_then(Value::as_str)
        .ok_or_else(|| WatchtowerError::ApplyError("manifest has no kind".to_string()))?;
    let metadata = manifest.get("metadata");
    let name = metadata
        .and_then(|m| m.get("name"))
        .and_then(Value::as_str)
        .ok_or_else(|| WatchtowerError::ApplyError("manifest has no metadata.name".to_string()))?;
    let manifest_namespace = metadata.and_then(|m| m.get("namespace")).and_then(Value::as_str);

    let (group, version) = match api_version.split_once('/') {
        Some((g, v)) => (g, v),
        None => ("", api_version),
    };
    let gvk = GroupVersionKind {
        group: group.to_string(),
        version: version.to_string(),
        kind: kind.to_string(),
    };
    let (api_resource, capabilities) = discovery.resolve_gvk(&gvk).ok_or_else(|| {
        WatchtowerError::ApplyError(format!("unknown resource type {}/{}", api_version, kind))
    })?;

    let api: Api<DynamicObject> = if matches!(capabilities.scope, Scope::Namespaced) {
        let namespace = manifest_namespace
            .or(scope.namespace.as_deref())
            .ok_or_else(|| {
                WatchtowerError::ApplyError(format!(
                    "{} '{}' is namespaced but neither the manifest nor the scope names a namespace",
                    kind, name
                ))
            })?;
        Api::namespaced_with(client.clone(), namespace, &api_resource)
    } else {
        Api::all_with(client.clone(), &api_resource)
    };

    let pp = PatchParams::apply(FIELD_MANAGER).force();
    let applied = api
        .patch(name, &pp, &Patch::Apply(manifest))
        .await
        .map_err(|e| {
            WatchtowerError::ApplyError(format!("failed to apply {} '{}': {}", kind, name, e))
        })?;

    debug!(kind = %kind, name = %name, "Applied manifest");

    let handle = ResourceHandle {
        api_version: api_version.to_string(),
        kind: kind.to_string(),
        namespace: applied.namespace(),
        name: applied.name_any(),
        uid: applied.uid(),
    };
    let key = engine_key(scope, &handle);
    Ok((key, handle))
}

fn engine_key(scope: &ScopeContext, handle: &ResourceHandle) -> String {
    match &handle.namespace {
        Some(ns) => format!(
            "{}:{}/{}:{}/{}",
            scope.name, handle.api_version, handle.kind, ns, handle.name
        ),
        None => format!(
            "{}:{}/{}:{}",
            scope.name, handle.api_version, handle.kind, handle.name
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{applied_prometheus_json, with_monitoring_discovery, MockService};
    use serde_json::json;

    fn handle(name: &str) -> ResourceHandle {
        ResourceHandle {
            api_version: "v1".to_string(),
            kind: "ConfigMap".to_string(),
            namespace: Some("default".to_string()),
            name: name.to_string(),
            uid: None,
        }
    }

    fn prometheus_manifest(namespace: Option<&str>) -> Manifest {
        let mut value = json!({
            "apiVersion": "monitoring.coreos.com/v1",
            "kind": "Prometheus",
            "metadata": { "name": "prometheus" },
            "spec": { "replicas": 1 }
        });
        if let Some(ns) = namespace {
            value["metadata"]["namespace"] = json!(ns);
        }
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn scope() -> ScopeContext {
        ScopeContext {
            namespace: Some("prometheus".to_string()),
            name: "prometheus".to_string(),
        }
    }

    #[test]
    fn test_single_handle_returns_sole_entry_for_any_key() {
        for key in ["a", "urn:engine:weird/key", ""] {
            let results = BTreeMap::from([(key.to_string(), handle("only"))]);
            let extracted = single_handle(results).unwrap();
            assert_eq!(extracted.name, "only");
        }
    }

    #[test]
    fn test_single_handle_rejects_empty_result() {
        let err = single_handle(BTreeMap::new()).unwrap_err();
        assert!(matches!(err, WatchtowerError::AmbiguousResult(0)));
    }

    #[test]
    fn test_single_handle_rejects_multiple_results() {
        let results = BTreeMap::from([
            ("one".to_string(), handle("a")),
            ("two".to_string(), handle("b")),
        ]);
        let err = single_handle(results).unwrap_err();
        assert!(matches!(err, WatchtowerError::AmbiguousResult(2)));
    }

    #[tokio::test]
    async fn test_apply_manifest_returns_handle() {
        let client = with_monitoring_discovery(MockService::new())
            .on_patch(
                "/apis/monitoring.coreos.com/v1/namespaces/prometheus/prometheuses/prometheus",
                200,
                &applied_prometheus_json("prometheus", "prometheus"),
            )
            .into_client();

        let handle = apply_manifest(&client, &scope(), &prometheus_manifest(Some("prometheus")))
            .await
            .unwrap();
        assert_eq!(handle.api_version, "monitoring.coreos.com/v1");
        assert_eq!(handle.kind, "Prometheus");
        assert_eq!(handle.name, "prometheus");
        assert_eq!(handle.namespace.as_deref(), Some("prometheus"));
        assert_eq!(handle.uid.as_deref(), Some("test-uid"));
    }

    #[tokio::test]
    async fn test_scope_namespace_used_when_manifest_has_none() {
        let client = with_monitoring_discovery(MockService::new())
            .on_patch(
                "/apis/monitoring.coreos.com/v1/namespaces/prometheus/prometheuses/prometheus",
                200,
                &applied_prometheus_json("prometheus", "prometheus"),
            )
            .into_client();

        let handle = apply_manifest(&client, &scope(), &prometheus_manifest(None))
            .await
            .unwrap();
        assert_eq!(handle.namespace.as_deref(), Some("prometheus"));
    }

    #[tokio::test]
    async fn test_apply_manifests_keys_every_submitted_manifest() {
        let client = with_monitoring_discovery(MockService::new())
            .on_patch(
                "/apis/monitoring.coreos.com/v1/namespaces/prometheus/prometheuses/prometheus",
                200,
                &applied_prometheus_json("prometheus", "prometheus"),
            )
            .into_client();

        let manifests = vec![prometheus_manifest(Some("prometheus"))];
        let handles = apply_manifests(&client, &scope(), &manifests).await.unwrap();
        assert_eq!(handles.len(), 1);
        let (_, only) = handles.into_iter().next().unwrap();
        assert_eq!(only.name, "prometheus");
    }

    #[tokio::test]
    async fn test_unknown_kind_is_an_apply_error() {
        let client = with_monitoring_discovery(MockService::new()).into_client();
        let mut manifest = prometheus_manifest(Some("prometheus"));
        manifest.insert("kind".to_string(), json!("Imaginary"));

        let err = apply_manifest(&client, &scope(), &manifest).await.unwrap_err();
        assert!(matches!(err, WatchtowerError::ApplyError(_)));
    }

    #[tokio::test]
    async fn test_manifest_without_kind_is_rejected() {
        let client = with_monitoring_discovery(MockService::new()).into_client();
        let mut manifest = prometheus_manifest(Some("prometheus"));
        manifest.remove("kind");

        let err = apply_manifest(&client, &scope(), &manifest).await.unwrap_err();
        assert!(matches!(err, WatchtowerError::ApplyError(_)));
    }

    #[tokio::test]
    async fn test_missing_namespace_everywhere_is_rejected() {
        let client = with_monitoring_discovery(MockService::new()).into_client();
        let unscoped = ScopeContext {
            namespace: None,
            name: "prometheus".to_string(),
        };

        let err = apply_manifest(&client, &unscoped, &prometheus_manifest(None))
            .await
            .unwrap_err();
        assert!(matches!(err, WatchtowerError::ApplyError(_)));
    }

    #[tokio::test]
    async fn test_engine_rejection_is_an_apply_error() {
        let denied = json!({
            "kind": "Status",
            "apiVersion": "v1",
            "status": "Failure",
            "message": "prometheuses.monitoring.coreos.com is forbidden",
            "reason": "Forbidden",
            "code": 403
        })
        .to_string();
        let client = with_monitoring_discovery(MockService::new())
            .on_patch(
                "/apis/monitoring.coreos.com/v1/namespaces/prometheus/prometheuses/prometheus",
                403,
                &denied,
            )
            .into_client();

        let err = apply_manifest(&client, &scope(), &prometheus_manifest(Some("prometheus")))
            .await
            .unwrap_err();
        assert!(matches!(err, WatchtowerError::ApplyError(_)));
    }
}
