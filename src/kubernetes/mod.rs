// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes utilities for dynamic manifest application, CRD discovery, and namespace management.

pub mod apply;
pub mod crd;
pub mod namespaces;

pub use apply::{apply_manifest, apply_manifests, ResourceHandle, ScopeContext};
pub use crd::wait_for_prometheus_crd;
pub use namespaces::ensure_namespace_exists;
