// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Chart installation through the external helm binary.

use std::io::Write;

use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::{info, instrument};

use crate::error::{Result, WatchtowerError};
use crate::process;

/// Source coordinates of a packaged chart.
#[derive(Debug, Clone)]
pub struct HelmChartSrc {
    pub chart: String,
    pub repo: String,
    pub version: String,
}

/// Install or upgrade a chart release. The installer itself is an
/// external service; values are rendered to YAML and handed over through
/// a file.
#[instrument(skip(values), fields(chart = %src.chart, version = %src.version))]
pub async fn upgrade_install(
    release: &str,
    namespace: &str,
    src: &HelmChartSrc,
    values: &Value,
) -> Result<()> {
    let values_yaml = serde_yaml::to_string(values)
        .map_err(|e| WatchtowerError::HelmError(format!("failed to render values: {}", e)))?;

    let mut values_file = NamedTempFile::new()
        .map_err(|e| WatchtowerError::HelmError(format!("failed to create values file: {}", e)))?;
    values_file
        .write_all(values_yaml.as_bytes())
        .map_err(|e| WatchtowerError::HelmError(format!("failed to write values file: {}", e)))?;

    let values_path = values_file.path().to_string_lossy().into_owned();
    let args = upgrade_args(release, namespace, src, &values_path);
    let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();

    info!(
        "Installing chart {} {} into namespace {}",
        src.chart, src.version, namespace
    );
    // values_file must stay alive until helm has read it
    process::run("helm", &arg_refs)
        .await
        .map_err(|e| WatchtowerError::HelmError(e.to_string()))?;

    Ok(())
}

fn upgrade_args(
    release: &str,
    namespace: &str,
    src: &HelmChartSrc,
    values_path: &str,
) -> Vec<String> {
    [
        "upgrade",
        "--install",
        release,
        &src.chart,
        "--repo",
        &src.repo,
        "--version",
        &src.version,
        "--namespace",
        namespace,
        "--values",
        values_path,
        "--wait",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
