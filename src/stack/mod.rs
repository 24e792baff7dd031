// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Monitoring stack provisioning.

pub mod prometheus;

pub use prometheus::PrometheusStack;
