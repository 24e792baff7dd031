// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Generic manifest conversion.

use serde::Serialize;

use crate::error::{Result, WatchtowerError};

/// An ordered, string-keyed document describing one resource, stripped of
/// the type it was produced from.
pub type Manifest = serde_json::Map<String, serde_json::Value>;

/// Convert any serializable value into a generic manifest.
///
/// The value is first encoded to JSON bytes and then decoded back into a
/// plain mapping, so the result carries only structural data and can be
/// handed to the dynamic apply path no matter which concrete type
/// produced it. Values with no JSON representation fail the encode stage;
/// values that encode to something other than a mapping fail the decode
/// stage.
pub fn to_manifest<T: Serialize>(obj: &T) -> Result<Manifest> {
    let intermediate =
        serde_json::to_vec(obj).map_err(|e| WatchtowerError::EncodingError(e.to_string()))?;
    serde_json::from_slice(&intermediate)
        .map_err(|e| WatchtowerError::DecodingError(e.to_string()))
}
