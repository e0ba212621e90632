//! Showcase manifest parsing.
//!
//! The manifest is the one piece of runtime configuration: which packs
//! exist, what to call them, and how many display slots start visible.
//! Parsing is deliberately permissive per entry: a malformed entry is
//! dropped with a log line rather than failing the whole document.

use serde::Deserialize;
use tracing::debug;

use crate::util::{Error, Result};

/// Fewest slots the showcase will start with.
pub const MIN_VISIBLE_SLOTS: usize = 3;

/// Most slots the showcase will start with (the full row).
pub const MAX_VISIBLE_SLOTS: usize = 5;

/// Visible-slot count when the manifest does not declare one.
pub const DEFAULT_VISIBLE_SLOTS: usize = 3;

/// One declared pack.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub fbx_url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

/// Parsed manifest document.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    pub default_visible_count: usize,
    pub model_packs: Vec<ManifestEntry>,
    pub clip_packs: Vec<ManifestEntry>,
}

impl Manifest {
    /// Look up a declared model pack.
    pub fn model_entry(&self, id: &str) -> Option<&ManifestEntry> {
        self.model_packs.iter().find(|e| e.id == id)
    }

    /// Look up a declared clip pack.
    pub fn clip_entry(&self, id: &str) -> Option<&ManifestEntry> {
        self.clip_packs.iter().find(|e| e.id == id)
    }
}

/// Parse a manifest document.
///
/// The top level must be a JSON object; everything below that degrades
/// gracefully. `defaultVisibleCount` is clamped into
/// [`MIN_VISIBLE_SLOTS`]..=[`MAX_VISIBLE_SLOTS`].
pub fn parse_manifest(json: &str) -> Result<Manifest> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    let obj = value
        .as_object()
        .ok_or_else(|| Error::InvalidManifest("top level is not an object".into()))?;

    let default_visible_count = obj
        .get("defaultVisibleCount")
        .and_then(serde_json::Value::as_u64)
        .map(|v| (v as usize).clamp(MIN_VISIBLE_SLOTS, MAX_VISIBLE_SLOTS))
        .unwrap_or(DEFAULT_VISIBLE_SLOTS);

    let model_packs = entries(obj.get("modelPacks"), "modelPacks");
    let clip_packs = entries(obj.get("clipPacks"), "clipPacks");

    Ok(Manifest {
        default_visible_count,
        model_packs,
        clip_packs,
    })
}

fn entries(value: Option<&serde_json::Value>, field: &str) -> Vec<ManifestEntry> {
    let Some(array) = value.and_then(serde_json::Value::as_array) else {
        return Vec::new();
    };
    let mut out = Vec::with_capacity(array.len());
    let mut dropped = 0usize;
    for item in array {
        match serde_json::from_value::<ManifestEntry>(item.clone()) {
            Ok(entry) => out.push(entry),
            Err(_) => dropped += 1,
        }
    }
    if dropped > 0 {
        debug!("manifest: dropped {dropped} malformed entr(ies) from {field}");
    }
    out
}
