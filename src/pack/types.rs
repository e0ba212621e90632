//! Pack: one ingested 3D asset.

use crate::scene::{AnimationClip, SceneGraph};

/// Registry-wide pack identifier.
pub type PackId = String;

/// What a pack is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackKind {
    /// A displayable model (has a skinned mesh), possibly with clips.
    ModelWithClip,
    /// Animation clips only, meant to attach onto compatible models.
    ClipOnly,
}

/// Where a pack came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackSource {
    /// Declared in the showcase manifest.
    Manifest,
    /// Uploaded or fetched at runtime.
    Runtime,
}

/// One ingested asset: the loaded scene plus the metadata the showcase
/// needs to cache, display and compatibility-check it.
///
/// Invariant: `kind == ModelWithClip` exactly when `has_skinned_mesh`,
/// established at the single classification site in the ingestion
/// pipeline. The skeleton signature is computed once at ingestion and
/// never recomputed; slot-local clones and disposal do not affect it.
#[derive(Debug)]
pub struct Pack {
    pub kind: PackKind,
    pub id: PackId,
    pub label: String,
    pub source: PackSource,
    pub size_bytes: Option<u64>,
    pub scene: SceneGraph,
    pub skeleton_signature: Option<String>,
    pub has_skinned_mesh: bool,
}

impl Pack {
    /// Clips authored inside this pack's source file.
    pub fn clips(&self) -> &[AnimationClip] {
        &self.scene.clips
    }

    /// Animation compatibility: both signatures present and equal.
    pub fn is_compatible_with(&self, other: &Pack) -> bool {
        match (&self.skeleton_signature, &other.skeleton_signature) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}
