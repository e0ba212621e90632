//! Archive ingestion pipeline.
//!
//! Turns raw uploaded or fetched bytes into a validated, loadable asset:
//! sniff the container, extract members, publish them as handles, build
//! the asset map, parse the primary mesh member with texture
//! substitution, and classify the result. Handles issued along the way
//! are revoked if any later step fails, so an aborted ingestion leaves
//! nothing behind.

use tracing::{debug, info};

use super::types::PackKind;
use crate::fbx::{self, MESH_EXTENSION};
use crate::resolve::{AssetMap, HandleStore};
use crate::scene::{skeleton_signature, SceneGraph};
use crate::util::{extension, mime_for_extension, Error, Result};
use crate::zip::{looks_like_zip, ZipArchive};

/// Product of a successful ingestion, ready to be wrapped into a
/// [`Pack`](super::types::Pack) by the registry.
#[derive(Debug)]
pub struct IngestedAsset {
    pub scene: SceneGraph,
    pub kind: PackKind,
    pub has_skinned_mesh: bool,
    pub skeleton_signature: Option<String>,
    /// Texture member names in archive order.
    pub texture_file_names: Vec<String>,
    /// Handle URLs issued for the archive's members. Ownership moves to
    /// the pack; its release callback must revoke them.
    pub handle_urls: Vec<String>,
    /// Name of the mesh member the scene was parsed from. Empty for
    /// bare (non-archive) mesh ingestion.
    pub primary_member: String,
}

/// Ingest bytes of unknown shape: a ZIP asset archive or a bare binary
/// mesh file (the form manifest-declared packs are served in).
pub fn ingest_bytes(bytes: &[u8], store: &HandleStore) -> Result<IngestedAsset> {
    if looks_like_zip(bytes) {
        return ingest_archive(bytes, store);
    }
    let scene = fbx::load_scene(bytes)?;
    Ok(classify(scene, Vec::new(), Vec::new(), String::new()))
}

/// Ingest a ZIP asset archive.
///
/// The archive must contain exactly one mesh member; texture members
/// are classified, everything else is still extracted into the resolver
/// map so odd references can match.
pub fn ingest_archive(bytes: &[u8], store: &HandleStore) -> Result<IngestedAsset> {
    if !looks_like_zip(bytes) {
        return Err(Error::NotAnArchive);
    }

    let archive = ZipArchive::parse(bytes)?;
    let members = archive.extract_all()?;

    let mesh_members: Vec<&str> = members
        .iter()
        .filter(|m| extension(&m.name).as_deref() == Some(MESH_EXTENSION))
        .map(|m| m.name.as_str())
        .collect();
    let primary = match mesh_members.as_slice() {
        [] => {
            return Err(Error::invalid(format!(
                "archive is missing a .{MESH_EXTENSION} entry"
            )))
        }
        [one] => one.to_string(),
        many => {
            return Err(Error::invalid(format!(
                "archive must contain exactly one .{MESH_EXTENSION} entry, found {}",
                many.len()
            )))
        }
    };

    let texture_file_names: Vec<String> = members
        .iter()
        .filter(|m| m.is_texture)
        .map(|m| m.name.clone())
        .collect();

    // Publish members; from here on, failure must revoke what we issued.
    let mut guard = HandleGuard::new(store);
    let mut map = AssetMap::new();
    for member in members {
        let mime = extension(&member.name)
            .map(|ext| mime_for_extension(&ext))
            .unwrap_or("application/octet-stream");
        let url = store.issue(&member.name, member.bytes, mime);
        map.insert_member(&member.name, &url);
        guard.push(url);
    }

    debug!(
        "ingesting archive: primary '{primary}', {} texture(s), {} handle(s)",
        texture_file_names.len(),
        guard.urls.len()
    );

    let scene = fbx::load_from_resolved_archive(&primary, &map, store)?;
    let handle_urls = guard.release();

    let asset = classify(scene, texture_file_names, handle_urls, primary);
    info!(
        "ingested archive as {:?} ({} clip(s), signature {})",
        asset.kind,
        asset.scene.clips.len(),
        asset
            .skeleton_signature
            .as_deref()
            .unwrap_or("<none>")
    );
    Ok(asset)
}

/// The single classification site: the kind/has-skinned-mesh invariant
/// holds because both fields derive from one inspection of the scene.
fn classify(
    scene: SceneGraph,
    texture_file_names: Vec<String>,
    handle_urls: Vec<String>,
    primary_member: String,
) -> IngestedAsset {
    let has_skinned_mesh = scene.has_skinned_mesh();
    let kind = if has_skinned_mesh {
        PackKind::ModelWithClip
    } else {
        PackKind::ClipOnly
    };
    let skeleton_signature = skeleton_signature(&scene);
    IngestedAsset {
        scene,
        kind,
        has_skinned_mesh,
        skeleton_signature,
        texture_file_names,
        handle_urls,
        primary_member,
    }
}

/// Build a release callback that revokes a set of handle URLs.
pub fn release_for(
    store: &std::sync::Arc<HandleStore>,
    urls: Vec<String>,
) -> Box<dyn FnOnce() + Send> {
    let store = std::sync::Arc::clone(store);
    Box::new(move || {
        for url in &urls {
            store.revoke(url);
        }
    })
}

/// Revokes issued handles on drop unless released. Keeps the error path
/// of [`ingest_archive`] free of partially-published state.
struct HandleGuard<'a> {
    store: &'a HandleStore,
    urls: Vec<String>,
    armed: bool,
}

impl<'a> HandleGuard<'a> {
    fn new(store: &'a HandleStore) -> Self {
        Self {
            store,
            urls: Vec::new(),
            armed: true,
        }
    }

    fn push(&mut self, url: String) {
        self.urls.push(url);
    }

    fn release(mut self) -> Vec<String> {
        self.armed = false;
        std::mem::take(&mut self.urls)
    }
}

impl Drop for HandleGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            for url in &self.urls {
                self.store.revoke(url);
            }
        }
    }
}
