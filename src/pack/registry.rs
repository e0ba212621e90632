//! Pack registry and cache.
//!
//! The one process-wide shared structure of the pipeline. Explicitly
//! constructed with its manifest and byte source, passed by reference
//! to consumers, and disposed exactly once; deliberately not a
//! module-level singleton.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::ingest::{self, IngestedAsset};
use super::manifest::{Manifest, ManifestEntry};
use super::types::{Pack, PackId, PackKind, PackSource};
use crate::fetch::RemoteSource;
use crate::resolve::HandleStore;
use crate::util::{slugify, Error, Result};

/// Callback that revokes a pack's temporary handles.
pub type ReleaseFn = Box<dyn FnOnce() + Send>;

/// Cache and lifecycle owner for manifest-declared and runtime packs.
pub struct PackRegistry<S> {
    source: S,
    store: Arc<HandleStore>,
    manifest: Manifest,
    model_cache: Mutex<HashMap<PackId, Arc<Pack>>>,
    clip_cache: Mutex<HashMap<PackId, Arc<Pack>>>,
    runtime_entries: Mutex<Vec<ManifestEntry>>,
    releases: Mutex<Vec<(PackId, ReleaseFn)>>,
    runtime_seq: AtomicU64,
}

impl<S: RemoteSource> PackRegistry<S> {
    /// Create a registry over a manifest and byte source.
    pub fn new(manifest: Manifest, source: S) -> Self {
        Self::with_store(manifest, source, Arc::new(HandleStore::new()))
    }

    /// Create a registry sharing an existing handle store.
    pub fn with_store(manifest: Manifest, source: S, store: Arc<HandleStore>) -> Self {
        Self {
            source,
            store,
            manifest,
            model_cache: Mutex::new(HashMap::new()),
            clip_cache: Mutex::new(HashMap::new()),
            runtime_entries: Mutex::new(Vec::new()),
            releases: Mutex::new(Vec::new()),
            runtime_seq: AtomicU64::new(0),
        }
    }

    /// The handle store backing this registry's ingestions.
    pub fn handle_store(&self) -> &Arc<HandleStore> {
        &self.store
    }

    /// The manifest this registry serves.
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Load a manifest-declared model pack, fetching and ingesting on
    /// first use.
    ///
    /// Repeated calls return the cached instance. Two overlapping calls
    /// for the same un-cached id may both fetch (no lock is held across
    /// the suspension points); the later insert wins and the duplicate
    /// work is discarded. Accepted, not a bug.
    pub async fn load_model_pack(&self, id: &str) -> Result<Arc<Pack>> {
        if let Some(pack) = self.model_cache.lock().get(id) {
            debug!("model pack '{id}' served from cache");
            return Ok(Arc::clone(pack));
        }
        let entry = self
            .manifest
            .model_entry(id)
            .cloned()
            .ok_or_else(|| Error::PackNotRegistered(id.to_string()))?;
        let pack = self.fetch_and_ingest(&entry).await?;
        self.model_cache
            .lock()
            .insert(id.to_string(), Arc::clone(&pack));
        Ok(pack)
    }

    /// Load a manifest-declared clip pack. Same caching and race
    /// caveats as [`load_model_pack`](Self::load_model_pack).
    pub async fn load_clip_pack(&self, id: &str) -> Result<Arc<Pack>> {
        if let Some(pack) = self.clip_cache.lock().get(id) {
            debug!("clip pack '{id}' served from cache");
            return Ok(Arc::clone(pack));
        }
        let entry = self
            .manifest
            .clip_entry(id)
            .cloned()
            .ok_or_else(|| Error::PackNotRegistered(id.to_string()))?;
        let pack = self.fetch_and_ingest(&entry).await?;
        self.clip_cache
            .lock()
            .insert(id.to_string(), Arc::clone(&pack));
        Ok(pack)
    }

    async fn fetch_and_ingest(&self, entry: &ManifestEntry) -> Result<Arc<Pack>> {
        let url = entry
            .fbx_url
            .clone()
            .ok_or_else(|| Error::MissingSource(entry.id.clone()))?;

        let size_bytes = self.source.probe_size(&url).await;
        let bytes = self.source.fetch_bytes(&url).await?;
        let asset = ingest::ingest_bytes(&bytes, &self.store)?;

        let release = ingest::release_for(&self.store, asset.handle_urls.clone());
        self.releases.lock().push((entry.id.clone(), release));

        info!(
            "loaded pack '{}' ({:?}, {} byte(s) declared)",
            entry.id,
            asset.kind,
            size_bytes.map_or("unknown".to_string(), |s| s.to_string())
        );

        Ok(Arc::new(Pack {
            kind: asset.kind,
            id: entry.id.clone(),
            label: entry.label.clone(),
            source: PackSource::Manifest,
            size_bytes,
            scene: asset.scene,
            skeleton_signature: asset.skeleton_signature,
            has_skinned_mesh: asset.has_skinned_mesh,
        }))
    }

    /// Admit a runtime-ingested pack (user upload or pasted URL).
    ///
    /// The id combines a monotonic counter with the slugified label, so
    /// it cannot collide within one process lifetime. The release
    /// callback runs once at [`dispose`](Self::dispose).
    pub fn register_runtime_pack(
        &self,
        kind: PackKind,
        label: &str,
        asset: IngestedAsset,
        release: ReleaseFn,
        size_bytes: Option<u64>,
    ) -> (PackId, Arc<Pack>) {
        debug_assert_eq!(
            kind == PackKind::ModelWithClip,
            asset.has_skinned_mesh,
            "pack kind must match skinned-mesh classification"
        );

        let seq = self.runtime_seq.fetch_add(1, Ordering::Relaxed);
        let slug = slugify(label);
        let id = if slug.is_empty() {
            format!("runtime-{seq}-pack")
        } else {
            format!("runtime-{seq}-{slug}")
        };

        let pack = Arc::new(Pack {
            kind,
            id: id.clone(),
            label: label.to_string(),
            source: PackSource::Runtime,
            size_bytes,
            scene: asset.scene,
            skeleton_signature: asset.skeleton_signature,
            has_skinned_mesh: asset.has_skinned_mesh,
        });

        self.releases.lock().push((id.clone(), release));
        self.runtime_entries.lock().push(ManifestEntry {
            id: id.clone(),
            label: label.to_string(),
            kind: Some(
                match kind {
                    PackKind::ModelWithClip => "model",
                    PackKind::ClipOnly => "clip",
                }
                .to_string(),
            ),
            fbx_url: None,
            thumbnail_url: None,
        });

        let cache = match kind {
            PackKind::ModelWithClip => &self.model_cache,
            PackKind::ClipOnly => &self.clip_cache,
        };
        cache.lock().insert(id.clone(), Arc::clone(&pack));

        info!("registered runtime pack '{id}' ({kind:?})");
        (id, pack)
    }

    /// Clip packs whose bytes have actually been loaded, declared or
    /// runtime. Declared-but-unloaded manifest entries are excluded.
    pub fn loaded_clip_packs(&self) -> Vec<(ManifestEntry, Arc<Pack>)> {
        let cache = self.clip_cache.lock();
        let mut out = Vec::new();
        for entry in &self.manifest.clip_packs {
            if let Some(pack) = cache.get(&entry.id) {
                out.push((entry.clone(), Arc::clone(pack)));
            }
        }
        for entry in self.runtime_entries.lock().iter() {
            if let Some(pack) = cache.get(&entry.id) {
                out.push((entry.clone(), Arc::clone(pack)));
            }
        }
        out
    }

    /// Run every registered release callback and clear both caches.
    ///
    /// Each callback is invoked individually so one misbehaving callback
    /// cannot starve the rest; a panicking callback is logged and
    /// skipped past. Safe to call more than once.
    pub fn dispose(&self) {
        let releases = std::mem::take(&mut *self.releases.lock());
        let count = releases.len();
        for (id, release) in releases {
            if catch_unwind(AssertUnwindSafe(release)).is_err() {
                warn!("release callback for pack '{id}' panicked");
            }
        }
        self.model_cache.lock().clear();
        self.clip_cache.lock().clear();
        self.runtime_entries.lock().clear();
        self.store.clear();
        info!("registry disposed, {count} release callback(s) run");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullSource;

    impl RemoteSource for NullSource {
        async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
            Err(Error::HttpStatus {
                url: url.to_string(),
                status: 404,
            })
        }

        async fn probe_size(&self, _url: &str) -> Option<u64> {
            None
        }
    }

    fn block_on<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(future)
    }

    #[test]
    fn test_unknown_id_is_not_registered_error() {
        let registry = PackRegistry::new(Manifest::default(), NullSource);
        let err = block_on(registry.load_model_pack("ghost")).unwrap_err();
        assert!(matches!(err, Error::PackNotRegistered(_)));
    }

    #[test]
    fn test_missing_url_is_missing_source_error() {
        let manifest = Manifest {
            default_visible_count: 3,
            model_packs: vec![ManifestEntry {
                id: "hero".into(),
                label: "Hero".into(),
                kind: None,
                fbx_url: None,
                thumbnail_url: None,
            }],
            clip_packs: Vec::new(),
        };
        let registry = PackRegistry::new(manifest, NullSource);
        let err = block_on(registry.load_model_pack("hero")).unwrap_err();
        assert!(matches!(err, Error::MissingSource(_)));
    }

    #[test]
    fn test_fetch_errors_propagate_unwrapped() {
        let manifest = Manifest {
            default_visible_count: 3,
            model_packs: vec![ManifestEntry {
                id: "hero".into(),
                label: "Hero".into(),
                kind: None,
                fbx_url: Some("https://cdn/hero.zip".into()),
                thumbnail_url: None,
            }],
            clip_packs: Vec::new(),
        };
        let registry = PackRegistry::new(manifest, NullSource);
        let err = block_on(registry.load_model_pack("hero")).unwrap_err();
        assert!(matches!(err, Error::HttpStatus { status: 404, .. }));
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let registry = PackRegistry::new(Manifest::default(), NullSource);
        registry.dispose();
        registry.dispose();
        assert!(registry.loaded_clip_packs().is_empty());
    }
}
