//! Temporary resource handles.
//!
//! Every extracted archive member is published under a process-local
//! `mem://` URL so that path strings baked into mesh files can be
//! substituted with something the loader can actually read. Handles are
//! owned by the pack that ingestion produced and revoked exactly once
//! when that pack is disposed; revocation is idempotent here so callers
//! do not have to track it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::util::basename;

/// Scheme prefix of issued handle URLs.
pub const LOCAL_SCHEME: &str = "mem://";

struct StoredBlob {
    bytes: Arc<Vec<u8>>,
    mime: &'static str,
}

/// Store of issued byte handles, keyed by handle URL.
///
/// Explicitly constructed and passed by reference to every consumer;
/// there is deliberately no process-global instance.
#[derive(Default)]
pub struct HandleStore {
    blobs: RwLock<HashMap<String, StoredBlob>>,
    next_id: AtomicU64,
    total_bytes: AtomicUsize,
}

impl HandleStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// True when a URL refers to a handle rather than a remote resource.
    pub fn is_local_url(url: &str) -> bool {
        url.starts_with(LOCAL_SCHEME)
    }

    /// Publish bytes under a fresh handle URL.
    ///
    /// The URL embeds a monotonic id plus the member's basename, which
    /// keeps handle URLs unique for the process lifetime while staying
    /// readable in logs.
    pub fn issue(&self, member_name: &str, bytes: Vec<u8>, mime: &'static str) -> String {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let url = format!("{LOCAL_SCHEME}{id}/{}", basename(member_name));
        let size = bytes.len();

        let mut blobs = self.blobs.write();
        blobs.insert(
            url.clone(),
            StoredBlob {
                bytes: Arc::new(bytes),
                mime,
            },
        );
        self.total_bytes.fetch_add(size, Ordering::Relaxed);
        url
    }

    /// Look up the bytes behind a handle URL.
    pub fn get(&self, url: &str) -> Option<Arc<Vec<u8>>> {
        let blobs = self.blobs.read();
        blobs.get(url).map(|b| Arc::clone(&b.bytes))
    }

    /// MIME type recorded for a handle URL.
    pub fn mime(&self, url: &str) -> Option<&'static str> {
        let blobs = self.blobs.read();
        blobs.get(url).map(|b| b.mime)
    }

    /// Revoke one handle. Returns true when the handle existed.
    /// Revoking an already-revoked or unknown URL is a no-op.
    pub fn revoke(&self, url: &str) -> bool {
        let mut blobs = self.blobs.write();
        if let Some(blob) = blobs.remove(url) {
            let _ = self.total_bytes.fetch_update(
                Ordering::Relaxed,
                Ordering::Relaxed,
                |x| Some(x.saturating_sub(blob.bytes.len())),
            );
            true
        } else {
            false
        }
    }

    /// Revoke every outstanding handle.
    pub fn clear(&self) {
        let mut blobs = self.blobs.write();
        blobs.clear();
        self.total_bytes.store(0, Ordering::Relaxed);
    }

    /// Number of live handles.
    pub fn len(&self) -> usize {
        self.blobs.read().len()
    }

    /// True when no handles are live.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total bytes held across live handles.
    pub fn total_bytes(&self) -> usize {
        self.total_bytes.load(Ordering::Relaxed)
    }
}
