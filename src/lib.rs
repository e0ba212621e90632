//! # Rigstage
//!
//! Asset pipeline for an interactive skinned-character showcase: ingest
//! packaged 3D assets (ZIP archives holding one binary FBX plus loose
//! textures), resolve their texture references against the archive,
//! fingerprint their skeletons for animation compatibility, cache them
//! by id, and bind them onto a fixed row of five display slots with
//! per-slot animation control. Rendering, shading and camera work are
//! the job of a downstream collaborator that consumes the loaded scene
//! graphs and clip lists.
//!
//! ## Modules
//!
//! - [`util`] - Errors, key normalization, MIME table
//! - [`zip`] - Low-level ZIP container reading and sniffing
//! - [`fbx`] - Binary FBX record tree and scene extraction
//! - [`scene`] - Scene graph, materials, clips, skeleton signatures
//! - [`resolve`] - Temporary byte handles and the archive resolver
//! - [`pack`] - Ingestion pipeline, manifest, registry/cache
//! - [`fetch`] - HTTP downloads and share-link resolution
//! - [`slot`] - Animation mixer, slot binder, the five-slot stage
//!
//! ## Example
//!
//! ```ignore
//! use rigstage::prelude::*;
//!
//! let store = HandleStore::new();
//! let asset = ingest_archive(&archive_bytes, &store)?;
//! let signature = asset.skeleton_signature.as_deref();
//! println!("{:?} ({} clips)", asset.kind, asset.scene.clips.len());
//! ```

pub mod fbx;
pub mod fetch;
pub mod pack;
pub mod resolve;
pub mod scene;
pub mod slot;
pub mod util;
pub mod zip;

// Re-export commonly used types
pub use pack::{Pack, PackId, PackKind, PackRegistry};
pub use resolve::{AssetMap, HandleStore};
pub use scene::{skeleton_signature, SceneGraph};
pub use slot::{Slot, Stage};
pub use util::{Error, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fetch::{HttpSource, RemoteSource};
    pub use crate::pack::{
        ingest_archive, ingest_bytes, parse_manifest, IngestedAsset, Manifest, Pack, PackId,
        PackKind, PackRegistry, PackSource,
    };
    pub use crate::resolve::{AssetMap, HandleStore};
    pub use crate::scene::{skeleton_signature, AnimationClip, SceneGraph, SceneNode};
    pub use crate::slot::{AnimationOption, Slot, Stage};
    pub use crate::util::{normalize_key, Error, Result};
    pub use crate::zip::looks_like_zip;
}
