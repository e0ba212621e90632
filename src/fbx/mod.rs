//! Binary FBX mesh/skeleton format support.
//!
//! - [`format`] - Magic bytes, version boundaries, KTime
//! - [`reader`] - Raw node-record tree with typed properties
//! - [`document`] - Scene graph extraction with texture resolution

pub mod document;
pub mod format;
pub mod reader;

pub use document::{load_from_resolved_archive, load_scene};
pub use reader::{FbxFile, FbxNode, FbxProperty};

/// Extension of the primary mesh member inside an asset archive.
pub const MESH_EXTENSION: &str = "fbx";
