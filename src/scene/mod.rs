//! Scene graph types produced by the mesh/skeleton loader.
//!
//! - [`node`] - Node hierarchy, meshes, skins, clone and disposal
//! - [`material`] - Closed material variant set
//! - [`clip`] - Animation clip descriptors
//! - [`skeleton`] - Skeleton compatibility signature

pub mod clip;
pub mod material;
pub mod node;
pub mod skeleton;

pub use clip::AnimationClip;
pub use material::{Material, TextureRef};
pub use node::{Geometry, Mesh, NodeKind, SceneGraph, SceneNode, Skin};
pub use skeleton::{skeleton_signature, SIGNATURE_DELIMITER};
