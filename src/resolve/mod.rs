//! Resolution of embedded resource references against archive members.
//!
//! - [`handle`] - Temporary `mem://` byte handles with explicit revocation
//! - [`map`] - The asset map and its forgiving path-matching rules

pub mod handle;
pub mod map;

pub use handle::{HandleStore, LOCAL_SCHEME};
pub use map::{AssetMap, COLOCATED_TEXTURE_MARKER};
