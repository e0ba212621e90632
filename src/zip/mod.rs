//! Low-level ZIP container support.
//!
//! - [`format`] - Signatures, method codes and the [`looks_like_zip`]
//!   sniffer
//! - [`reader`] - Central directory walk and member extraction

pub mod format;
pub mod reader;

pub use format::looks_like_zip;
pub use reader::{ArchiveMember, ZipArchive};
