//! Network layer.
//!
//! - [`http`] - Byte downloads with status/HTML guards and best-effort
//!   size probing
//! - [`share`] - Cloud-storage share-link resolution
//!
//! Everything here is a suspension point in the otherwise synchronous,
//! cooperative pipeline; nothing spawns threads.

pub mod http;
pub mod share;

pub use http::HttpSource;

use crate::util::Result;

/// Source of remote pack bytes.
///
/// The registry is generic over this seam so tests can serve archives
/// from memory.
#[allow(async_fn_in_trait)]
pub trait RemoteSource {
    /// Download the bytes behind a URL. Status and HTML-disguise
    /// failures are errors; content sniffing beyond that is the
    /// caller's job.
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>>;

    /// Best-effort content length: HEAD first, full fetch as fallback,
    /// `None` when the size cannot be learned. Never fails the load.
    async fn probe_size(&self, url: &str) -> Option<u64>;
}
