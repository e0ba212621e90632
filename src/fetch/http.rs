//! HTTP byte downloads.

use reqwest::header::CONTENT_TYPE;
use tracing::{debug, trace};

use super::share;
use super::RemoteSource;
use crate::util::{Error, Result};

/// Network-backed [`RemoteSource`].
pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    /// Create a source with a fresh client.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Create a source over an existing client (shared pools, proxies).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// The underlying client.
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

impl Default for HttpSource {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteSource for HttpSource {
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        // Share links detour through the provider's direct endpoint.
        if let Some(file_id) = share::extract_file_id(url) {
            return share::download(&self.client, &file_id).await;
        }
        fetch_binary(&self.client, url).await
    }

    async fn probe_size(&self, url: &str) -> Option<u64> {
        probe_content_length(&self.client, url).await
    }
}

/// GET a URL and require binary content.
///
/// Non-2xx statuses and HTML payloads are errors; a permissive
/// `Content-Type` alone is never trusted.
pub async fn fetch_binary(client: &reqwest::Client, url: &str) -> Result<Vec<u8>> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(Error::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    let bytes = response.bytes().await?.to_vec();

    if content_type.starts_with("text/html") || is_html_payload(&bytes) {
        return Err(Error::HtmlResponse(url.to_string()));
    }

    debug!("fetched {} byte(s) from {url}", bytes.len());
    Ok(bytes)
}

/// Best-effort content length: HEAD, then a full GET when the server
/// omits the header. `None` rather than an error in every failure case.
pub async fn probe_content_length(client: &reqwest::Client, url: &str) -> Option<u64> {
    match client.head(url).send().await {
        Ok(response) if response.status().is_success() => {
            if let Some(len) = response.content_length() {
                return Some(len);
            }
            trace!("HEAD {url} omitted Content-Length, falling back to GET");
        }
        Ok(response) => {
            trace!("HEAD {url} returned {}", response.status());
        }
        Err(e) => {
            trace!("HEAD {url} failed: {e}");
        }
    }

    match client.get(url).send().await {
        Ok(response) if response.status().is_success() => {
            if let Some(len) = response.content_length() {
                return Some(len);
            }
            response.bytes().await.ok().map(|b| b.len() as u64)
        }
        _ => None,
    }
}

/// Sniff an HTML document by its first non-whitespace bytes.
pub(crate) fn is_html_payload(bytes: &[u8]) -> bool {
    let head_len = bytes.len().min(512);
    let head = String::from_utf8_lossy(&bytes[..head_len]);
    let trimmed = head.trim_start().to_ascii_lowercase();
    trimmed.starts_with("<!doctype html") || trimmed.starts_with("<html")
}
