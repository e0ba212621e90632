//! Share-link resolution for one cloud-storage provider.
//!
//! Share URLs come in several shapes; all of them carry a file id that
//! the direct-download endpoint accepts. Large files get an
//! interstitial "confirm download" HTML page instead of bytes; the
//! confirmation token is scraped out of that page and the request
//! retried once. Best-effort glue, but it must never hand an HTML error
//! page onward as if it were archive bytes.

use tracing::debug;

use super::http::{fetch_binary, is_html_payload};
use crate::util::{Error, Result};

/// Direct-download endpoint of the provider.
pub const DIRECT_DOWNLOAD_ENDPOINT: &str = "https://drive.google.com/uc?export=download";

const HOSTS: [&str; 2] = ["drive.google.com", "docs.google.com"];

/// Extract the file id from a share URL, if this is one.
///
/// Recognized shapes:
/// - `https://drive.google.com/file/d/<id>/view?usp=sharing`
/// - `https://drive.google.com/open?id=<id>`
/// - `https://drive.google.com/uc?export=download&id=<id>`
pub fn extract_file_id(url: &str) -> Option<String> {
    if !HOSTS.iter().any(|h| url.contains(h)) {
        return None;
    }

    if let Some(pos) = url.find("/file/d/") {
        let rest = &url[pos + "/file/d/".len()..];
        let id: String = rest
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
            .collect();
        if !id.is_empty() {
            return Some(id);
        }
    }

    for marker in ["?id=", "&id="] {
        if let Some(pos) = url.find(marker) {
            let rest = &url[pos + marker.len()..];
            let id: String = rest
                .chars()
                .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
                .collect();
            if !id.is_empty() {
                return Some(id);
            }
        }
    }

    None
}

/// Download a shared file through the direct endpoint, following one
/// confirmation interstitial if the provider serves one.
pub async fn download(client: &reqwest::Client, file_id: &str) -> Result<Vec<u8>> {
    let url = format!("{DIRECT_DOWNLOAD_ENDPOINT}&id={file_id}");
    let first = fetch_binary_allow_html(client, &url).await?;

    if !is_html_payload(&first) {
        return Ok(first);
    }

    let page = String::from_utf8_lossy(&first);
    let Some(token) = confirm_token(&page) else {
        return Err(Error::HtmlResponse(url));
    };
    debug!("share link {file_id}: following confirm interstitial");

    let confirmed = format!("{DIRECT_DOWNLOAD_ENDPOINT}&id={file_id}&confirm={token}");
    // The confirmed request must produce real bytes; HTML here is final.
    fetch_binary(client, &confirmed).await
}

/// Pull a `confirm=<token>` value out of an interstitial page.
pub(crate) fn confirm_token(page: &str) -> Option<String> {
    let pos = page.find("confirm=")?;
    let rest = &page[pos + "confirm=".len()..];
    let token: String = rest
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Like [`fetch_binary`] but leaves HTML detection to the caller, which
/// needs the page body to scrape the token.
async fn fetch_binary_allow_html(client: &reqwest::Client, url: &str) -> Result<Vec<u8>> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(Error::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(response.bytes().await?.to_vec())
}
