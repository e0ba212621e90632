//! Error types for the rigstage pipeline.

use thiserror::Error;

/// Main error type for ingestion, registry and slot operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Bytes are not a ZIP container (magic mismatch)
    #[error("Not an archive: expected ZIP magic bytes")]
    NotAnArchive,

    /// Downloaded content is an HTML page disguised as binary data
    #[error("Response from {0} is an HTML page, not binary data")]
    HtmlResponse(String),

    /// Archive failed a structural validation rule
    #[error("Invalid archive: {0}")]
    InvalidArchive(String),

    /// Container data is truncated or corrupted
    #[error("Unexpected end of data at position {0}")]
    UnexpectedEof(u64),

    /// Archive member uses a compression method we do not handle
    #[error("Member '{member}' uses unsupported compression method {method}")]
    UnsupportedCompression { member: String, method: u16 },

    /// Archive member is encrypted
    #[error("Member '{0}' is encrypted")]
    EncryptedMember(String),

    /// Binary mesh format decode failure
    #[error("Decode failed: {0}")]
    Decode(String),

    /// Unsupported mesh format version
    #[error("Unsupported FBX version: {0}")]
    UnsupportedVersion(u32),

    /// Manifest entry declares no source URL
    #[error("Pack '{0}' has no source URL")]
    MissingSource(String),

    /// Pack id not present in the registry
    #[error("Pack '{0}' is not registered")]
    PackNotRegistered(String),

    /// Non-2xx HTTP status
    #[error("Request to {url} failed with status {status}")]
    HttpStatus { url: String, status: u16 },

    /// Manifest document is not valid JSON at the top level
    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// UTF-8 conversion error
    #[error("Invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// JSON parse error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an "other" error from a string.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Create an archive validation error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArchive(msg.into())
    }

    /// Create a decode error.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }
}

/// Result type alias for rigstage operations.
pub type Result<T> = std::result::Result<T, Error>;
