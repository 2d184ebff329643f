use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("invalid host {host}: {reason}")]
    InvalidHost { host: String, reason: String },

    #[error("g_ck not found on {host}")]
    TokenNotFound { host: String },

    #[error("received status code {status} for {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("unexpected response structure from {url}: {reason}")]
    MalformedResponse { url: String, reason: String },

    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode records: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("scan deadline exceeded")]
    DeadlineExceeded,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, ScanError>;
