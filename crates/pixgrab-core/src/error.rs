//! Error types shared by the crawl phases.
//!
//! `ConfigError` is the only error that aborts a crawl; it is raised while
//! building a query, before any request is sent. `FetchError` covers a single
//! unit of work (one page, one identifier, one file) and is absorbed by the
//! phase that produced it.

use thiserror::Error;

/// Invalid crawl parameters. Fatal, reported before any I/O.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid mode {0:?}: expected one of safe, r18, all")]
    InvalidMode(String),
    #[error("target image count must be positive")]
    NonPositiveTarget,
    #[error("downloader capacity must be positive")]
    ZeroCapacity,
}

/// Failure of one request, parse or file write.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Curl reported an error (timeout, connection, etc.).
    #[error("{0}")]
    Curl(#[from] curl::Error),
    /// HTTP response had a non-2xx status.
    #[error("HTTP {0}")]
    Http(u32),
    /// Response body did not have the expected shape.
    #[error("unparseable body: {0}")]
    Parse(String),
    /// Disk write, sync or rename failed.
    #[error("storage: {0}")]
    Storage(#[from] std::io::Error),
    /// Server closed before sending the advertised number of bytes.
    #[error("partial transfer: expected {expected} bytes, got {received}")]
    PartialTransfer { expected: u64, received: u64 },
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::Parse(e.to_string())
    }
}
