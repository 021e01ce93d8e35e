//! Values passed between the crawl phases.

use std::fmt;

/// Opaque token naming one artwork (the numeric illust id as sent by the site).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(String);

impl Identifier {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identifier {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// One artwork ready for transfer: its id and every file URL it resolved to.
///
/// Built by a [`Resolver`](crate::resolver::Resolver), consumed once by the
/// [`Downloader`](crate::downloader::Downloader).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    identifier: Identifier,
    media: Vec<String>,
}

impl DownloadTask {
    pub fn new(identifier: Identifier, media: Vec<String>) -> Self {
        Self { identifier, media }
    }

    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    /// Direct file URLs, one per page of the artwork.
    pub fn media(&self) -> &[String] {
        &self.media
    }
}
