//! Discovery fetch: GET every search page on the pool and select identifiers.

use crate::error::FetchError;
use crate::http::Fetcher;
use crate::model::Identifier;
use crate::page_url::PageUrl;
use crate::pool::WorkerPool;
use crate::progress::{Phase, ProgressReporter};
use std::collections::HashMap;

/// Extracts identifiers from one response body.
pub type SelectFn = fn(&[u8]) -> Result<Vec<Identifier>, FetchError>;

/// Outcome for one page URL.
#[derive(Debug)]
pub struct PageFetch {
    pub page: PageUrl,
    pub result: Result<Vec<Identifier>, FetchError>,
}

impl PageFetch {
    /// Identifiers contributed by this page; a failed page contributes none.
    pub fn identifiers(self) -> Vec<Identifier> {
        self.result.unwrap_or_default()
    }
}

/// Fetches and parses every page on `pool`, blocking until all have finished.
///
/// A network, status or parse failure is logged and kept in that page's
/// result; it never affects the other pages.
pub fn fetch_pages(
    pool: &WorkerPool,
    fetcher: &dyn Fetcher,
    pages: Vec<PageUrl>,
    select: SelectFn,
    headers: &HashMap<String, String>,
    progress: &dyn ProgressReporter,
) -> Vec<PageFetch> {
    pool.run(pages, Phase::Collecting, progress, |page| {
        let result = fetcher
            .get(&page.url, headers)
            .and_then(|body| select(&body));
        match &result {
            Ok(ids) => tracing::debug!(page = page.page, found = ids.len(), "page collected"),
            Err(e) => tracing::warn!(page = page.page, url = %page.url, "page fetch failed: {}", e),
        }
        PageFetch { page, result }
    })
}
