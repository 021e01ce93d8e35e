//! Resolver interface for turning identifiers into download tasks.
//!
//! The collector only depends on this trait and does not know which endpoint
//! or body format produces the file URLs.

use crate::error::FetchError;
use crate::http::Fetcher;
use crate::model::{DownloadTask, Identifier};
use crate::selector::select_pages;
use std::collections::HashMap;
use std::sync::Arc;

/// Expands one identifier into zero or more download tasks. Called from pool
/// workers, one identifier per call.
pub trait Resolver: Send + Sync {
    fn resolve(&self, id: &Identifier) -> Result<Vec<DownloadTask>, FetchError>;
}

/// Resolves through `{base}/ajax/illust/{id}/pages`: one task per artwork
/// carrying every page's original file URL.
pub struct HttpResolver {
    fetcher: Arc<dyn Fetcher>,
    base_url: String,
    headers: HashMap<String, String>,
}

impl HttpResolver {
    pub fn new(fetcher: Arc<dyn Fetcher>, base_url: &str, headers: HashMap<String, String>) -> Self {
        Self {
            fetcher,
            base_url: base_url.trim_end_matches('/').to_string(),
            headers,
        }
    }

    pub fn pages_url(&self, id: &Identifier) -> String {
        format!("{}/ajax/illust/{}/pages", self.base_url, id)
    }
}

impl Resolver for HttpResolver {
    fn resolve(&self, id: &Identifier) -> Result<Vec<DownloadTask>, FetchError> {
        let body = self.fetcher.get(&self.pages_url(id), &self.headers)?;
        let media = select_pages(&body)?;
        if media.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![DownloadTask::new(id.clone(), media)])
    }
}
