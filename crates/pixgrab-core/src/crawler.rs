//! Keyword crawl orchestration.
//!
//! A crawl runs three phases strictly in order, each a fork-join batch on its
//! own worker pool:
//!
//! 1. collecting: fetch every search page and merge identifiers into the [`Collector`]
//! 2. resolving: expand identifiers into tasks until the [`Downloader`] is full
//! 3. downloading: drain the downloader
//!
//! Parameters are validated in the constructor; nothing touches the network
//! before [`KeywordCrawler::run`].

use crate::collector::{Collector, ResolveStats};
use crate::config::PixgrabConfig;
use crate::downloader::{DownloadSummary, Downloader};
use crate::error::ConfigError;
use crate::fetch::{fetch_pages, PageFetch, SelectFn};
use crate::http::{CurlFetcher, Fetcher};
use crate::page_url::{PageUrl, PageUrlBuilder};
use crate::pool::WorkerPool;
use crate::progress::{NoProgress, ProgressReporter};
use crate::query::KeywordQuery;
use crate::resolver::{HttpResolver, Resolver};
use crate::selector::select_keyword;
use crate::url_model::keyword_dirname;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Where a crawl is in its lifecycle. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlState {
    Collecting,
    Resolving,
    Downloading,
    Done,
}

impl fmt::Display for CrawlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CrawlState::Collecting => "collecting",
            CrawlState::Resolving => "resolving",
            CrawlState::Downloading => "downloading",
            CrawlState::Done => "done",
        })
    }
}

/// Everything a finished crawl reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    /// Search pages requested.
    pub pages: usize,
    /// Search pages that failed to fetch or parse.
    pub pages_failed: usize,
    /// Distinct identifiers discovered.
    pub discovered: usize,
    pub resolve: ResolveStats,
    pub download: DownloadSummary,
}

pub struct KeywordCrawler {
    query: KeywordQuery,
    pages: PageUrlBuilder,
    select: SelectFn,
    fetcher: Arc<dyn Fetcher>,
    resolver: Box<dyn Resolver>,
    headers: HashMap<String, String>,
    pool: WorkerPool,
    collector: Collector,
    downloader: Downloader,
    progress: Box<dyn ProgressReporter>,
    state: CrawlState,
}

impl KeywordCrawler {
    /// Builds a crawl over libcurl. Fails on an unknown `mode`, a zero
    /// `n_images` or a zero `capacity`, without any I/O.
    pub fn new(
        config: &PixgrabConfig,
        keyword: &str,
        popular: bool,
        mode: &str,
        n_images: usize,
        capacity: usize,
    ) -> Result<Self, ConfigError> {
        let query = KeywordQuery::new(keyword, popular, mode, n_images)?;
        let fetcher = Arc::new(CurlFetcher::new(config.connect_timeout(), config.timeout()));
        Self::with_fetcher(config, query, capacity, fetcher)
    }

    /// Builds a crawl over an arbitrary fetcher.
    pub fn with_fetcher(
        config: &PixgrabConfig,
        query: KeywordQuery,
        capacity: usize,
        fetcher: Arc<dyn Fetcher>,
    ) -> Result<Self, ConfigError> {
        let headers = config.request_headers();
        let pool = WorkerPool::new(config.download.n_thread);
        let dest_dir = config
            .download
            .download_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(keyword_dirname(query.keyword()));
        let downloader = Downloader::new(capacity, Arc::clone(&fetcher))?
            .with_pool(pool)
            .with_dest_dir(dest_dir)
            .with_headers(headers.clone());
        let resolver = HttpResolver::new(Arc::clone(&fetcher), &config.site.base_url, headers.clone());

        Ok(Self {
            pages: PageUrlBuilder::new(&config.site.base_url, &config.site.lang),
            query,
            select: select_keyword,
            fetcher,
            resolver: Box::new(resolver),
            headers,
            pool,
            collector: Collector::new(),
            downloader,
            progress: Box::new(NoProgress),
            state: CrawlState::Collecting,
        })
    }

    pub fn with_progress(mut self, progress: Box<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    /// Replaces the identifier resolver (defaults to the site's pages endpoint).
    pub fn with_resolver(mut self, resolver: Box<dyn Resolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn query(&self) -> &KeywordQuery {
        &self.query
    }

    pub fn state(&self) -> CrawlState {
        self.state
    }

    pub fn downloader(&self) -> &Downloader {
        &self.downloader
    }

    /// Search pages this crawl will request.
    pub fn page_urls(&self) -> Vec<PageUrl> {
        self.pages.build(&self.query)
    }

    fn advance(&mut self, next: CrawlState) {
        tracing::debug!(from = %self.state, to = %next, "crawl state");
        self.state = next;
    }

    /// Phase 1: fetch all search pages and merge their identifiers.
    fn collect(&self, summary: &mut CrawlSummary) {
        let urls = self.page_urls();
        summary.pages = urls.len();
        tracing::info!(
            keyword = %self.query.keyword(),
            pages = urls.len(),
            "===== start collecting {} =====",
            self.query.keyword()
        );

        let results = fetch_pages(
            &self.pool,
            self.fetcher.as_ref(),
            urls,
            self.select,
            &self.headers,
            self.progress.as_ref(),
        );
        for result in results {
            if result.result.is_err() {
                summary.pages_failed += 1;
            }
            self.collector.add(PageFetch::identifiers(result));
        }
        summary.discovered = self.collector.len();
        tracing::info!(
            discovered = summary.discovered,
            failed_pages = summary.pages_failed,
            "===== collect {} complete =====",
            self.query.keyword()
        );
    }

    /// Runs all three phases and returns the combined summary.
    pub fn run(mut self) -> CrawlSummary {
        let mut summary = CrawlSummary::default();

        self.collect(&mut summary);

        self.advance(CrawlState::Resolving);
        summary.resolve = self.collector.resolve_and_enqueue(
            self.resolver.as_ref(),
            &self.downloader,
            &self.pool,
            self.progress.as_ref(),
        );
        tracing::info!(
            resolved = summary.resolve.resolved,
            failed = summary.resolve.failed,
            enqueued = summary.resolve.enqueued,
            capacity = self.downloader.capacity(),
            "resolution complete"
        );

        self.advance(CrawlState::Downloading);
        summary.download = self.downloader.download(self.progress.as_ref());

        self.advance(CrawlState::Done);
        tracing::info!(
            succeeded = summary.download.succeeded,
            failed = summary.download.failed,
            files = summary.download.files,
            bytes = summary.download.bytes,
            "crawl {} finished",
            self.query.keyword()
        );
        summary
    }
}
