pub mod config;
pub mod logging;

pub mod collector;
pub mod crawler;
pub mod downloader;
pub mod error;
pub mod fetch;
pub mod http;
pub mod model;
pub mod page_url;
pub mod pool;
pub mod progress;
pub mod query;
pub mod resolver;
pub mod selector;
pub mod storage;
pub mod url_model;

pub use crawler::{CrawlState, CrawlSummary, KeywordCrawler};
pub use error::{ConfigError, FetchError};
