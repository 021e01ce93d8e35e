//! `pixgrab keyword` – crawl a keyword and download the results.

use anyhow::{Context, Result};
use pixgrab_core::config::PixgrabConfig;
use pixgrab_core::progress::Progress;
use pixgrab_core::KeywordCrawler;
use std::io::Write;
use std::path::PathBuf;

/// Arguments of `pixgrab keyword`, overriding the loaded config.
#[derive(Debug, Clone)]
pub struct KeywordArgs {
    pub keyword: String,
    pub popular: bool,
    pub mode: String,
    pub images: usize,
    pub capacity: Option<usize>,
    pub threads: Option<usize>,
    pub download_dir: Option<PathBuf>,
}

/// Applies CLI overrides; a missing download dir resolves to the current directory.
fn effective_config(mut cfg: PixgrabConfig, args: &KeywordArgs) -> Result<PixgrabConfig> {
    if let Some(n) = args.threads {
        cfg.download.n_thread = n;
    }
    if let Some(dir) = &args.download_dir {
        cfg.download.download_dir = Some(dir.clone());
    }
    if cfg.download.download_dir.is_none() {
        cfg.download.download_dir = Some(std::env::current_dir()?);
    }
    Ok(cfg)
}

/// One `\r`-rewritten status line per completed unit.
fn print_progress(p: Progress) {
    let mut err = std::io::stderr().lock();
    let _ = write!(err, "\r  {}: {}/{} ({:.0}%)  ", p.phase, p.done, p.total, p.fraction() * 100.0);
    if p.done >= p.total {
        let _ = writeln!(err);
    }
}

pub fn run_keyword(cfg: PixgrabConfig, args: KeywordArgs) -> Result<()> {
    let cfg = effective_config(cfg, &args)?;
    let capacity = args.capacity.unwrap_or(cfg.download.capacity);
    let crawler = KeywordCrawler::new(
        &cfg,
        &args.keyword,
        args.popular,
        &args.mode,
        args.images,
        capacity,
    )
    .context("invalid crawl parameters")?
    .with_progress(Box::new(print_progress));

    let summary = crawler.run();

    println!(
        "pages: {} ({} failed)  discovered: {}  resolved: {}  queued: {}",
        summary.pages,
        summary.pages_failed,
        summary.discovered,
        summary.resolve.resolved,
        summary.resolve.enqueued
    );
    println!(
        "downloaded: {}  failed: {}  files: {}  {:.2} MiB",
        summary.download.succeeded,
        summary.download.failed,
        summary.download.files,
        summary.download.bytes as f64 / 1_048_576.0
    );
    Ok(())
}
