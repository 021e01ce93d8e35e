//! Tracing setup for crawls: append to `pixgrab.log` in the XDG state dir,
//! or write to stderr when that file is unavailable.

use anyhow::Result;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,pixgrab=debug,pixgrab_core=debug";
const LOG_FILE_NAME: &str = "pixgrab.log";

/// Destination for one batch of formatted events.
enum LogSink {
    File(File),
    /// The log file handle could not be duplicated for this event.
    Stderr,
}

impl Write for LogSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            LogSink::File(f) => f.write(buf),
            LogSink::Stderr => io::stderr().lock().write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            LogSink::File(f) => f.flush(),
            LogSink::Stderr => io::stderr().lock().flush(),
        }
    }
}

/// Shared crawl log; each event gets its own handle so pool workers never
/// contend on one writer.
struct CrawlLog(File);

impl<'a> MakeWriter<'a> for CrawlLog {
    type Writer = LogSink;

    fn make_writer(&'a self) -> Self::Writer {
        match self.0.try_clone() {
            Ok(f) => LogSink::File(f),
            Err(_) => LogSink::Stderr,
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

fn open_crawl_log() -> Result<(File, PathBuf)> {
    let state_dir = xdg::BaseDirectories::with_prefix("pixgrab")?.get_state_home();
    fs::create_dir_all(&state_dir)?;
    let path = state_dir.join(LOG_FILE_NAME);
    let file = fs::OpenOptions::new().create(true).append(true).open(&path)?;
    Ok((file, path))
}

/// Installs the global subscriber writing to `~/.local/state/pixgrab/pixgrab.log`
/// and returns that path. `RUST_LOG` overrides the default filter.
///
/// Errors leave no subscriber installed; callers fall back to
/// [`init_logging_stderr`].
pub fn init_logging() -> Result<PathBuf> {
    let (file, path) = open_crawl_log()?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(BoxMakeWriter::new(CrawlLog(file)))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    tracing::info!("crawl log at {}", path.display());
    Ok(path)
}

/// Installs a stderr-only subscriber. A subscriber that is already set wins.
pub fn init_logging_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(io::stderr)
        .with_ansi(false)
        .try_init();
}
