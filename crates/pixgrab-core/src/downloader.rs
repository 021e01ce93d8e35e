//! Capacity-bounded downloader.
//!
//! Holds at most `capacity` pending [`DownloadTask`]s. Overflow policy is
//! reject: once the queue is full, [`Downloader::enqueue`] hands the task back
//! as [`Enqueue::Rejected`] and the queue is left untouched, which makes
//! `capacity` a hard cap on how many artworks one crawl downloads.
//!
//! [`Downloader::download`] drains the queue through a [`WorkerPool`]; each
//! task writes its files under the destination directory. A failed transfer
//! marks its task failed and the drain continues.

use crate::error::{ConfigError, FetchError};
use crate::http::Fetcher;
use crate::model::DownloadTask;
use crate::pool::WorkerPool;
use crate::progress::{Phase, ProgressReporter};
use crate::url_model::derive_filename;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Result of offering a task to the queue.
#[derive(Debug, PartialEq, Eq)]
pub enum Enqueue {
    Accepted,
    /// Queue was full; the task is returned unqueued.
    Rejected(DownloadTask),
}

/// Counts from one drain of the queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadSummary {
    /// Tasks whose every file was written.
    pub succeeded: usize,
    /// Tasks with at least one failed file.
    pub failed: usize,
    /// Files written across all tasks.
    pub files: usize,
    /// Bytes written across all tasks.
    pub bytes: u64,
}

impl DownloadSummary {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// Outcome of one task, produced inside a pool worker.
struct TaskOutcome {
    files: usize,
    bytes: u64,
    error: Option<FetchError>,
}

pub struct Downloader {
    capacity: usize,
    queue: Mutex<VecDeque<DownloadTask>>,
    fetcher: Arc<dyn Fetcher>,
    pool: WorkerPool,
    dest_dir: PathBuf,
    headers: HashMap<String, String>,
}

impl Downloader {
    /// A downloader holding at most `capacity` tasks, saving into the current directory
    /// with a single worker until configured otherwise.
    pub fn new(capacity: usize, fetcher: Arc<dyn Fetcher>) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(Self {
            capacity,
            queue: Mutex::new(VecDeque::new()),
            fetcher,
            pool: WorkerPool::new(1),
            dest_dir: PathBuf::from("."),
            headers: HashMap::new(),
        })
    }

    pub fn with_pool(mut self, pool: WorkerPool) -> Self {
        self.pool = pool;
        self
    }

    pub fn with_dest_dir(mut self, dest_dir: impl Into<PathBuf>) -> Self {
        self.dest_dir = dest_dir.into();
        self
    }

    /// Headers sent with every file request (cookie, referer).
    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn dest_dir(&self) -> &Path {
        &self.dest_dir
    }

    fn queue(&self) -> MutexGuard<'_, VecDeque<DownloadTask>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Pending tasks.
    pub fn len(&self) -> usize {
        self.queue().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue().is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.queue().len() >= self.capacity
    }

    /// Adds `task` if the queue is below capacity; otherwise rejects it.
    /// Safe to call from several threads at once.
    pub fn enqueue(&self, task: DownloadTask) -> Enqueue {
        let mut queue = self.queue();
        if queue.len() >= self.capacity {
            return Enqueue::Rejected(task);
        }
        queue.push_back(task);
        Enqueue::Accepted
    }

    /// Downloads every queued task and empties the queue. An empty queue
    /// yields an empty summary without touching the network.
    pub fn download(&self, progress: &dyn ProgressReporter) -> DownloadSummary {
        let tasks: Vec<DownloadTask> = self.queue().drain(..).collect();
        if tasks.is_empty() {
            return DownloadSummary::default();
        }
        tracing::info!(
            tasks = tasks.len(),
            workers = self.pool.workers(),
            dir = %self.dest_dir.display(),
            "downloading"
        );

        let outcomes = self
            .pool
            .run(tasks, Phase::Downloading, progress, |task| self.download_task(&task));

        let mut summary = DownloadSummary::default();
        for outcome in outcomes {
            summary.files += outcome.files;
            summary.bytes += outcome.bytes;
            if outcome.error.is_none() {
                summary.succeeded += 1;
            } else {
                summary.failed += 1;
            }
        }
        summary
    }

    /// Writes every file of `task`. Keeps going after a failed file so the
    /// other pages still land; the first error marks the task failed.
    fn download_task(&self, task: &DownloadTask) -> TaskOutcome {
        let mut outcome = TaskOutcome {
            files: 0,
            bytes: 0,
            error: None,
        };
        if task.media().is_empty() {
            outcome.error = Some(FetchError::Parse(format!(
                "no media for {}",
                task.identifier()
            )));
            return outcome;
        }
        for (index, url) in task.media().iter().enumerate() {
            let dest = self
                .dest_dir
                .join(derive_filename(task.identifier(), index, url));
            match self.fetcher.download(url, &self.headers, &dest) {
                Ok(n) => {
                    tracing::debug!(id = %task.identifier(), url = %url, bytes = n, "saved {}", dest.display());
                    outcome.files += 1;
                    outcome.bytes += n;
                }
                Err(e) => {
                    tracing::warn!(id = %task.identifier(), url = %url, "download failed: {}", e);
                    outcome.error.get_or_insert(e);
                }
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Identifier;
    use crate::progress::NoProgress;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Writes the URL into `dest`; URLs containing "broken" fail with HTTP 404.
    #[derive(Default)]
    struct FakeFetcher {
        downloads: AtomicUsize,
    }

    impl Fetcher for FakeFetcher {
        fn get(&self, _: &str, _: &HashMap<String, String>) -> Result<Vec<u8>, FetchError> {
            unreachable!("downloader never GETs bodies into memory")
        }

        fn download(
            &self,
            url: &str,
            _: &HashMap<String, String>,
            dest: &Path,
        ) -> Result<u64, FetchError> {
            self.downloads.fetch_add(1, Ordering::SeqCst);
            if url.contains("broken") {
                return Err(FetchError::Http(404));
            }
            std::fs::write(dest, url.as_bytes())?;
            Ok(url.len() as u64)
        }
    }

    fn task(id: &str, pages: &[&str]) -> DownloadTask {
        DownloadTask::new(
            Identifier::from(id),
            pages.iter().map(|p| p.to_string()).collect(),
        )
    }

    #[test]
    fn zero_capacity_rejected() {
        let fetcher: Arc<dyn Fetcher> = Arc::new(FakeFetcher::default());
        assert_eq!(
            Downloader::new(0, fetcher).err(),
            Some(ConfigError::ZeroCapacity)
        );
    }

    #[test]
    fn enqueue_rejects_past_capacity() {
        let dl = Downloader::new(2, Arc::new(FakeFetcher::default())).unwrap();
        assert_eq!(dl.enqueue(task("1", &["https://x/1_p0.png"])), Enqueue::Accepted);
        assert_eq!(dl.enqueue(task("2", &["https://x/2_p0.png"])), Enqueue::Accepted);
        assert!(dl.is_full());
        let third = task("3", &["https://x/3_p0.png"]);
        assert_eq!(dl.enqueue(third.clone()), Enqueue::Rejected(third));
        assert_eq!(dl.len(), 2);
    }

    #[test]
    fn concurrent_enqueue_never_exceeds_capacity() {
        let dl = Downloader::new(5, Arc::new(FakeFetcher::default())).unwrap();
        let accepted = AtomicUsize::new(0);
        std::thread::scope(|s| {
            for t in 0..8 {
                let dl = &dl;
                let accepted = &accepted;
                s.spawn(move || {
                    for i in 0..10 {
                        let id = format!("{}-{}", t, i);
                        if dl.enqueue(task(&id, &["https://x/a.png"])) == Enqueue::Accepted {
                            accepted.fetch_add(1, Ordering::SeqCst);
                        }
                        assert!(dl.len() <= 5);
                    }
                });
            }
        });
        assert_eq!(dl.len(), 5);
        assert_eq!(accepted.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn download_empty_queue_is_empty_summary() {
        let fetcher = Arc::new(FakeFetcher::default());
        let dl = Downloader::new(3, fetcher.clone()).unwrap();
        assert_eq!(dl.download(&NoProgress), DownloadSummary::default());
        assert_eq!(fetcher.downloads.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn download_records_failures_and_continues() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(FakeFetcher::default());
        let dl = Downloader::new(10, fetcher.clone())
            .unwrap()
            .with_pool(WorkerPool::new(3))
            .with_dest_dir(dir.path());
        dl.enqueue(task("1", &["https://x/1_p0.png", "https://x/1_p1.png"]));
        dl.enqueue(task("2", &["https://x/broken/2_p0.png", "https://x/2_p1.png"]));
        dl.enqueue(task("3", &["https://x/3_p0.jpg"]));

        let summary = dl.download(&NoProgress);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.files, 4);
        assert_eq!(summary.total(), 3);
        assert_eq!(fetcher.downloads.load(Ordering::SeqCst), 5);
        assert!(dir.path().join("1_p1.png").exists());
        assert!(dir.path().join("2_p1.png").exists());
        assert!(!dir.path().join("2_p0.png").exists());
        assert!(dl.is_empty());

        // A second drain sees an empty queue.
        assert_eq!(dl.download(&NoProgress), DownloadSummary::default());
    }
}
