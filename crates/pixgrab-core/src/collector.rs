//! Identifier collector.
//!
//! Owns the deduplicated identifier set for one crawl. Discovery merges page
//! results into it with [`Collector::add`]; resolution then expands every
//! identifier into download tasks and offers them to the [`Downloader`] until
//! it is full.

use crate::downloader::{Downloader, Enqueue};
use crate::model::Identifier;
use crate::pool::WorkerPool;
use crate::progress::{Phase, ProgressReporter};
use crate::resolver::Resolver;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Counts from one resolution pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveStats {
    /// Identifiers that resolved without error.
    pub resolved: usize,
    /// Identifiers whose resolution failed.
    pub failed: usize,
    /// Identifiers not resolved because the downloader was already full.
    pub skipped: usize,
    /// Tasks accepted by the downloader.
    pub enqueued: usize,
    /// Tasks resolved but rejected by a full downloader.
    pub rejected: usize,
}

enum Resolution {
    Resolved { enqueued: usize, rejected: usize },
    Failed,
    Skipped,
}

#[derive(Debug, Default)]
pub struct Collector {
    ids: Mutex<HashSet<Identifier>>,
}

impl Collector {
    pub fn new() -> Self {
        Self::default()
    }

    fn ids(&self) -> MutexGuard<'_, HashSet<Identifier>> {
        self.ids.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Merges `ids` into the set. Idempotent and safe to call from several
    /// threads. Returns how many were new.
    pub fn add<I>(&self, ids: I) -> usize
    where
        I: IntoIterator<Item = Identifier>,
    {
        let mut set = self.ids();
        ids.into_iter().filter(|id| set.insert(id.clone())).count()
    }

    pub fn len(&self) -> usize {
        self.ids().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids().is_empty()
    }

    pub fn contains(&self, id: &Identifier) -> bool {
        self.ids().contains(id)
    }

    /// Current identifiers in ascending order.
    pub fn snapshot(&self) -> Vec<Identifier> {
        let mut ids: Vec<Identifier> = self.ids().iter().cloned().collect();
        ids.sort_unstable();
        ids
    }

    /// Resolves every identifier on `pool` and enqueues the resulting tasks
    /// into `downloader`.
    ///
    /// Once the downloader is full, remaining identifiers are not resolved and
    /// further tasks are dropped. A failed resolution skips that identifier
    /// only.
    pub fn resolve_and_enqueue(
        &self,
        resolver: &dyn Resolver,
        downloader: &Downloader,
        pool: &WorkerPool,
        progress: &dyn ProgressReporter,
    ) -> ResolveStats {
        let ids = self.snapshot();
        let outcomes = pool.run(ids, Phase::Resolving, progress, |id| {
            if downloader.is_full() {
                return Resolution::Skipped;
            }
            let tasks = match resolver.resolve(&id) {
                Ok(tasks) => tasks,
                Err(e) => {
                    tracing::warn!(id = %id, "resolve failed: {}", e);
                    return Resolution::Failed;
                }
            };
            let mut enqueued = 0;
            let mut rejected = 0;
            for task in tasks {
                match downloader.enqueue(task) {
                    Enqueue::Accepted => enqueued += 1,
                    Enqueue::Rejected(task) => {
                        tracing::debug!(id = %task.identifier(), "downloader full, task dropped");
                        rejected += 1;
                    }
                }
            }
            Resolution::Resolved { enqueued, rejected }
        });

        let mut stats = ResolveStats::default();
        for outcome in outcomes {
            match outcome {
                Resolution::Resolved { enqueued, rejected } => {
                    stats.resolved += 1;
                    stats.enqueued += enqueued;
                    stats.rejected += rejected;
                }
                Resolution::Failed => stats.failed += 1,
                Resolution::Skipped => stats.skipped += 1,
            }
        }
        if stats.skipped > 0 {
            tracing::debug!(skipped = stats.skipped, "identifiers discarded, downloader full");
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::http::Fetcher;
    use crate::model::DownloadTask;
    use crate::progress::NoProgress;
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::Arc;

    struct NoNetwork;

    impl Fetcher for NoNetwork {
        fn get(&self, _: &str, _: &HashMap<String, String>) -> Result<Vec<u8>, FetchError> {
            unreachable!()
        }

        fn download(&self, _: &str, _: &HashMap<String, String>, _: &Path) -> Result<u64, FetchError> {
            unreachable!()
        }
    }

    /// One task per id; ids starting with "bad" fail.
    struct OneTaskResolver;

    impl Resolver for OneTaskResolver {
        fn resolve(&self, id: &Identifier) -> Result<Vec<DownloadTask>, FetchError> {
            if id.as_str().starts_with("bad") {
                return Err(FetchError::Http(404));
            }
            Ok(vec![DownloadTask::new(
                id.clone(),
                vec![format!("https://i.example.net/{}_p0.png", id)],
            )])
        }
    }

    fn ids(raw: &[&str]) -> Vec<Identifier> {
        raw.iter().map(|s| Identifier::from(*s)).collect()
    }

    fn downloader(capacity: usize) -> Downloader {
        Downloader::new(capacity, Arc::new(NoNetwork)).unwrap()
    }

    #[test]
    fn add_deduplicates() {
        let c = Collector::new();
        assert_eq!(c.add(ids(&["1", "2", "2", "3"])), 3);
        assert_eq!(c.add(ids(&["3", "4"])), 1);
        assert_eq!(c.len(), 4);
        assert!(c.contains(&Identifier::from("4")));
    }

    #[test]
    fn add_is_idempotent() {
        let batch = ids(&["10", "11", "12"]);
        let once = Collector::new();
        once.add(batch.clone());
        let twice = Collector::new();
        twice.add(batch.clone());
        assert_eq!(twice.add(batch), 0);
        assert_eq!(once.snapshot(), twice.snapshot());
    }

    #[test]
    fn concurrent_add_keeps_set_semantics() {
        let c = Collector::new();
        std::thread::scope(|s| {
            for t in 0..8 {
                let c = &c;
                s.spawn(move || {
                    // Half of each batch overlaps with every other thread.
                    let batch: Vec<Identifier> = (0..50)
                        .map(|i| Identifier::new(format!("shared-{}", i)))
                        .chain((0..50).map(|i| Identifier::new(format!("t{}-{}", t, i))))
                        .collect();
                    c.add(batch);
                });
            }
        });
        assert_eq!(c.len(), 50 + 8 * 50);
    }

    #[test]
    fn resolve_stops_at_capacity() {
        let c = Collector::new();
        c.add(ids(&["1", "2", "3", "4", "5", "6", "7", "8"]));
        let dl = downloader(5);
        let stats = c.resolve_and_enqueue(&OneTaskResolver, &dl, &WorkerPool::new(4), &NoProgress);
        assert_eq!(dl.len(), 5);
        assert_eq!(stats.enqueued, 5);
        assert_eq!(stats.resolved + stats.skipped, 8);
        assert_eq!(stats.enqueued + stats.rejected + stats.skipped, 8);
        assert_eq!(stats.failed, 0);
    }

    #[test]
    fn failed_resolution_is_skipped() {
        let c = Collector::new();
        c.add(ids(&["1", "bad-2", "3", "bad-4"]));
        let dl = downloader(10);
        let stats = c.resolve_and_enqueue(&OneTaskResolver, &dl, &WorkerPool::new(2), &NoProgress);
        assert_eq!(stats.failed, 2);
        assert_eq!(stats.resolved, 2);
        assert_eq!(stats.enqueued, 2);
        assert_eq!(dl.len(), 2);
    }

    #[test]
    fn resolve_empty_set() {
        let c = Collector::new();
        let dl = downloader(1);
        let stats = c.resolve_and_enqueue(&OneTaskResolver, &dl, &WorkerPool::new(2), &NoProgress);
        assert_eq!(stats, ResolveStats::default());
        assert!(dl.is_empty());
    }
}
