//! Progress reporting for the crawl phases.
//!
//! Pools call the reporter once per completed unit, from the thread that
//! waits on the pool. Reporting is purely informational; the crawl behaves
//! the same with [`NoProgress`].

use std::fmt;

/// Crawl phase a progress snapshot belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Collecting,
    Resolving,
    Downloading,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Collecting => "collecting ids",
            Phase::Resolving => "resolving",
            Phase::Downloading => "downloading",
        })
    }
}

/// Snapshot after one unit of a phase completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub phase: Phase,
    /// Units finished so far (successful or not).
    pub done: usize,
    /// Units submitted to the pool.
    pub total: usize,
}

impl Progress {
    /// Fraction complete in [0.0, 1.0].
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        (self.done as f64 / self.total as f64).min(1.0)
    }
}

pub trait ProgressReporter: Send + Sync {
    fn report(&self, progress: Progress);
}

/// Reporter that discards every snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _progress: Progress) {}
}

impl<F> ProgressReporter for F
where
    F: Fn(Progress) + Send + Sync,
{
    fn report(&self, progress: Progress) {
        self(progress)
    }
}
