//! Fixed-size fork-join worker pool.
//!
//! Units are pushed onto a shared queue; `workers` threads pop and run them
//! until the queue is empty, sending each result back over a channel. The
//! caller blocks until every submitted unit has produced a result, so a phase
//! never observes a partially finished predecessor.

use crate::progress::{Phase, Progress, ProgressReporter};
use std::collections::VecDeque;
use std::sync::mpsc;
use std::sync::{Mutex, PoisonError};
use std::thread;

#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    workers: usize,
}

impl WorkerPool {
    /// A pool of `workers` threads (at least one).
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Runs `work` on every item and returns all results, in completion order.
    ///
    /// `work` must absorb its own failures (return them as values); one unit's
    /// outcome never affects its siblings. `progress` is told after each unit.
    pub fn run<T, R, F>(
        &self,
        items: Vec<T>,
        phase: Phase,
        progress: &dyn ProgressReporter,
        work: F,
    ) -> Vec<R>
    where
        T: Send,
        R: Send,
        F: Fn(T) -> R + Sync,
    {
        let total = items.len();
        if total == 0 {
            return Vec::new();
        }
        let queue: Mutex<VecDeque<T>> = Mutex::new(items.into_iter().collect());
        let num_workers = self.workers.min(total);
        let work = &work;
        let queue = &queue;

        thread::scope(|scope| {
            let (tx, rx) = mpsc::channel();
            for _ in 0..num_workers {
                let tx = tx.clone();
                scope.spawn(move || loop {
                    let next = queue
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .pop_front();
                    let Some(item) = next else {
                        break;
                    };
                    if tx.send(work(item)).is_err() {
                        break;
                    }
                });
            }
            drop(tx);

            let mut results = Vec::with_capacity(total);
            for res in rx {
                results.push(res);
                progress.report(Progress {
                    phase,
                    done: results.len(),
                    total,
                });
            }
            results
        })
    }
}
