use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use parking_lot::Mutex;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;

use crate::domain::notes::note::NoteName;

use super::SyncEngine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitState {
    Pending,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CrawlReport {
    /// Distinct names discovered, roots included.
    pub visited: usize,
    pub indexed: usize,
    pub skipped: usize,
}

/// State of one bulk crawl. Names are marked visited when enqueued, so two
/// workers discovering the same link cannot both schedule it.
struct CrawlPass {
    visited: Mutex<HashMap<NoteName, VisitState>>,
    enqueued: AtomicUsize,
    completed: AtomicUsize,
    indexed: AtomicUsize,
    skipped: AtomicUsize,
    queue: mpsc::UnboundedSender<NoteName>,
}

impl CrawlPass {
    fn new(queue: mpsc::UnboundedSender<NoteName>) -> Self {
        Self {
            visited: Mutex::new(HashMap::new()),
            enqueued: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
            indexed: AtomicUsize::new(0),
            skipped: AtomicUsize::new(0),
            queue,
        }
    }

    fn discover(&self, name: NoteName) -> bool {
        let mut visited = self.visited.lock();
        if visited.contains_key(&name) {
            return false;
        }
        visited.insert(name.clone(), VisitState::Pending);
        // counted before the discovering unit completes, so the barrier cannot close early
        self.enqueued.fetch_add(1, Ordering::SeqCst);
        if self.queue.send(name).is_err() {
            self.completed.fetch_add(1, Ordering::SeqCst);
        }
        true
    }

    fn finish(&self, name: &NoteName) {
        self.visited.lock().insert(name.clone(), VisitState::Done);
        self.completed.fetch_add(1, Ordering::SeqCst);
    }

    fn is_complete(&self) -> bool {
        // completed first: every enqueue done by a finished unit is then visible
        let completed = self.completed.load(Ordering::SeqCst);
        completed == self.enqueued.load(Ordering::SeqCst)
    }

    fn report(&self) -> CrawlReport {
        let visited = self.visited.lock();
        debug_assert!(visited.values().all(|s| *s == VisitState::Done));
        CrawlReport {
            visited: visited.len(),
            indexed: self.indexed.load(Ordering::SeqCst),
            skipped: self.skipped.load(Ordering::SeqCst),
        }
    }
}

/// Marks its unit complete when dropped, including when the unit panics.
struct Completion {
    pass: Arc<CrawlPass>,
    name: NoteName,
}

impl Drop for Completion {
    fn drop(&mut self) {
        self.pass.finish(&self.name);
    }
}

impl SyncEngine {
    /// Breadth-first crawl over `[[...]]` references starting at the root
    /// set. Runs to completion; per-note failures are logged and skipped.
    pub async fn crawl(self: &Arc<Self>) -> CrawlReport {
        let started = Instant::now();
        let (tx, mut rx) = mpsc::unbounded_channel::<NoteName>();
        let pass = Arc::new(CrawlPass::new(tx));
        let permits = Arc::new(Semaphore::new(self.options.workers.max(1)));
        let mut workers = JoinSet::new();

        tracing::info!(roots = self.roots.len(), "crawl_started");
        for root in &self.roots {
            pass.discover(root.clone());
        }

        while !pass.is_complete() {
            tokio::select! {
                Some(name) = rx.recv() => {
                    let engine = self.clone();
                    let pass = pass.clone();
                    let permits = permits.clone();
                    workers.spawn(async move {
                        let completion = Completion { pass, name };
                        let Ok(_permit) = permits.acquire_owned().await else {
                            return;
                        };
                        engine.crawl_unit(&completion.pass, &completion.name).await;
                    });
                }
                Some(joined) = workers.join_next() => {
                    if let Err(e) = joined {
                        tracing::error!(error = ?e, "crawl_worker_failed");
                    }
                }
            }
        }
        while workers.join_next().await.is_some() {}

        let report = pass.report();
        tracing::info!(
            visited = report.visited,
            indexed = report.indexed,
            skipped = report.skipped,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "crawl_finished"
        );
        report
    }

    async fn crawl_unit(&self, pass: &CrawlPass, name: &NoteName) {
        match self.process_note(name).await {
            Ok(note) => {
                pass.indexed.fetch_add(1, Ordering::SeqCst);
                for link in &note.outbound_links {
                    pass.discover(link.clone());
                }
            }
            Err(e) => {
                pass.skipped.fetch_add(1, Ordering::SeqCst);
                tracing::warn!(note = %name, error = %e, "crawl_note_skipped");
            }
        }
    }
}
