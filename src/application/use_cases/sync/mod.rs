mod crawl;
mod process;
mod resync;

pub use crawl::CrawlReport;
pub use resync::{NudgeOutcome, ResyncReport, ResyncStatus};

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::application::ports::note_store::NoteStore;
use crate::application::services::indexing::IndexerHandle;
use crate::application::services::publish::PublishGate;
use crate::application::services::template::PageTemplate;
use crate::domain::notes::note::NoteName;

#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Upper bound for a single note download.
    pub fetch_timeout: Duration,
    /// Crawl work units allowed to run at the same time.
    pub workers: usize,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(10),
            workers: 8,
        }
    }
}

/// Webhook re-sync bookkeeping. Lives for the whole process; every field is
/// read and written under one lock.
#[derive(Debug, Default)]
struct SyncState {
    cursor: Option<String>,
    in_flight: bool,
    deferred: bool,
}

/// Discovers, renders and indexes notes: bulk crawls from the root set and
/// incremental re-syncs driven by backend change notifications.
pub struct SyncEngine {
    store: Arc<dyn NoteStore>,
    indexer: IndexerHandle,
    gate: PublishGate,
    template: Arc<PageTemplate>,
    roots: Vec<NoteName>,
    options: SyncOptions,
    state: Mutex<SyncState>,
}

impl SyncEngine {
    pub fn new(
        store: Arc<dyn NoteStore>,
        indexer: IndexerHandle,
        gate: PublishGate,
        template: Arc<PageTemplate>,
        roots: Vec<NoteName>,
        options: SyncOptions,
    ) -> Self {
        Self {
            store,
            indexer,
            gate,
            template,
            roots,
            options,
            state: Mutex::new(SyncState::default()),
        }
    }

    pub fn roots(&self) -> &[NoteName] {
        &self.roots
    }

    /// Whether a delta cursor is held, i.e. the next re-sync is a continuation.
    pub fn has_cursor(&self) -> bool {
        self.state.lock().cursor.is_some()
    }
}
