use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::application::ports::note_store::ListError;
use crate::domain::notes::note::ChangeKind;

use super::SyncEngine;

/// What happened to a change notification.
#[derive(Debug)]
pub enum NudgeOutcome {
    /// No re-sync was running; one was started.
    Started(JoinHandle<()>),
    /// A re-sync is already running; it will run once more when it finishes.
    Deferred,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResyncStatus {
    #[default]
    Applied,
    /// The backend rejected the stored cursor; the next pass bootstraps.
    CursorReset,
    /// Listing failed; the stored cursor is kept for the next attempt.
    ListFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResyncReport {
    /// Full listing (no stored cursor) rather than a continuation.
    pub bootstrap: bool,
    pub status: ResyncStatus,
    pub entries: usize,
    pub indexed: usize,
    pub removed: usize,
    pub skipped: usize,
}

/// Releases the in-flight slot if a pass unwinds before reaching its own
/// completion check.
struct InFlight<'a> {
    engine: &'a SyncEngine,
    armed: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.armed {
            let mut state = self.engine.state.lock();
            state.in_flight = false;
            state.deferred = false;
            tracing::error!("resync_aborted");
        }
    }
}

impl SyncEngine {
    /// Handles a change notification. At most one re-sync runs at a time; any
    /// number of nudges arriving meanwhile collapse into one follow-up pass.
    pub fn nudge(self: &Arc<Self>) -> NudgeOutcome {
        {
            let mut state = self.state.lock();
            if state.in_flight {
                state.deferred = true;
                tracing::debug!("resync_deferred");
                return NudgeOutcome::Deferred;
            }
            state.in_flight = true;
        }
        let engine = self.clone();
        NudgeOutcome::Started(tokio::spawn(async move { engine.resync_loop().await }))
    }

    async fn resync_loop(self: Arc<Self>) {
        let mut guard = InFlight {
            engine: &self,
            armed: true,
        };
        loop {
            let report = self.resync_once().await;
            tracing::info!(
                bootstrap = report.bootstrap,
                status = ?report.status,
                entries = report.entries,
                indexed = report.indexed,
                removed = report.removed,
                skipped = report.skipped,
                "resync_finished"
            );
            // completion and the deferred check share one critical section
            let again = {
                let mut state = self.state.lock();
                if state.deferred {
                    state.deferred = false;
                    true
                } else {
                    state.in_flight = false;
                    false
                }
            };
            if !again {
                guard.armed = false;
                break;
            }
        }
    }

    /// One delta pass: bootstrap listing without a cursor, continuation with
    /// one. Every changed entry goes through fetch, gate, render and index.
    pub async fn resync_once(&self) -> ResyncReport {
        let cursor = self.state.lock().cursor.clone();
        let mut report = ResyncReport {
            bootstrap: cursor.is_none(),
            ..ResyncReport::default()
        };

        let changes = match self.store.list_changes(cursor.as_deref()).await {
            Ok(changes) => changes,
            Err(ListError::CursorReset) => {
                tracing::warn!("resync_cursor_reset");
                self.state.lock().cursor = None;
                report.status = ResyncStatus::CursorReset;
                return report;
            }
            Err(ListError::Transient(e)) => {
                tracing::error!(error = ?e, "resync_list_failed");
                report.status = ResyncStatus::ListFailed;
                return report;
            }
        };

        report.entries = changes.entries.len();
        for entry in &changes.entries {
            match entry.kind {
                ChangeKind::Deleted => {
                    self.invalidate(&entry.name).await;
                    report.removed += 1;
                }
                ChangeKind::Modified => match self.process_note(&entry.name).await {
                    Ok(_) => report.indexed += 1,
                    Err(e) if e.is_hidden() => report.removed += 1,
                    Err(e) => {
                        report.skipped += 1;
                        tracing::warn!(note = %entry.name, error = %e, "resync_note_skipped");
                    }
                },
            }
        }

        self.state.lock().cursor = Some(changes.cursor);
        report
    }
}
