use std::sync::Arc;

use crate::application::ports::note_store::FetchError;
use crate::application::services::indexing::NoteEvent;
use crate::application::services::markdown::render_note;
use crate::domain::notes::errors::NoteError;
use crate::domain::notes::note::{NoteName, RenderedNote};

use super::SyncEngine;

impl SyncEngine {
    /// Downloads one note, bounded by the configured timeout.
    pub async fn fetch(&self, name: &NoteName) -> Result<Vec<u8>, FetchError> {
        match tokio::time::timeout(self.options.fetch_timeout, self.store.fetch(name)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout),
        }
    }

    /// One fetch -> gate -> render -> index unit of work.
    ///
    /// A note that is gone or no longer published is dropped from every
    /// index. Transient failures leave the last good render in place.
    pub async fn process_note(&self, name: &NoteName) -> Result<Arc<RenderedNote>, NoteError> {
        let raw = match self.fetch(name).await {
            Ok(raw) => raw,
            Err(FetchError::NotFound) => {
                self.invalidate(name).await;
                return Err(NoteError::NotFound);
            }
            Err(e) => return Err(e.into()),
        };

        if !self.gate.is_public(&raw) {
            tracing::info!(note = %name, "note_not_public");
            self.invalidate(name).await;
            return Err(NoteError::Unpublished);
        }

        let note = Arc::new(render_note(name, &raw, &self.template));
        if let Err(e) = self.indexer.publish(NoteEvent::Changed(note.clone())).await {
            tracing::error!(note = %name, error = ?e, "index_publish_failed");
        }
        tracing::debug!(
            note = %name,
            tags = note.tags.len(),
            links = note.outbound_links.len(),
            "note_indexed"
        );
        Ok(note)
    }

    pub(crate) async fn invalidate(&self, name: &NoteName) {
        if let Err(e) = self.indexer.publish(NoteEvent::Removed(name.clone())).await {
            tracing::error!(note = %name, error = ?e, "index_invalidate_failed");
        }
    }
}
