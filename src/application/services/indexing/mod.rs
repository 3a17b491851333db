use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use crate::application::linkgraph::BacklinkIndex;
use crate::application::services::render_cache::RenderCache;
use crate::application::services::tagging::TagIndex;
use crate::domain::notes::note::{NoteName, RenderedNote};

#[derive(Debug, Clone)]
pub enum NoteEvent {
    /// A freshly rendered, published note.
    Changed(Arc<RenderedNote>),
    /// The note is gone upstream or no longer published.
    Removed(NoteName),
}

/// The three derived stores, each behind its own lock.
#[derive(Clone, Default)]
pub struct Indexes {
    pub cache: Arc<RenderCache>,
    pub tags: Arc<TagIndex>,
    pub backlinks: Arc<BacklinkIndex>,
}

impl Indexes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&self, event: NoteEvent) {
        match event {
            NoteEvent::Changed(note) => {
                self.tags.replace(&note.name, &note.tags);
                self.backlinks.replace_edges(&note.name, &note.outbound_links);
                // cache last: once a page is servable its tag and backlink data is in place
                self.cache.put(note);
            }
            NoteEvent::Removed(name) => {
                self.cache.invalidate(&name);
                self.tags.remove(&name);
                self.backlinks.remove_source(&name);
            }
        }
    }
}

struct IndexCommand {
    event: NoteEvent,
    ack: oneshot::Sender<()>,
}

/// Producer side of the indexing channel. Cloned into crawl workers and the
/// re-sync path; a single consumer task owns all index writes.
#[derive(Clone)]
pub struct IndexerHandle {
    tx: mpsc::Sender<IndexCommand>,
}

impl IndexerHandle {
    /// Sends `event` and waits until the consumer has applied it.
    pub async fn publish(&self, event: NoteEvent) -> anyhow::Result<()> {
        let (ack, done) = oneshot::channel();
        self.tx
            .send(IndexCommand { event, ack })
            .await
            .map_err(|_| anyhow::anyhow!("indexer stopped"))?;
        done.await
            .map_err(|_| anyhow::anyhow!("indexer dropped event"))?;
        Ok(())
    }
}

pub fn spawn_indexer(indexes: Indexes, capacity: usize) -> IndexerHandle {
    let (tx, mut rx) = mpsc::channel::<IndexCommand>(capacity.max(1));
    tokio::spawn(async move {
        while let Some(cmd) = rx.recv().await {
            let name = match &cmd.event {
                NoteEvent::Changed(note) => note.name.clone(),
                NoteEvent::Removed(name) => name.clone(),
            };
            let removed = matches!(cmd.event, NoteEvent::Removed(_));
            indexes.apply(cmd.event);
            tracing::debug!(note = %name, removed, "index_updated");
            let _ = cmd.ack.send(());
        }
        tracing::debug!("indexer_stopped");
    });
    IndexerHandle { tx }
}
