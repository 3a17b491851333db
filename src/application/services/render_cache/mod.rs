use std::sync::Arc;

use dashmap::DashMap;

use crate::domain::notes::note::{NoteName, RenderedNote};

/// name -> last rendered note. The only store the request path reads.
///
/// Sharded map: a writer replacing one note never blocks readers of another.
#[derive(Default)]
pub struct RenderCache {
    entries: DashMap<NoteName, Arc<RenderedNote>>,
}

impl RenderCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &NoteName) -> Option<Arc<RenderedNote>> {
        self.entries.get(name).map(|e| e.value().clone())
    }

    pub fn put(&self, note: Arc<RenderedNote>) {
        self.entries.insert(note.name.clone(), note);
    }

    pub fn invalidate(&self, name: &NoteName) -> bool {
        self.entries.remove(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
