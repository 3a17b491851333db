use std::collections::{BTreeSet, HashMap};

use parking_lot::RwLock;

use crate::domain::notes::note::NoteName;

#[derive(Default)]
struct EdgeState {
    // target -> sources linking to it
    incoming: HashMap<NoteName, BTreeSet<NoteName>>,
    // source -> targets it linked to when last indexed
    outgoing: HashMap<NoteName, BTreeSet<NoteName>>,
}

/// Inverted link graph: note -> notes that reference it.
#[derive(Default)]
pub struct BacklinkIndex {
    inner: RwLock<EdgeState>,
}

impl BacklinkIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every edge previously recorded for `source`, then records the
    /// current ones.
    pub fn replace_edges(&self, source: &NoteName, targets: &BTreeSet<NoteName>) {
        let mut state = self.inner.write();
        Self::detach(&mut state, source);
        for target in targets {
            state
                .incoming
                .entry(target.clone())
                .or_default()
                .insert(source.clone());
        }
        if !targets.is_empty() {
            state.outgoing.insert(source.clone(), targets.clone());
        }
    }

    pub fn remove_source(&self, source: &NoteName) {
        let mut state = self.inner.write();
        Self::detach(&mut state, source);
    }

    fn detach(state: &mut EdgeState, source: &NoteName) {
        let Some(previous) = state.outgoing.remove(source) else {
            return;
        };
        for target in previous {
            if let Some(sources) = state.incoming.get_mut(&target) {
                sources.remove(source);
                if sources.is_empty() {
                    state.incoming.remove(&target);
                }
            }
        }
    }

    /// Notes linking to `target`, sorted by name.
    pub fn backlinks(&self, target: &NoteName) -> Vec<NoteName> {
        self.inner
            .read()
            .incoming
            .get(target)
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default()
    }
}
