//! In-process note store with knobs for failure injection and for pausing
//! delta listings mid-flight.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{Notify, Semaphore};

use crate::application::ports::note_store::{ChangeSet, FetchError, ListError, NoteStore};
use crate::domain::notes::note::{ChangeEntry, ChangeKind, NoteName};

#[derive(Default)]
struct Inner {
    notes: HashMap<NoteName, String>,
    failing: HashSet<NoteName>,
    hanging: HashSet<NoteName>,
    fetches: HashMap<NoteName, usize>,
    log: Vec<ChangeEntry>,
    list_calls: usize,
    cursors_seen: Vec<Option<String>>,
    reset_next: bool,
    fail_lists: bool,
    panic_lists: bool,
}

#[derive(Default)]
pub struct MemoryNoteStore {
    inner: Mutex<Inner>,
    list_gate: Option<Arc<Semaphore>>,
    list_entered: Notify,
}

fn key(name: &str) -> NoteName {
    NoteName::parse(name).expect("valid note name")
}

impl MemoryNoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `list_changes` call blocks until a permit is released.
    pub fn with_list_gate() -> Self {
        Self {
            list_gate: Some(Arc::new(Semaphore::new(0))),
            ..Self::default()
        }
    }

    pub fn put(&self, name: &str, content: &str) {
        let name = key(name);
        let mut inner = self.inner.lock();
        inner.notes.insert(name.clone(), content.to_string());
        inner.log.push(ChangeEntry {
            name,
            kind: ChangeKind::Modified,
        });
    }

    pub fn delete(&self, name: &str) {
        let name = key(name);
        let mut inner = self.inner.lock();
        inner.notes.remove(&name);
        inner.log.push(ChangeEntry {
            name,
            kind: ChangeKind::Deleted,
        });
    }

    pub fn fail(&self, name: &str) {
        self.inner.lock().failing.insert(key(name));
    }

    pub fn hang(&self, name: &str) {
        self.inner.lock().hanging.insert(key(name));
    }

    /// The next continuation call answers with a cursor reset.
    pub fn reset_cursor(&self) {
        self.inner.lock().reset_next = true;
    }

    pub fn fail_lists(&self, fail: bool) {
        self.inner.lock().fail_lists = fail;
    }

    /// Listing panics instead of answering, as a buggy backend would.
    pub fn panic_lists(&self, panic: bool) {
        self.inner.lock().panic_lists = panic;
    }

    pub fn fetch_count(&self, name: &str) -> usize {
        self.inner.lock().fetches.get(&key(name)).copied().unwrap_or(0)
    }

    pub fn list_calls(&self) -> usize {
        self.inner.lock().list_calls
    }

    pub fn cursors_seen(&self) -> Vec<Option<String>> {
        self.inner.lock().cursors_seen.clone()
    }

    pub fn release_lists(&self, n: usize) {
        if let Some(gate) = &self.list_gate {
            gate.add_permits(n);
        }
    }

    pub async fn wait_list_entered(&self) {
        self.list_entered.notified().await;
    }

    fn list_now(&self, cursor: Option<&str>) -> Result<ChangeSet, ListError> {
        let mut inner = self.inner.lock();
        if inner.fail_lists {
            return Err(ListError::Transient(anyhow::anyhow!("listing unavailable")));
        }
        let head = format!("v{}", inner.log.len());
        let Some(cursor) = cursor else {
            let mut entries: Vec<ChangeEntry> = inner
                .notes
                .keys()
                .map(|name| ChangeEntry {
                    name: name.clone(),
                    kind: ChangeKind::Modified,
                })
                .collect();
            entries.sort_by(|a, b| a.name.cmp(&b.name));
            return Ok(ChangeSet {
                entries,
                cursor: head,
            });
        };
        if std::mem::take(&mut inner.reset_next) {
            return Err(ListError::CursorReset);
        }
        let from = cursor
            .strip_prefix('v')
            .and_then(|n| n.parse::<usize>().ok())
            .filter(|n| *n <= inner.log.len())
            .ok_or(ListError::CursorReset)?;
        Ok(ChangeSet {
            entries: inner.log[from..].to_vec(),
            cursor: head,
        })
    }
}

#[async_trait]
impl NoteStore for MemoryNoteStore {
    async fn fetch(&self, name: &NoteName) -> Result<Vec<u8>, FetchError> {
        let (result, hang) = {
            let mut inner = self.inner.lock();
            *inner.fetches.entry(name.clone()).or_default() += 1;
            let result = if inner.failing.contains(name) {
                Err(FetchError::Transient(anyhow::anyhow!("injected failure")))
            } else {
                inner
                    .notes
                    .get(name)
                    .map(|c| c.as_bytes().to_vec())
                    .ok_or(FetchError::NotFound)
            };
            (result, inner.hanging.contains(name))
        };
        if hang {
            std::future::pending::<()>().await;
        }
        result
    }

    async fn list_changes(&self, cursor: Option<&str>) -> Result<ChangeSet, ListError> {
        let panics = {
            let mut inner = self.inner.lock();
            inner.list_calls += 1;
            inner.cursors_seen.push(cursor.map(str::to_string));
            inner.panic_lists
        };
        if panics {
            panic!("listing blew up");
        }
        if let Some(gate) = &self.list_gate {
            self.list_entered.notify_one();
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
        self.list_now(cursor)
    }
}
