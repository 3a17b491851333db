use async_trait::async_trait;

use crate::domain::notes::errors::NoteError;
use crate::domain::notes::note::{ChangeEntry, NoteName};

#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("note does not exist in the backend")]
    NotFound,
    #[error("fetch timed out")]
    Timeout,
    #[error("backend request failed")]
    Transient(#[source] anyhow::Error),
}

#[derive(thiserror::Error, Debug)]
pub enum ListError {
    /// The backend no longer accepts the cursor; listing must restart from scratch.
    #[error("delta cursor was reset by the backend")]
    CursorReset,
    #[error("delta listing failed")]
    Transient(#[source] anyhow::Error),
}

impl From<FetchError> for NoteError {
    fn from(value: FetchError) -> Self {
        match value {
            FetchError::NotFound => NoteError::NotFound,
            FetchError::Timeout => {
                NoteError::TransientFetch(anyhow::anyhow!("fetch timed out"))
            }
            FetchError::Transient(e) => NoteError::TransientFetch(e),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    pub entries: Vec<ChangeEntry>,
    pub cursor: String,
}

/// Remote note storage. The only component allowed to do I/O for note content.
#[async_trait]
pub trait NoteStore: Send + Sync {
    async fn fetch(&self, name: &NoteName) -> Result<Vec<u8>, FetchError>;

    /// Without a cursor this lists every note currently present; with one it
    /// returns only what changed since.
    async fn list_changes(&self, cursor: Option<&str>) -> Result<ChangeSet, ListError>;
}
