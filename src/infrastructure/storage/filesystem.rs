use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;

use crate::application::ports::note_store::{ChangeSet, FetchError, ListError, NoteStore};
use crate::domain::notes::note::{ChangeEntry, ChangeKind, NoteName};

const CURSOR_PREFIX: &str = "fs:";

/// Notes read from a local directory. Delta listings compare modification
/// times against the cursor; removals are not reported.
pub struct FsNoteStore {
    root: PathBuf,
}

impl FsNoteStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_of(&self, name: &NoteName) -> Option<PathBuf> {
        let rel = Path::new(name.as_str());
        let plain = rel
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        plain.then(|| self.root.join(rel))
    }
}

fn millis(t: SystemTime) -> u128 {
    t.duration_since(UNIX_EPOCH).map(|d| d.as_millis()).unwrap_or(0)
}

fn parse_cursor(cursor: &str) -> Option<u128> {
    cursor.strip_prefix(CURSOR_PREFIX)?.parse().ok()
}

#[async_trait]
impl NoteStore for FsNoteStore {
    async fn fetch(&self, name: &NoteName) -> Result<Vec<u8>, FetchError> {
        let Some(path) = self.path_of(name) else {
            return Err(FetchError::NotFound);
        };
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(FetchError::NotFound),
            Err(e) => Err(FetchError::Transient(e.into())),
        }
    }

    async fn list_changes(&self, cursor: Option<&str>) -> Result<ChangeSet, ListError> {
        let since = match cursor {
            None => None,
            Some(c) => Some(parse_cursor(c).ok_or(ListError::CursorReset)?),
        };
        let started = millis(SystemTime::now());

        let mut dir = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|e| ListError::Transient(e.into()))?;
        let mut entries = Vec::new();
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| ListError::Transient(e.into()))?
        {
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            if !file_name.ends_with(".md") {
                continue;
            }
            let meta = match entry.metadata().await {
                Ok(meta) if meta.is_file() => meta,
                _ => continue,
            };
            if let Some(since) = since {
                let modified = meta.modified().map(millis).unwrap_or(u128::MAX);
                if modified < since {
                    continue;
                }
            }
            if let Some(name) = NoteName::parse(file_name) {
                entries.push(ChangeEntry {
                    name,
                    kind: ChangeKind::Modified,
                });
            }
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(ChangeSet {
            entries,
            cursor: format!("{CURSOR_PREFIX}{started}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> NoteName {
        NoteName::parse(s).unwrap()
    }

    #[tokio::test]
    async fn fetches_existing_and_reports_missing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.md"), "#public").unwrap();
        let store = FsNoteStore::new(dir.path());

        assert_eq!(store.fetch(&name("a")).await.unwrap(), b"#public");
        assert!(matches!(
            store.fetch(&name("b")).await,
            Err(FetchError::NotFound)
        ));
    }

    #[tokio::test]
    async fn parent_components_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let inner = dir.path().join("notes");
        std::fs::create_dir(&inner).unwrap();
        std::fs::write(dir.path().join("secret.md"), "#public").unwrap();
        let store = FsNoteStore::new(&inner);

        assert!(matches!(
            store.fetch(&name("../secret")).await,
            Err(FetchError::NotFound)
        ));
    }

    #[tokio::test]
    async fn bootstrap_lists_markdown_files_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.md"), "").unwrap();
        std::fs::write(dir.path().join("a.md"), "").unwrap();
        std::fs::write(dir.path().join("style.css"), "").unwrap();
        std::fs::create_dir(dir.path().join("sub.md")).unwrap();
        let store = FsNoteStore::new(dir.path());

        let changes = store.list_changes(None).await.unwrap();
        let names: Vec<&str> = changes.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a.md", "b.md"]);
        assert!(changes.cursor.starts_with(CURSOR_PREFIX));
    }

    #[tokio::test]
    async fn continuation_skips_untouched_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.md"), "").unwrap();
        let store = FsNoteStore::new(dir.path());

        let future = format!("{CURSOR_PREFIX}{}", u128::from(u64::MAX));
        let changes = store.list_changes(Some(&future)).await.unwrap();
        assert!(changes.entries.is_empty());

        let changes = store.list_changes(Some("fs:0")).await.unwrap();
        assert_eq!(changes.entries.len(), 1);
    }

    #[tokio::test]
    async fn foreign_cursor_is_reset() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsNoteStore::new(dir.path());
        assert!(matches!(
            store.list_changes(Some("AAH3x")).await,
            Err(ListError::CursorReset)
        ));
    }
}
