use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::application::ports::note_store::{ChangeSet, FetchError, ListError, NoteStore};
use crate::domain::notes::note::{ChangeEntry, ChangeKind, NoteName};

#[derive(Debug, Clone)]
pub struct DropboxConfig {
    pub token: String,
    /// Folder holding the notes, relative to the app root.
    pub root: String,
    pub api_url: String,
    pub content_url: String,
    pub timeout: Duration,
}

pub struct DropboxNoteStore {
    client: reqwest::Client,
    cfg: DropboxConfig,
}

#[derive(Serialize)]
struct PathArg<'a> {
    path: &'a str,
}

#[derive(Serialize)]
struct ListFolderArg<'a> {
    path: &'a str,
    recursive: bool,
}

#[derive(Serialize)]
struct ContinueArg<'a> {
    cursor: &'a str,
}

#[derive(Deserialize)]
struct ListFolderResponse {
    entries: Vec<Metadata>,
    cursor: String,
    #[serde(default)]
    has_more: bool,
}

#[derive(Deserialize)]
struct Metadata {
    #[serde(rename = ".tag")]
    tag: String,
    name: String,
}

/// JSON for the `Dropbox-API-Arg` header. Header values must be ASCII, so
/// everything else is written as `\uXXXX` escapes.
fn header_json<T: Serialize>(value: &T) -> anyhow::Result<String> {
    let raw = serde_json::to_string(value)?;
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if ch.is_ascii() {
            out.push(ch);
        } else {
            let mut buf = [0u16; 2];
            for unit in ch.encode_utf16(&mut buf) {
                out.push_str(&format!("\\u{unit:04x}"));
            }
        }
    }
    Ok(out)
}

fn to_entry(meta: Metadata) -> Option<ChangeEntry> {
    if !meta.name.ends_with(".md") {
        return None;
    }
    let kind = match meta.tag.as_str() {
        "file" => ChangeKind::Modified,
        "deleted" => ChangeKind::Deleted,
        _ => return None,
    };
    Some(ChangeEntry {
        name: NoteName::parse(&meta.name)?,
        kind,
    })
}

impl DropboxNoteStore {
    pub fn new(cfg: DropboxConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(cfg.timeout)
            .build()
            .context("building dropbox http client")?;
        Ok(Self { client, cfg })
    }

    fn folder(&self) -> String {
        let root = self.cfg.root.trim_matches('/');
        if root.is_empty() {
            String::new()
        } else {
            format!("/{root}")
        }
    }

    fn remote_path(&self, name: &NoteName) -> String {
        format!("{}/{}", self.folder(), name)
    }

    async fn list_page<T: Serialize>(
        &self,
        endpoint: &str,
        arg: &T,
    ) -> Result<ListFolderResponse, ListError> {
        let url = format!("{}/2/files/{endpoint}", self.cfg.api_url);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.cfg.token)
            .json(arg)
            .send()
            .await
            .map_err(|e| ListError::Transient(e.into()))?;
        let status = resp.status();
        if status.is_success() {
            return resp
                .json::<ListFolderResponse>()
                .await
                .map_err(|e| ListError::Transient(e.into()));
        }
        let body = resp.text().await.unwrap_or_default();
        if status == reqwest::StatusCode::CONFLICT && body.contains("reset") {
            return Err(ListError::CursorReset);
        }
        Err(ListError::Transient(anyhow::anyhow!(
            "dropbox {endpoint} returned {status}: {body}"
        )))
    }
}

#[async_trait]
impl NoteStore for DropboxNoteStore {
    async fn fetch(&self, name: &NoteName) -> Result<Vec<u8>, FetchError> {
        let path = self.remote_path(name);
        let arg = header_json(&PathArg { path: &path }).map_err(FetchError::Transient)?;
        let url = format!("{}/2/files/download", self.cfg.content_url);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.cfg.token)
            .header("Dropbox-API-Arg", arg)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout
                } else {
                    FetchError::Transient(e.into())
                }
            })?;
        let status = resp.status();
        if status.is_success() {
            let bytes = resp
                .bytes()
                .await
                .map_err(|e| FetchError::Transient(e.into()))?;
            tracing::debug!(note = %name, bytes = bytes.len(), "dropbox_downloaded");
            return Ok(bytes.to_vec());
        }
        let body = resp.text().await.unwrap_or_default();
        if status == reqwest::StatusCode::CONFLICT && body.contains("not_found") {
            return Err(FetchError::NotFound);
        }
        Err(FetchError::Transient(anyhow::anyhow!(
            "dropbox download returned {status}: {body}"
        )))
    }

    async fn list_changes(&self, cursor: Option<&str>) -> Result<ChangeSet, ListError> {
        let folder = self.folder();
        let mut page = match cursor {
            None => {
                let arg = ListFolderArg {
                    path: &folder,
                    recursive: false,
                };
                self.list_page("list_folder", &arg).await?
            }
            Some(cursor) => {
                self.list_page("list_folder/continue", &ContinueArg { cursor })
                    .await?
            }
        };

        let mut entries = Vec::new();
        loop {
            entries.extend(page.entries.into_iter().filter_map(to_entry));
            if !page.has_more {
                break;
            }
            let next = page.cursor;
            page = self
                .list_page("list_folder/continue", &ContinueArg { cursor: &next })
                .await?;
        }
        tracing::debug!(entries = entries.len(), "dropbox_listed");
        Ok(ChangeSet {
            entries,
            cursor: page.cursor,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Json;
    use axum::Router;
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::{IntoResponse, Response};
    use axum::routing::post;
    use serde_json::{Value, json};

    async fn download(headers: HeaderMap) -> Response {
        let arg = headers
            .get("Dropbox-API-Arg")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        let arg: Value = serde_json::from_str(arg).unwrap();
        match arg["path"].as_str().unwrap_or_default() {
            "/notes/index.md" => "#public [[Über]]".into_response(),
            "/notes/Über.md" => "umlaut".into_response(),
            "/notes/flaky.md" => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
            _ => (
                StatusCode::CONFLICT,
                Json(json!({"error_summary": "path/not_found/.."})),
            )
                .into_response(),
        }
    }

    async fn list_folder(Json(arg): Json<Value>) -> Json<Value> {
        assert_eq!(arg["path"], "/notes");
        assert_eq!(arg["recursive"], false);
        Json(json!({
            "entries": [
                {".tag": "file", "name": "a.md"},
                {".tag": "folder", "name": "img"},
            ],
            "cursor": "c1",
            "has_more": true,
        }))
    }

    async fn list_continue(Json(arg): Json<Value>) -> Response {
        match arg["cursor"].as_str().unwrap_or_default() {
            "c1" => Json(json!({
                "entries": [
                    {".tag": "file", "name": "b.md"},
                    {".tag": "deleted", "name": "c.md"},
                    {".tag": "file", "name": "photo.png"},
                ],
                "cursor": "c2",
                "has_more": false,
            }))
            .into_response(),
            _ => (
                StatusCode::CONFLICT,
                Json(json!({"error_summary": "reset/.."})),
            )
                .into_response(),
        }
    }

    async fn mock_store() -> DropboxNoteStore {
        let app = Router::new()
            .route("/2/files/download", post(download))
            .route("/2/files/list_folder", post(list_folder))
            .route("/2/files/list_folder/continue", post(list_continue));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        DropboxNoteStore::new(DropboxConfig {
            token: "t".into(),
            root: "notes".into(),
            api_url: base.clone(),
            content_url: base,
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    fn name(s: &str) -> NoteName {
        NoteName::parse(s).unwrap()
    }

    #[test]
    fn header_arg_is_ascii() {
        let arg = header_json(&PathArg { path: "/notes/Über 😀.md" }).unwrap();
        assert!(arg.is_ascii());
        assert!(arg.contains("\\u00dc"));
        assert!(arg.contains("\\ud83d\\ude00"));
        let back: Value = serde_json::from_str(&arg).unwrap();
        assert_eq!(back["path"], "/notes/Über 😀.md");
    }

    #[tokio::test]
    async fn downloads_and_classifies_failures() {
        let store = mock_store().await;
        assert_eq!(
            store.fetch(&name("index")).await.unwrap(),
            b"#public [[\xc3\x9cber]]"
        );
        assert_eq!(store.fetch(&name("Über")).await.unwrap(), b"umlaut");
        assert!(matches!(
            store.fetch(&name("missing")).await,
            Err(FetchError::NotFound)
        ));
        assert!(matches!(
            store.fetch(&name("flaky")).await,
            Err(FetchError::Transient(_))
        ));
    }

    #[tokio::test]
    async fn listing_follows_pagination_and_keeps_markdown() {
        let store = mock_store().await;
        let changes = store.list_changes(None).await.unwrap();
        assert_eq!(changes.cursor, "c2");
        assert_eq!(
            changes.entries,
            vec![
                ChangeEntry {
                    name: name("a"),
                    kind: ChangeKind::Modified
                },
                ChangeEntry {
                    name: name("b"),
                    kind: ChangeKind::Modified
                },
                ChangeEntry {
                    name: name("c"),
                    kind: ChangeKind::Deleted
                },
            ]
        );
    }

    #[tokio::test]
    async fn stale_cursor_is_reported_as_reset() {
        let store = mock_store().await;
        assert!(matches!(
            store.list_changes(Some("stale")).await,
            Err(ListError::CursorReset)
        ));
    }
}
