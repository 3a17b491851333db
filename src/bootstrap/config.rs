use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::application::services::publish::DEFAULT_PUBLISH_MARKER;
use crate::domain::notes::note::NoteName;
use crate::infrastructure::dropbox::{DEFAULT_API_URL, DEFAULT_CONTENT_URL};

pub const DEFAULT_BUILD: &str = "not available";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageBackend {
    Dropbox,
    Filesystem,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub api_port: u16,
    pub storage_backend: StorageBackend,
    pub dropbox_token: String,
    pub dropbox_app_secret: String,
    pub dropbox_api_url: String,
    pub dropbox_content_url: String,
    pub notes_root: String,
    /// Crawl roots; the first one is served at `/`.
    pub root_notes: Vec<NoteName>,
    pub template_path: PathBuf,
    pub static_dir: PathBuf,
    pub publish_marker: String,
    pub fetch_timeout: Duration,
    pub crawl_workers: usize,
    pub index_queue_capacity: usize,
    pub admin_token: Option<String>,
    pub build: String,
    pub is_production: bool,
}

fn parse_roots(raw: &str) -> Vec<NoteName> {
    let mut roots: Vec<NoteName> = Vec::new();
    for name in raw.split(',').filter_map(NoteName::parse) {
        if !roots.contains(&name) {
            roots.push(name);
        }
    }
    roots
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let api_port = var("API_PORT")
            .and_then(|s| s.parse().ok())
            .unwrap_or(8080);
        let storage_backend = match var("STORAGE_BACKEND").as_deref().map(str::trim) {
            None | Some("") | Some("dropbox") => StorageBackend::Dropbox,
            Some("filesystem") | Some("fs") => StorageBackend::Filesystem,
            Some(other) => anyhow::bail!("unknown STORAGE_BACKEND `{other}`"),
        };
        let dropbox_token = var("DROPBOX_TOKEN").unwrap_or_default();
        let dropbox_app_secret = var("DROPBOX_APP_SECRET").unwrap_or_default();
        let dropbox_api_url = var("DROPBOX_API_URL")
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_URL.into());
        let dropbox_content_url = var("DROPBOX_CONTENT_URL")
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_CONTENT_URL.into());
        let notes_root = var("NOTES_ROOT").unwrap_or_else(|| "notes".into());
        let root_notes = parse_roots(&var("ROOT_NOTES").unwrap_or_else(|| "index".into()));
        let template_path = var("TEMPLATE_PATH")
            .unwrap_or_else(|| "template.html".into())
            .into();
        let static_dir = var("STATIC_DIR").unwrap_or_else(|| "static".into()).into();
        let publish_marker = var("PUBLISH_MARKER")
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PUBLISH_MARKER.into());
        let fetch_timeout = Duration::from_secs(
            var("FETCH_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .filter(|s| *s > 0)
                .unwrap_or(10),
        );
        let crawl_workers = var("CRAWL_WORKERS")
            .and_then(|s| s.parse().ok())
            .filter(|n| *n > 0)
            .unwrap_or(8);
        let index_queue_capacity = var("INDEX_QUEUE_CAPACITY")
            .and_then(|s| s.parse().ok())
            .filter(|n| *n > 0)
            .unwrap_or(256);
        let admin_token = var("ADMIN_TOKEN").filter(|t| !t.trim().is_empty());
        let build = var("COMMIT")
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BUILD.into());
        let is_production = matches!(
            var("RUST_ENV").as_deref(),
            Some("production") | Some("prod")
        );

        if root_notes.is_empty() {
            anyhow::bail!("ROOT_NOTES must name at least one note");
        }
        if is_production && storage_backend == StorageBackend::Dropbox {
            if dropbox_token.is_empty() {
                anyhow::bail!("DROPBOX_TOKEN must be set in production");
            }
            if dropbox_app_secret.is_empty() {
                anyhow::bail!("DROPBOX_APP_SECRET must be set in production");
            }
        }

        Ok(Self {
            api_port,
            storage_backend,
            dropbox_token,
            dropbox_app_secret,
            dropbox_api_url,
            dropbox_content_url,
            notes_root,
            root_notes,
            template_path,
            static_dir,
            publish_marker,
            fetch_timeout,
            crawl_workers,
            index_queue_capacity,
            admin_token,
            build,
            is_production,
        })
    }

    /// Note served at `/`.
    pub fn home_note(&self) -> &NoteName {
        &self.root_notes[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.api_port, 8080);
        assert_eq!(cfg.storage_backend, StorageBackend::Dropbox);
        assert_eq!(cfg.home_note().as_str(), "index.md");
        assert_eq!(cfg.publish_marker, "#public");
        assert_eq!(cfg.fetch_timeout, Duration::from_secs(10));
        assert_eq!(cfg.crawl_workers, 8);
        assert_eq!(cfg.build, DEFAULT_BUILD);
        assert!(cfg.admin_token.is_none());
        assert_eq!(cfg.dropbox_api_url, DEFAULT_API_URL);
    }

    #[test]
    fn roots_are_normalized_and_deduplicated() {
        let cfg = config(&[("ROOT_NOTES", "home, about.md,, about ,/home")]).unwrap();
        let roots: Vec<&str> = cfg.root_notes.iter().map(|n| n.as_str()).collect();
        assert_eq!(roots, vec!["home.md", "about.md"]);
    }

    #[test]
    fn empty_root_set_is_rejected() {
        assert!(config(&[("ROOT_NOTES", " , ")]).is_err());
    }

    #[test]
    fn production_requires_dropbox_secrets() {
        assert!(config(&[("RUST_ENV", "production")]).is_err());
        assert!(
            config(&[
                ("RUST_ENV", "production"),
                ("DROPBOX_TOKEN", "t"),
                ("DROPBOX_APP_SECRET", "s"),
            ])
            .is_ok()
        );
        assert!(
            config(&[("RUST_ENV", "production"), ("STORAGE_BACKEND", "filesystem")]).is_ok()
        );
    }

    #[test]
    fn unknown_backend_is_an_error() {
        assert!(config(&[("STORAGE_BACKEND", "s3")]).is_err());
    }
}
