use std::sync::Arc;

use crate::application::linkgraph::BacklinkIndex;
use crate::application::ports::note_store::NoteStore;
use crate::application::services::indexing::{Indexes, spawn_indexer};
use crate::application::services::publish::PublishGate;
use crate::application::services::render_cache::RenderCache;
use crate::application::services::tagging::TagIndex;
use crate::application::services::template::PageTemplate;
use crate::application::use_cases::sync::{SyncEngine, SyncOptions};
use crate::bootstrap::config::{Config, StorageBackend};
use crate::infrastructure::dropbox::{DropboxConfig, DropboxNoteStore};
use crate::infrastructure::storage::FsNoteStore;

#[derive(Clone)]
pub struct AppContext {
    pub cfg: Config,
    services: Arc<AppServices>,
}

pub struct AppServices {
    indexes: Indexes,
    template: Arc<PageTemplate>,
    engine: Arc<SyncEngine>,
}

/// Note store selected by `STORAGE_BACKEND`.
pub fn build_note_store(cfg: &Config) -> anyhow::Result<Arc<dyn NoteStore>> {
    let store: Arc<dyn NoteStore> = match cfg.storage_backend {
        StorageBackend::Dropbox => Arc::new(DropboxNoteStore::new(DropboxConfig {
            token: cfg.dropbox_token.clone(),
            root: cfg.notes_root.clone(),
            api_url: cfg.dropbox_api_url.clone(),
            content_url: cfg.dropbox_content_url.clone(),
            timeout: cfg.fetch_timeout,
        })?),
        StorageBackend::Filesystem => Arc::new(FsNoteStore::new(&cfg.notes_root)),
    };
    Ok(store)
}

impl AppServices {
    /// Spawns the indexing task, so it must run inside a tokio runtime.
    pub fn new(cfg: &Config, store: Arc<dyn NoteStore>, template: PageTemplate) -> Self {
        let indexes = Indexes::new();
        let indexer = spawn_indexer(indexes.clone(), cfg.index_queue_capacity);
        let template = Arc::new(template);
        let engine = Arc::new(SyncEngine::new(
            store,
            indexer,
            PublishGate::new(&cfg.publish_marker),
            template.clone(),
            cfg.root_notes.clone(),
            SyncOptions {
                fetch_timeout: cfg.fetch_timeout,
                workers: cfg.crawl_workers,
            },
        ));
        Self {
            indexes,
            template,
            engine,
        }
    }
}

impl AppContext {
    pub fn new(cfg: Config, services: AppServices) -> Self {
        Self {
            cfg,
            services: Arc::new(services),
        }
    }

    pub fn render_cache(&self) -> &RenderCache {
        &self.services.indexes.cache
    }

    pub fn tag_index(&self) -> &TagIndex {
        &self.services.indexes.tags
    }

    pub fn backlink_index(&self) -> &BacklinkIndex {
        &self.services.indexes.backlinks
    }

    pub fn template(&self) -> &PageTemplate {
        &self.services.template
    }

    pub fn sync_engine(&self) -> Arc<SyncEngine> {
        self.services.engine.clone()
    }
}
