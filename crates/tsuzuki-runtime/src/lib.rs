//! Concurrent shell around the tracking core: the single-writer store
//! actor and the background favorites poller.

pub mod poller;
pub mod store;

pub use poller::{FavoritesPoller, NotificationSink, SweepReport, SweepUpdate};
pub use store::StoreHandle;

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use tsuzuki_core::config::AppConfig;
use tsuzuki_core::error::TsuzukiError;
use tsuzuki_core::models::{MediaKind, MediaRecord};
use tsuzuki_sources::SourceRegistry;

/// Application context: constructed once at startup and passed explicitly
/// to whatever needs it.
pub struct Runtime {
    store: StoreHandle,
    sources: Arc<SourceRegistry>,
    config: AppConfig,
}

impl Runtime {
    /// Open the persisted lists and spawn the store actor.
    pub fn new(config: AppConfig, sources: SourceRegistry) -> Result<Self, TsuzukiError> {
        let dir = config.ensure_data_dir()?;
        let store = StoreHandle::open(&dir)
            .ok_or_else(|| TsuzukiError::Config("failed to open list store".into()))?;
        Ok(Self {
            store,
            sources: Arc::new(sources),
            config,
        })
    }

    pub fn store(&self) -> StoreHandle {
        self.store.clone()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn sources(&self) -> Arc<SourceRegistry> {
        Arc::clone(&self.sources)
    }

    /// Search one source, degrading any adapter failure to an empty page.
    pub async fn search(&self, source_id: &str, page: u32, query: &str) -> Vec<MediaRecord> {
        let Some(source) = self.sources.get(source_id) else {
            debug!(source = source_id, "search against unknown source");
            return Vec::new();
        };
        match source.fetch_search(page, query).await {
            Ok(records) => records,
            Err(e) => {
                warn!(source = source_id, error = %e, "search failed");
                Vec::new()
            }
        }
    }

    /// Browse one source's listing, degrading any adapter failure to an
    /// empty page.
    pub async fn browse(&self, source_id: &str, page: u32) -> Vec<MediaRecord> {
        let Some(source) = self.sources.get(source_id) else {
            debug!(source = source_id, "browse against unknown source");
            return Vec::new();
        };
        match source.fetch_list(page).await {
            Ok(records) => records,
            Err(e) => {
                warn!(source = source_id, error = %e, "browse failed");
                Vec::new()
            }
        }
    }

    /// Start tracking a fetched record. When the identity resolver finds
    /// an entry already representing the same title, the record is
    /// attached to it as one more source snapshot; otherwise a fresh
    /// entry is seeded.
    pub async fn track(
        &self,
        kind: MediaKind,
        source_id: &str,
        record: MediaRecord,
    ) -> Result<Uuid, TsuzukiError> {
        match self.store.find_for_record(kind, record.clone()).await {
            Some(existing) => {
                self.store
                    .attach_source(existing.id, source_id, record)
                    .await?;
                Ok(existing.id)
            }
            None => self.store.add_entry(kind, source_id, record).await,
        }
    }

    /// Start the background favorites poller. The returned guard stops it
    /// cooperatively at the next favourite boundary.
    pub fn spawn_poller(&self, sink: Arc<dyn NotificationSink>) -> PollerGuard {
        let (tx, rx) = watch::channel(false);
        let poller = FavoritesPoller::new(
            self.store.clone(),
            Arc::clone(&self.sources),
            sink,
            &self.config,
        );
        let handle = tokio::spawn(poller.run(rx));
        PollerGuard {
            shutdown: tx,
            handle,
        }
    }
}

/// Handle to a running poller. Dropping the guard closes the shutdown
/// channel, which also stops the poller at its next check.
pub struct PollerGuard {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl PollerGuard {
    /// Request cooperative shutdown and wait for the loop to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.handle.await {
            warn!(error = %e, "poller task join failed");
        }
    }
}
