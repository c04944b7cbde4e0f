use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use tsuzuki_core::aggregator::latest_installment;
use tsuzuki_core::config::AppConfig;
use tsuzuki_core::models::{ListEntry, MediaRecord};
use tsuzuki_sources::SourceRegistry;

use crate::store::StoreHandle;

/// Receiver of the once-per-sweep update notification.
///
/// Called at most once per sweep, and only when at least one favourite
/// gained a new installment.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, title: &str, subtitle: &str);
}

/// The first new installment found during a sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepUpdate {
    pub title: String,
    pub installment: String,
}

/// Outcome of one favorites sweep.
#[derive(Debug, Clone, Default)]
pub struct SweepReport {
    /// Favourites actually refreshed (a cancelled sweep stops early).
    pub polled: usize,
    /// Favourites whose latest installment moved past the bookmark.
    pub updated: usize,
    pub first_update: Option<SweepUpdate>,
}

/// Background sweep over all top-rated entries.
///
/// Favourites are refreshed strictly one after another with a fixed
/// politeness delay in between, bounding the outbound request rate; the
/// per-favourite refresh fans out one detail fetch per tracked source and
/// joins before moving on.
pub struct FavoritesPoller {
    store: StoreHandle,
    sources: Arc<SourceRegistry>,
    sink: Arc<dyn NotificationSink>,
    interval: Duration,
    politeness_delay: Duration,
    request_timeout: Duration,
    stale_threshold: chrono::Duration,
}

impl FavoritesPoller {
    pub fn new(
        store: StoreHandle,
        sources: Arc<SourceRegistry>,
        sink: Arc<dyn NotificationSink>,
        config: &AppConfig,
    ) -> Self {
        Self {
            store,
            sources,
            sink,
            interval: Duration::from_secs(config.poller.interval_secs),
            politeness_delay: Duration::from_secs(config.poller.politeness_delay_secs),
            request_timeout: Duration::from_secs(config.poller.request_timeout_secs),
            stale_threshold: config.stale_threshold(),
        }
    }

    /// Run sweeps on the configured cadence until `shutdown` flips.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let report = self.sweep(&mut shutdown).await;
                    info!(
                        polled = report.polled,
                        updated = report.updated,
                        "favorites sweep finished"
                    );
                    if *shutdown.borrow() {
                        debug!("favorites poller stopped");
                        break;
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        debug!("favorites poller stopped");
                        break;
                    }
                }
            }
        }
    }

    /// One full pass over the favourites. Cancellation is honored at each
    /// favourite boundary; a favourite mid-refresh always completes.
    pub async fn sweep(&self, shutdown: &mut watch::Receiver<bool>) -> SweepReport {
        let favourites = self.store.favourites().await;
        let total = favourites.len();
        let mut report = SweepReport::default();

        for (index, favourite) in favourites.into_iter().enumerate() {
            if *shutdown.borrow() {
                debug!(polled = report.polled, total, "sweep cancelled");
                break;
            }

            let entry = favourite.entry;
            let saved = entry.last_segment_title.clone();

            self.store.begin_refresh(entry.id);
            let refreshed = self.refresh_content(&entry).await;

            if let Err(e) = self.store.replace_content(entry.id, refreshed).await {
                debug!(title = %entry.primary_title(), error = %e, "refresh write-back skipped");
            }

            let fetched = match self.store.get(entry.id).await {
                Some(current) => latest_installment(&current),
                None => None,
            };

            if let (Some(saved), Some(fetched)) = (saved.as_deref(), fetched.as_deref()) {
                if saved != fetched {
                    if report.first_update.is_none() {
                        report.first_update = Some(SweepUpdate {
                            title: entry.primary_title().to_string(),
                            installment: fetched.to_string(),
                        });
                    }
                    report.updated += 1;
                    info!(
                        title = %entry.primary_title(),
                        saved,
                        fetched,
                        "new installment detected"
                    );
                }
            }

            if let Err(e) = self
                .store
                .apply_stale(entry.id, Utc::now(), self.stale_threshold)
                .await
            {
                debug!(title = %entry.primary_title(), error = %e, "stale check skipped");
            }

            self.store.finish_refresh(entry.id);
            report.polled += 1;

            if index + 1 < total {
                tokio::select! {
                    _ = tokio::time::sleep(self.politeness_delay) => {}
                    changed = shutdown.changed() => {
                        // A closed channel counts as cancellation too.
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }
        }

        if report.updated > 0 {
            if let Some(update) = &report.first_update {
                let subtitle = if report.updated > 1 {
                    format!("{} and {} others", update.installment, report.updated - 1)
                } else {
                    update.installment.clone()
                };
                self.sink.notify(&update.title, &subtitle);
            }
        }

        report
    }

    /// Refresh every source snapshot of one entry concurrently. A source
    /// whose call fails, times out, or is not registered contributes its
    /// prior snapshot unchanged.
    async fn refresh_content(&self, entry: &ListEntry) -> HashMap<String, MediaRecord> {
        let fetches = entry.content.iter().map(|(source_id, record)| {
            let source = self.sources.get(source_id);
            let timeout = self.request_timeout;
            async move {
                let updated = match source {
                    Some(source) => {
                        match tokio::time::timeout(timeout, source.fetch_details(record)).await {
                            Ok(Ok(Some(updated))) => Some(updated),
                            Ok(Ok(None)) => {
                                debug!(source = %source_id, title = %record.title, "source no longer lists title");
                                None
                            }
                            Ok(Err(e)) => {
                                warn!(source = %source_id, title = %record.title, error = %e, "detail refresh failed");
                                None
                            }
                            Err(_) => {
                                warn!(source = %source_id, title = %record.title, "detail refresh timed out");
                                None
                            }
                        }
                    }
                    None => {
                        debug!(source = %source_id, "source not registered, keeping prior snapshot");
                        None
                    }
                };
                (
                    source_id.clone(),
                    updated.unwrap_or_else(|| record.clone()),
                )
            }
        });

        join_all(fetches).await.into_iter().collect()
    }
}
