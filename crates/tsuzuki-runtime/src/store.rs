use std::collections::{HashMap, HashSet};
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use tsuzuki_core::error::TsuzukiError;
use tsuzuki_core::library::Library;
use tsuzuki_core::models::{
    EntryStatus, Favourite, ListEntry, LoadingState, MediaKind, MediaRecord, Rating,
};

/// Handle to the store actor: the single writer of list state.
///
/// Cloneable and cheap; every clone talks to the same actor thread, so
/// foreground edits and the background sweep can never interleave
/// partially. Reads return owned snapshots.
#[derive(Clone)]
pub struct StoreHandle {
    tx: mpsc::UnboundedSender<StoreCommand>,
}

enum StoreCommand {
    Favourites {
        reply: oneshot::Sender<Vec<Favourite>>,
    },
    Entries {
        kind: MediaKind,
        reply: oneshot::Sender<Vec<ListEntry>>,
    },
    Get {
        id: Uuid,
        reply: oneshot::Sender<Option<ListEntry>>,
    },
    FindForRecord {
        kind: MediaKind,
        record: Box<MediaRecord>,
        reply: oneshot::Sender<Option<ListEntry>>,
    },
    AddEntry {
        kind: MediaKind,
        source_id: String,
        record: Box<MediaRecord>,
        reply: oneshot::Sender<Result<Uuid, TsuzukiError>>,
    },
    DeleteEntry {
        id: Uuid,
        reply: oneshot::Sender<Result<(), TsuzukiError>>,
    },
    SetStatus {
        id: Uuid,
        status: EntryStatus,
        reply: oneshot::Sender<Result<(), TsuzukiError>>,
    },
    SetRating {
        id: Uuid,
        rating: Rating,
        reply: oneshot::Sender<Result<(), TsuzukiError>>,
    },
    SetBookmark {
        id: Uuid,
        segment_title: Option<String>,
        reply: oneshot::Sender<Result<(), TsuzukiError>>,
    },
    AttachSource {
        id: Uuid,
        source_id: String,
        record: Box<MediaRecord>,
        reply: oneshot::Sender<Result<(), TsuzukiError>>,
    },
    DetachSource {
        id: Uuid,
        source_id: String,
        reply: oneshot::Sender<Result<(), TsuzukiError>>,
    },
    ReplaceContent {
        id: Uuid,
        content: HashMap<String, MediaRecord>,
        reply: oneshot::Sender<Result<(), TsuzukiError>>,
    },
    ApplyStale {
        id: Uuid,
        now: DateTime<Utc>,
        threshold: Duration,
        reply: oneshot::Sender<Result<Option<EntryStatus>, TsuzukiError>>,
    },
    BeginRefresh {
        id: Uuid,
    },
    FinishRefresh {
        id: Uuid,
    },
}

impl StoreHandle {
    /// Open the library at `dir` and spawn the actor thread.
    pub fn open(dir: &Path) -> Option<Self> {
        let library = Library::open(dir)
            .map_err(|e| tracing::error!("failed to open list store: {e}"))
            .ok()?;

        let (tx, rx) = mpsc::unbounded_channel();

        std::thread::Builder::new()
            .name("store-actor".into())
            .spawn(move || actor_loop(library, rx))
            .map_err(|e| tracing::error!("failed to spawn store thread: {e}"))
            .ok()?;

        Some(Self { tx })
    }

    pub async fn favourites(&self) -> Vec<Favourite> {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(StoreCommand::Favourites { reply });
        rx.await.unwrap_or_default()
    }

    pub async fn entries(&self, kind: MediaKind) -> Vec<ListEntry> {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(StoreCommand::Entries { kind, reply });
        rx.await.unwrap_or_default()
    }

    pub async fn get(&self, id: Uuid) -> Option<ListEntry> {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(StoreCommand::Get { id, reply });
        rx.await.unwrap_or(None)
    }

    pub async fn find_for_record(&self, kind: MediaKind, record: MediaRecord) -> Option<ListEntry> {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(StoreCommand::FindForRecord {
            kind,
            record: Box::new(record),
            reply,
        });
        rx.await.unwrap_or(None)
    }

    pub async fn add_entry(
        &self,
        kind: MediaKind,
        source_id: impl Into<String>,
        record: MediaRecord,
    ) -> Result<Uuid, TsuzukiError> {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(StoreCommand::AddEntry {
            kind,
            source_id: source_id.into(),
            record: Box::new(record),
            reply,
        });
        rx.await.unwrap_or_else(|_| Err(closed()))
    }

    pub async fn delete_entry(&self, id: Uuid) -> Result<(), TsuzukiError> {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(StoreCommand::DeleteEntry { id, reply });
        rx.await.unwrap_or_else(|_| Err(closed()))
    }

    pub async fn set_status(&self, id: Uuid, status: EntryStatus) -> Result<(), TsuzukiError> {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(StoreCommand::SetStatus { id, status, reply });
        rx.await.unwrap_or_else(|_| Err(closed()))
    }

    pub async fn set_rating(&self, id: Uuid, rating: Rating) -> Result<(), TsuzukiError> {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(StoreCommand::SetRating { id, rating, reply });
        rx.await.unwrap_or_else(|_| Err(closed()))
    }

    pub async fn set_bookmark(
        &self,
        id: Uuid,
        segment_title: Option<String>,
    ) -> Result<(), TsuzukiError> {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(StoreCommand::SetBookmark {
            id,
            segment_title,
            reply,
        });
        rx.await.unwrap_or_else(|_| Err(closed()))
    }

    pub async fn attach_source(
        &self,
        id: Uuid,
        source_id: impl Into<String>,
        record: MediaRecord,
    ) -> Result<(), TsuzukiError> {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(StoreCommand::AttachSource {
            id,
            source_id: source_id.into(),
            record: Box::new(record),
            reply,
        });
        rx.await.unwrap_or_else(|_| Err(closed()))
    }

    pub async fn detach_source(
        &self,
        id: Uuid,
        source_id: impl Into<String>,
    ) -> Result<(), TsuzukiError> {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(StoreCommand::DetachSource {
            id,
            source_id: source_id.into(),
            reply,
        });
        rx.await.unwrap_or_else(|_| Err(closed()))
    }

    pub async fn replace_content(
        &self,
        id: Uuid,
        content: HashMap<String, MediaRecord>,
    ) -> Result<(), TsuzukiError> {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(StoreCommand::ReplaceContent { id, content, reply });
        rx.await.unwrap_or_else(|_| Err(closed()))
    }

    pub async fn apply_stale(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
        threshold: Duration,
    ) -> Result<Option<EntryStatus>, TsuzukiError> {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(StoreCommand::ApplyStale {
            id,
            now,
            threshold,
            reply,
        });
        rx.await.unwrap_or_else(|_| Err(closed()))
    }

    /// Mark an entry as having a poll in flight. Fire-and-forget; only
    /// affects the `loading` field of favourites snapshots.
    pub fn begin_refresh(&self, id: Uuid) {
        let _ = self.tx.send(StoreCommand::BeginRefresh { id });
    }

    pub fn finish_refresh(&self, id: Uuid) {
        let _ = self.tx.send(StoreCommand::FinishRefresh { id });
    }
}

fn closed() -> TsuzukiError {
    TsuzukiError::NotFound("store actor closed".into())
}

fn actor_loop(mut library: Library, mut rx: mpsc::UnboundedReceiver<StoreCommand>) {
    let mut refreshing: HashSet<Uuid> = HashSet::new();

    while let Some(cmd) = rx.blocking_recv() {
        match cmd {
            StoreCommand::Favourites { reply } => {
                let mut favourites = library.favourites();
                for favourite in &mut favourites {
                    if refreshing.contains(&favourite.entry.id) {
                        favourite.loading = LoadingState::Refreshing;
                    }
                }
                let _ = reply.send(favourites);
            }
            StoreCommand::Entries { kind, reply } => {
                let _ = reply.send(library.entries(kind).to_vec());
            }
            StoreCommand::Get { id, reply } => {
                let _ = reply.send(library.get(id).cloned());
            }
            StoreCommand::FindForRecord { kind, record, reply } => {
                let _ = reply.send(library.find_for_record(kind, &record).cloned());
            }
            StoreCommand::AddEntry {
                kind,
                source_id,
                record,
                reply,
            } => {
                let _ = reply.send(Ok(library.add_entry(kind, source_id, *record)));
            }
            StoreCommand::DeleteEntry { id, reply } => {
                let _ = reply.send(library.delete_entry(id));
            }
            StoreCommand::SetStatus { id, status, reply } => {
                let _ = reply.send(library.set_status(id, status));
            }
            StoreCommand::SetRating { id, rating, reply } => {
                let _ = reply.send(library.set_rating(id, rating));
            }
            StoreCommand::SetBookmark {
                id,
                segment_title,
                reply,
            } => {
                let _ = reply.send(library.set_bookmark(id, segment_title));
            }
            StoreCommand::AttachSource {
                id,
                source_id,
                record,
                reply,
            } => {
                let _ = reply.send(library.attach_source(id, source_id, *record));
            }
            StoreCommand::DetachSource {
                id,
                source_id,
                reply,
            } => {
                let _ = reply.send(library.detach_source(id, &source_id));
            }
            StoreCommand::ReplaceContent { id, content, reply } => {
                let _ = reply.send(library.replace_content(id, content));
            }
            StoreCommand::ApplyStale {
                id,
                now,
                threshold,
                reply,
            } => {
                let _ = reply.send(library.apply_stale(id, now, threshold));
            }
            StoreCommand::BeginRefresh { id } => {
                refreshing.insert(id);
            }
            StoreCommand::FinishRefresh { id } => {
                refreshing.remove(&id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsuzuki_core::models::Segment;

    fn record(title: &str, segments: &[&str]) -> MediaRecord {
        MediaRecord {
            title: title.into(),
            segments: segments.iter().map(|s| Segment::new(*s)).collect(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_basic_crud_through_actor() {
        let dir = tempfile::tempdir().unwrap();
        let store = StoreHandle::open(dir.path()).unwrap();

        let id = store
            .add_entry(MediaKind::Manga, "site-a", record("One", &["Ch.1"]))
            .await
            .unwrap();

        store.set_status(id, EntryStatus::Viewing).await.unwrap();
        store.set_bookmark(id, Some("Ch.1".into())).await.unwrap();

        let entry = store.get(id).await.unwrap();
        assert_eq!(entry.status, EntryStatus::Viewing);
        assert_eq!(entry.last_segment_title.as_deref(), Some("Ch.1"));

        store.delete_entry(id).await.unwrap();
        assert!(store.get(id).await.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_writers_serialize() {
        let dir = tempfile::tempdir().unwrap();
        let store = StoreHandle::open(dir.path()).unwrap();

        let id = store
            .add_entry(MediaKind::Manga, "seed", record("One", &[]))
            .await
            .unwrap();

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .attach_source(id, format!("site-{i}"), record("One", &[]))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        // Seed plus all sixteen attaches, none lost to interleaving.
        assert_eq!(store.get(id).await.unwrap().content.len(), 17);
    }

    #[tokio::test]
    async fn test_refresh_marker_surfaces_in_favourites() {
        let dir = tempfile::tempdir().unwrap();
        let store = StoreHandle::open(dir.path()).unwrap();

        let id = store
            .add_entry(MediaKind::Anime, "site-a", record("One", &["Ep.1"]))
            .await
            .unwrap();
        store.set_rating(id, Rating::Best).await.unwrap();

        store.begin_refresh(id);
        let favourites = store.favourites().await;
        assert_eq!(favourites.len(), 1);
        assert_eq!(favourites[0].loading, LoadingState::Refreshing);

        store.finish_refresh(id);
        let favourites = store.favourites().await;
        assert_eq!(favourites[0].loading, LoadingState::Idle);
    }

    #[tokio::test]
    async fn test_find_for_record_through_actor() {
        let dir = tempfile::tempdir().unwrap();
        let store = StoreHandle::open(dir.path()).unwrap();

        store
            .add_entry(MediaKind::Novel, "site-a", record("Tale", &[]))
            .await
            .unwrap();

        let found = store
            .find_for_record(MediaKind::Novel, record("Tale", &[]))
            .await;
        assert!(found.is_some());
    }
}
