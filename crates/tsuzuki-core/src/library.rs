//! The persisted collection of tracked entries, one list per media kind.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::TsuzukiError;
use crate::models::{
    EntryStatus, Favourite, ListEntry, LoadingState, MediaKind, MediaRecord, Rating,
};
use crate::resolver;
use crate::staleness;

/// The single writer of on-disk list state.
///
/// One ordered list of entries per media kind, each backed by a JSON file
/// under `dir`. Every completed mutation writes the affected list back to
/// disk in full. A failed write is logged and the in-memory list stays
/// authoritative for the running session.
pub struct Library {
    dir: PathBuf,
    lists: HashMap<MediaKind, Vec<ListEntry>>,
}

impl Library {
    /// Open the lists stored under `dir`. A missing list file is treated
    /// as an empty list and created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, TsuzukiError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;

        let mut lists = HashMap::new();
        for kind in MediaKind::ALL {
            let path = Self::list_path(&dir, *kind);
            let entries: Vec<ListEntry> = if path.exists() {
                let raw = std::fs::read_to_string(&path)?;
                serde_json::from_str(&raw)?
            } else {
                std::fs::write(&path, "[]\n")?;
                Vec::new()
            };
            lists.insert(*kind, entries);
        }

        Ok(Self { dir, lists })
    }

    fn list_path(dir: &Path, kind: MediaKind) -> PathBuf {
        dir.join(format!("{}.json", kind.as_file_str()))
    }

    // ── Reads ───────────────────────────────────────────────────

    pub fn entries(&self, kind: MediaKind) -> &[ListEntry] {
        self.lists.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn get(&self, id: Uuid) -> Option<&ListEntry> {
        self.locate(id)
            .and_then(|(kind, idx)| self.lists.get(&kind).and_then(|list| list.get(idx)))
    }

    /// All entries across kinds, in kind order then stored order.
    pub fn all_entries(&self) -> impl Iterator<Item = &ListEntry> {
        MediaKind::ALL
            .iter()
            .flat_map(|kind| self.entries(*kind).iter())
    }

    /// Top-rated entries across all kinds, most recently viewed first,
    /// never-viewed entries last.
    pub fn favourites(&self) -> Vec<Favourite> {
        let mut entries: Vec<&ListEntry> = self
            .all_entries()
            .filter(|e| e.rating == Rating::Best)
            .collect();
        entries.sort_by(|a, b| match (a.last_viewed, b.last_viewed) {
            (Some(a), Some(b)) => b.cmp(&a),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
        entries
            .into_iter()
            .map(|entry| Favourite {
                entry: entry.clone(),
                loading: LoadingState::Idle,
            })
            .collect()
    }

    /// Resolve a fetched record against the stored entries of one kind.
    pub fn find_for_record(&self, kind: MediaKind, record: &MediaRecord) -> Option<&ListEntry> {
        resolver::find_entry(record, self.entries(kind))
    }

    // ── Mutations (each persists the affected list) ─────────────

    /// Seed a new entry from one source's record. Returns the new id.
    pub fn add_entry(
        &mut self,
        kind: MediaKind,
        source_id: impl Into<String>,
        record: MediaRecord,
    ) -> Uuid {
        let entry = ListEntry::seeded(kind, source_id, record);
        let id = entry.id;
        self.lists.entry(kind).or_default().push(entry);
        self.persist(kind);
        id
    }

    /// Remove an entry entirely.
    pub fn delete_entry(&mut self, id: Uuid) -> Result<(), TsuzukiError> {
        let (kind, idx) = self.require(id)?;
        self.lists.entry(kind).or_default().remove(idx);
        self.persist(kind);
        Ok(())
    }

    pub fn set_status(&mut self, id: Uuid, status: EntryStatus) -> Result<(), TsuzukiError> {
        let (kind, idx) = self.require(id)?;
        self.lists.entry(kind).or_default()[idx].status = status;
        self.persist(kind);
        Ok(())
    }

    pub fn set_rating(&mut self, id: Uuid, rating: Rating) -> Result<(), TsuzukiError> {
        let (kind, idx) = self.require(id)?;
        self.lists.entry(kind).or_default()[idx].rating = rating;
        self.persist(kind);
        Ok(())
    }

    /// Set or clear the user's bookmark. Setting it also stamps
    /// `last_viewed`; the two never change separately.
    pub fn set_bookmark(
        &mut self,
        id: Uuid,
        segment_title: Option<String>,
    ) -> Result<(), TsuzukiError> {
        let (kind, idx) = self.require(id)?;
        let entry = &mut self.lists.entry(kind).or_default()[idx];
        let stamp = segment_title.is_some();
        entry.last_segment_title = segment_title;
        if stamp {
            entry.last_viewed = Some(Utc::now());
        }
        self.persist(kind);
        Ok(())
    }

    /// Insert or replace one source's snapshot on an entry.
    pub fn attach_source(
        &mut self,
        id: Uuid,
        source_id: impl Into<String>,
        record: MediaRecord,
    ) -> Result<(), TsuzukiError> {
        let (kind, idx) = self.require(id)?;
        self.lists.entry(kind).or_default()[idx]
            .content
            .insert(source_id.into(), record);
        self.persist(kind);
        Ok(())
    }

    /// Remove one source's snapshot. Removing the last one deletes the
    /// entry itself.
    pub fn detach_source(&mut self, id: Uuid, source_id: &str) -> Result<(), TsuzukiError> {
        let (kind, idx) = self.require(id)?;
        let list = self.lists.entry(kind).or_default();
        if list[idx].content.remove(source_id).is_none() {
            debug!(%id, source = source_id, "detach of unknown source ignored");
            return Ok(());
        }
        if list[idx].content.is_empty() {
            list.remove(idx);
        }
        self.persist(kind);
        Ok(())
    }

    /// Swap an entry's whole content map, e.g. after a poll refresh. An
    /// empty replacement is refused; entries never exist without content.
    pub fn replace_content(
        &mut self,
        id: Uuid,
        content: HashMap<String, MediaRecord>,
    ) -> Result<(), TsuzukiError> {
        if content.is_empty() {
            warn!(%id, "refused to replace entry content with an empty map");
            return Ok(());
        }
        let (kind, idx) = self.require(id)?;
        self.lists.entry(kind).or_default()[idx].content = content;
        self.persist(kind);
        Ok(())
    }

    /// Run the stale-status rule against one entry, persisting a changed
    /// status. Returns the rule's decision.
    pub fn apply_stale(
        &mut self,
        id: Uuid,
        now: DateTime<Utc>,
        threshold: Duration,
    ) -> Result<Option<EntryStatus>, TsuzukiError> {
        let (kind, idx) = self.require(id)?;
        let list = self.lists.entry(kind).or_default();
        let decision = staleness::stale_transition(&list[idx], now, threshold);
        let changed = match decision {
            Some(status) if status != list[idx].status => {
                list[idx].status = status;
                true
            }
            _ => false,
        };
        if changed {
            self.persist(kind);
        }
        Ok(decision)
    }

    // ── Internals ───────────────────────────────────────────────

    fn locate(&self, id: Uuid) -> Option<(MediaKind, usize)> {
        for kind in MediaKind::ALL {
            if let Some(idx) = self.entries(*kind).iter().position(|e| e.id == id) {
                return Some((*kind, idx));
            }
        }
        None
    }

    fn require(&self, id: Uuid) -> Result<(MediaKind, usize), TsuzukiError> {
        self.locate(id).ok_or_else(|| {
            debug!(%id, "entry not found in store");
            TsuzukiError::NotFound(id.to_string())
        })
    }

    /// Write one kind's list back to disk in full.
    fn persist(&self, kind: MediaKind) {
        let path = Self::list_path(&self.dir, kind);
        if let Err(e) = self.write_list(&path, kind) {
            warn!(kind = %kind, path = %path.display(), error = %e, "failed to persist list");
        }
    }

    fn write_list(&self, path: &Path, kind: MediaKind) -> Result<(), TsuzukiError> {
        let json = serde_json::to_string_pretty(self.entries(kind))?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
