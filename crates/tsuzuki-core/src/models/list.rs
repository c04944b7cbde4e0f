use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::media::{MediaKind, MediaRecord};

/// User's tracking status for a list entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryStatus {
    ToView,
    Waiting,
    Viewing,
    Completed,
    Dropped,
}

impl EntryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ToView => "To View",
            Self::Waiting => "Waiting",
            Self::Viewing => "Viewing",
            Self::Completed => "Completed",
            Self::Dropped => "Dropped",
        }
    }

    pub const ALL: &[EntryStatus] = &[
        Self::ToView,
        Self::Waiting,
        Self::Viewing,
        Self::Completed,
        Self::Dropped,
    ];
}

impl std::fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User's rating for a list entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rating {
    #[default]
    None,
    Horrible,
    Bad,
    Good,
    Best,
}

impl Rating {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "Not Rated",
            Self::Horrible => "Horrible",
            Self::Bad => "Bad",
            Self::Good => "Good",
            Self::Best => "Best",
        }
    }

    pub const ALL: &[Rating] = &[
        Self::None,
        Self::Horrible,
        Self::Bad,
        Self::Good,
        Self::Best,
    ];
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One user-tracked title, aggregating per-source snapshots of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListEntry {
    /// Immutable for the entry's lifetime.
    pub id: Uuid,
    pub kind: MediaKind,
    /// sourceId → that source's snapshot. Never empty while the entry
    /// exists; removing the last key removes the entry.
    pub content: HashMap<String, MediaRecord>,
    /// The user's bookmark: the last installment they consumed.
    pub last_segment_title: Option<String>,
    pub status: EntryStatus,
    pub rating: Rating,
    pub last_viewed: Option<DateTime<Utc>>,
    pub created: DateTime<Utc>,
}

impl ListEntry {
    /// Seed a new entry from a single source's record.
    pub fn seeded(kind: MediaKind, source_id: impl Into<String>, record: MediaRecord) -> Self {
        let mut content = HashMap::new();
        content.insert(source_id.into(), record);
        Self {
            id: Uuid::new_v4(),
            kind,
            content,
            last_segment_title: None,
            status: EntryStatus::ToView,
            rating: Rating::None,
            last_viewed: None,
            created: Utc::now(),
        }
    }

    /// Display title: the first snapshot that carries a non-empty title.
    pub fn primary_title(&self) -> &str {
        self.content
            .values()
            .map(|r| r.title.as_str())
            .find(|t| !t.is_empty())
            .unwrap_or("Unknown")
    }
}

/// Transient per-favourite poll state. Lives only on [`Favourite`] and is
/// never written to disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadingState {
    #[default]
    Idle,
    Refreshing,
}

/// A top-rated entry surfaced for periodic polling.
#[derive(Debug, Clone)]
pub struct Favourite {
    pub entry: ListEntry,
    pub loading: LoadingState,
}
