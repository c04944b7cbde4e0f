use serde::{Deserialize, Serialize};

/// The kind of serialized media a list tracks.
///
/// A closed set: every entry belongs to exactly one kind, and each kind
/// owns one persisted list file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaKind {
    Anime,
    Manga,
    Novel,
}

impl MediaKind {
    pub const ALL: &[MediaKind] = &[Self::Anime, Self::Manga, Self::Novel];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anime => "Anime",
            Self::Manga => "Manga",
            Self::Novel => "Novel",
        }
    }

    /// File stem of this kind's persisted list (lowercase, no spaces).
    pub fn as_file_str(&self) -> &'static str {
        match self {
            Self::Anime => "anime",
            Self::Manga => "manga",
            Self::Novel => "novel",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One installment (episode or chapter) of a media record.
///
/// The tracking core only ever inspects `title`; the remaining fields
/// belong to the presentation and playback layers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub resume_position: Option<f64>,
}

impl Segment {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }
}

/// One source's snapshot of a title: its naming and its installment list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaRecord {
    pub title: String,
    #[serde(default)]
    pub alt_titles: Vec<String>,
    /// Chronological, oldest first.
    #[serde(default)]
    pub segments: Vec<Segment>,
    /// Source-specific metadata, carried verbatim and never inspected.
    #[serde(default)]
    pub extra: serde_json::Value,
}

impl MediaRecord {
    /// Collect all title strings for this record (primary plus alternates).
    pub fn candidate_titles(&self) -> Vec<&str> {
        let mut titles = Vec::with_capacity(1 + self.alt_titles.len());
        titles.push(self.title.as_str());
        for t in &self.alt_titles {
            titles.push(t.as_str());
        }
        titles
    }

    /// The newest installment this source knows about.
    pub fn last_segment(&self) -> Option<&Segment> {
        self.segments.last()
    }
}
