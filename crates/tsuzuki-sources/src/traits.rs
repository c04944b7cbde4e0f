use async_trait::async_trait;
use thiserror::Error;

use tsuzuki_core::models::{MediaKind, MediaRecord};

/// Failure modes of a source adapter call.
///
/// Callers treat every variant as "no data" — an adapter failure never
/// propagates as a crash and never aborts a sweep.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("network error: {0}")]
    Network(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("source unavailable: {0}")]
    Unavailable(String),
}

/// A content source serving structured media records.
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Stable identifier; the key under which this source's snapshots are
    /// stored in an entry's content map.
    fn id(&self) -> &str;

    /// Which media kind this source serves.
    fn kind(&self) -> MediaKind;

    /// Fetch one page of the source's browse listing.
    async fn fetch_list(&self, page: u32) -> Result<Vec<MediaRecord>, SourceError>;

    /// Fetch one page of search results for a query.
    async fn fetch_search(&self, page: u32, query: &str) -> Result<Vec<MediaRecord>, SourceError>;

    /// Fetch the full record for a previously listed title. `Ok(None)`
    /// means the source no longer carries it.
    async fn fetch_details(&self, record: &MediaRecord) -> Result<Option<MediaRecord>, SourceError>;
}
