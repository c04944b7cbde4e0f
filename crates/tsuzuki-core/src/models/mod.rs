pub mod list;
pub mod media;

pub use list::{EntryStatus, Favourite, ListEntry, LoadingState, Rating};
pub use media::{MediaKind, MediaRecord, Segment};
