//! Stale-status transitions for inactive entries.

use chrono::{DateTime, Duration, Utc};

use crate::models::{EntryStatus, ListEntry};

/// Default inactivity threshold in days.
pub const DEFAULT_STALE_AFTER_DAYS: i64 = 5;

/// Decide the stale-status transition for one entry, if any.
///
/// `Completed`, `ToView`, and `Viewing` are user-set and never touched by
/// this rule. An entry viewed within `threshold` is left alone. A stale
/// entry moves to `Waiting` when some snapshot's newest segment equals the
/// user's bookmark (inactive but not behind), otherwise to `Dropped`.
///
/// This is a pure decision over the entry's current state: re-running it
/// with unchanged inputs yields the same answer, so a sweep may invoke it
/// repeatedly without statuses toggling.
pub fn stale_transition(
    entry: &ListEntry,
    now: DateTime<Utc>,
    threshold: Duration,
) -> Option<EntryStatus> {
    match entry.status {
        EntryStatus::Completed | EntryStatus::ToView | EntryStatus::Viewing => return None,
        EntryStatus::Waiting | EntryStatus::Dropped => {}
    }

    let last_viewed = entry.last_viewed.unwrap_or(now);
    if now - last_viewed <= threshold {
        return None;
    }

    let caught_up = entry.content.values().any(|record| {
        record.last_segment().map(|s| s.title.as_str()) == entry.last_segment_title.as_deref()
    });

    Some(if caught_up {
        EntryStatus::Waiting
    } else {
        EntryStatus::Dropped
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MediaKind, MediaRecord, Segment};

    fn entry(status: EntryStatus, days_ago: i64, bookmark: &str, source_last: &str) -> ListEntry {
        let record = MediaRecord {
            title: "Title".into(),
            segments: vec![Segment::new("Ch.1"), Segment::new(source_last)],
            ..Default::default()
        };
        let mut entry = ListEntry::seeded(MediaKind::Manga, "a", record);
        entry.status = status;
        entry.last_segment_title = Some(bookmark.into());
        entry.last_viewed = Some(Utc::now() - Duration::days(days_ago));
        entry
    }

    fn threshold() -> Duration {
        Duration::days(DEFAULT_STALE_AFTER_DAYS)
    }

    #[test]
    fn test_stale_and_caught_up_waits() {
        let entry = entry(EntryStatus::Dropped, 6, "Ch.5", "Ch.5");
        assert_eq!(
            stale_transition(&entry, Utc::now(), threshold()),
            Some(EntryStatus::Waiting)
        );
    }

    #[test]
    fn test_stale_and_behind_drops() {
        let entry = entry(EntryStatus::Waiting, 6, "Ch.5", "Ch.6");
        assert_eq!(
            stale_transition(&entry, Utc::now(), threshold()),
            Some(EntryStatus::Dropped)
        );
    }

    #[test]
    fn test_recently_viewed_is_untouched() {
        let entry = entry(EntryStatus::Waiting, 2, "Ch.5", "Ch.6");
        assert_eq!(stale_transition(&entry, Utc::now(), threshold()), None);
    }

    #[test]
    fn test_never_viewed_counts_as_fresh() {
        let mut entry = entry(EntryStatus::Waiting, 6, "Ch.5", "Ch.6");
        entry.last_viewed = None;
        assert_eq!(stale_transition(&entry, Utc::now(), threshold()), None);
    }

    #[test]
    fn test_user_set_statuses_are_untouched() {
        for status in [
            EntryStatus::Completed,
            EntryStatus::ToView,
            EntryStatus::Viewing,
        ] {
            let entry = entry(status, 30, "Ch.5", "Ch.6");
            assert_eq!(stale_transition(&entry, Utc::now(), threshold()), None);
        }
    }

    #[test]
    fn test_idempotent_across_repeat_invocations() {
        let mut entry = entry(EntryStatus::Waiting, 6, "Ch.5", "Ch.6");
        let now = Utc::now();

        let first = stale_transition(&entry, now, threshold());
        assert_eq!(first, Some(EntryStatus::Dropped));
        entry.status = first.unwrap();

        let second = stale_transition(&entry, now, threshold());
        assert_eq!(second, Some(EntryStatus::Dropped));
    }

    #[test]
    fn test_any_snapshot_can_confirm_the_bookmark() {
        let mut entry = entry(EntryStatus::Waiting, 6, "Ch.5", "Ch.6");
        entry.content.insert(
            "b".into(),
            MediaRecord {
                title: "Title".into(),
                segments: vec![Segment::new("Ch.5")],
                ..Default::default()
            },
        );
        assert_eq!(
            stale_transition(&entry, Utc::now(), threshold()),
            Some(EntryStatus::Waiting)
        );
    }
}
