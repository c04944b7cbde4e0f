//! Cross-source "latest installment" aggregation.

use crate::models::ListEntry;

/// Compute the single newest installment label across every snapshot an
/// entry holds.
///
/// Sources enumerate the same story under different segment titling with
/// no shared numeric key, so no single source's ordering is trusted
/// outright. Each snapshot either bootstraps the marker (first snapshot
/// with any segments) or advances it — and advancing requires the current
/// marker to appear in that snapshot's own segment list with a different
/// newest segment.
///
/// Returns `None` exactly when every snapshot has an empty segment list.
/// When sources genuinely conflict the result depends on the iteration
/// order of `content`; that order sensitivity is inherited behavior, kept
/// as-is.
pub fn latest_installment(entry: &ListEntry) -> Option<String> {
    let mut current = String::new();

    for record in entry.content.values() {
        let Some(source_last) = record.last_segment() else {
            continue;
        };
        let source_last = source_last.title.as_str();

        let marker_confirmed =
            !current.is_empty() && record.segments.iter().any(|s| s.title == current);

        if marker_confirmed && source_last != current {
            current = source_last.to_string();
        } else if current.is_empty() {
            current = source_last.to_string();
        }
    }

    if current.is_empty() {
        None
    } else {
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MediaKind, MediaRecord, Segment};

    fn record(segments: &[&str]) -> MediaRecord {
        MediaRecord {
            title: "Title".into(),
            segments: segments.iter().map(|s| Segment::new(*s)).collect(),
            ..Default::default()
        }
    }

    fn entry(sources: &[(&str, &[&str])]) -> ListEntry {
        let mut entry =
            ListEntry::seeded(MediaKind::Anime, sources[0].0.to_string(), record(sources[0].1));
        for (source_id, segments) in sources.iter().skip(1) {
            entry
                .content
                .insert(source_id.to_string(), record(segments));
        }
        entry
    }

    #[test]
    fn test_single_source_uses_its_last_segment() {
        let entry = entry(&[("a", &["Ch.1", "Ch.2", "Ch.3"])]);
        assert_eq!(latest_installment(&entry).as_deref(), Some("Ch.3"));
    }

    #[test]
    fn test_advances_when_marker_confirmed() {
        // Either iteration order converges: the shorter source confirms
        // the marker but cannot advance past the longer one's tail.
        let entry = entry(&[("a", &["Ch.1", "Ch.2"]), ("b", &["Ch.1", "Ch.2", "Ch.3"])]);
        assert_eq!(latest_installment(&entry).as_deref(), Some("Ch.3"));
    }

    #[test]
    fn test_does_not_jump_to_foreign_numbering() {
        // The second source never lists the marker, so it cannot advance
        // it regardless of iteration order; the result is whichever
        // source bootstrapped first.
        let entry = entry(&[("a", &["Ch.1", "Ch.2"]), ("b", &["Episode One"])]);
        let latest = latest_installment(&entry).unwrap();
        assert!(latest == "Ch.2" || latest == "Episode One");
    }

    #[test]
    fn test_sources_without_segments_are_skipped() {
        let entry = entry(&[("a", &[]), ("b", &["Ch.1"]), ("c", &[])]);
        assert_eq!(latest_installment(&entry).as_deref(), Some("Ch.1"));
    }

    #[test]
    fn test_absent_iff_all_segment_lists_empty() {
        let entry = entry(&[("a", &[]), ("b", &[])]);
        assert_eq!(latest_installment(&entry), None);
    }

    #[test]
    fn test_agreeing_sources_are_stable() {
        let entry = entry(&[
            ("a", &["Ch.1", "Ch.2"]),
            ("b", &["Ch.1", "Ch.2"]),
            ("c", &["Ch.1", "Ch.2"]),
        ]);
        assert_eq!(latest_installment(&entry).as_deref(), Some("Ch.2"));
    }
}
