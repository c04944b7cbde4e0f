//! Media identity resolution across disagreeing sources.

use crate::models::{ListEntry, MediaRecord};

/// Find the tracked entry that represents the same title as a freshly
/// fetched record.
///
/// The candidate set is the record's primary title plus its alternates.
/// Entries are scanned in stored order against the union of titles over
/// every snapshot they hold; the first entry with a non-empty exact
/// intersection wins and later entries are never inspected. Matching is
/// exact string equality — no case folding, no fuzzy pass.
pub fn find_entry<'a>(record: &MediaRecord, entries: &'a [ListEntry]) -> Option<&'a ListEntry> {
    let candidates = record.candidate_titles();
    entries.iter().find(|entry| matches_entry(&candidates, entry))
}

/// Index variant of [`find_entry`] for callers that mutate the match.
pub fn find_entry_index(record: &MediaRecord, entries: &[ListEntry]) -> Option<usize> {
    let candidates = record.candidate_titles();
    entries.iter().position(|entry| matches_entry(&candidates, entry))
}

fn matches_entry(candidates: &[&str], entry: &ListEntry) -> bool {
    entry.content.values().any(|known| {
        known
            .candidate_titles()
            .iter()
            .any(|title| candidates.contains(title))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MediaKind;

    fn record(title: &str, alts: &[&str]) -> MediaRecord {
        MediaRecord {
            title: title.into(),
            alt_titles: alts.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    fn entry(titles: &[(&str, &[&str])]) -> ListEntry {
        let mut entry = ListEntry::seeded(MediaKind::Manga, "src-0", record(titles[0].0, titles[0].1));
        for (i, (title, alts)) in titles.iter().enumerate().skip(1) {
            entry.content.insert(format!("src-{i}"), record(title, alts));
        }
        entry
    }

    #[test]
    fn test_resolves_by_alt_title() {
        let entries = vec![entry(&[("X", &["Y"])])];

        let found = find_entry(&record("Y", &[]), &entries);
        assert_eq!(found.map(|e| e.id), Some(entries[0].id));

        assert!(find_entry(&record("Z", &[]), &entries).is_none());
    }

    #[test]
    fn test_candidate_alt_matches_entry_primary() {
        let entries = vec![entry(&[("Long Official Title", &[])])];

        let fetched = record("Short Title", &["Long Official Title"]);
        assert!(find_entry(&fetched, &entries).is_some());
    }

    #[test]
    fn test_first_match_wins() {
        let entries = vec![entry(&[("Shared", &[])]), entry(&[("Shared", &["Other"])])];

        let found = find_entry(&record("Shared", &[]), &entries).unwrap();
        assert_eq!(found.id, entries[0].id);
    }

    #[test]
    fn test_matching_is_exact() {
        let entries = vec![entry(&[("My Title", &[])])];

        assert!(find_entry(&record("my title", &[]), &entries).is_none());
        assert!(find_entry(&record("My Title ", &[]), &entries).is_none());
    }

    #[test]
    fn test_scans_every_snapshot_of_an_entry() {
        let entries = vec![entry(&[("Name on site A", &[]), ("Name on site B", &[])])];

        assert!(find_entry(&record("Name on site B", &[]), &entries).is_some());
    }

    #[test]
    fn test_index_variant_agrees() {
        let entries = vec![entry(&[("A", &[])]), entry(&[("B", &[])])];

        assert_eq!(find_entry_index(&record("B", &[]), &entries), Some(1));
        assert_eq!(find_entry_index(&record("C", &[]), &entries), None);
    }
}
