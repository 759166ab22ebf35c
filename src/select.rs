//! Canonical selection: one catalog entry per (performer, normalized title).
//!
//! Within a group, regular recordings always outrank variant-only ones
//! (chorus-only, short, TV size, ...). Among the preferred subset the most
//! recent session wins; same-day sessions are ordered by session ID.
//! The winner's original title is published, never the normalized key.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::debug;

use crate::models::{CanonicalEntry, JoinedEntry};
use crate::normalize::normalize_title;

/// Grouping key: (performer, normalized title). Sorted so that group
/// iteration order never depends on input order.
pub type GroupKey = (String, String);

/// One joined entry with its precomputed variant flag.
#[derive(Debug, Clone, Copy)]
struct Candidate<'a> {
    entry: &'a JoinedEntry,
    is_variant: bool,
}

#[derive(Debug, Default)]
pub struct SelectionOutcome {
    /// Canonical entries in group-key order.
    pub entries: Vec<CanonicalEntry>,
    pub groups: usize,
    /// Groups with no regular recording at all
    pub variant_only_groups: usize,
}

/// Recency order: later date, then larger session ID.
/// Ties inside one session fall to the later offset, then the larger
/// timing ID, so the result is independent of input order.
pub fn compare_recency(a: &JoinedEntry, b: &JoinedEntry) -> Ordering {
    a.session
        .date
        .cmp(&b.session.date)
        .then_with(|| a.session.id.cmp(&b.session.id))
        .then_with(|| a.offset_sec.cmp(&b.offset_sec))
        .then_with(|| a.timing.id.cmp(&b.timing.id))
}

fn group_entries(entries: &[JoinedEntry]) -> BTreeMap<GroupKey, Vec<Candidate<'_>>> {
    let mut groups: BTreeMap<GroupKey, Vec<Candidate<'_>>> = BTreeMap::new();
    for entry in entries {
        let norm = normalize_title(entry.title());
        groups
            .entry((entry.performer().to_string(), norm.text))
            .or_default()
            .push(Candidate {
                entry,
                is_variant: norm.is_variant,
            });
    }
    groups
}

/// Pick the canonical recording of one group.
/// Returns the winner and whether it came from the variant subset.
fn select_canonical<'a>(candidates: &[Candidate<'a>]) -> Option<(&'a JoinedEntry, bool)> {
    let has_regular = candidates.iter().any(|c| !c.is_variant);
    candidates
        .iter()
        .filter(|c| !has_regular || !c.is_variant)
        .map(|c| c.entry)
        .max_by(|a, b| compare_recency(a, b))
        .map(|winner| (winner, !has_regular))
}

/// Reduce joined entries to exactly one canonical entry per group.
pub fn select(entries: &[JoinedEntry]) -> SelectionOutcome {
    let groups = group_entries(entries);
    let mut outcome = SelectionOutcome {
        entries: Vec::with_capacity(groups.len()),
        groups: groups.len(),
        variant_only_groups: 0,
    };

    for ((performer, norm_title), candidates) in &groups {
        let Some((winner, variant_only)) = select_canonical(candidates) else {
            continue;
        };
        if variant_only {
            outcome.variant_only_groups += 1;
        }
        debug!(
            performer = %performer,
            title = %norm_title,
            recordings = candidates.len(),
            session = winner.session.id,
            variant_only,
            "selected canonical recording"
        );
        outcome.entries.push(CanonicalEntry {
            performer: performer.clone(),
            title: winner.title().to_string(),
            latest_url: winner.timestamp_url(),
        });
    }

    outcome
}
