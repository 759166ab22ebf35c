//! Catalog diffing against the previously published snapshot.

use std::collections::BTreeMap;

use crate::models::{CatalogEntry, DiffResult};

fn index(entries: &[CatalogEntry]) -> BTreeMap<(&str, &str), &CatalogEntry> {
    entries.iter().map(|e| (e.identity(), e)).collect()
}

/// Compare two snapshots by `(performer, title)`.
///
/// `added` and `updated` follow the order of `current`, `removed` the
/// order of `previous`. Entries whose key is in both with the same URL
/// and sort key appear nowhere. Neither snapshot is modified.
pub fn diff_catalogs(previous: &[CatalogEntry], current: &[CatalogEntry]) -> DiffResult {
    let prev_index = index(previous);
    let curr_index = index(current);

    let mut result = DiffResult::default();

    for entry in current {
        match prev_index.get(&entry.identity()) {
            None => result.added.push(entry.clone()),
            Some(old) if old.latest_url != entry.latest_url || old.sort_key != entry.sort_key => {
                result.updated.push(((*old).clone(), entry.clone()));
            }
            Some(_) => {}
        }
    }

    result.removed = previous
        .iter()
        .filter(|e| !curr_index.contains_key(&e.identity()))
        .cloned()
        .collect();

    result
}
