//! Publication order for the catalog.

use crate::models::CatalogEntry;

/// Order by sort key, then title (plain lexical order), then performer so
/// that two performers sharing a sort key and a title still have a fixed
/// order. The sort is stable.
pub fn sequence(mut entries: Vec<CatalogEntry>) -> Vec<CatalogEntry> {
    entries.sort_by(|a, b| {
        a.sort_key
            .cmp(&b.sort_key)
            .then_with(|| a.title.cmp(&b.title))
            .then_with(|| a.performer.cmp(&b.performer))
    });
    entries
}
