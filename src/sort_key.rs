//! Performer sort keys.
//!
//! The catalog only needs a `SortKeyProvider`; it passes performer names
//! through untouched and uses whatever key comes back. The provided
//! implementation transliterates names to ASCII and lets a fixed override
//! table supply readings the transliteration gets wrong.

use rustc_hash::FxHashMap;
use std::path::Path;

use crate::error::Result;
use crate::models::{CanonicalEntry, CatalogEntry};
use crate::normalize::fold_to_ascii;
use crate::tsv::read_sort_key_overrides;

/// Maps a performer name to the key the catalog is ordered by.
pub trait SortKeyProvider {
    fn sort_key(&self, performer: &str) -> String;
}

/// Immutable artist → reading table.
#[derive(Debug, Clone, Default)]
pub struct SortKeyOverrides {
    readings: FxHashMap<String, String>,
}

impl SortKeyOverrides {
    pub fn new(readings: FxHashMap<String, String>) -> Self {
        Self { readings }
    }

    /// Load the override TSV. A missing file is an empty table.
    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self::new(read_sort_key_overrides(path)?))
    }

    pub fn get(&self, performer: &str) -> Option<&str> {
        self.readings.get(performer).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

/// Automatic transliteration with per-artist overrides.
/// Override readings are folded the same way, so both kinds of key
/// sort on one scale.
#[derive(Debug, Clone, Default)]
pub struct TransliterationSortKeys {
    overrides: SortKeyOverrides,
}

impl TransliterationSortKeys {
    pub fn new(overrides: SortKeyOverrides) -> Self {
        Self { overrides }
    }
}

impl SortKeyProvider for TransliterationSortKeys {
    fn sort_key(&self, performer: &str) -> String {
        match self.overrides.get(performer) {
            Some(reading) => fold_to_ascii(reading),
            None => fold_to_ascii(performer),
        }
    }
}

/// Attach sort keys to canonical entries. The provider is asked once per
/// distinct performer, so every entry of a performer gets the same key.
pub fn assign_sort_keys(
    entries: Vec<CanonicalEntry>,
    provider: &dyn SortKeyProvider,
) -> Vec<CatalogEntry> {
    let mut cache: FxHashMap<String, String> = FxHashMap::default();
    entries
        .into_iter()
        .map(|e| {
            let sort_key = cache
                .entry(e.performer.clone())
                .or_insert_with(|| provider.sort_key(&e.performer))
                .clone();
            CatalogEntry {
                performer: e.performer,
                sort_key,
                title: e.title,
                latest_url: e.latest_url,
            }
        })
        .collect()
}
