//! Near-duplicate detection over the canonical catalog.
//!
//! Flags performer names that look alike across the whole catalog, and
//! song titles that look alike within one performer's songs. Warnings
//! are advisory only; they never change what gets published.

use rustc_hash::FxHashSet;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

use crate::models::{CatalogEntry, SimilarityWarning, WarningKind};
use crate::normalize::fold_for_comparison;

/// Default score at or above which a pair is reported.
pub const DEFAULT_THRESHOLD: f64 = 0.85;

// ============================================================================
// Scoring
// ============================================================================

/// Normalized, symmetric string similarity: 1.0 identical, 0.0 unrelated.
pub trait SimilarityScorer {
    fn score(&self, a: &str, b: &str) -> f64;
}

/// Built-in metrics. All compare case- and width-folded text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SimilarityMetric {
    /// 1 - edit distance / longer length
    #[default]
    Levenshtein,
    JaroWinkler,
    /// Bigram overlap
    SorensenDice,
    /// Word-set overlap
    TokenJaccard,
}

impl std::str::FromStr for SimilarityMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "levenshtein" => Ok(Self::Levenshtein),
            "jaro-winkler" => Ok(Self::JaroWinkler),
            "sorensen-dice" => Ok(Self::SorensenDice),
            "token-jaccard" => Ok(Self::TokenJaccard),
            other => Err(format!(
                "unknown similarity metric '{}' (levenshtein, jaro-winkler, sorensen-dice, token-jaccard)",
                other
            )),
        }
    }
}

/// Jaccard similarity on whitespace tokens.
pub fn token_jaccard(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }

    let tokens_a: FxHashSet<&str> = a.split_whitespace().collect();
    let tokens_b: FxHashSet<&str> = b.split_whitespace().collect();

    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let intersection = tokens_a.intersection(&tokens_b).count();
    let union = tokens_a.union(&tokens_b).count();

    intersection as f64 / union as f64
}

impl SimilarityScorer for SimilarityMetric {
    fn score(&self, a: &str, b: &str) -> f64 {
        let a = fold_for_comparison(a);
        let b = fold_for_comparison(b);
        // Score in a fixed argument order so the result is exactly symmetric.
        let (x, y) = if a <= b { (&a, &b) } else { (&b, &a) };
        let score = match self {
            SimilarityMetric::Levenshtein => strsim::normalized_levenshtein(x, y),
            SimilarityMetric::JaroWinkler => strsim::jaro_winkler(x, y),
            SimilarityMetric::SorensenDice => strsim::sorensen_dice(x, y),
            SimilarityMetric::TokenJaccard => token_jaccard(x, y),
        };
        score.clamp(0.0, 1.0)
    }
}

// ============================================================================
// Scanner
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanConfig {
    pub enabled: bool,
    pub threshold: f64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

/// All unordered pairs of distinct items scoring at or above `threshold`.
/// `items` must already be unique; pairs come out in (i, j), i < j order.
fn sweep<'a>(
    items: &[&'a str],
    scorer: &dyn SimilarityScorer,
    threshold: f64,
) -> Vec<(&'a str, &'a str, f64)> {
    let mut pairs = Vec::new();
    for (i, a) in items.iter().enumerate() {
        for b in &items[i + 1..] {
            let score = scorer.score(a, b);
            if score >= threshold {
                pairs.push((*a, *b, score));
            }
        }
    }
    pairs
}

/// Scan the catalog for look-alike performers and, per performer, look-alike titles.
pub fn scan(
    catalog: &[CatalogEntry],
    scorer: &dyn SimilarityScorer,
    config: &ScanConfig,
) -> Vec<SimilarityWarning> {
    if !config.enabled {
        return Vec::new();
    }

    let mut songs: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for entry in catalog {
        songs
            .entry(entry.performer.as_str())
            .or_default()
            .insert(entry.title.as_str());
    }

    let mut warnings = Vec::new();

    let performers: Vec<&str> = songs.keys().copied().collect();
    for (a, b, score) in sweep(&performers, scorer, config.threshold) {
        warn!(score, "similar performers: '{}' / '{}'", a, b);
        warnings.push(SimilarityWarning {
            kind: WarningKind::Performer,
            scope: None,
            item_a: a.to_string(),
            item_b: b.to_string(),
            score,
        });
    }

    for (performer, titles) in &songs {
        if titles.len() < 2 {
            continue;
        }
        let titles: Vec<&str> = titles.iter().copied().collect();
        for (a, b, score) in sweep(&titles, scorer, config.threshold) {
            warn!(score, performer = %performer, "similar titles: '{}' / '{}'", a, b);
            warnings.push(SimilarityWarning {
                kind: WarningKind::Title,
                scope: Some(performer.to_string()),
                item_a: a.to_string(),
                item_b: b.to_string(),
                score,
            });
        }
    }

    warnings
}
