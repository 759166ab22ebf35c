//! Single-pass reconciliation run.
//!
//! load → join → select → sort keys → sequence → (scan, diff) → persist
//!
//! Loading is finished before any processing starts; only load failures
//! are errors. A failed write is reported in the result together with the
//! catalog and diff that would have been written.

use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

use crate::diff::diff_catalogs;
use crate::error::Result;
use crate::join::join;
use crate::models::{
    CatalogEntry, DiffResult, RowWarning, RunStats, Session, SimilarityWarning, TimingRecord,
    WarningKind,
};
use crate::progress::{Phase, PhaseSpinner};
use crate::safety::validate_output_path;
use crate::select::select;
use crate::sequence::sequence;
use crate::similarity::{scan, ScanConfig, SimilarityScorer};
use crate::sort_key::{assign_sort_keys, SortKeyProvider};
use crate::tsv;

/// File locations for one run. `catalog` is both the baseline and the output.
#[derive(Debug, Clone)]
pub struct RunPaths {
    pub sessions: PathBuf,
    pub timings: PathBuf,
    pub catalog: PathBuf,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub scan: ScanConfig,
    pub dry_run: bool,
}

/// In-memory result of reconciling one set of inputs.
#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    /// Catalog in publication order
    pub catalog: Vec<CatalogEntry>,
    pub similarity_warnings: Vec<SimilarityWarning>,
    pub row_warnings: Vec<RowWarning>,
    pub stats: RunStats,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistOutcome {
    Written { path: PathBuf, rows: usize },
    DryRun,
    Failed { path: PathBuf, reason: String },
}

impl PersistOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, PersistOutcome::Failed { .. })
    }
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub reconciliation: Reconciliation,
    pub diff: DiffResult,
    pub persist: PersistOutcome,
}

/// Turn raw sessions and timing records into a sequenced catalog.
pub fn reconcile(
    sessions: &[Session],
    timings: &[TimingRecord],
    sort_keys: &dyn SortKeyProvider,
    scorer: &dyn SimilarityScorer,
    scan_config: &ScanConfig,
) -> Reconciliation {
    let mut stats = RunStats {
        sessions: sessions.len(),
        timing_records: timings.len(),
        ..Default::default()
    };

    let joined = join(sessions, timings);
    stats.joined = joined.entries.len();
    for warning in &joined.warnings {
        stats.record_drop(warning);
    }

    let selection = select(&joined.entries);
    stats.groups = selection.groups;
    stats.variant_only_groups = selection.variant_only_groups;

    let catalog = sequence(assign_sort_keys(selection.entries, sort_keys));
    stats.canonical_entries = catalog.len();
    stats.performers = {
        let mut names: Vec<&str> = catalog.iter().map(|e| e.performer.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        names.len()
    };

    let similarity_warnings = scan(&catalog, scorer, scan_config);
    stats.performer_warnings = similarity_warnings
        .iter()
        .filter(|w| w.kind == WarningKind::Performer)
        .count();
    stats.title_warnings = similarity_warnings.len() - stats.performer_warnings;

    info!(
        joined = stats.joined,
        dropped = stats.dropped_rows(),
        groups = stats.groups,
        entries = stats.canonical_entries,
        "reconciled catalog"
    );

    Reconciliation {
        catalog,
        similarity_warnings,
        row_warnings: joined.warnings,
        stats,
    }
}

fn persist_catalog(paths: &RunPaths, catalog: &[CatalogEntry]) -> PersistOutcome {
    let failed = |reason: String| PersistOutcome::Failed {
        path: paths.catalog.clone(),
        reason,
    };

    if let Err(e) = validate_output_path(&paths.catalog, &[&paths.sessions, &paths.timings]) {
        return failed(e.to_string());
    }
    match tsv::write_catalog(&paths.catalog, catalog) {
        Ok(()) => PersistOutcome::Written {
            path: paths.catalog.clone(),
            rows: catalog.len(),
        },
        Err(e) => failed(e.to_string()),
    }
}

/// Run the whole pipeline over files.
pub fn run(
    paths: &RunPaths,
    sort_keys: &dyn SortKeyProvider,
    scorer: &dyn SimilarityScorer,
    options: &RunOptions,
) -> Result<RunReport> {
    let start = Instant::now();

    let spinner = PhaseSpinner::start(Phase::Load);
    let sessions = tsv::read_sessions(&paths.sessions)?;
    let timings = tsv::read_timings(&paths.timings)?;
    let previous = tsv::read_baseline(&paths.catalog)?;
    info!(
        sessions = sessions.len(),
        timings = timings.len(),
        baseline = previous.len(),
        "loaded inputs"
    );
    spinner.finish(&format!(
        "{} sessions, {} timings, {} baseline rows",
        sessions.len(),
        timings.len(),
        previous.len()
    ));

    let spinner = PhaseSpinner::start(Phase::Reconcile);
    let mut reconciliation = reconcile(&sessions, &timings, sort_keys, scorer, &options.scan);
    let diff = diff_catalogs(&previous, &reconciliation.catalog);
    reconciliation.stats.added = diff.added.len();
    reconciliation.stats.removed = diff.removed.len();
    reconciliation.stats.updated = diff.updated.len();
    spinner.finish(&format!(
        "{} entries, {} warnings",
        reconciliation.catalog.len(),
        reconciliation.similarity_warnings.len() + reconciliation.row_warnings.len()
    ));

    let persist = if options.dry_run {
        PersistOutcome::DryRun
    } else {
        let spinner = PhaseSpinner::start(Phase::Persist);
        let outcome = persist_catalog(paths, &reconciliation.catalog);
        match &outcome {
            PersistOutcome::Failed { path, reason } => {
                warn!("failed to write {}: {}", path.display(), reason);
                spinner.finish("failed");
            }
            _ => spinner.finish(&format!("{} rows", reconciliation.catalog.len())),
        }
        outcome
    };

    reconciliation.stats.elapsed_seconds = start.elapsed().as_secs_f64();

    Ok(RunReport {
        reconciliation,
        diff,
        persist,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::similarity::SimilarityMetric;
    use crate::sort_key::TransliterationSortKeys;
    use chrono::NaiveDate;

    fn session(id: i64, day: u32) -> Session {
        Session {
            id,
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            title: String::new(),
            url: format!("https://youtu.be/{}", id),
        }
    }

    fn timing(id: i64, session_id: i64, title: &str, performer: &str) -> TimingRecord {
        TimingRecord {
            id,
            session_id: Some(session_id),
            offset: "1:00".to_string(),
            title: title.to_string(),
            performer: performer.to_string(),
        }
    }

    #[test]
    fn test_reconcile_counts() {
        let sessions = vec![session(1, 1), session(2, 5)];
        let timings = vec![
            timing(1, 1, "Song", "B"),
            timing(2, 2, "Song (short ver)", "B"),
            timing(3, 2, "Other (TV size)", "A"),
            timing(4, 7, "Lost", "A"),
            timing(5, 1, "", "A"),
        ];
        let r = reconcile(
            &sessions,
            &timings,
            &TransliterationSortKeys::default(),
            &SimilarityMetric::Levenshtein,
            &ScanConfig::default(),
        );
        assert_eq!(r.stats.joined, 3);
        assert_eq!(r.stats.dropped_rows(), 2);
        assert_eq!(r.stats.groups, 2);
        assert_eq!(r.stats.variant_only_groups, 1);
        assert_eq!(r.stats.performers, 2);
        let rows: Vec<(&str, &str)> = r
            .catalog
            .iter()
            .map(|e| (e.performer.as_str(), e.title.as_str()))
            .collect();
        assert_eq!(rows, vec![("A", "Other (TV size)"), ("B", "Song")]);
        assert_eq!(r.catalog[1].latest_url, "https://youtu.be/1?t=60s");
    }
}
