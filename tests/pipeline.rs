//! End-to-end runs over files in a temporary directory.

use std::fs;

use setlist_catalog::error::LoadError;
use setlist_catalog::models::{CatalogEntry, WarningKind};
use setlist_catalog::pipeline::{run, PersistOutcome, RunOptions, RunPaths, RunReport};
use setlist_catalog::similarity::SimilarityMetric;
use setlist_catalog::sort_key::TransliterationSortKeys;
use setlist_catalog::tsv::{read_catalog, write_catalog};
use tempfile::TempDir;

const SESSION_HEADER: &str = "ID\tDate\tTitle\tURL\n";
const TIMING_HEADER: &str = "ID\tLIVE_ID\tTimestamp\tTitle\tArtist\n";

struct Fixture {
    dir: TempDir,
    paths: RunPaths,
}

impl Fixture {
    fn new(sessions: &str, timings: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let paths = RunPaths {
            sessions: dir.path().join("live.tsv"),
            timings: dir.path().join("timing.tsv"),
            catalog: dir.path().join("catalog.tsv"),
        };
        fs::write(&paths.sessions, format!("{}{}", SESSION_HEADER, sessions)).unwrap();
        fs::write(&paths.timings, format!("{}{}", TIMING_HEADER, timings)).unwrap();
        Self { dir, paths }
    }

    fn run_with(&self, options: &RunOptions) -> RunReport {
        run(
            &self.paths,
            &TransliterationSortKeys::default(),
            &SimilarityMetric::Levenshtein,
            options,
        )
        .unwrap()
    }

    fn run(&self) -> RunReport {
        self.run_with(&RunOptions::default())
    }
}

fn entry(performer: &str, title: &str, url: &str) -> CatalogEntry {
    CatalogEntry {
        performer: performer.to_string(),
        sort_key: performer.to_lowercase(),
        title: title.to_string(),
        latest_url: url.to_string(),
    }
}

fn identities(entries: &[CatalogEntry]) -> Vec<(String, String)> {
    entries
        .iter()
        .map(|e| (e.performer.clone(), e.title.clone()))
        .collect()
}

#[test]
fn test_regular_recording_beats_newer_short_version() {
    let fx = Fixture::new(
        "1\t2024-01-01\tfirst\thttps://youtu.be/one\n2\t2024-01-05\tsecond\thttps://youtu.be/two\n",
        "1\t1\t0:10\tSong\tA\n2\t2\t0:20\tSong (short ver)\tA\n",
    );
    let report = fx.run();
    let catalog = &report.reconciliation.catalog;
    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog[0].title, "Song");
    assert_eq!(catalog[0].latest_url, "https://youtu.be/one?t=10s");
}

#[test]
fn test_same_day_sessions_pick_larger_id() {
    let fx = Fixture::new(
        "9\t2024-01-01\tlate\thttps://youtu.be/nine\n5\t2024-01-01\tearly\thttps://youtu.be/five\n",
        "1\t9\t1:00\tSong\tA\n2\t5\t2:00\tSong\tA\n",
    );
    let report = fx.run();
    assert_eq!(
        report.reconciliation.catalog[0].latest_url,
        "https://youtu.be/nine?t=60s"
    );
}

#[test]
fn test_diff_reports_updated_and_added() {
    let fx = Fixture::new(
        "1\t2024-01-01\tx\thttps://youtu.be/new\n",
        "1\t1\t0:05\tX\tA\n2\t1\t0:30\tY\tB\n",
    );
    write_catalog(&fx.paths.catalog, &[entry("A", "X", "https://youtu.be/old?t=5s")]).unwrap();

    let report = fx.run();
    assert_eq!(identities(&report.diff.added), vec![("B".into(), "Y".into())]);
    assert!(report.diff.removed.is_empty());
    assert_eq!(report.diff.updated.len(), 1);
    let (old, new) = &report.diff.updated[0];
    assert_eq!(old.latest_url, "https://youtu.be/old?t=5s");
    assert_eq!(new.latest_url, "https://youtu.be/new?t=5s");
}

#[test]
fn test_similar_performers_warn_without_blocking() {
    let fx = Fixture::new(
        "1\t2024-01-01\tx\thttps://youtu.be/a\n",
        "1\t1\t0:05\tcrossing field\tLisa\n2\t1\t0:30\t紅蓮華\tLiSA\n",
    );
    let report = fx.run();
    let warnings = &report.reconciliation.similarity_warnings;
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].kind, WarningKind::Performer);
    assert_eq!(report.reconciliation.catalog.len(), 2);
    assert!(matches!(report.persist, PersistOutcome::Written { rows: 2, .. }));
}

#[test]
fn test_empty_baseline_reports_everything_added() {
    let fx = Fixture::new(
        "1\t2024-01-01\tx\thttps://youtu.be/a\n",
        "1\t1\t0:05\tX\tA\n2\t1\t0:30\tY\tB\n",
    );
    fs::write(&fx.paths.catalog, "").unwrap();
    let report = fx.run();
    assert_eq!(report.diff.added, report.reconciliation.catalog);
    assert!(report.diff.removed.is_empty());
    assert!(report.diff.updated.is_empty());
}

#[test]
fn test_rerun_is_idempotent() {
    let fx = Fixture::new(
        "1\t2024-01-01\tx\thttps://youtu.be/a\n2\t2024-02-01\ty\thttps://youtu.be/b\n",
        "1\t1\t0:05\tX\tB\n2\t2\t0:30\tX (TV size)\tB\n3\t2\t1:30\tZ\tA\n4\t1\t2:00\tW\tA\n",
    );
    let first = fx.run();
    let written = read_catalog(&fx.paths.catalog).unwrap();
    assert_eq!(written, first.reconciliation.catalog);

    let second = fx.run();
    assert_eq!(second.reconciliation.catalog, first.reconciliation.catalog);
    assert!(second.diff.is_empty());
    assert_eq!(read_catalog(&fx.paths.catalog).unwrap(), written);
}

#[test]
fn test_dry_run_leaves_catalog_untouched() {
    let fx = Fixture::new(
        "1\t2024-01-01\tx\thttps://youtu.be/a\n",
        "1\t1\t0:05\tX\tA\n",
    );
    let options = RunOptions {
        dry_run: true,
        ..Default::default()
    };
    let report = fx.run_with(&options);
    assert_eq!(report.persist, PersistOutcome::DryRun);
    assert_eq!(report.diff.added.len(), 1);
    assert!(!fx.paths.catalog.exists());
}

#[test]
fn test_row_defects_are_dropped_not_fatal() {
    let fx = Fixture::new(
        "1\t2024-01-01\tx\thttps://youtu.be/a\n",
        "1\t1\t0:05\tX\tA\n2\t42\t0:10\tY\tA\n3\t1\t0:15\t\tA\n4\t1\tsoon\tZ\tA\n",
    );
    let report = fx.run();
    assert_eq!(report.reconciliation.catalog.len(), 1);
    assert_eq!(report.reconciliation.row_warnings.len(), 3);
    assert_eq!(report.reconciliation.stats.dropped_rows(), 3);
}

#[test]
fn test_blank_session_reference_is_dropped_not_fatal() {
    let fx = Fixture::new(
        "1\t2024-01-01\tx\thttps://youtu.be/a\n",
        "1\t1\t0:05\tX\tA\n2\t\t0:10\tY\tB\n",
    );
    let report = fx.run();
    assert_eq!(identities(&report.reconciliation.catalog), vec![("A".into(), "X".into())]);
    assert_eq!(report.reconciliation.row_warnings.len(), 1);
    assert_eq!(report.reconciliation.stats.dropped_missing_session, 1);
    assert!(matches!(report.persist, PersistOutcome::Written { rows: 1, .. }));
}

#[test]
fn test_header_mismatch_aborts_run() {
    let fx = Fixture::new("1\t2024-01-01\tx\thttps://youtu.be/a\n", "1\t1\t0:05\tX\tA\n");
    fs::write(&fx.paths.timings, "ID\tSESSION\tTimestamp\tTitle\tArtist\n").unwrap();
    let err = run(
        &fx.paths,
        &TransliterationSortKeys::default(),
        &SimilarityMetric::Levenshtein,
        &RunOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, LoadError::HeaderMismatch { .. }));
    assert!(!fx.paths.catalog.exists());
}

#[test]
fn test_write_failure_still_returns_result() {
    let mut fx = Fixture::new(
        "1\t2024-01-01\tx\thttps://youtu.be/a\n",
        "1\t1\t0:05\tX\tA\n",
    );
    fx.paths.catalog = fx.dir.path().join("missing-dir").join("catalog.tsv");
    let report = fx.run();
    assert!(report.persist.is_failure());
    assert_eq!(report.reconciliation.catalog.len(), 1);
    assert_eq!(report.diff.added.len(), 1);
}

#[test]
fn test_output_over_input_is_refused() {
    let mut fx = Fixture::new(
        "1\t2024-01-01\tx\thttps://youtu.be/a\n",
        "1\t1\t0:05\tX\tA\n",
    );
    let original = fs::read_to_string(&fx.paths.timings).unwrap();
    fx.paths.catalog = fx.paths.timings.clone();
    // The timing log is not a valid catalog, so the baseline load fails first.
    let err = run(
        &fx.paths,
        &TransliterationSortKeys::default(),
        &SimilarityMetric::Levenshtein,
        &RunOptions::default(),
    );
    assert!(err.is_err());
    assert_eq!(fs::read_to_string(&fx.paths.timings).unwrap(), original);
}
