//! Core data models for catalog reconciliation.
//!
//! This module contains the raw input records, the intermediate joined
//! form, the published catalog entry, and the result/diagnostic types
//! produced by a run.

use chrono::NaiveDate;
use serde::Serialize;

// ============================================================================
// Input Models
// ============================================================================

/// One live session from the session log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub id: i64,
    pub date: NaiveDate,
    pub title: String,
    pub url: String,
}

/// One song timestamp from the timing log.
/// `session_id` is `None` for a blank LIVE_ID and may point at a session
/// that does not exist.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimingRecord {
    pub id: i64,
    pub session_id: Option<i64>,
    pub offset: String, // "H:MM:SS" or "MM:SS"
    pub title: String,
    pub performer: String,
}

/// Timing record attached to its session. `Some(session.id) == timing.session_id`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JoinedEntry {
    pub session: Session,
    pub timing: TimingRecord,
    pub offset_sec: u32, // parsed from timing.offset by the joiner
}

impl JoinedEntry {
    /// Trimmed performer name, the grouping and display form.
    pub fn performer(&self) -> &str {
        self.timing.performer.trim()
    }

    /// Trimmed original title.
    pub fn title(&self) -> &str {
        self.timing.title.trim()
    }

    /// Session URL with the offset appended as a `t=<sec>s` parameter.
    pub fn timestamp_url(&self) -> String {
        with_time_param(&self.session.url, self.offset_sec)
    }
}

/// Set the `t=<sec>s` query parameter on a URL, keeping any `#fragment`
/// at the end. An existing `t` parameter is replaced in place.
pub fn with_time_param(url: &str, offset_sec: u32) -> String {
    let (base, fragment) = match url.find('#') {
        Some(idx) => (&url[..idx], &url[idx..]),
        None => (url, ""),
    };
    let (path, query) = base.split_once('?').unwrap_or((base, ""));
    let time = format!("t={}s", offset_sec);

    let mut replaced = false;
    let mut params: Vec<&str> = Vec::new();
    for param in query.split('&').filter(|p| !p.is_empty()) {
        if param.split('=').next() == Some("t") {
            if !replaced {
                params.push(&time);
                replaced = true;
            }
        } else {
            params.push(param);
        }
    }
    if !replaced {
        params.push(&time);
    }
    format!("{}?{}{}", path, params.join("&"), fragment)
}

// ============================================================================
// Catalog Models
// ============================================================================

/// One published catalog row: one song per performer.
/// `(performer, title)` is the identity key across snapshots.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub performer: String,
    pub sort_key: String,
    pub title: String,
    pub latest_url: String,
}

impl CatalogEntry {
    pub fn identity(&self) -> (&str, &str) {
        (&self.performer, &self.title)
    }
}

/// Canonical entry before sort keys are assigned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CanonicalEntry {
    pub performer: String,
    pub title: String,
    pub latest_url: String,
}

// ============================================================================
// Similarity Models
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WarningKind {
    Performer,
    Title,
}

/// Advisory near-duplicate report. Never changes the catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityWarning {
    pub kind: WarningKind,
    /// Performer the titles belong to; `None` for performer warnings.
    pub scope: Option<String>,
    pub item_a: String,
    pub item_b: String,
    pub score: f64,
}

// ============================================================================
// Diff Models
// ============================================================================

/// Changes between the previously published catalog and this run's.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffResult {
    pub added: Vec<CatalogEntry>,
    pub removed: Vec<CatalogEntry>,
    /// (previous, current) pairs sharing an identity key.
    pub updated: Vec<(CatalogEntry, CatalogEntry)>,
}

impl DiffResult {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.updated.is_empty()
    }
}

// ============================================================================
// Diagnostics
// ============================================================================

/// Row-level defect found while joining. The row is dropped, the run continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowWarning {
    /// LIVE_ID is blank
    MissingSession { timing_id: i64 },
    /// LIVE_ID does not match any session
    UnknownSession { timing_id: i64, session_id: i64 },
    EmptyTitle { timing_id: i64 },
    EmptyPerformer { timing_id: i64 },
    /// Offset is not `[[H:]M:]S`
    InvalidOffset { timing_id: i64, offset: String },
}

impl std::fmt::Display for RowWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RowWarning::MissingSession { timing_id } => {
                write!(f, "timing {} has no session reference", timing_id)
            }
            RowWarning::UnknownSession {
                timing_id,
                session_id,
            } => write!(
                f,
                "timing {} references unknown session {}",
                timing_id, session_id
            ),
            RowWarning::EmptyTitle { timing_id } => write!(f, "timing {} has empty title", timing_id),
            RowWarning::EmptyPerformer { timing_id } => {
                write!(f, "timing {} has empty performer", timing_id)
            }
            RowWarning::InvalidOffset { timing_id, offset } => {
                write!(f, "timing {} has invalid offset '{}'", timing_id, offset)
            }
        }
    }
}

// ============================================================================
// Statistics (Instrumentation)
// ============================================================================

/// Per-run counters, logged as JSON and optionally written to disk.
#[derive(Default, Debug, Clone, Serialize)]
pub struct RunStats {
    // Inputs
    pub sessions: usize,
    pub timing_records: usize,

    // Joiner
    pub joined: usize,
    pub dropped_missing_session: usize,
    pub dropped_unknown_session: usize,
    pub dropped_empty_title: usize,
    pub dropped_empty_performer: usize,
    pub dropped_invalid_offset: usize,

    // Selector
    pub groups: usize,
    pub variant_only_groups: usize,
    pub canonical_entries: usize,
    pub performers: usize,

    // Scanner
    pub performer_warnings: usize,
    pub title_warnings: usize,

    // Differ
    pub added: usize,
    pub removed: usize,
    pub updated: usize,

    pub elapsed_seconds: f64,
}

impl RunStats {
    pub fn dropped_rows(&self) -> usize {
        self.dropped_missing_session
            + self.dropped_unknown_session
            + self.dropped_empty_title
            + self.dropped_empty_performer
            + self.dropped_invalid_offset
    }

    /// Count one dropped row under its category.
    pub fn record_drop(&mut self, warning: &RowWarning) {
        match warning {
            RowWarning::MissingSession { .. } => self.dropped_missing_session += 1,
            RowWarning::UnknownSession { .. } => self.dropped_unknown_session += 1,
            RowWarning::EmptyTitle { .. } => self.dropped_empty_title += 1,
            RowWarning::EmptyPerformer { .. } => self.dropped_empty_performer += 1,
            RowWarning::InvalidOffset { .. } => self.dropped_invalid_offset += 1,
        }
    }

    /// Log stats in JSON format
    pub fn log_summary(&self) {
        if let Ok(json) = serde_json::to_string_pretty(self) {
            tracing::info!("run stats:\n{}", json);
        }
    }

    /// Write stats to a JSON file
    pub fn write_to_file(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
