//! Tab-separated input and output.
//!
//! Every file starts with a header row that must match the expected
//! columns exactly. Blank lines are skipped; any other row must have
//! exactly as many cells as the header.

use chrono::NaiveDate;
use rustc_hash::FxHashMap;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{LoadError, Result};
use crate::models::{CatalogEntry, Session, TimingRecord};

// ============================================================================
// Column Layouts
// ============================================================================

pub const SESSION_HEADER: [&str; 4] = ["ID", "Date", "Title", "URL"];
pub const TIMING_HEADER: [&str; 5] = ["ID", "LIVE_ID", "Timestamp", "Title", "Artist"];
pub const CATALOG_HEADER: [&str; 4] = ["Artist", "Artist Sort Key", "Title", "Latest URL"];
pub const SORT_KEY_HEADER: [&str; 2] = ["Artist", "Sort Reading"];

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

/// Data row with its 1-based line number in the file.
struct Row {
    line: usize,
    cells: Vec<String>,
}

fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Split `content` into rows after checking the header.
fn parse_table(path: &Path, content: &str, expected: &[&str]) -> Result<Vec<Row>> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut lines = content.lines();

    let header: Vec<String> = match lines.next() {
        Some(h) => h.split('\t').map(str::to_string).collect(),
        None => {
            return Err(LoadError::MissingHeader {
                path: path.to_path_buf(),
            })
        }
    };
    if header.iter().map(String::as_str).ne(expected.iter().copied()) {
        return Err(LoadError::HeaderMismatch {
            path: path.to_path_buf(),
            expected: expected.iter().map(|s| s.to_string()).collect(),
            found: header,
        });
    }

    let mut rows = Vec::new();
    for (idx, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let line_no = idx + 2;
        let cells: Vec<String> = line.split('\t').map(str::to_string).collect();
        if cells.len() != expected.len() {
            return Err(malformed(
                path,
                line_no,
                format!("expected {} columns, found {}", expected.len(), cells.len()),
            ));
        }
        rows.push(Row {
            line: line_no,
            cells,
        });
    }
    Ok(rows)
}

fn malformed(path: &Path, line: usize, reason: String) -> LoadError {
    LoadError::MalformedRow {
        path: path.to_path_buf(),
        line,
        reason,
    }
}

fn parse_id(path: &Path, line: usize, column: &str, cell: &str) -> Result<i64> {
    cell.trim()
        .parse()
        .map_err(|_| malformed(path, line, format!("{} '{}' is not an integer", column, cell)))
}

/// Like `parse_id`, but a blank cell is `None`.
fn parse_optional_id(path: &Path, line: usize, column: &str, cell: &str) -> Result<Option<i64>> {
    if cell.trim().is_empty() {
        return Ok(None);
    }
    parse_id(path, line, column, cell).map(Some)
}

fn parse_date(path: &Path, line: usize, cell: &str) -> Result<NaiveDate> {
    let cell = cell.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(cell, fmt).ok())
        .ok_or_else(|| malformed(path, line, format!("Date '{}' is not YYYY-MM-DD", cell)))
}

// ============================================================================
// Readers
// ============================================================================

/// Read the session log.
pub fn read_sessions(path: &Path) -> Result<Vec<Session>> {
    let content = read_to_string(path)?;
    parse_table(path, &content, &SESSION_HEADER)?
        .into_iter()
        .map(|row| -> Result<Session> {
            let [id, date, title, url]: [String; 4] = row
                .cells
                .try_into()
                .map_err(|_| malformed(path, row.line, "column count".into()))?;
            Ok(Session {
                id: parse_id(path, row.line, "ID", &id)?,
                date: parse_date(path, row.line, &date)?,
                title: title.trim().to_string(),
                url: url.trim().to_string(),
            })
        })
        .collect()
}

/// Read the timing log. Blank LIVE_IDs, titles and performers are kept;
/// the joiner drops those rows.
pub fn read_timings(path: &Path) -> Result<Vec<TimingRecord>> {
    let content = read_to_string(path)?;
    parse_table(path, &content, &TIMING_HEADER)?
        .into_iter()
        .map(|row| -> Result<TimingRecord> {
            let [id, live_id, offset, title, performer]: [String; 5] = row
                .cells
                .try_into()
                .map_err(|_| malformed(path, row.line, "column count".into()))?;
            Ok(TimingRecord {
                id: parse_id(path, row.line, "ID", &id)?,
                session_id: parse_optional_id(path, row.line, "LIVE_ID", &live_id)?,
                offset: offset.trim().to_string(),
                title,
                performer,
            })
        })
        .collect()
}

/// Read a persisted catalog.
pub fn read_catalog(path: &Path) -> Result<Vec<CatalogEntry>> {
    let content = read_to_string(path)?;
    parse_catalog(path, &content)
}

fn parse_catalog(path: &Path, content: &str) -> Result<Vec<CatalogEntry>> {
    Ok(parse_table(path, content, &CATALOG_HEADER)?
        .into_iter()
        .filter_map(|row| {
            let [performer, sort_key, title, latest_url]: [String; 4] =
                row.cells.try_into().ok()?;
            Some(CatalogEntry {
                performer,
                sort_key,
                title,
                latest_url,
            })
        })
        .collect())
}

/// Read the previously published catalog.
/// A missing or zero-length file is an empty baseline, not an error.
pub fn read_baseline(path: &Path) -> Result<Vec<CatalogEntry>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    parse_catalog(path, &content)
}

/// Read the artist → sort reading override table.
/// A missing file yields an empty table. Later rows win over earlier ones.
pub fn read_sort_key_overrides(path: &Path) -> Result<FxHashMap<String, String>> {
    if !path.exists() {
        return Ok(FxHashMap::default());
    }
    let content = read_to_string(path)?;
    Ok(parse_table(path, &content, &SORT_KEY_HEADER)?
        .into_iter()
        .filter_map(|row| {
            let [artist, reading]: [String; 2] = row.cells.try_into().ok()?;
            let (artist, reading) = (artist.trim(), reading.trim());
            if artist.is_empty() || reading.is_empty() {
                None
            } else {
                Some((artist.to_string(), reading.to_string()))
            }
        })
        .collect())
}

// ============================================================================
// Writer
// ============================================================================

/// Tabs and line breaks cannot be represented inside a cell.
fn sanitize_cell(cell: &str) -> String {
    cell.replace(['\t', '\r', '\n'], " ")
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write the catalog in the given order. The file is written beside the
/// target and renamed into place, so a failure leaves the old file intact.
pub fn write_catalog(path: &Path, entries: &[CatalogEntry]) -> std::io::Result<()> {
    let tmp = temp_path_for(path);
    let result = (|| {
        let mut out = BufWriter::new(fs::File::create(&tmp)?);
        writeln!(out, "{}", CATALOG_HEADER.join("\t"))?;
        for e in entries {
            writeln!(
                out,
                "{}\t{}\t{}\t{}",
                sanitize_cell(&e.performer),
                sanitize_cell(&e.sort_key),
                sanitize_cell(&e.title),
                sanitize_cell(&e.latest_url)
            )?;
        }
        out.into_inner().map_err(|e| e.into_error())?.sync_all()?;
        fs::rename(&tmp, path)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}
