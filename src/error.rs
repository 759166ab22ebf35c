//! Load-time errors.
//!
//! Only structural problems with an input file are errors. Row-level
//! defects are reported as `RowWarning` values and never abort a run.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LoadError>;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is empty (missing header row)", .path.display())]
    MissingHeader { path: PathBuf },

    #[error("{}: header mismatch, expected [{}] found [{}]", .path.display(), .expected.join(", "), .found.join(", "))]
    HeaderMismatch {
        path: PathBuf,
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("{}:{line}: {reason}", .path.display())]
    MalformedRow {
        path: PathBuf,
        line: usize,
        reason: String,
    },
}
