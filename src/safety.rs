//! Safety checks that keep the catalog writer away from its inputs.
//!
//! The catalog path doubles as the diff baseline and is rewritten on every
//! run; pointing it at one of the raw logs by mistake would destroy data.

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

/// Resolve a path for comparison, falling back to the raw path if it
/// does not exist yet.
fn resolved(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Validates that the catalog output path is safe to overwrite.
///
/// Checks:
/// - Output must have a `.tsv` extension
/// - Output cannot be the same file as any of the provided source paths
pub fn validate_output_path(output: &Path, source_paths: &[&Path]) -> Result<()> {
    let is_tsv = output
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("tsv"));
    if !is_tsv {
        bail!(
            "Safety check failed: output file '{}' must have a .tsv extension",
            output.display()
        );
    }

    let output_resolved = resolved(output);
    for source in source_paths {
        if output == *source || output_resolved == resolved(source) {
            bail!(
                "Safety check failed: output '{}' cannot be the same as source '{}'",
                output.display(),
                source.display()
            );
        }
    }

    Ok(())
}
