//! Loading of molecule spec files and contact request files.
//!
//! Arguments are treated as glob patterns, except that an argument naming an
//! existing file is taken literally.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::{BatchItemError, SpecFileError};
use crate::molecule::{ContactRequest, LayoutCalculator, LayoutResult, MoleculeSpec};

/// Expands `patterns` into a sorted list of files without duplicates.
///
/// # Errors
///
/// Returns [`SpecFileError::Pattern`] if a pattern is malformed.
pub fn collect_spec_files<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<PathBuf>, SpecFileError> {
    let mut files = Vec::new();

    for pattern in patterns {
        let pattern = pattern.as_ref();

        let literal = Path::new(pattern);
        if literal.is_file() {
            files.push(literal.to_path_buf());
            continue;
        }

        let entries = glob::glob(pattern).map_err(|source| SpecFileError::Pattern {
            pattern: pattern.to_string(),
            source,
        })?;

        let before = files.len();
        for entry in entries {
            match entry {
                Ok(path) if path.is_file() => files.push(path),
                Ok(_) => {}
                Err(e) => warn!(path = %e.path().display(), "Skipping unreadable path: {}", e.error()),
            }
        }
        if files.len() == before {
            warn!(pattern, "Pattern matched no files");
        }
    }

    files.sort();
    files.dedup();
    debug!(count = files.len(), "Collected spec files");
    Ok(files)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, SpecFileError> {
    let contents = std::fs::read_to_string(path).map_err(|source| SpecFileError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&contents).map_err(|source| SpecFileError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads and parses a JSON molecule spec.
///
/// # Errors
///
/// Returns [`SpecFileError::Read`] if the file cannot be read, or
/// [`SpecFileError::Parse`] if it is not a valid spec.
pub fn load_spec(path: &Path) -> Result<MoleculeSpec, SpecFileError> {
    read_json(path)
}

/// Reads a JSON array of contact requests.
///
/// # Errors
///
/// Returns [`SpecFileError::Read`] if the file cannot be read, or
/// [`SpecFileError::Parse`] if it is not an array of requests.
pub fn load_contacts(path: &Path) -> Result<Vec<ContactRequest>, SpecFileError> {
    read_json(path)
}

/// Lays out every file matched by `patterns`.
///
/// A bad file yields an `Err` entry and does not stop the batch.
///
/// # Errors
///
/// Returns [`SpecFileError::Pattern`] if a pattern is malformed.
pub fn layout_files<S: AsRef<str>>(
    patterns: &[S],
) -> Result<Vec<(PathBuf, Result<LayoutResult, BatchItemError>)>, SpecFileError> {
    let calculator = LayoutCalculator::new();

    let results = collect_spec_files(patterns)?
        .into_iter()
        .map(|path| {
            let result = load_spec(&path)
                .map_err(BatchItemError::from)
                .and_then(|spec| calculator.calculate(&spec).map_err(BatchItemError::from));
            (path, result)
        })
        .collect();

    Ok(results)
}
