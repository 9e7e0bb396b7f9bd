//! Candidate discovery in the input directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{MergeError, MergeResult};

/// Which directory entries count as candidate containers.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    extensions: Vec<String>,
    exclude: Option<PathBuf>,
}

impl ScanOptions {
    /// Match files by extension (case-insensitive, without the leading dot).
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            exclude: None,
        }
    }

    /// Never yield `path` (typically the merge output), even if it matches.
    pub fn excluding(mut self, path: &Path) -> Self {
        self.exclude = fs::canonicalize(path).ok();
        self
    }

    pub fn matches_name(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .is_some_and(|ext| self.extensions.iter().any(|e| *e == ext))
    }

    fn is_excluded(&self, path: &Path) -> bool {
        match &self.exclude {
            Some(excluded) => fs::canonicalize(path).is_ok_and(|p| &p == excluded),
            None => false,
        }
    }
}

/// List candidate containers in `dir`, sorted by file name.
///
/// Entries that do not match the extension filter are silently ignored, as
/// are directories. A missing directory is a terminal error.
pub fn scan_candidates(dir: &Path, options: &ScanOptions) -> MergeResult<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|source| input_dir_error(dir, source))?;

    let mut candidates = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| input_dir_error(dir, source))?;
        let path = entry.path();

        if !options.matches_name(&path) || !path.is_file() {
            continue;
        }
        if options.is_excluded(&path) {
            debug!(path = %path.display(), "skipping merge output in input directory");
            continue;
        }
        candidates.push(path);
    }

    candidates.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    debug!(dir = %dir.display(), count = candidates.len(), "scanned candidates");
    Ok(candidates)
}

fn input_dir_error(dir: &Path, source: io::Error) -> MergeError {
    if source.kind() == io::ErrorKind::NotFound {
        MergeError::InputDirMissing {
            path: dir.to_path_buf(),
        }
    } else {
        MergeError::InputDir {
            path: dir.to_path_buf(),
            source,
        }
    }
}
