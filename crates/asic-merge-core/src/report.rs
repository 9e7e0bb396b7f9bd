//! Run reporting: per-candidate side channel plus the final summary.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{error, info, warn};

use crate::classify::SkipReason;
use crate::error::MergeError;

/// Receives run events as they happen. None of the callbacks can stop the run.
pub trait Reporter {
    fn accepted_base(&mut self, _path: &Path) {}

    fn accepted_contributor(&mut self, _path: &Path) {}

    fn skipped(&mut self, path: &Path, reason: &SkipReason);

    /// Emitted once, right before the run stops.
    fn terminal(&mut self, path: Option<&Path>, error: &MergeError);

    /// The scan completed without a single eligible container.
    fn nothing_merged(&mut self, _input_dir: &Path) {}
}

/// Reports through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

fn display_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

impl Reporter for LogReporter {
    fn accepted_base(&mut self, path: &Path) {
        info!(container = %display_name(path), "using container as merge base");
    }

    fn accepted_contributor(&mut self, path: &Path) {
        info!(container = %display_name(path), "merged signature");
    }

    fn skipped(&mut self, path: &Path, reason: &SkipReason) {
        warn!(
            container = %display_name(path),
            reason = %reason,
            code = reason.code(),
            "skipping container"
        );
    }

    fn terminal(&mut self, path: Option<&Path>, err: &MergeError) {
        match path {
            Some(path) => error!(container = %display_name(path), error = %err, "merge aborted"),
            None => error!(error = %err, "merge aborted"),
        }
    }

    fn nothing_merged(&mut self, input_dir: &Path) {
        warn!(
            input_dir = %input_dir.display(),
            "no eligible containers found; nothing written"
        );
    }
}

/// One skipped candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedEntry {
    pub path: PathBuf,
    pub code: &'static str,
    pub reason: String,
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub input_dir: PathBuf,
    /// `None` when no eligible container was found.
    pub output: Option<PathBuf>,
    pub base: Option<PathBuf>,
    pub contributors: Vec<PathBuf>,
    pub skipped: Vec<SkippedEntry>,
    /// Signatures in the written output.
    pub signature_count: usize,
}

impl RunSummary {
    pub fn new(input_dir: &Path) -> Self {
        Self {
            input_dir: input_dir.to_path_buf(),
            ..Self::default()
        }
    }

    pub(crate) fn record_skip(&mut self, path: &Path, reason: &SkipReason) {
        self.skipped.push(SkippedEntry {
            path: path.to_path_buf(),
            code: reason.code(),
            reason: reason.to_string(),
        });
    }

    /// Whether `path` was skipped with the given reason code.
    pub fn was_skipped(&self, path: &Path, code: &str) -> bool {
        self.skipped.iter().any(|s| s.path == path && s.code == code)
    }
}
