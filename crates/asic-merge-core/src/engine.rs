//! Merge target ownership: seed, absorb, persist.
//!
//! The target is a physical copy of the base container kept in a staging file
//! beside the output path. Signatures are queued on it and written once by
//! [`MergeEngine::persist`]. Dropping the engine without persisting removes
//! the staging file, so an aborted run leaves nothing behind.

use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::classify::Baseline;
use crate::container::{Container, ContainerError, Signature};
use crate::error::{MergeError, MergeResult};

/// Result of [`MergeEngine::absorb`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Absorbed {
    Added,
    /// A byte-identical signature is already in the target.
    Duplicate,
}

struct MergeTarget {
    // Keeps the staging copy alive; removed on drop.
    _staging: NamedTempFile,
    container: Container,
    base: PathBuf,
}

/// Running merge state threaded through the candidate fold.
pub struct MergeEngine {
    staging_dir: PathBuf,
    baseline: Option<Baseline>,
    target: Option<MergeTarget>,
}

impl MergeEngine {
    /// `staging_dir` should be on the same filesystem as the output path.
    pub fn new(staging_dir: impl Into<PathBuf>) -> Self {
        Self {
            staging_dir: staging_dir.into(),
            baseline: None,
            target: None,
        }
    }

    pub fn baseline(&self) -> Option<&Baseline> {
        self.baseline.as_ref()
    }

    pub fn is_seeded(&self) -> bool {
        self.target.is_some()
    }

    /// Container the target was copied from.
    pub fn base(&self) -> Option<&Path> {
        self.target.as_ref().map(|t| t.base.as_path())
    }

    pub fn signature_count(&self) -> usize {
        self.target
            .as_ref()
            .map_or(0, |t| t.container.signature_count())
    }

    /// Record the baseline and copy `base` to become the merge target.
    ///
    /// Must be called at most once per run.
    pub fn seed(&mut self, base: &Path, baseline: Baseline) -> MergeResult<()> {
        debug_assert!(self.target.is_none(), "merge target seeded twice");

        let staging = tempfile::Builder::new()
            .prefix(".asic-merge-")
            .suffix(".asice")
            .tempfile_in(&self.staging_dir)
            .map_err(|source| MergeError::Staging {
                path: self.staging_dir.clone(),
                source,
            })?;
        std::fs::copy(base, staging.path()).map_err(|source| MergeError::Staging {
            path: staging.path().to_path_buf(),
            source,
        })?;
        let container = Container::open(staging.path())?;

        debug!(
            base = %base.display(),
            staging = %staging.path().display(),
            data_files = baseline.names().len(),
            "seeded merge target"
        );
        self.baseline = Some(baseline);
        self.target = Some(MergeTarget {
            _staging: staging,
            container,
            base: base.to_path_buf(),
        });
        Ok(())
    }

    /// Add a contributor's signature to the target.
    pub fn absorb(&mut self, signature: &Signature) -> MergeResult<Absorbed> {
        let Some(target) = self.target.as_mut() else {
            return Err(MergeError::Internal {
                message: "absorb called before the target was seeded".to_string(),
            });
        };

        match target.container.add_signature(signature) {
            Ok(()) => Ok(Absorbed::Added),
            Err(ContainerError::DuplicateSignature { .. }) => Ok(Absorbed::Duplicate),
            Err(e) => Err(e.into()),
        }
    }

    /// Write the target to `output`. Returns `None` when nothing was seeded.
    pub fn persist(self, output: &Path) -> MergeResult<Option<PathBuf>> {
        let Some(mut target) = self.target else {
            return Ok(None);
        };

        target.container.save(output)?;
        info!(
            output = %output.display(),
            signatures = target.container.signature_count(),
            "wrote merged container"
        );
        Ok(Some(output.to_path_buf()))
    }
}
