//! Candidate acceptance.
//!
//! Each candidate goes through the same ordered checks, stopping at the first
//! one that fails:
//!
//! ```text
//! open + verify ──fail──> Terminal (or Skipped(Invalid) under InvalidPolicy::Skip)
//! signatures == 1 ──no──> Skipped(NoSignatures | MultipleSignatures)
//! data files > 0 ──no──> Skipped(NoDataFiles)
//! no baseline yet ──────> AcceptedBase
//! names == baseline ──no──> Skipped(FileNameMismatch)
//! digests == baseline ─no─> Skipped(FileContentMismatch)
//! otherwise ────────────> AcceptedContributor
//! ```

use std::fmt;
use std::path::Path;

use crate::config::InvalidPolicy;
use crate::container::{Container, ContainerError, ContainerResult, Signature};
use crate::digest::{DigestAlgorithm, PayloadDigestSet};
use crate::error::MergeError;
use crate::verify::SignatureVerifier;

/// Data file names and payload digests of the first accepted container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Baseline {
    names: Vec<String>,
    digests: PayloadDigestSet,
}

impl Baseline {
    pub fn new(names: Vec<String>, digests: PayloadDigestSet) -> Self {
        Self { names, digests }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn digests(&self) -> &PayloadDigestSet {
        &self.digests
    }
}

/// Why a candidate was left out of the merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NoSignatures,
    MultipleSignatures(usize),
    NoDataFiles,
    FileNameMismatch,
    FileContentMismatch,
    DuplicateSignature,
    /// Failed to open or verify; only produced under [`InvalidPolicy::Skip`].
    Invalid(String),
}

impl SkipReason {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoSignatures => "no_signatures",
            Self::MultipleSignatures(_) => "multiple_signatures",
            Self::NoDataFiles => "no_data_files",
            Self::FileNameMismatch => "file_name_mismatch",
            Self::FileContentMismatch => "file_content_mismatch",
            Self::DuplicateSignature => "duplicate_signature",
            Self::Invalid(_) => "invalid_container",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSignatures => f.write_str("no signatures"),
            Self::MultipleSignatures(n) => write!(f, "more than one signature ({n})"),
            Self::NoDataFiles => f.write_str("no data files"),
            Self::FileNameMismatch => f.write_str("file mismatch: data file names differ"),
            Self::FileContentMismatch => f.write_str("file mismatch: data file contents differ"),
            Self::DuplicateSignature => f.write_str("duplicate signature"),
            Self::Invalid(reason) => write!(f, "invalid container: {reason}"),
        }
    }
}

/// Result of classifying one candidate.
#[derive(Debug)]
pub enum Outcome {
    /// First eligible container: establishes the baseline.
    AcceptedBase { baseline: Baseline },
    /// Matches the baseline; carries its single signature.
    AcceptedContributor { signature: Signature },
    Skipped(SkipReason),
    Terminal(MergeError),
}

impl Outcome {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminal(_))
    }
}

/// Applies the acceptance checks to one candidate at a time.
pub struct Classifier<'a> {
    verifier: &'a dyn SignatureVerifier,
    algorithm: DigestAlgorithm,
    on_invalid: InvalidPolicy,
}

impl<'a> Classifier<'a> {
    pub fn new(
        verifier: &'a dyn SignatureVerifier,
        algorithm: DigestAlgorithm,
        on_invalid: InvalidPolicy,
    ) -> Self {
        Self {
            verifier,
            algorithm,
            on_invalid,
        }
    }

    /// Classify the container at `path` against the current baseline.
    ///
    /// The container is opened here and released before returning, whatever
    /// the outcome.
    pub fn classify(&self, path: &Path, baseline: Option<&Baseline>) -> Outcome {
        let mut container = match self.open_verified(path) {
            Ok(container) => container,
            Err(err) => return self.invalid(err),
        };

        match self.check(&mut container, baseline) {
            Ok(outcome) => outcome,
            Err(err) => Outcome::Terminal(err.into()),
        }
    }

    fn open_verified(&self, path: &Path) -> ContainerResult<Container> {
        let mut container = Container::open(path)?;
        container.verify(self.verifier)?;
        Ok(container)
    }

    fn invalid(&self, err: ContainerError) -> Outcome {
        match self.on_invalid {
            InvalidPolicy::Abort => Outcome::Terminal(err.into()),
            InvalidPolicy::Skip => Outcome::Skipped(SkipReason::Invalid(err.to_string())),
        }
    }

    fn check(
        &self,
        container: &mut Container,
        baseline: Option<&Baseline>,
    ) -> ContainerResult<Outcome> {
        match container.signature_count() {
            0 => return Ok(Outcome::Skipped(SkipReason::NoSignatures)),
            1 => {}
            n => return Ok(Outcome::Skipped(SkipReason::MultipleSignatures(n))),
        }

        if !container.has_data_files() {
            return Ok(Outcome::Skipped(SkipReason::NoDataFiles));
        }

        let Some(baseline) = baseline else {
            let digests = self.payload_digests(container)?;
            let names = container.data_file_names().to_vec();
            return Ok(Outcome::AcceptedBase {
                baseline: Baseline::new(names, digests),
            });
        };

        // Names before digests: no hashing for a name mismatch.
        if baseline.names() != container.data_file_names() {
            return Ok(Outcome::Skipped(SkipReason::FileNameMismatch));
        }

        if &self.payload_digests(container)? != baseline.digests() {
            return Ok(Outcome::Skipped(SkipReason::FileContentMismatch));
        }

        let first = container.iter_signatures().next().transpose()?;
        let signature = first.ok_or_else(|| {
            ContainerError::structure(container.path(), "signature entry disappeared")
        })?;
        Ok(Outcome::AcceptedContributor { signature })
    }

    fn payload_digests(&self, container: &mut Container) -> ContainerResult<PayloadDigestSet> {
        let digests = container
            .iter_data_files()
            .map(|file| file.map(|f| self.algorithm.digest(&f.bytes)))
            .collect::<ContainerResult<Vec<_>>>()?;
        Ok(PayloadDigestSet::new(self.algorithm, digests))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_messages_name_the_reason() {
        assert_eq!(SkipReason::NoSignatures.to_string(), "no signatures");
        assert!(SkipReason::MultipleSignatures(2)
            .to_string()
            .starts_with("more than one signature"));
        assert!(SkipReason::FileNameMismatch
            .to_string()
            .starts_with("file mismatch"));
        assert!(SkipReason::FileContentMismatch
            .to_string()
            .starts_with("file mismatch"));
        assert_eq!(SkipReason::NoDataFiles.code(), "no_data_files");
    }
}
