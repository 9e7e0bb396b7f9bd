//! Merge co-signed ASiC-E containers.
//!
//! Several parties sign the same document independently, each producing a
//! container with one signature. This crate scans a directory of such
//! containers, picks the first eligible one as the base and copies the
//! signature of every other container that carries the same payload into it.
//!
//! ```no_run
//! use asic_merge_core::{merge_directory, LogReporter, MergeConfig};
//!
//! let config = MergeConfig::default();
//! let summary = merge_directory(&config, &mut LogReporter)?;
//! println!("{} signatures", summary.signature_count);
//! # Ok::<(), asic_merge_core::MergeError>(())
//! ```

pub mod classify;
pub mod config;
pub mod container;
pub mod digest;
pub mod engine;
pub mod error;
pub mod report;
pub mod run;
pub mod scan;
pub mod verify;

pub use classify::{Baseline, Classifier, Outcome, SkipReason};
pub use config::{InvalidPolicy, MergeConfig};
pub use container::{Container, ContainerError, ContainerWriter, ReadLimits, Signature};
pub use digest::{DigestAlgorithm, PayloadDigest, PayloadDigestSet};
pub use engine::{Absorbed, MergeEngine};
pub use error::{MergeError, MergeResult};
pub use report::{LogReporter, Reporter, RunSummary, SkippedEntry};
pub use run::{merge_directory, merge_directory_with};
pub use scan::{scan_candidates, ScanOptions};
pub use verify::{
    Payload, ReferenceDigestVerifier, SignatureFailure, SignatureVerifier, StructureOnlyVerifier,
    VerifyMode,
};
