//! Merge run driver.
//!
//! The run is a fold over the sorted candidate list: each candidate is
//! classified against the engine's baseline and the outcome is applied to the
//! engine. A terminal outcome ends the fold; the engine is then dropped and
//! its staging copy removed, so nothing is persisted.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::classify::{Classifier, Outcome, SkipReason};
use crate::config::MergeConfig;
use crate::engine::{Absorbed, MergeEngine};
use crate::error::{MergeError, MergeResult};
use crate::report::{Reporter, RunSummary};
use crate::scan::{scan_candidates, ScanOptions};
use crate::verify::SignatureVerifier;

/// Merge every eligible container in `config.input_dir` into `config.output`
/// using the verifier selected by `config.verify_mode`.
pub fn merge_directory(
    config: &MergeConfig,
    reporter: &mut dyn Reporter,
) -> MergeResult<RunSummary> {
    let verifier = config.verify_mode.verifier();
    merge_directory_with(config, verifier.as_ref(), reporter)
}

/// Same as [`merge_directory`] with a caller-supplied verifier.
pub fn merge_directory_with(
    config: &MergeConfig,
    verifier: &dyn SignatureVerifier,
    reporter: &mut dyn Reporter,
) -> MergeResult<RunSummary> {
    config
        .validate()
        .inspect_err(|e| reporter.terminal(None, e))?;

    let options = ScanOptions::new(&config.extensions).excluding(&config.output);
    let candidates = scan_candidates(&config.input_dir, &options)
        .inspect_err(|e| reporter.terminal(None, e))?;
    debug!(
        candidates = candidates.len(),
        verifier = verifier.name(),
        digest = %config.digest_algorithm,
        "starting merge"
    );

    let classifier = Classifier::new(verifier, config.digest_algorithm, config.on_invalid);
    let mut summary = RunSummary::new(&config.input_dir);

    let engine = candidates.iter().try_fold(
        MergeEngine::new(staging_dir(&config.output)),
        |mut engine, path| {
            let outcome = classifier.classify(path, engine.baseline());
            apply(outcome, path, &mut engine, &mut summary, &mut *reporter)?;
            Ok::<_, MergeError>(engine)
        },
    )?;

    summary.base = engine.base().map(Path::to_path_buf);
    summary.signature_count = engine.signature_count();
    summary.output = engine
        .persist(&config.output)
        .inspect_err(|e| reporter.terminal(None, e))?;

    if summary.output.is_none() {
        reporter.nothing_merged(&config.input_dir);
    }
    Ok(summary)
}

/// Apply one classifier outcome to the running state.
fn apply(
    outcome: Outcome,
    path: &Path,
    engine: &mut MergeEngine,
    summary: &mut RunSummary,
    reporter: &mut dyn Reporter,
) -> MergeResult<()> {
    let result = match outcome {
        Outcome::AcceptedBase { baseline } => engine.seed(path, baseline).map(|()| {
            reporter.accepted_base(path);
        }),
        Outcome::AcceptedContributor { signature } => {
            engine.absorb(&signature).map(|absorbed| match absorbed {
                Absorbed::Added => {
                    reporter.accepted_contributor(path);
                    summary.contributors.push(path.to_path_buf());
                }
                Absorbed::Duplicate => {
                    let reason = SkipReason::DuplicateSignature;
                    reporter.skipped(path, &reason);
                    summary.record_skip(path, &reason);
                }
            })
        }
        Outcome::Skipped(reason) => {
            reporter.skipped(path, &reason);
            summary.record_skip(path, &reason);
            Ok(())
        }
        Outcome::Terminal(err) => Err(err),
    };

    result.inspect_err(|e| reporter.terminal(Some(path), e))
}

fn staging_dir(output: &Path) -> PathBuf {
    match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
