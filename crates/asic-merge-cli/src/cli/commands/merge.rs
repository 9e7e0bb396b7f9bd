use anyhow::Context;
use asic_merge_core::{merge_directory, LogReporter, MergeConfig, MergeResult, RunSummary};
use tracing::error;

use crate::cli::args::MergeArgs;
use crate::exit_codes;

pub fn run(args: MergeArgs) -> anyhow::Result<i32> {
    let config = match resolve_config(&args) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            return Ok(e.exit_code());
        }
    };

    // Failures are already reported through the LogReporter.
    let summary = match merge_directory(&config, &mut LogReporter) {
        Ok(summary) => summary,
        Err(e) => return Ok(e.exit_code()),
    };

    if args.json {
        let json =
            serde_json::to_string_pretty(&summary).context("failed to serialize run summary")?;
        println!("{json}");
    } else {
        print_summary(&summary);
    }
    Ok(exit_codes::SUCCESS)
}

/// Layer flags (and their environment variables) over the config file.
pub(crate) fn resolve_config(args: &MergeArgs) -> MergeResult<MergeConfig> {
    let mut config = match &args.config {
        Some(path) => MergeConfig::load(path)?,
        None => MergeConfig::default(),
    };

    if let Some(input) = &args.input {
        config.input_dir = input.clone();
    }
    if let Some(output) = &args.output {
        config.output = output.clone();
    }
    if let Some(digest) = args.digest {
        config.digest_algorithm = digest;
    }
    if let Some(verify) = args.verify {
        config.verify_mode = verify;
    }
    if let Some(on_invalid) = args.on_invalid {
        config.on_invalid = on_invalid;
    }

    config.validate()?;
    Ok(config)
}

fn print_summary(summary: &RunSummary) {
    match &summary.output {
        Some(output) => println!(
            "Merged {} signature(s) into {}",
            summary.signature_count,
            output.display()
        ),
        None => println!(
            "No eligible containers in {}; nothing written",
            summary.input_dir.display()
        ),
    }
    for skipped in &summary.skipped {
        println!("  skipped {}: {}", skipped.path.display(), skipped.reason);
    }
}
