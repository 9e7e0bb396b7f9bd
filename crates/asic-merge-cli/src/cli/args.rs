use asic_merge_core::{DigestAlgorithm, InvalidPolicy, VerifyMode};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "asic-merge",
    version,
    about = "Merge co-signed ASiC-E containers into one container carrying every signature"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Merge every eligible container in a directory
    Merge(MergeArgs),
    /// Verify one container and list its data files and signatures
    Inspect(InspectArgs),
}

/// Flags left unset fall back to the config file, then to built-in defaults.
#[derive(clap::Args, Clone, Debug, Default)]
pub struct MergeArgs {
    /// YAML config file
    #[arg(long, env = "ASIC_MERGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory scanned for candidate containers [default: containers]
    #[arg(long, env = "ASIC_MERGE_INPUT")]
    pub input: Option<PathBuf>,

    /// Path of the merged container [default: combined.asice]
    #[arg(long, env = "ASIC_MERGE_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Payload digest algorithm (sha224, sha256, sha384, sha512)
    #[arg(long, env = "ASIC_MERGE_DIGEST")]
    pub digest: Option<DigestAlgorithm>,

    /// Signature verification (references, structure)
    #[arg(long, env = "ASIC_MERGE_VERIFY")]
    pub verify: Option<VerifyMode>,

    /// What to do with containers that fail verification (abort, skip)
    #[arg(long, env = "ASIC_MERGE_ON_INVALID")]
    pub on_invalid: Option<InvalidPolicy>,

    /// Print the run summary as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

#[derive(clap::Args, Clone, Debug)]
pub struct InspectArgs {
    /// Container to inspect
    pub container: PathBuf,

    /// Digest algorithm for the listed data files
    #[arg(long, default_value = "sha256")]
    pub digest: DigestAlgorithm,

    /// Signature verification (references, structure)
    #[arg(long, default_value = "references")]
    pub verify: VerifyMode,

    /// Print the listing as JSON on stdout
    #[arg(long)]
    pub json: bool,
}
