//! Run configuration.
//!
//! Loaded from an optional YAML file; the CLI layers flags and environment
//! variables on top.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::digest::DigestAlgorithm;
use crate::error::{MergeError, MergeResult};
use crate::verify::VerifyMode;

/// What to do with a candidate that fails to open or verify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidPolicy {
    /// Stop the run: an untrusted container taints the whole input set.
    #[default]
    Abort,
    /// Report the container as skipped and continue.
    Skip,
}

impl std::str::FromStr for InvalidPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "abort" => Ok(Self::Abort),
            "skip" => Ok(Self::Skip),
            other => Err(format!("unknown invalid-container policy: {other}")),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct MergeConfig {
    /// Directory scanned for candidate containers.
    pub input_dir: PathBuf,

    /// Path of the merged container.
    pub output: PathBuf,

    /// Candidate file extensions, case-insensitive.
    pub extensions: Vec<String>,

    /// Algorithm for payload comparison. Fixed for the whole run.
    pub digest_algorithm: DigestAlgorithm,

    pub verify_mode: VerifyMode,

    pub on_invalid: InvalidPolicy,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("containers"),
            output: PathBuf::from("combined.asice"),
            extensions: vec!["asice".to_string(), "sce".to_string(), "bdoc".to_string()],
            digest_algorithm: DigestAlgorithm::default(),
            verify_mode: VerifyMode::default(),
            on_invalid: InvalidPolicy::default(),
        }
    }
}

impl MergeConfig {
    pub fn from_yaml_str(content: &str) -> MergeResult<Self> {
        let config: Self = serde_yaml::from_str(content)
            .map_err(|e| MergeError::config(format!("invalid config: {e}")))?;
        config.check_values()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> MergeResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            MergeError::config(format!("failed to read config {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&content)
    }

    /// Check the settings against each other and against the filesystem.
    ///
    /// Run after all layers are applied, so a relative output path resolves
    /// against the working directory of the run.
    pub fn validate(&self) -> MergeResult<()> {
        self.check_values()?;
        if self.output.is_dir() {
            return Err(MergeError::config(format!(
                "output path {} is a directory",
                self.output.display()
            )));
        }
        if let Some(parent) = self.output.parent() {
            if !parent.as_os_str().is_empty() && !parent.is_dir() {
                return Err(MergeError::config(format!(
                    "output directory {} does not exist",
                    parent.display()
                )));
            }
        }
        Ok(())
    }

    fn check_values(&self) -> MergeResult<()> {
        if self.extensions.is_empty() || self.extensions.iter().any(|e| e.trim().is_empty()) {
            return Err(MergeError::config(
                "extensions must list at least one non-empty extension",
            ));
        }
        if self.output.as_os_str().is_empty() {
            return Err(MergeError::config("output path must not be empty"));
        }
        Ok(())
    }
}
