//! Error types for the merge run.

use std::io;
use std::path::PathBuf;

use crate::container::ContainerError;

/// Errors that stop a merge run.
///
/// Every variant is terminal: skip outcomes are not errors and never travel
/// through this type.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// The input directory does not exist.
    #[error("input directory not found: {}", path.display())]
    InputDirMissing { path: PathBuf },

    /// The input directory exists but could not be enumerated.
    #[error("failed to read input directory {}: {source}", path.display())]
    InputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A container failed to open or verify.
    #[error(transparent)]
    Container(#[from] ContainerError),

    /// The staging copy of the merge target could not be created.
    #[error("failed to stage merge target in {}: {source}", path.display())]
    Staging {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// Broken internal invariant.
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl MergeError {
    /// Exit code for CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config { .. } => 2,
            Self::InputDirMissing { .. }
            | Self::InputDir { .. }
            | Self::Container(_)
            | Self::Staging { .. }
            | Self::Internal { .. } => 1,
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

/// Result type for merge operations.
pub type MergeResult<T> = Result<T, MergeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_map_to_usage_exit_code() {
        assert_eq!(MergeError::config("bad").exit_code(), 2);
        let missing = MergeError::InputDirMissing {
            path: PathBuf::from("containers"),
        };
        assert_eq!(missing.exit_code(), 1);
        assert_eq!(missing.to_string(), "input directory not found: containers");
    }
}
