//! Container accessor errors.

use std::io;
use std::path::{Path, PathBuf};

use crate::verify::SignatureFailure;

/// Errors raised while opening, verifying or writing a container archive.
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    /// Container file does not exist.
    #[error("container not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// The file is not a readable ZIP archive.
    #[error("malformed container archive {}: {reason}", path.display())]
    MalformedArchive { path: PathBuf, reason: String },

    /// The archive violates the ASiC-E layout.
    #[error("invalid container structure in {}: {reason}", path.display())]
    Structure { path: PathBuf, reason: String },

    /// A signature in the container did not verify.
    #[error("signature verification failed for {} ({signature}): {source}", path.display())]
    SignatureVerification {
        path: PathBuf,
        signature: String,
        #[source]
        source: SignatureFailure,
    },

    /// The signature is already present in the container.
    #[error("signature already present in {}", path.display())]
    DuplicateSignature { path: PathBuf },

    /// I/O error while reading or writing the archive.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ContainerError {
    pub(crate) fn open(path: &Path, err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::NotFound {
            Self::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            Self::io(path, err)
        }
    }

    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn malformed(path: &Path, err: zip::result::ZipError) -> Self {
        Self::MalformedArchive {
            path: path.to_path_buf(),
            reason: err.to_string(),
        }
    }

    pub(crate) fn structure(path: &Path, reason: impl Into<String>) -> Self {
        Self::Structure {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    /// Whether this error came from signature verification rather than the
    /// archive layout.
    pub fn is_signature_failure(&self) -> bool {
        matches!(self, Self::SignatureVerification { .. })
    }
}

/// Result type for container operations.
pub type ContainerResult<T> = Result<T, ContainerError>;
