//! Signature verification boundary.
//!
//! The merge core never inspects signatures itself: it hands each one to a
//! [`SignatureVerifier`] together with a [`Payload`] view of the container's
//! data files and only looks at pass/fail.

use std::collections::BTreeSet;
use std::io;

use serde::{Deserialize, Serialize};

use crate::container::Signature;
use crate::digest::{DigestAlgorithm, PayloadDigest};

/// Why a signature did not verify.
#[derive(Debug, thiserror::Error)]
pub enum SignatureFailure {
    #[error("malformed signature: {0}")]
    Malformed(String),

    #[error("unsupported digest method '{0}'")]
    UnsupportedDigest(String),

    #[error("signature references no data files")]
    NoDataReferences,

    #[error("reference '{0}' does not name a data file")]
    UnknownReference(String),

    #[error("data file '{0}' is not covered by the signature")]
    Uncovered(String),

    #[error("digest mismatch for data file '{0}'")]
    DigestMismatch(String),

    #[error("failed to read data file '{name}': {source}")]
    Read {
        name: String,
        #[source]
        source: io::Error,
    },

    /// Rejected by an external verifier.
    #[error("{0}")]
    Rejected(String),
}

/// Read access to a container's data files for verifiers.
pub trait Payload {
    fn data_file_names(&self) -> &[String];

    /// Digest of the named data file, or `None` if no such data file exists.
    fn digest(
        &mut self,
        name: &str,
        algorithm: DigestAlgorithm,
    ) -> io::Result<Option<PayloadDigest>>;
}

/// Opaque signature verification capability.
pub trait SignatureVerifier {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    fn verify(
        &self,
        signature: &Signature,
        payload: &mut dyn Payload,
    ) -> Result<(), SignatureFailure>;
}

/// Checks that the signature's data references cover exactly the container's
/// data files and that every referenced digest matches the file content.
///
/// The `SignatureValue` itself is not checked against a certificate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceDigestVerifier;

impl SignatureVerifier for ReferenceDigestVerifier {
    fn name(&self) -> &'static str {
        "references"
    }

    fn verify(
        &self,
        signature: &Signature,
        payload: &mut dyn Payload,
    ) -> Result<(), SignatureFailure> {
        let references = signature.references()?;
        let mut covered = BTreeSet::new();

        for reference in references.iter().filter(|r| r.is_data_object()) {
            let name = reference.data_file_name();
            let algorithm = DigestAlgorithm::from_xmldsig_uri(&reference.digest_method)
                .ok_or_else(|| SignatureFailure::UnsupportedDigest(reference.digest_method.clone()))?;

            let actual = payload
                .digest(&name, algorithm)
                .map_err(|source| SignatureFailure::Read {
                    name: name.clone(),
                    source,
                })?
                .ok_or_else(|| SignatureFailure::UnknownReference(reference.uri.clone()))?;

            if actual.as_bytes() != reference.digest_value.as_slice() {
                return Err(SignatureFailure::DigestMismatch(name));
            }
            covered.insert(name);
        }

        if covered.is_empty() {
            return Err(SignatureFailure::NoDataReferences);
        }

        if let Some(missing) = payload
            .data_file_names()
            .iter()
            .find(|name| !covered.contains(name.as_str()))
        {
            return Err(SignatureFailure::Uncovered(missing.clone()));
        }

        Ok(())
    }
}

/// Accepts any signature document that is well formed.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructureOnlyVerifier;

impl SignatureVerifier for StructureOnlyVerifier {
    fn name(&self) -> &'static str {
        "structure"
    }

    fn verify(
        &self,
        signature: &Signature,
        _payload: &mut dyn Payload,
    ) -> Result<(), SignatureFailure> {
        signature.references().map(|_| ())
    }
}

/// Built-in verifier selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifyMode {
    #[default]
    References,
    Structure,
}

impl VerifyMode {
    pub fn verifier(self) -> Box<dyn SignatureVerifier> {
        match self {
            Self::References => Box::new(ReferenceDigestVerifier),
            Self::Structure => Box::new(StructureOnlyVerifier),
        }
    }
}

impl std::str::FromStr for VerifyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "references" => Ok(Self::References),
            "structure" => Ok(Self::Structure),
            other => Err(format!("unknown verify mode: {other}")),
        }
    }
}
