//! Payload digests.
//!
//! Contract:
//! - one digest algorithm per run, chosen by configuration
//! - identical bytes always yield identical digests
//! - the only failure mode is a read error from the input stream

use std::fmt;
use std::io::{self, Cursor, Read};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};

const XMLENC_SHA256: &str = "http://www.w3.org/2001/04/xmlenc#sha256";
const XMLENC_SHA512: &str = "http://www.w3.org/2001/04/xmlenc#sha512";
const XMLDSIG_MORE_SHA224: &str = "http://www.w3.org/2001/04/xmldsig-more#sha224";
const XMLDSIG_MORE_SHA384: &str = "http://www.w3.org/2001/04/xmldsig-more#sha384";

/// Hash algorithms understood by the merge run and the reference verifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    Sha224,
    #[default]
    Sha256,
    Sha384,
    Sha512,
}

impl DigestAlgorithm {
    /// Map an XML-DSig `DigestMethod/@Algorithm` URI to an algorithm.
    pub fn from_xmldsig_uri(uri: &str) -> Option<Self> {
        match uri.trim() {
            XMLDSIG_MORE_SHA224 => Some(Self::Sha224),
            XMLENC_SHA256 => Some(Self::Sha256),
            XMLDSIG_MORE_SHA384 => Some(Self::Sha384),
            XMLENC_SHA512 => Some(Self::Sha512),
            _ => None,
        }
    }

    /// The XML-DSig URI for this algorithm.
    pub fn xmldsig_uri(self) -> &'static str {
        match self {
            Self::Sha224 => XMLDSIG_MORE_SHA224,
            Self::Sha256 => XMLENC_SHA256,
            Self::Sha384 => XMLDSIG_MORE_SHA384,
            Self::Sha512 => XMLENC_SHA512,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Sha224 => "sha224",
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
        }
    }

    /// Digest an in-memory buffer.
    pub fn digest(self, bytes: &[u8]) -> PayloadDigest {
        // Reading from a cursor cannot fail.
        self.digest_reader(Cursor::new(bytes))
            .expect("hashing in-memory bytes via cursor must not fail")
    }

    /// Digest a stream, reading it to the end.
    pub fn digest_reader<R: Read>(self, reader: R) -> io::Result<PayloadDigest> {
        let bytes = match self {
            Self::Sha224 => hash_reader::<Sha224, _>(reader)?,
            Self::Sha256 => hash_reader::<Sha256, _>(reader)?,
            Self::Sha384 => hash_reader::<Sha384, _>(reader)?,
            Self::Sha512 => hash_reader::<Sha512, _>(reader)?,
        };
        Ok(PayloadDigest(bytes))
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for DigestAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha224" => Ok(Self::Sha224),
            "sha256" => Ok(Self::Sha256),
            "sha384" => Ok(Self::Sha384),
            "sha512" => Ok(Self::Sha512),
            other => Err(format!("unsupported digest algorithm: {other}")),
        }
    }
}

fn hash_reader<D: Digest, R: Read>(mut reader: R) -> io::Result<Vec<u8>> {
    let mut hasher = D::new();
    let mut buf = [0_u8; 8192];

    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hasher.finalize().to_vec())
}

/// Digest of one data file.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PayloadDigest(Vec<u8>);

impl PayloadDigest {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl fmt::Debug for PayloadDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PayloadDigest({})", self.to_hex())
    }
}

impl fmt::Display for PayloadDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Ordered digests of a container's data files, in data file name order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadDigestSet {
    algorithm: DigestAlgorithm,
    digests: Vec<PayloadDigest>,
}

impl PayloadDigestSet {
    pub fn new(algorithm: DigestAlgorithm, digests: Vec<PayloadDigest>) -> Self {
        Self { algorithm, digests }
    }

    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    pub fn digests(&self) -> &[PayloadDigest] {
        &self.digests
    }

    pub fn len(&self) -> usize {
        self.digests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.digests.is_empty()
    }
}
