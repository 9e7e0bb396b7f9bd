//! Signature handles and XAdES reference extraction.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use once_cell::sync::Lazy;
use percent_encoding::percent_decode_str;
use regex::Regex;
use sha2::{Digest, Sha256};

use super::xml;
use crate::verify::SignatureFailure;

const SIGNED_PROPERTIES_TYPE_SUFFIX: &str = "#SignedProperties";

static REFERENCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?s)<(?:[A-Za-z_][\w.-]*:)?Reference\b([^>]*)>(.*?)</(?:[A-Za-z_][\w.-]*:)?Reference\s*>",
    )
    .expect("reference pattern")
});
static DIGEST_METHOD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<(?:[A-Za-z_][\w.-]*:)?DigestMethod\b([^>]*)>").expect("digest method pattern")
});
static DIGEST_VALUE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?s)<(?:[A-Za-z_][\w.-]*:)?DigestValue\b[^>]*>(.*?)</(?:[A-Za-z_][\w.-]*:)?DigestValue\s*>",
    )
    .expect("digest value pattern")
});
static SIGNATURE_VALUE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<(?:[A-Za-z_][\w.-]*:)?SignatureValue\b").expect("signature value pattern")
});
static URI_RE: Lazy<Regex> = Lazy::new(|| xml::attribute_regex("URI"));
static TYPE_RE: Lazy<Regex> = Lazy::new(|| xml::attribute_regex("Type"));
static ALGORITHM_RE: Lazy<Regex> = Lazy::new(|| xml::attribute_regex("Algorithm"));

/// An opaque signature document, as stored under `META-INF/`.
///
/// The handle owns its bytes, so it outlives the container it was read from
/// and can be transplanted into another container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    file_name: String,
    xml: Vec<u8>,
}

impl Signature {
    pub fn new(file_name: impl Into<String>, xml: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            xml: xml.into(),
        }
    }

    /// Archive entry name the signature was read from (or will be stored as).
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn xml(&self) -> &[u8] {
        &self.xml
    }

    /// `sha256:<hex>` of the signature document; equal for byte-identical
    /// signatures regardless of entry name.
    pub fn fingerprint(&self) -> String {
        format!("sha256:{}", hex::encode(Sha256::digest(&self.xml)))
    }

    pub(crate) fn with_file_name(&self, file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            xml: self.xml.clone(),
        }
    }

    /// Extract every `ds:Reference` from the signature.
    pub fn references(&self) -> Result<Vec<SignatureReference>, SignatureFailure> {
        let text = std::str::from_utf8(&self.xml)
            .map_err(|e| SignatureFailure::Malformed(format!("not UTF-8: {e}")))?;

        if !SIGNATURE_VALUE_RE.is_match(text) {
            return Err(SignatureFailure::Malformed(
                "missing SignatureValue element".to_string(),
            ));
        }

        REFERENCE_RE
            .captures_iter(text)
            .map(|caps| {
                let attrs = caps.get(1).map_or("", |m| m.as_str());
                let body = caps.get(2).map_or("", |m| m.as_str());
                SignatureReference::parse(attrs, body)
            })
            .collect()
    }
}

/// One `ds:Reference` of a signature's `SignedInfo`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureReference {
    pub uri: String,
    pub reference_type: Option<String>,
    pub digest_method: String,
    pub digest_value: Vec<u8>,
}

impl SignatureReference {
    fn parse(attrs: &str, body: &str) -> Result<Self, SignatureFailure> {
        let uri = xml::attribute(&URI_RE, attrs).unwrap_or_default();
        let reference_type = xml::attribute(&TYPE_RE, attrs);

        let digest_method = DIGEST_METHOD_RE
            .captures(body)
            .and_then(|caps| xml::attribute(&ALGORITHM_RE, caps.get(1)?.as_str()))
            .ok_or_else(|| {
                SignatureFailure::Malformed(format!("reference '{uri}' has no DigestMethod"))
            })?;

        let encoded = DIGEST_VALUE_RE
            .captures(body)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
            .ok_or_else(|| {
                SignatureFailure::Malformed(format!("reference '{uri}' has no DigestValue"))
            })?;
        let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
        let digest_value = BASE64.decode(compact.as_bytes()).map_err(|e| {
            SignatureFailure::Malformed(format!("reference '{uri}' DigestValue: {e}"))
        })?;

        Ok(Self {
            uri,
            reference_type,
            digest_method,
            digest_value,
        })
    }

    /// Whether the reference points at a data file rather than at signed
    /// properties or another same-document fragment.
    pub fn is_data_object(&self) -> bool {
        if self.uri.is_empty() || self.uri.starts_with('#') {
            return false;
        }
        !self
            .reference_type
            .as_deref()
            .is_some_and(|t| t.ends_with(SIGNED_PROPERTIES_TYPE_SUFFIX))
    }

    /// The data file name the URI refers to (percent-decoded, relative).
    pub fn data_file_name(&self) -> String {
        let decoded = percent_decode_str(&self.uri).decode_utf8_lossy();
        decoded.trim_start_matches("./").to_string()
    }
}
