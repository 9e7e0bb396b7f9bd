//! ASiC-E container accessor.
//!
//! An ASiC-E container is a ZIP archive laid out as:
//! - `mimetype`: first entry, stored, `application/vnd.etsi.asic-e+zip`
//! - `META-INF/manifest.xml`: media types of the data files
//! - `META-INF/*signatures*.xml`: one XAdES signature document each
//! - every other file entry is a data file, in archive order
//!
//! [`Container`] owns the archive handle; dropping it releases the file.

mod error;
pub mod manifest;
mod signature;
mod writer;
mod xml;

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Component, Path, PathBuf};

use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::digest::{DigestAlgorithm, PayloadDigest};
use crate::verify::{Payload, SignatureVerifier};

pub use error::{ContainerError, ContainerResult};
pub use manifest::{Manifest, ManifestEntry};
pub use signature::{Signature, SignatureReference};
pub use writer::ContainerWriter;

/// Canonical entry names inside the archive.
pub mod paths {
    pub const MIMETYPE: &str = "mimetype";
    pub const META_INF: &str = "META-INF/";
    pub const MANIFEST: &str = "META-INF/manifest.xml";
}

/// Upper bounds on what is read from an archive into memory.
///
/// Declared entry sizes come from the archive itself and are never trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadLimits {
    /// `mimetype`, `META-INF/manifest.xml` and signature documents.
    pub max_metadata_bytes: u64,
    /// A single data file.
    pub max_data_file_bytes: u64,
}

impl Default for ReadLimits {
    fn default() -> Self {
        Self {
            max_metadata_bytes: 10 * 1024 * 1024,   // 10 MB
            max_data_file_bytes: 1024 * 1024 * 1024, // 1 GB
        }
    }
}

// Preallocation cap; buffers grow past it as bytes actually arrive.
const MAX_PREALLOC_BYTES: u64 = 64 * 1024;

/// Content of the `mimetype` entry for ASiC-E.
pub const MIMETYPE_ASICE: &str = "application/vnd.etsi.asic-e+zip";

/// Whether an entry name denotes a signature document.
pub fn is_signature_entry(name: &str) -> bool {
    let Some(file) = name.strip_prefix(paths::META_INF) else {
        return false;
    };
    !file.contains('/') && file.contains("signatures") && file.ends_with(".xml")
}

fn is_data_entry(name: &str) -> bool {
    name != paths::MIMETYPE && !name.starts_with(paths::META_INF) && !name.ends_with('/')
}

fn read_error(err: zip::result::ZipError) -> io::Error {
    match err {
        zip::result::ZipError::Io(e) => e,
        other => io::Error::new(io::ErrorKind::InvalidData, other),
    }
}

/// One data file read from a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataFile {
    pub name: String,
    pub bytes: Vec<u8>,
    pub media_type: String,
}

/// An opened container archive.
pub struct Container {
    path: PathBuf,
    archive: ZipArchive<BufReader<File>>,
    entry_names: Vec<String>,
    data_file_names: Vec<String>,
    signature_file_names: Vec<String>,
    manifest: Option<Manifest>,
    pending: Vec<Signature>,
    digest_cache: HashMap<(String, DigestAlgorithm), PayloadDigest>,
    limits: ReadLimits,
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("path", &self.path)
            .field("data_file_names", &self.data_file_names)
            .field("signature_file_names", &self.signature_file_names)
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl Container {
    /// Open a container archive and index its entries.
    ///
    /// Only the ZIP central directory is validated here; the ASiC-E layout is
    /// checked by [`Container::verify`].
    pub fn open(path: impl AsRef<Path>) -> ContainerResult<Self> {
        Self::open_with_limits(path, ReadLimits::default())
    }

    /// [`Container::open`] with explicit read limits.
    pub fn open_with_limits(path: impl AsRef<Path>, limits: ReadLimits) -> ContainerResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| ContainerError::open(path, e))?;
        let mut archive = ZipArchive::new(BufReader::new(file))
            .map_err(|e| ContainerError::malformed(path, e))?;

        let mut entry_names = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let entry = archive
                .by_index_raw(i)
                .map_err(|e| ContainerError::malformed(path, e))?;
            entry_names.push(entry.name().to_string());
        }

        let data_file_names = entry_names
            .iter()
            .filter(|n| is_data_entry(n))
            .cloned()
            .collect();
        let signature_file_names = entry_names
            .iter()
            .filter(|n| is_signature_entry(n))
            .cloned()
            .collect();

        let mut container = Self {
            path: path.to_path_buf(),
            archive,
            entry_names,
            data_file_names,
            signature_file_names,
            manifest: None,
            pending: Vec::new(),
            digest_cache: HashMap::new(),
            limits,
        };

        if container.has_entry(paths::MANIFEST) {
            let content = container.read_entry(paths::MANIFEST, limits.max_metadata_bytes)?;
            container.manifest = Some(Manifest::parse(&content));
        }

        debug!(
            path = %path.display(),
            data_files = container.data_file_names.len(),
            signatures = container.signature_file_names.len(),
            "opened container"
        );
        Ok(container)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of signatures, including ones added but not yet saved.
    pub fn signature_count(&self) -> usize {
        self.signature_file_names.len() + self.pending.len()
    }

    /// Data file names in archive order.
    pub fn data_file_names(&self) -> &[String] {
        &self.data_file_names
    }

    pub fn has_data_files(&self) -> bool {
        !self.data_file_names.is_empty()
    }

    pub fn manifest(&self) -> Option<&Manifest> {
        self.manifest.as_ref()
    }

    /// Entry names of the stored signature documents.
    pub fn signature_file_names(&self) -> &[String] {
        &self.signature_file_names
    }

    /// Check the ASiC-E layout, then hand every signature to `verifier`.
    pub fn verify(&mut self, verifier: &dyn SignatureVerifier) -> ContainerResult<()> {
        self.verify_structure()?;

        let signatures = self.iter_signatures().collect::<ContainerResult<Vec<_>>>()?;
        for signature in &signatures {
            verifier.verify(signature, &mut *self).map_err(|source| {
                ContainerError::SignatureVerification {
                    path: self.path.clone(),
                    signature: signature.file_name().to_string(),
                    source,
                }
            })?;
        }

        debug!(
            path = %self.path.display(),
            verifier = verifier.name(),
            signatures = signatures.len(),
            "container verified"
        );
        Ok(())
    }

    fn verify_structure(&mut self) -> ContainerResult<()> {
        let path = self.path.clone();

        for name in &self.entry_names {
            if !is_safe_entry_name(name) {
                return Err(ContainerError::structure(
                    &path,
                    format!("unsafe entry name '{name}'"),
                ));
            }
        }

        if self.entry_names.first().map(String::as_str) != Some(paths::MIMETYPE) {
            return Err(ContainerError::structure(
                &path,
                "first entry must be 'mimetype'",
            ));
        }

        let compression = self
            .archive
            .by_index_raw(0)
            .map_err(|e| ContainerError::malformed(&path, e))?
            .compression();
        if compression != CompressionMethod::Stored {
            return Err(ContainerError::structure(
                &path,
                "'mimetype' entry must be stored uncompressed",
            ));
        }

        let mimetype = self.read_entry(paths::MIMETYPE, self.limits.max_metadata_bytes)?;
        let mimetype = String::from_utf8_lossy(&mimetype);
        if mimetype.trim() != MIMETYPE_ASICE {
            return Err(ContainerError::structure(
                &path,
                format!("unexpected mimetype '{}'", mimetype.trim()),
            ));
        }

        let Some(manifest) = &self.manifest else {
            return Err(ContainerError::structure(
                &path,
                format!("missing {}", paths::MANIFEST),
            ));
        };

        if let Some(name) = self
            .data_file_names
            .iter()
            .find(|n| manifest.media_type(n).is_none())
        {
            return Err(ContainerError::structure(
                &path,
                format!("data file '{name}' is not listed in the manifest"),
            ));
        }

        if let Some(entry) = manifest
            .file_entries()
            .find(|e| !self.data_file_names.contains(&e.full_path))
        {
            return Err(ContainerError::structure(
                &path,
                format!("manifest lists '{}' but the file is missing", entry.full_path),
            ));
        }

        Ok(())
    }

    /// Lazily read the data files in [`Container::data_file_names`] order.
    pub fn iter_data_files(&mut self) -> DataFiles<'_> {
        DataFiles {
            container: self,
            next: 0,
        }
    }

    /// Lazily read the signatures: stored ones first, then pending ones.
    pub fn iter_signatures(&mut self) -> Signatures<'_> {
        Signatures {
            container: self,
            next: 0,
        }
    }

    /// Whether a byte-identical signature is already present.
    pub fn contains_signature(&mut self, signature: &Signature) -> ContainerResult<bool> {
        for existing in self.iter_signatures() {
            if existing?.xml() == signature.xml() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Queue a signature for the next [`Container::save`], stored as the next
    /// free `META-INF/signatures{N}.xml`.
    pub fn add_signature(&mut self, signature: &Signature) -> ContainerResult<()> {
        if self.contains_signature(signature)? {
            return Err(ContainerError::DuplicateSignature {
                path: self.path.clone(),
            });
        }

        let mut index = self.signature_count();
        let file_name = loop {
            let candidate = format!("{}signatures{index}.xml", paths::META_INF);
            let taken = self.has_entry(&candidate)
                || self.pending.iter().any(|s| s.file_name() == candidate);
            if !taken {
                break candidate;
            }
            index += 1;
        };

        debug!(
            path = %self.path.display(),
            entry = %file_name,
            "queued signature"
        );
        self.pending.push(signature.with_file_name(file_name));
        Ok(())
    }

    /// Write the container, including queued signatures, to `dest`.
    ///
    /// Existing entries are copied without recompression so `mimetype` stays
    /// first and stored. The archive is written to a temporary file beside
    /// `dest` and renamed into place.
    pub fn save(&mut self, dest: impl AsRef<Path>) -> ContainerResult<()> {
        let dest = dest.as_ref();
        let dir = match dest.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let staging =
            tempfile::NamedTempFile::new_in(&dir).map_err(|e| ContainerError::io(dest, e))?;

        {
            let mut writer = ZipWriter::new(BufWriter::new(staging.as_file()));
            for i in 0..self.archive.len() {
                let entry = self
                    .archive
                    .by_index_raw(i)
                    .map_err(|e| ContainerError::malformed(&self.path, e))?;
                writer
                    .raw_copy_file(entry)
                    .map_err(|e| ContainerError::io(dest, read_error(e)))?;
            }

            let options =
                SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
            for signature in &self.pending {
                writer
                    .start_file(signature.file_name(), options)
                    .map_err(|e| ContainerError::io(dest, read_error(e)))?;
                writer
                    .write_all(signature.xml())
                    .map_err(|e| ContainerError::io(dest, e))?;
            }

            let mut inner = writer
                .finish()
                .map_err(|e| ContainerError::io(dest, read_error(e)))?;
            inner.flush().map_err(|e| ContainerError::io(dest, e))?;
        }

        staging
            .persist(dest)
            .map_err(|e| ContainerError::io(dest, e.error))?;

        debug!(
            path = %dest.display(),
            signatures = self.signature_count(),
            "saved container"
        );
        Ok(())
    }

    fn has_entry(&self, name: &str) -> bool {
        self.entry_names.iter().any(|n| n == name)
    }

    /// Read a whole entry, failing once more than `limit` bytes come out.
    fn read_entry(&mut self, name: &str, limit: u64) -> ContainerResult<Vec<u8>> {
        let entry = self.archive.by_name(name).map_err(|e| match e {
            zip::result::ZipError::FileNotFound => {
                ContainerError::structure(&self.path, format!("missing entry '{name}'"))
            }
            other => ContainerError::malformed(&self.path, other),
        })?;

        let capacity = entry.size().min(limit).min(MAX_PREALLOC_BYTES);
        let mut buf = Vec::with_capacity(usize::try_from(capacity).unwrap_or(0));
        entry
            .take(limit.saturating_add(1))
            .read_to_end(&mut buf)
            .map_err(|e| ContainerError::io(&self.path, e))?;

        if buf.len() as u64 > limit {
            return Err(ContainerError::structure(
                &self.path,
                format!("entry '{name}' exceeds {limit} bytes"),
            ));
        }
        Ok(buf)
    }

    fn read_data_file(&mut self, name: &str) -> ContainerResult<DataFile> {
        let bytes = self.read_entry(name, self.limits.max_data_file_bytes)?;
        let media_type = self
            .manifest
            .as_ref()
            .and_then(|m| m.media_type(name))
            .unwrap_or(manifest::DEFAULT_MEDIA_TYPE)
            .to_string();
        Ok(DataFile {
            name: name.to_string(),
            bytes,
            media_type,
        })
    }
}

impl Payload for Container {
    fn data_file_names(&self) -> &[String] {
        &self.data_file_names
    }

    fn digest(
        &mut self,
        name: &str,
        algorithm: DigestAlgorithm,
    ) -> io::Result<Option<PayloadDigest>> {
        if !self.data_file_names.iter().any(|n| n == name) {
            return Ok(None);
        }
        let key = (name.to_string(), algorithm);
        if let Some(digest) = self.digest_cache.get(&key) {
            return Ok(Some(digest.clone()));
        }

        let entry = self.archive.by_name(name).map_err(read_error)?;
        let digest = algorithm.digest_reader(entry)?;
        self.digest_cache.insert(key, digest.clone());
        Ok(Some(digest))
    }
}

fn is_safe_entry_name(name: &str) -> bool {
    if name.is_empty() || name.contains('\\') || name.starts_with('/') {
        return false;
    }
    Path::new(name)
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Iterator returned by [`Container::iter_data_files`].
pub struct DataFiles<'a> {
    container: &'a mut Container,
    next: usize,
}

impl Iterator for DataFiles<'_> {
    type Item = ContainerResult<DataFile>;

    fn next(&mut self) -> Option<Self::Item> {
        let name = self.container.data_file_names.get(self.next)?.clone();
        self.next += 1;
        Some(self.container.read_data_file(&name))
    }
}

/// Iterator returned by [`Container::iter_signatures`].
pub struct Signatures<'a> {
    container: &'a mut Container,
    next: usize,
}

impl Iterator for Signatures<'_> {
    type Item = ContainerResult<Signature>;

    fn next(&mut self) -> Option<Self::Item> {
        let stored = self.container.signature_file_names.len();
        let index = self.next;
        self.next += 1;

        if index < stored {
            let name = self.container.signature_file_names[index].clone();
            return Some(
                self.container
                    .read_entry(&name, self.container.limits.max_metadata_bytes)
                    .map(|xml| Signature::new(name, xml)),
            );
        }
        self.container.pending.get(index - stored).cloned().map(Ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verify::StructureOnlyVerifier;
    use tempfile::tempdir;

    const DOC: &[u8] = b"%PDF-1.7 doc";

    fn manifest_xml() -> Vec<u8> {
        Manifest::for_data_files([("doc.pdf", "application/pdf")])
            .render()
            .into_bytes()
    }

    fn write_zip(path: &Path, entries: &[(&str, &[u8], CompressionMethod)]) {
        let mut zip = ZipWriter::new(File::create(path).unwrap());
        for (name, bytes, method) in entries {
            let options = SimpleFileOptions::default().compression_method(*method);
            zip.start_file(*name, options).unwrap();
            zip.write_all(bytes).unwrap();
        }
        zip.finish().unwrap();
    }

    /// Open and structurally verify an archive with the given entries,
    /// returning the rejection reason.
    fn structure_rejection(entries: &[(&str, &[u8], CompressionMethod)]) -> String {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.asice");
        write_zip(&path, entries);

        let mut container = Container::open(&path).unwrap();
        match container.verify(&StructureOnlyVerifier) {
            Err(ContainerError::Structure { reason, .. }) => reason,
            other => panic!("expected a structure error, got {other:?}"),
        }
    }

    const STORED: CompressionMethod = CompressionMethod::Stored;
    const DEFLATED: CompressionMethod = CompressionMethod::Deflated;

    #[test]
    fn well_formed_layout_passes_structure_checks() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ok.asice");
        let manifest = manifest_xml();
        write_zip(
            &path,
            &[
                (paths::MIMETYPE, MIMETYPE_ASICE.as_bytes(), STORED),
                (paths::MANIFEST, manifest.as_slice(), DEFLATED),
                ("doc.pdf", DOC, DEFLATED),
            ],
        );

        let mut container = Container::open(&path).unwrap();
        container.verify(&StructureOnlyVerifier).unwrap();
        assert_eq!(container.data_file_names(), ["doc.pdf".to_string()]);
    }

    #[test]
    fn mimetype_must_be_the_first_entry() {
        let manifest = manifest_xml();
        let reason = structure_rejection(&[
            (paths::MANIFEST, manifest.as_slice(), DEFLATED),
            (paths::MIMETYPE, MIMETYPE_ASICE.as_bytes(), STORED),
            ("doc.pdf", DOC, DEFLATED),
        ]);
        assert!(reason.contains("first entry"), "{reason}");
    }

    #[test]
    fn mimetype_must_be_stored() {
        let manifest = manifest_xml();
        let reason = structure_rejection(&[
            (paths::MIMETYPE, MIMETYPE_ASICE.as_bytes(), DEFLATED),
            (paths::MANIFEST, manifest.as_slice(), DEFLATED),
            ("doc.pdf", DOC, DEFLATED),
        ]);
        assert!(reason.contains("stored uncompressed"), "{reason}");
    }

    #[test]
    fn mimetype_value_must_be_asic_e() {
        let manifest = manifest_xml();
        let reason = structure_rejection(&[
            (paths::MIMETYPE, &b"application/vnd.etsi.asic-s+zip"[..], STORED),
            (paths::MANIFEST, manifest.as_slice(), DEFLATED),
            ("doc.pdf", DOC, DEFLATED),
        ]);
        assert!(reason.contains("unexpected mimetype"), "{reason}");
    }

    #[test]
    fn manifest_is_required() {
        let reason = structure_rejection(&[
            (paths::MIMETYPE, MIMETYPE_ASICE.as_bytes(), STORED),
            ("doc.pdf", DOC, DEFLATED),
        ]);
        assert!(reason.contains("missing META-INF/manifest.xml"), "{reason}");
    }

    #[test]
    fn every_data_file_must_be_in_the_manifest() {
        let manifest = manifest_xml();
        let reason = structure_rejection(&[
            (paths::MIMETYPE, MIMETYPE_ASICE.as_bytes(), STORED),
            (paths::MANIFEST, manifest.as_slice(), DEFLATED),
            ("doc.pdf", DOC, DEFLATED),
            ("extra.txt", &b"unlisted"[..], DEFLATED),
        ]);
        assert!(reason.contains("'extra.txt' is not listed"), "{reason}");
    }

    #[test]
    fn every_manifest_file_must_exist() {
        let manifest = manifest_xml();
        let reason = structure_rejection(&[
            (paths::MIMETYPE, MIMETYPE_ASICE.as_bytes(), STORED),
            (paths::MANIFEST, manifest.as_slice(), DEFLATED),
        ]);
        assert!(reason.contains("lists 'doc.pdf'"), "{reason}");
    }

    #[test]
    fn traversal_entry_names_are_rejected() {
        let manifest = manifest_xml();
        let reason = structure_rejection(&[
            (paths::MIMETYPE, MIMETYPE_ASICE.as_bytes(), STORED),
            (paths::MANIFEST, manifest.as_slice(), DEFLATED),
            ("doc.pdf", DOC, DEFLATED),
            ("../evil.txt", &b"x"[..], DEFLATED),
        ]);
        assert!(reason.contains("unsafe entry name"), "{reason}");
    }

    #[test]
    fn oversized_metadata_entry_is_a_structure_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ok.asice");
        ContainerWriter::new()
            .data_file("doc.pdf", "application/pdf", DOC.to_vec())
            .write_to_path(&path)
            .unwrap();

        let limits = ReadLimits {
            max_metadata_bytes: 16,
            ..ReadLimits::default()
        };
        match Container::open_with_limits(&path, limits) {
            Err(ContainerError::Structure { reason, .. }) => {
                assert!(reason.contains("exceeds 16 bytes"), "{reason}")
            }
            other => panic!("expected a structure error, got {other:?}"),
        }
    }

    #[test]
    fn oversized_data_file_is_a_structure_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ok.asice");
        ContainerWriter::new()
            .data_file("doc.pdf", "application/pdf", vec![b'x'; 64])
            .write_to_path(&path)
            .unwrap();

        let limits = ReadLimits {
            max_data_file_bytes: 63,
            ..ReadLimits::default()
        };
        let mut container = Container::open_with_limits(&path, limits).unwrap();
        let err = container.iter_data_files().next().unwrap().unwrap_err();
        assert!(matches!(err, ContainerError::Structure { .. }), "{err:?}");
    }

    fn crc32(bytes: &[u8]) -> u32 {
        let mut crc = !0u32;
        for &b in bytes {
            crc ^= u32::from(b);
            for _ in 0..8 {
                let mask = (crc & 1).wrapping_neg();
                crc = (crc >> 1) ^ (0xEDB8_8320 & mask);
            }
        }
        !crc
    }

    /// Stored entries with real contents; an entry paired with `Some(size)`
    /// declares that uncompressed size in a ZIP64 extra field of its central
    /// directory record.
    fn raw_zip(entries: &[(&str, &[u8], Option<u64>)]) -> Vec<u8> {
        let mut out = Vec::new();
        let mut central = Vec::new();
        for (name, bytes, declared) in entries {
            let offset = out.len() as u32;
            let crc = crc32(bytes);
            let len = bytes.len() as u32;

            out.extend_from_slice(&0x0403_4b50u32.to_le_bytes());
            out.extend_from_slice(&45u16.to_le_bytes());
            out.extend_from_slice(&0u16.to_le_bytes()); // flags
            out.extend_from_slice(&0u16.to_le_bytes()); // stored
            out.extend_from_slice(&0u16.to_le_bytes()); // time
            out.extend_from_slice(&0x21u16.to_le_bytes()); // date
            out.extend_from_slice(&crc.to_le_bytes());
            out.extend_from_slice(&len.to_le_bytes());
            out.extend_from_slice(&len.to_le_bytes());
            out.extend_from_slice(&(name.len() as u16).to_le_bytes());
            out.extend_from_slice(&0u16.to_le_bytes());
            out.extend_from_slice(name.as_bytes());
            out.extend_from_slice(bytes);

            let mut extra = Vec::new();
            let uncompressed = match declared {
                Some(size) => {
                    extra.extend_from_slice(&0x0001u16.to_le_bytes());
                    extra.extend_from_slice(&8u16.to_le_bytes());
                    extra.extend_from_slice(&size.to_le_bytes());
                    u32::MAX
                }
                None => len,
            };
            central.extend_from_slice(&0x0201_4b50u32.to_le_bytes());
            central.extend_from_slice(&45u16.to_le_bytes());
            central.extend_from_slice(&45u16.to_le_bytes());
            central.extend_from_slice(&0u16.to_le_bytes());
            central.extend_from_slice(&0u16.to_le_bytes());
            central.extend_from_slice(&0u16.to_le_bytes());
            central.extend_from_slice(&0x21u16.to_le_bytes());
            central.extend_from_slice(&crc.to_le_bytes());
            central.extend_from_slice(&len.to_le_bytes());
            central.extend_from_slice(&uncompressed.to_le_bytes());
            central.extend_from_slice(&(name.len() as u16).to_le_bytes());
            central.extend_from_slice(&(extra.len() as u16).to_le_bytes());
            central.extend_from_slice(&0u16.to_le_bytes()); // comment
            central.extend_from_slice(&0u16.to_le_bytes()); // disk
            central.extend_from_slice(&0u16.to_le_bytes()); // internal attrs
            central.extend_from_slice(&0u32.to_le_bytes()); // external attrs
            central.extend_from_slice(&offset.to_le_bytes());
            central.extend_from_slice(name.as_bytes());
            central.extend_from_slice(&extra);
        }

        let central_offset = out.len() as u32;
        let count = entries.len() as u16;
        out.extend_from_slice(&central);
        out.extend_from_slice(&0x0605_4b50u32.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&count.to_le_bytes());
        out.extend_from_slice(&count.to_le_bytes());
        out.extend_from_slice(&(central.len() as u32).to_le_bytes());
        out.extend_from_slice(&central_offset.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out
    }

    #[test]
    fn huge_declared_entry_size_does_not_preallocate() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("zip64.asice");
        let manifest = manifest_xml();
        std::fs::write(
            &path,
            raw_zip(&[
                (paths::MIMETYPE, MIMETYPE_ASICE.as_bytes(), None),
                (paths::MANIFEST, manifest.as_slice(), Some(0xFFFF_FFFF_FFFF_FFF0)),
                ("doc.pdf", DOC, Some(0xFFFF_FFFF_FFFF_FFF0)),
            ]),
        )
        .unwrap();

        // Reaching either arm means the declared size was not trusted for
        // allocation.
        match Container::open(&path) {
            Ok(mut container) => {
                let _ = container.verify(&StructureOnlyVerifier);
                let _ = container.iter_data_files().collect::<Vec<_>>();
            }
            Err(err) => assert!(!err.is_signature_failure(), "{err:?}"),
        }
    }

    #[test]
    fn signature_entry_convention() {
        assert!(is_signature_entry("META-INF/signatures0.xml"));
        assert!(is_signature_entry("META-INF/signatures.xml"));
        assert!(is_signature_entry("META-INF/mysignatures12.xml"));
        assert!(!is_signature_entry("META-INF/manifest.xml"));
        assert!(!is_signature_entry("META-INF/sub/signatures0.xml"));
        assert!(!is_signature_entry("signatures0.xml"));
    }

    #[test]
    fn data_entry_convention() {
        assert!(is_data_entry("doc.pdf"));
        assert!(is_data_entry("folder/doc.pdf"));
        assert!(!is_data_entry("mimetype"));
        assert!(!is_data_entry("META-INF/manifest.xml"));
        assert!(!is_data_entry("folder/"));
    }

    #[test]
    fn entry_name_safety() {
        assert!(is_safe_entry_name("doc.pdf"));
        assert!(is_safe_entry_name("a/b.txt"));
        assert!(!is_safe_entry_name("../etc/passwd"));
        assert!(!is_safe_entry_name("/abs.txt"));
        assert!(!is_safe_entry_name("a\\b.txt"));
        assert!(!is_safe_entry_name("a/../../b.txt"));
    }
}
