#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use asic_merge_core::container::{paths, Manifest, MIMETYPE_ASICE};
use asic_merge_core::{ContainerWriter, MergeConfig, MergeError, Reporter, SkipReason};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use sha2::{Digest, Sha256};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const PDF: &str = "application/pdf";

/// XAdES document with one sha256 reference per data file plus the usual
/// SignedProperties reference. `signer` makes the document unique.
pub fn xades(signer: &str, files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut references = String::new();
    for (i, (name, bytes)) in files.iter().enumerate() {
        references.push_str(&format!(
            r#"<ds:Reference Id="{signer}-RefId{i}" URI="{uri}">
<ds:DigestMethod Algorithm="http://www.w3.org/2001/04/xmlenc#sha256"/>
<ds:DigestValue>{digest}</ds:DigestValue>
</ds:Reference>
"#,
            uri = name.replace(' ', "%20"),
            digest = BASE64.encode(Sha256::digest(bytes)),
        ));
    }

    format!(
        r##"<?xml version="1.0" encoding="UTF-8" standalone="no"?>
<asic:XAdESSignatures xmlns:asic="http://uri.etsi.org/02918/v1.2.1#" xmlns:ds="http://www.w3.org/2000/09/xmldsig#" xmlns:xades="http://uri.etsi.org/01903/v1.3.2#">
<ds:Signature Id="{signer}">
<ds:SignedInfo>
<ds:CanonicalizationMethod Algorithm="http://www.w3.org/2006/12/xml-c14n11"/>
<ds:SignatureMethod Algorithm="http://www.w3.org/2001/04/xmldsig-more#ecdsa-sha256"/>
{references}<ds:Reference Id="{signer}-RefId-SP" Type="http://uri.etsi.org/01903#SignedProperties" URI="#{signer}-SignedProperties">
<ds:DigestMethod Algorithm="http://www.w3.org/2001/04/xmlenc#sha256"/>
<ds:DigestValue>AAAA</ds:DigestValue>
</ds:Reference>
</ds:SignedInfo>
<ds:SignatureValue Id="{signer}-SIG">c2lnbmF0dXJl</ds:SignatureValue>
</ds:Signature>
</asic:XAdESSignatures>
"##
    )
    .into_bytes()
}

/// Scratch workspace: `<tmp>/containers` as input, `<tmp>/combined.asice` as output.
pub struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("containers")).unwrap();
        Self { dir }
    }

    pub fn input(&self) -> PathBuf {
        self.dir.path().join("containers")
    }

    pub fn output(&self) -> PathBuf {
        self.dir.path().join("combined.asice")
    }

    pub fn config(&self) -> MergeConfig {
        MergeConfig {
            input_dir: self.input(),
            output: self.output(),
            ..MergeConfig::default()
        }
    }

    pub fn write(&self, name: &str, writer: ContainerWriter) -> PathBuf {
        let path = self.input().join(name);
        writer.write_to_path(&path).unwrap();
        path
    }

    /// Container with `files` and a single signature by `signer` over them.
    pub fn signed(&self, name: &str, signer: &str, files: &[(&str, &[u8])]) -> PathBuf {
        let writer = files
            .iter()
            .fold(ContainerWriter::new(), |w, (file, bytes)| {
                w.data_file(*file, PDF, bytes.to_vec())
            })
            .signature(xades(signer, files));
        self.write(name, writer)
    }

    /// Signed single-file container whose `mimetype` entry is deflated.
    pub fn deflated_mimetype(&self, name: &str, signer: &str, file: (&str, &[u8])) -> PathBuf {
        let path = self.input().join(name);
        let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let manifest = Manifest::for_data_files([(file.0, PDF)]).render();

        let mut zip = ZipWriter::new(File::create(&path).unwrap());
        zip.start_file(paths::MIMETYPE, deflated).unwrap();
        zip.write_all(MIMETYPE_ASICE.as_bytes()).unwrap();
        zip.start_file(paths::MANIFEST, deflated).unwrap();
        zip.write_all(manifest.as_bytes()).unwrap();
        zip.start_file(file.0, deflated).unwrap();
        zip.write_all(file.1).unwrap();
        zip.start_file("META-INF/signatures0.xml", deflated).unwrap();
        zip.write_all(&xades(signer, &[file])).unwrap();
        zip.finish().unwrap();
        path
    }

    /// Leftover staging files next to the output.
    pub fn staging_leftovers(&self) -> Vec<PathBuf> {
        fs::read_dir(self.dir.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(".asic-merge-") || n.starts_with(".tmp"))
            })
            .collect()
    }
}

pub fn file_name(path: &Path) -> String {
    path.file_name().unwrap().to_string_lossy().into_owned()
}

/// Records every reporter callback as a short line.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    pub events: Vec<String>,
}

impl RecordingReporter {
    pub fn terminal_count(&self) -> usize {
        self.events.iter().filter(|e| e.starts_with("terminal")).count()
    }
}

impl Reporter for RecordingReporter {
    fn accepted_base(&mut self, path: &Path) {
        self.events.push(format!("base {}", file_name(path)));
    }

    fn accepted_contributor(&mut self, path: &Path) {
        self.events.push(format!("contributor {}", file_name(path)));
    }

    fn skipped(&mut self, path: &Path, reason: &SkipReason) {
        self.events
            .push(format!("skipped {} {}", file_name(path), reason.code()));
    }

    fn terminal(&mut self, path: Option<&Path>, _error: &MergeError) {
        match path {
            Some(path) => self.events.push(format!("terminal {}", file_name(path))),
            None => self.events.push("terminal".to_string()),
        }
    }

    fn nothing_merged(&mut self, _input_dir: &Path) {
        self.events.push("nothing_merged".to_string());
    }
}
