//! Fresh container creation.
//!
//! Writes `mimetype` first and stored, then the manifest, the data files in
//! the order they were added and finally the signature documents.

use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::{paths, read_error, ContainerError, ContainerResult, DataFile, Manifest, MIMETYPE_ASICE};

/// Builder for a new ASiC-E archive.
#[derive(Debug, Default, Clone)]
pub struct ContainerWriter {
    data_files: Vec<DataFile>,
    signatures: Vec<Vec<u8>>,
}

impl ContainerWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data_file(
        mut self,
        name: impl Into<String>,
        media_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        self.data_files.push(DataFile {
            name: name.into(),
            bytes: bytes.into(),
            media_type: media_type.into(),
        });
        self
    }

    /// Add a signature document, stored as `META-INF/signatures{N}.xml`.
    pub fn signature(mut self, xml: impl Into<Vec<u8>>) -> Self {
        self.signatures.push(xml.into());
        self
    }

    pub fn write_to<W: Write + Seek>(&self, w: W) -> zip::result::ZipResult<W> {
        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        let mut zip = ZipWriter::new(w);
        zip.start_file(paths::MIMETYPE, stored)?;
        zip.write_all(MIMETYPE_ASICE.as_bytes())?;

        let manifest = Manifest::for_data_files(
            self.data_files
                .iter()
                .map(|f| (f.name.as_str(), f.media_type.as_str())),
        );
        zip.start_file(paths::MANIFEST, deflated)?;
        zip.write_all(manifest.render().as_bytes())?;

        for file in &self.data_files {
            zip.start_file(file.name.as_str(), deflated)?;
            zip.write_all(&file.bytes)?;
        }

        for (i, xml) in self.signatures.iter().enumerate() {
            zip.start_file(format!("{}signatures{i}.xml", paths::META_INF), deflated)?;
            zip.write_all(xml)?;
        }

        zip.finish()
    }

    pub fn write_to_path(&self, path: impl AsRef<Path>) -> ContainerResult<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| ContainerError::io(path, e))?;
        let mut out = self
            .write_to(BufWriter::new(file))
            .map_err(|e| ContainerError::io(path, read_error(e)))?;
        out.flush().map_err(|e| ContainerError::io(path, e))
    }
}
