//! `META-INF/manifest.xml` (OpenDocument manifest) reading and rendering.

use once_cell::sync::Lazy;
use regex::Regex;

use super::xml;
use super::MIMETYPE_ASICE;

static FILE_ENTRY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<(?:[A-Za-z_][\w.-]*:)?file-entry\b([^>]*)>").expect("file-entry pattern")
});
static FULL_PATH_RE: Lazy<Regex> = Lazy::new(|| xml::attribute_regex("full-path"));
static MEDIA_TYPE_RE: Lazy<Regex> = Lazy::new(|| xml::attribute_regex("media-type"));

/// Media type used when the manifest does not name one.
pub const DEFAULT_MEDIA_TYPE: &str = "application/octet-stream";

/// One `manifest:file-entry`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub full_path: String,
    pub media_type: String,
}

/// Parsed manifest. Entry order follows the document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: Vec<ManifestEntry>,
}

impl Manifest {
    /// Extract the file entries from manifest XML.
    ///
    /// Entries without a `full-path` attribute are ignored; the root entry
    /// (`/`) is kept so callers can inspect the declared container type.
    pub fn parse(content: &[u8]) -> Self {
        let text = String::from_utf8_lossy(content);
        let entries = FILE_ENTRY_RE
            .captures_iter(&text)
            .filter_map(|caps| {
                let attrs = caps.get(1)?.as_str();
                let full_path = xml::attribute(&FULL_PATH_RE, attrs)?;
                let media_type = xml::attribute(&MEDIA_TYPE_RE, attrs)
                    .unwrap_or_else(|| DEFAULT_MEDIA_TYPE.to_string());
                Some(ManifestEntry {
                    full_path,
                    media_type,
                })
            })
            .collect();
        Self { entries }
    }

    /// Build a manifest for the given `(name, media_type)` data files.
    pub fn for_data_files<'a>(files: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut entries = vec![ManifestEntry {
            full_path: "/".to_string(),
            media_type: MIMETYPE_ASICE.to_string(),
        }];
        entries.extend(files.into_iter().map(|(name, media_type)| ManifestEntry {
            full_path: name.to_string(),
            media_type: media_type.to_string(),
        }));
        Self { entries }
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    /// Entries describing data files (everything except the root entry).
    pub fn file_entries(&self) -> impl Iterator<Item = &ManifestEntry> {
        self.entries.iter().filter(|e| e.full_path != "/")
    }

    pub fn media_type(&self, name: &str) -> Option<&str> {
        self.file_entries()
            .find(|e| e.full_path == name)
            .map(|e| e.media_type.as_str())
    }

    pub fn render(&self) -> String {
        let mut out = String::from(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\" ?>\n\
             <manifest:manifest xmlns:manifest=\"urn:oasis:names:tc:opendocument:xmlns:manifest:1.0\" manifest:version=\"1.2\">\n",
        );
        for entry in &self.entries {
            out.push_str(&format!(
                "  <manifest:file-entry manifest:full-path=\"{}\" manifest:media-type=\"{}\"/>\n",
                xml::escape(&entry.full_path),
                xml::escape(&entry.media_type)
            ));
        }
        out.push_str("</manifest:manifest>\n");
        out
    }
}
