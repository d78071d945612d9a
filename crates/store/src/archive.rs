//! In-memory package archive backed by the `zip` codec.

use std::io::{Cursor, Read, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{Result, StoreError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub path: String,
    pub bytes: Vec<u8>,
}

/// Ordered mapping from relative path to content.
///
/// Entries keep their first insertion position when overwritten, so the same
/// sequence of writes always serializes to the same bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Archive {
    entries: Vec<ArchiveEntry>,
}

impl Archive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes a serialized archive. Directory entries are skipped.
    pub fn load(bytes: &[u8]) -> Result<Self> {
        let mut zip = ZipArchive::new(Cursor::new(bytes))?;
        let mut archive = Archive::new();

        for i in 0..zip.len() {
            let mut file = zip.by_index(i)?;
            if file.is_dir() {
                continue;
            }

            let path = file.name().to_string();
            let mut content = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut content)
                .map_err(|source| StoreError::ArchiveSerialization {
                    path: path.clone(),
                    source,
                })?;
            archive.set_file(path, content);
        }

        Ok(archive)
    }

    pub fn set_file(&mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        let path = path.into();
        let bytes = bytes.into();
        match self.entries.iter_mut().find(|e| e.path == path) {
            Some(existing) => existing.bytes = bytes,
            None => self.entries.push(ArchiveEntry { path, bytes }),
        }
    }

    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|e| e.path == path)
            .map(|e| e.bytes.as_slice())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    pub fn entries(&self) -> impl Iterator<Item = &ArchiveEntry> {
        self.entries.iter()
    }

    pub fn paths(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.path.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Encodes every entry with deflate and a fixed timestamp.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(zip::DateTime::default());

        for entry in &self.entries {
            writer.start_file(entry.path.as_str(), options)?;
            writer
                .write_all(&entry.bytes)
                .map_err(|source| StoreError::ArchiveSerialization {
                    path: entry.path.clone(),
                    source,
                })?;
        }

        Ok(writer.finish()?.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overwrite_keeps_position() {
        let mut archive = Archive::new();
        archive.set_file("manifest.json", "{}");
        archive.set_file("icon.png", vec![1u8, 2, 3]);
        archive.set_file("manifest.json", "{\"a\":1}");

        assert_eq!(archive.paths(), vec!["manifest.json", "icon.png"]);
        assert_eq!(archive.get("manifest.json").unwrap(), b"{\"a\":1}");
    }

    #[test]
    fn test_serialize_then_load_preserves_entries() {
        let mut archive = Archive::new();
        archive.set_file("manifest.json", "{}");
        archive.set_file("bin/App.dll", vec![0u8; 128]);
        archive.set_file("screenshots/0.png", vec![9u8; 4]);

        let bytes = archive.serialize().unwrap();
        let loaded = Archive::load(&bytes).unwrap();

        assert_eq!(loaded, archive);
    }

    #[test]
    fn test_serialization_is_reproducible() {
        let mut archive = Archive::new();
        archive.set_file("manifest.json", "{}");
        archive.set_file("icon.png", vec![7u8; 16]);

        assert_eq!(archive.serialize().unwrap(), archive.serialize().unwrap());
    }

    #[test]
    fn test_load_skips_directory_entries() {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        writer.add_directory("nested/", options).unwrap();
        writer.start_file("nested/manifest.json", options).unwrap();
        writer.write_all(b"{}").unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let archive = Archive::load(&bytes).unwrap();
        assert_eq!(archive.paths(), vec!["nested/manifest.json"]);
    }

    #[test]
    fn test_load_rejects_garbage() {
        let err = Archive::load(b"not a zip").unwrap_err();
        assert!(matches!(err, StoreError::ArchiveError(_)));
    }
}
