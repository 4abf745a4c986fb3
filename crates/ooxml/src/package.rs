//! Zip container holding the parts of an Office document.

use crate::xml::XmlDocument;
use crate::{OoxmlError, OoxmlResult};
use std::io::{Cursor, Read, Write};
use std::path::Path;

/// An Office package with every part held in memory.
///
/// Parts keep their archive order so `[Content_Types].xml` stays first when written back.
#[derive(Debug, Clone, Default)]
pub struct Package {
    parts: Vec<(String, Vec<u8>)>,
}

impl Package {
    /// Creates an empty package.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a package from a file on disk.
    ///
    /// # Errors
    ///
    /// Returns `OoxmlError::Io` if the file cannot be read, or `OoxmlError::Zip` if it is not a
    /// zip archive.
    pub fn open(path: &Path) -> OoxmlResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            OoxmlError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read package {}: {}", path.display(), e),
            ))
        })?;
        Self::from_bytes(&bytes)
    }

    /// Reads a package from in-memory zip bytes. Directory entries are skipped.
    pub fn from_bytes(bytes: &[u8]) -> OoxmlResult<Self> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
        let mut parts = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)?;
            parts.push((name, data));
        }
        Ok(Self { parts })
    }

    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| data.as_slice())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.part(name).is_some()
    }

    /// Replaces part `name`, or appends it if it does not exist yet.
    pub fn set_part(&mut self, name: &str, data: Vec<u8>) {
        match self.parts.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = data,
            None => self.parts.push((name.to_string(), data)),
        }
    }

    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|(n, _)| n.as_str())
    }

    /// Parses part `name` as XML.
    ///
    /// # Errors
    ///
    /// Returns `OoxmlError::MissingPart` if the part does not exist, or `OoxmlError::Xml` if it
    /// is not well-formed.
    pub fn xml(&self, name: &str) -> OoxmlResult<XmlDocument> {
        let data = self
            .part(name)
            .ok_or_else(|| OoxmlError::MissingPart(name.to_string()))?;
        XmlDocument::parse(name, data)
    }

    /// Serialises `doc` into part `name`.
    pub fn set_xml(&mut self, name: &str, doc: &XmlDocument) -> OoxmlResult<()> {
        let data = doc.to_bytes()?;
        self.set_part(name, data);
        Ok(())
    }

    /// Writes the package as zip bytes, substituting `overrides` for parts of the same name.
    pub fn to_bytes_with(&self, overrides: &[(&str, &[u8])]) -> OoxmlResult<Vec<u8>> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::FileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);

        for (name, data) in &self.parts {
            let data = overrides
                .iter()
                .find(|(n, _)| *n == name.as_str())
                .map(|(_, d)| *d)
                .unwrap_or(data.as_slice());
            writer.start_file(name.as_str(), options)?;
            writer.write_all(data)?;
        }

        let cursor = writer.finish()?;
        Ok(cursor.into_inner())
    }

    pub fn to_bytes(&self) -> OoxmlResult<Vec<u8>> {
        self.to_bytes_with(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parts_round_trip_in_order() {
        let mut package = Package::new();
        package.set_part("[Content_Types].xml", b"<Types/>".to_vec());
        package.set_part("word/document.xml", b"<w:document/>".to_vec());

        let reread = Package::from_bytes(&package.to_bytes().unwrap()).unwrap();
        let names: Vec<&str> = reread.part_names().collect();
        assert_eq!(names, vec!["[Content_Types].xml", "word/document.xml"]);
        assert_eq!(reread.part("word/document.xml"), Some(&b"<w:document/>"[..]));
    }

    #[test]
    fn test_set_part_replaces_existing() {
        let mut package = Package::new();
        package.set_part("a.xml", b"<a/>".to_vec());
        package.set_part("a.xml", b"<b/>".to_vec());
        assert_eq!(package.part_names().count(), 1);
        assert_eq!(package.part("a.xml"), Some(&b"<b/>"[..]));
    }

    #[test]
    fn test_overrides_replace_part_content() {
        let mut package = Package::new();
        package.set_part("a.xml", b"<a/>".to_vec());
        let bytes = package.to_bytes_with(&[("a.xml", &b"<z/>"[..])]).unwrap();
        let reread = Package::from_bytes(&bytes).unwrap();
        assert_eq!(reread.part("a.xml"), Some(&b"<z/>"[..]));
    }

    #[test]
    fn test_missing_part_is_reported() {
        let package = Package::new();
        assert!(matches!(
            package.xml("word/document.xml"),
            Err(OoxmlError::MissingPart(_))
        ));
    }

    #[test]
    fn test_garbage_is_not_a_package() {
        assert!(matches!(
            Package::from_bytes(b"definitely not a zip"),
            Err(OoxmlError::Zip(_))
        ));
    }

    #[test]
    fn test_open_reads_from_disk() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("doc.zip");
        let mut package = Package::new();
        package.set_part("x.xml", b"<x/>".to_vec());
        std::fs::write(&path, package.to_bytes().unwrap()).unwrap();

        let reread = Package::open(&path).unwrap();
        assert!(reread.contains("x.xml"));
    }
}
