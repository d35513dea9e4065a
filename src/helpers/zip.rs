//! ZIP archive helpers for the xlsx and ods containers.

use crate::error::ReaddirError;
use crate::helpers::xml::XmlReader;
use std::io::BufReader;
use std::io::Read;
use std::io::Seek;
use zip::read::ZipFile;
use zip::result::ZipError;
use zip::ZipArchive;

pub(crate) trait ZipHelper<RS: Read + Seek> {
    /// Gets an entry by name, ignoring ASCII case and path separator style.
    fn file(&'_ mut self, name: &str) -> Result<Option<ZipFile<'_, RS>>, ReaddirError>;

    /// Returns true if the archive holds an entry with this name.
    fn contains(&self, name: &str) -> bool;

    /// Creates an XML reader over an entry.
    fn xml_reader(
        &'_ mut self,
        name: &str,
    ) -> Result<Option<XmlReader<BufReader<ZipFile<'_, RS>>>>, ReaddirError>;
}

impl<RS: Read + Seek> ZipHelper<RS> for ZipArchive<RS> {
    fn file(&'_ mut self, name: &str) -> Result<Option<ZipFile<'_, RS>>, ReaddirError> {
        let path = self.file_names()
            .find(|file_name| same_entry(name, file_name))
            .map(|file_name| file_name.to_owned());
        match path.map(|file_name| self.by_name(&file_name)).transpose() {
            Ok(file) => Ok(file),
            Err(ZipError::FileNotFound) => Ok(None),
            Err(error) => Err(error)?,
        }
    }

    fn contains(&self, name: &str) -> bool {
        self.file_names().any(|file_name| same_entry(name, file_name))
    }

    fn xml_reader(
        &'_ mut self,
        name: &str,
    ) -> Result<Option<XmlReader<BufReader<ZipFile<'_, RS>>>>, ReaddirError> {
        let reader = self
            .file(name)?
            .map(|file| XmlReader::new(BufReader::new(file)));
        Ok(reader)
    }
}

fn same_entry(expected: &str, actual: &str) -> bool {
    let expected = expected.replace('\\', "/");
    let actual = actual.replace('\\', "/");
    expected.eq_ignore_ascii_case(&actual)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn archive() -> ZipArchive<Cursor<Vec<u8>>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer.start_file("xl/Workbook.xml", SimpleFileOptions::default()).unwrap();
        writer.write_all(b"<workbook/>").unwrap();
        let cursor = writer.finish().unwrap();
        ZipArchive::new(cursor).unwrap()
    }

    #[test]
    fn finds_entries_ignoring_case_and_separators() {
        let mut zip = archive();
        assert!(zip.contains("xl\\workbook.xml"));
        assert!(zip.file("XL/WORKBOOK.XML").unwrap().is_some());
        assert!(zip.file("xl/styles.xml").unwrap().is_none());
        assert!(!zip.contains("content.xml"));
    }
}
