//! Workbook readers.
//!
//! Every supported container is opened through [`open_spreadsheet`], which sniffs the
//! file content rather than trusting the extension, and yields a [`Spreadsheet`] that
//! reads its sheets into [`Sheet`] grids.

pub(crate) mod cell;
pub(crate) mod criteria;
pub(crate) mod ods;
pub(crate) mod range;
pub(crate) mod sheet;
pub(crate) mod xlsx;

use crate::error::ReaddirError;
use crate::helpers::zip::ZipHelper;
use crate::spreadsheet::criteria::Criteria;
use crate::spreadsheet::ods::OdsSpreadsheet;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::xlsx::XlsxSpreadsheet;
use std::fs::File;
use std::io::BufReader;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use std::path::Path;
use thiserror::Error;
use zip::ZipArchive;

/// Compound File Binary signature, used by legacy .xls and by encrypted OOXML packages.
const CFB_SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
/// Local file header signature of a zip archive.
const ZIP_SIGNATURE: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

pub(crate) type FileReader = BufReader<File>;

#[derive(Error, Debug)]
pub enum SpreadsheetError {
    #[error("Spreadsheet '{0}' is a compound document (legacy xls or password protected)")]
    SpreadsheetPasswordProtectedError(String),

    #[error("Spreadsheet '{0}' has no worksheets")]
    SpreadsheetEmptyError(String),

    #[error("Cannot detect spreadsheet format of '{0}'")]
    UnknownFormatError(String),

    #[error("Missing workbook part '{0}'")]
    FileError(String),

    #[error("Invalid cell value in '{0}' sheet '{1}' at {2}: {3}")]
    CellValueError(String, String, String, String),
}

/// A workbook opened for reading.
pub(crate) trait Spreadsheet {
    /// Display name of the workbook, used in sheet provenance and error messages.
    fn name(&self) -> &str;

    /// Reads every sheet accepted by `criteria`, in workbook order.
    fn read_sheets(&mut self, criteria: &Criteria) -> Result<Vec<Sheet>, ReaddirError>;
}

/// Opens the workbook at `path`, detecting its format from the content.
///
/// `name` is the label carried by the sheets read from it.
pub(crate) fn open_spreadsheet(path: &Path, name: &str) -> Result<Box<dyn Spreadsheet>, ReaddirError> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut signature = [0u8; 8];
    let length = read_signature(&mut reader, &mut signature)?;
    reader.seek(SeekFrom::Start(0))?;

    if length == CFB_SIGNATURE.len() && signature == CFB_SIGNATURE {
        Err(SpreadsheetError::SpreadsheetPasswordProtectedError(name.to_owned()))?
    } else if length < ZIP_SIGNATURE.len() || signature[..ZIP_SIGNATURE.len()] != ZIP_SIGNATURE {
        Err(SpreadsheetError::UnknownFormatError(name.to_owned()))?
    }

    let zip = ZipArchive::new(reader)?;
    if zip.contains("xl/workbook.xml") {
        Ok(Box::new(XlsxSpreadsheet::new(name, zip)?))
    } else if zip.contains("content.xml") {
        Ok(Box::new(OdsSpreadsheet::new(name, zip)?))
    } else {
        Err(SpreadsheetError::UnknownFormatError(name.to_owned()).into())
    }
}

/// Fills `signature` from the start of the file, returning how many bytes were available.
fn read_signature<R: Read>(reader: &mut R, signature: &mut [u8]) -> Result<usize, ReaddirError> {
    let mut length = 0usize;
    while length < signature.len() {
        let count = reader.read(&mut signature[length..])?;
        if count == 0 {
            break;
        }
        length += count;
    }
    Ok(length)
}
