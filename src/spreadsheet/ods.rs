//! OpenDocument spreadsheet reader (.ods).

use crate::error::ReaddirError;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::xml::XmlTextContextHelper;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::criteria::Criteria;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::FileReader;
use crate::spreadsheet::Spreadsheet;
use crate::spreadsheet::SpreadsheetError;
use quick_xml::events::BytesStart;
use quick_xml::events::Event;
use quick_xml::name::QName;
use std::io::Read;
use thiserror::Error;
use zip::ZipArchive;

const MIME_TYPE: &[u8] = b"application/vnd.oasis.opendocument.spreadsheet";
const SPREADSHEET: QName = QName(b"office:spreadsheet");
const TABLE: QName = QName(b"table:table");
const TABLE_ROW: QName = QName(b"table:table-row");
const TABLE_CELL: QName = QName(b"table:table-cell");
/// Cells hidden under a merged region
const TABLE_COVERED_CELL: QName = QName(b"table:covered-table-cell");
/// Comments attached to a cell
const ANNOTATION: QName = QName(b"office:annotation");
const PARAGRAPH: QName = QName(b"text:p");
/// Run of spaces, `text:c` times
const SPACES: QName = QName(b"text:s");

#[derive(Error, Debug)]
pub enum OdsError {
    #[error("Invalid ODS MIME type")]
    MimeTypeError,
}

pub(crate) struct OdsSpreadsheet {
    name: String,
    zip: ZipArchive<FileReader>,
}

impl OdsSpreadsheet {
    pub(crate) fn new(name: &str, mut zip: ZipArchive<FileReader>) -> Result<Self, ReaddirError> {
        check_mime(&mut zip)?;
        if is_password_protected(&mut zip)? {
            Err(SpreadsheetError::SpreadsheetPasswordProtectedError(name.to_owned()))?;
        }
        Ok(OdsSpreadsheet {
            name: name.to_owned(),
            zip,
        })
    }
}

impl Spreadsheet for OdsSpreadsheet {
    fn name(&self) -> &str {
        &self.name
    }

    fn read_sheets(&mut self, criteria: &Criteria) -> Result<Vec<Sheet>, ReaddirError> {
        let mut sheets = Vec::<Sheet>::new();
        let mut reader = self.zip
            .xml_reader("content.xml")?
            .ok_or_else(|| SpreadsheetError::FileError("content.xml".to_owned()))?;

        // Sheet being read, `None` between tables or inside a rejected table
        let mut sheet = None::<Sheet>;
        let mut ended = false;

        let mut row = 0usize;
        let mut col = 0usize;
        let mut row_count = 1usize;
        let mut col_count = 1usize;
        let mut kind = CellType::default();
        let mut value = String::new();
        let mut text_context = false;
        let mut annotation_context = false;

        match_xml_events!(reader => {
            Event::End(event) if event.name() == SPREADSHEET => break,
            Event::Start(event) if event.name() == TABLE => {
                let table_name = event.get_attribute_value("table:name")?.unwrap_or_default();
                sheet = Some(&table_name)
                    .filter(|name| criteria.accept(name))
                    .map(|name| Sheet::new(&self.name, name, criteria));
                row = 0;
                ended = false;
            }
            Event::End(event) if event.name() == TABLE => {
                if let Some(mut sheet) = sheet.take() {
                    sheet.finish();
                    sheets.push(sheet);
                }
            }
            Event::Start(event) if sheet.is_some() && event.name() == TABLE_ROW => {
                row_count = event.parse_attribute_value("table:number-rows-repeated")?.unwrap_or(1);
                col = 0;
            }
            Event::End(event) if sheet.is_some() && event.name() == TABLE_ROW => {
                row += row_count;
            }
            Event::Start(event) if sheet.is_some() && (event.name() == TABLE_CELL || event.name() == TABLE_COVERED_CELL) => {
                col_count = event.parse_attribute_value("table:number-columns-repeated")?.unwrap_or(1);
                value.clear();
                kind = cell_type(&event)?;
                text_context = matches!(kind, CellType::Text | CellType::Error);
                if !text_context {
                    value.push_str(&cell_value(&event, kind)?);
                }
            }
            Event::End(event) if event.name() == TABLE_CELL || event.name() == TABLE_COVERED_CELL => {
                if let Some(sheet) = sheet.as_mut() {
                    if !ended && kind != CellType::Empty && !value.is_empty() {
                        ended = push_repeated(sheet, row, row_count, col, col_count, kind, &value);
                    }
                }
                col += col_count;
                kind = CellType::Empty;
                text_context = false;
                annotation_context = false;
            }
            Event::Start(event) if text_context && event.name() == ANNOTATION => annotation_context = true,
            Event::End(event) if text_context && event.name() == ANNOTATION => annotation_context = false,
            Event::Start(event) if text_context && !annotation_context && event.name() == PARAGRAPH => {
                if !value.is_empty() {
                    value.push('\n');
                }
            }
            Event::Start(event) if text_context && !annotation_context && event.name() == SPACES => {
                let count = event.parse_attribute_value("text:c")?.unwrap_or(1usize);
                value.extend(std::iter::repeat_n(' ', count));
            }
            Event::Text(event) if text_context && !annotation_context => value.push_bytes_text(&event)?,
            Event::GeneralRef(event) if text_context && !annotation_context => value.push_bytes_ref(&event)?,
        });

        Ok(sheets)
    }
}

/// Pushes a cell value over its repeated rows and columns.
///
/// Returns true once `end_at_empty_row` stops the sheet.
fn push_repeated(
    sheet: &mut Sheet,
    row: usize,
    row_count: usize,
    col: usize,
    col_count: usize,
    kind: CellType,
    value: &str,
) -> bool {
    for row_number in row..row + row_count {
        if sheet.after_row_upper_bound(row_number) {
            break;
        } else if sheet.ends_before(row_number) {
            return true;
        }
        for col_number in col..col + col_count {
            if sheet.contains(row_number, col_number) {
                sheet.push(Cell {
                    row: row_number,
                    col: col_number,
                    kind,
                    value: value.to_owned(),
                });
            }
        }
    }
    false
}

fn cell_type(event: &BytesStart) -> Result<CellType, ReaddirError> {
    let kind = match event.get_attribute_value("office:value-type")?.as_deref() {
        Some("boolean") => CellType::Boolean,
        Some("date") => CellType::IsoDateTime,
        Some("time") => CellType::IsoDuration,
        Some("string") => {
            let is_error = event.get_attribute_value("calcext:value-type")?
                .map(|value| value == "error")
                .unwrap_or(false);
            if is_error { CellType::Error } else { CellType::Text }
        }
        Some(_) => CellType::Number,
        None => CellType::Empty,
    };
    Ok(kind)
}

/// Reads the typed value carried by the cell attributes; text cells carry theirs in `text:p`.
fn cell_value(event: &BytesStart, kind: CellType) -> Result<String, ReaddirError> {
    let value = match kind {
        CellType::Boolean => {
            let truth = event.get_attribute_value("office:boolean-value")?
                .map(|value| value != "false" && value != "0")
                .unwrap_or(false);
            if truth { "1" } else { "0" }.to_owned()
        }
        CellType::IsoDateTime => event.get_attribute_value("office:date-value")?.unwrap_or_default().to_string(),
        CellType::IsoDuration => event.get_attribute_value("office:time-value")?.unwrap_or_default().to_string(),
        CellType::Number => event.get_attribute_value("office:value")?.unwrap_or_default().to_string(),
        _ => String::new(),
    };
    Ok(value)
}

fn check_mime(zip: &mut ZipArchive<FileReader>) -> Result<(), ReaddirError> {
    if let Some(file) = &mut zip.file("mimetype")? {
        let mut buffer = Vec::with_capacity(MIME_TYPE.len());
        file.read_to_end(&mut buffer)?;
        if buffer.trim_ascii() != MIME_TYPE {
            Err(OdsError::MimeTypeError)?;
        }
    }
    Ok(())
}

fn is_password_protected(zip: &mut ZipArchive<FileReader>) -> Result<bool, ReaddirError> {
    let mut reader = match zip.xml_reader("META-INF/manifest.xml")? {
        Some(reader) => reader,
        None => return Ok(false),
    };
    let mut in_file_entry = false;
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == QName(b"manifest:file-entry") => in_file_entry = true,
        Event::End(event) if event.name() == QName(b"manifest:file-entry") => in_file_entry = false,
        Event::Start(event) if in_file_entry && event.name() == QName(b"manifest:encryption-data") => {
            return Ok(true);
        }
    });
    Ok(false)
}
