//! Office Open XML workbook reader (.xlsx, .xlsm, .xlam).

use crate::error::ReaddirError;
use crate::helpers::reference::index_to_reference;
use crate::helpers::reference::reference_to_index;
use crate::helpers::xml::XmlAttributeHelper;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::xml::XmlReader;
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
use quick_xml::events::Event;
use quick_xml::name::QName;
use std::borrow::Cow;
use std::collections::HashMap;
use std::io::BufReader;
use zip::read::ZipFile;
use zip::ZipArchive;

// XML tag names for parsing Excel XLSX format
const TAG_RELATIONSHIP: &[u8] = b"Relationship";
const TAG_CUSTOM_FORMATS: QName = QName(b"numFmts"); // Custom number formats container
const TAG_CUSTOM_FORMAT: QName = QName(b"numFmt");   // Individual custom number format
const TAG_FORMAT_INDEXES: QName = QName(b"cellXfs");  // Cell format indexes container
const TAG_FORMAT_INDEX: QName = QName(b"xf");         // Individual cell format index
const TAG_SHARED_STRING_ITEM: QName = QName(b"si");   // Shared string table item
const TAG_PHONETIC_TEXT: QName = QName(b"rPh");       // Phonetic text for Asian languages
const TAG_TEXT: QName = QName(b"t");                  // Text content within strings
const TAG_WORKBOOK_PROPERTIES: QName = QName(b"workbookPr");
const TAG_SHEET: QName = QName(b"sheet");
const TAG_ROW: QName = QName(b"row");
const TAG_CELL: QName = QName(b"c");
const TAG_INLINE_STRING: QName = QName(b"is");
const TAG_VALUE: QName = QName(b"v");

/// An opened xlsx workbook with its sheet list, styles and shared strings loaded.
pub(crate) struct XlsxSpreadsheet {
    name: String,
    zip: ZipArchive<FileReader>,
    /// Cell type per style index, for date detection
    number_formats: Vec<CellType>,
    /// Worksheets as (name, zip_path) pairs in workbook order
    sheets: Vec<(String, String)>,
    shared_strings: Vec<String>,
}

impl XlsxSpreadsheet {
    pub(crate) fn new(name: &str, mut zip: ZipArchive<FileReader>) -> Result<XlsxSpreadsheet, ReaddirError> {
        let (sheets, is_1904) = load_workbook(&mut zip)?;
        if sheets.is_empty() {
            Err(SpreadsheetError::SpreadsheetEmptyError(name.to_owned()))?
        }
        let number_formats = load_number_formats(&mut zip, is_1904)?;
        let shared_strings = load_shared_strings(&mut zip)?;
        Ok(XlsxSpreadsheet {
            name: name.to_owned(),
            zip,
            number_formats,
            sheets,
            shared_strings,
        })
    }

    fn shared_string(&self, sheet: &Sheet, row: usize, col: usize, index: &str) -> Result<String, ReaddirError> {
        index.trim()
            .parse::<usize>()
            .ok()
            .and_then(|index| self.shared_strings.get(index))
            .map(|value| value.to_owned())
            .ok_or_else(|| SpreadsheetError::CellValueError(
                sheet.file_name.to_owned(),
                sheet.name.to_owned(),
                index_to_reference(row, col),
                format!("shared string '{index}' does not exist"),
            ).into())
    }
}

impl Spreadsheet for XlsxSpreadsheet {
    fn name(&self) -> &str {
        &self.name
    }

    /// Streams each accepted worksheet, keeping only cells inside the requested range.
    fn read_sheets(&mut self, criteria: &Criteria) -> Result<Vec<Sheet>, ReaddirError> {
        let mut sheets = Vec::<Sheet>::new();
        let worksheets = self.sheets.clone();
        for (sheet_name, zip_path) in worksheets.iter().filter(|(name, _)| criteria.accept(name)) {
            let mut sheet = Sheet::new(&self.name, sheet_name, criteria);
            let mut cells = Vec::<(usize, usize, CellType, String)>::new();
            {
                let mut reader = self.zip.xml_reader(zip_path)?
                    .ok_or_else(|| SpreadsheetError::FileError(zip_path.to_owned()))?;
                read_worksheet(&mut reader, self.number_formats.as_slice(), &sheet, &mut cells)?;
            }
            for (row, col, kind, value) in cells {
                if sheet.ends_before(row) {
                    break;
                }
                let (kind, value) = match kind {
                    CellType::SharedString => (CellType::Text, self.shared_string(&sheet, row, col, &value)?),
                    _ => (kind, value),
                };
                sheet.push(Cell { row, col, kind, value });
            }
            sheet.finish();
            sheets.push(sheet);
        }
        Ok(sheets)
    }
}

/// Collects the (row, col, type, raw value) of every non-empty cell inside the sheet range.
fn read_worksheet(
    reader: &mut XmlReader<BufReader<ZipFile<'_, FileReader>>>,
    number_formats: &[CellType],
    sheet: &Sheet,
    cells: &mut Vec<(usize, usize, CellType, String)>,
) -> Result<(), ReaddirError> {
    let mut row_count = 0usize;
    let mut col_count = 0usize;
    let mut row = 0usize;
    let mut col = 0usize;
    let mut kind = CellType::default();
    let mut value = String::new();
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_ROW => {
            if let Some(number) = event.parse_attribute_value::<usize>("r")? {
                row_count = number.saturating_sub(1);
            }
            col_count = 0;
        }
        Event::End(event) if event.name() == TAG_ROW => {
            row_count += 1;
        }
        Event::Start(event) if event.name() == TAG_CELL => {
            (row, col) = event.get_attribute_value("r")?
                .and_then(|reference| reference_to_index(&reference))
                .unwrap_or((row_count, col_count));
            col_count = col + 1;
            value.clear();
            if sheet.after_row_upper_bound(row) {
                break;
            } else if sheet.contains(row, col) {
                kind = cell_type(event.get_attribute_value("t")?, event.get_attribute_value("s")?, number_formats)?;
            } else {
                kind = CellType::Empty;
            }
        }
        Event::Start(event) if kind != CellType::Empty && event.name() == TAG_INLINE_STRING => {
            value = read_string_value(reader, TAG_INLINE_STRING, false)?;
        }
        Event::Start(event) if kind != CellType::Empty && event.name() == TAG_VALUE => {
            value = read_string_value(reader, TAG_VALUE, true)?;
        }
        Event::End(event) if event.name() == TAG_CELL => {
            if kind != CellType::Empty && !value.is_empty() {
                cells.push((row, col, kind, std::mem::take(&mut value)));
            }
            kind = CellType::Empty;
        }
    });
    Ok(())
}

fn cell_type(kind: Option<Cow<'_, str>>, style: Option<Cow<'_, str>>, number_formats: &[CellType]) -> Result<CellType, ReaddirError> {
    let kind = match kind.as_deref() {
        Some("inlineStr") | Some("str") => CellType::Text,
        Some("s") => CellType::SharedString,
        Some("d") => CellType::IsoDateTime,
        Some("b") => CellType::Boolean,
        Some("e") => CellType::Error,
        _ => CellType::Number,
    };
    match style.filter(|style| kind == CellType::Number && !style.is_empty()) {
        Some(style) => {
            let index = style.parse::<usize>()?;
            Ok(number_formats.get(index).copied().unwrap_or(CellType::Number))
        }
        None => Ok(kind),
    }
}

/// Loads worksheet relationships as a map of relationship id to zip path.
fn load_relationships(zip: &mut ZipArchive<FileReader>, path: &str) -> Result<HashMap<String, String>, ReaddirError> {
    let mut reader = zip.xml_reader(path)?
        .ok_or_else(|| SpreadsheetError::FileError(path.to_string()))?;
    let mut relationships: HashMap<String, String> = HashMap::new();
    match_xml_events!(reader => {
        Event::Start(event) if event.local_name().as_ref() == TAG_RELATIONSHIP => {
            let id = event.get_attribute_value("Id")?;
            let kind = event.get_attribute_value("Type")?;
            let target = event.get_attribute_value("Target")?;
            if kind.map(|it| it.ends_with("/worksheet")).unwrap_or(true) {
                if let Some((id, target)) = id.zip(target) {
                    relationships.insert(id.to_string(), to_zip_path(&target));
                }
            }
        }
    });
    Ok(relationships)
}

/// Resolves a relationship target against the `xl/` directory of the package.
fn to_zip_path(path: &str) -> String {
    if let Some(absolute) = path.strip_prefix('/') {
        absolute.to_string()
    } else if path.starts_with("xl/") {
        path.to_string()
    } else {
        format!("xl/{path}")
    }
}

/// Reads sheet names and targets from `xl/workbook.xml` together with the date system.
fn load_workbook(zip: &mut ZipArchive<FileReader>) -> Result<(Vec<(String, String)>, bool), ReaddirError> {
    let relationships = load_relationships(zip, "xl/_rels/workbook.xml.rels")?;
    let mut reader = zip.xml_reader("xl/workbook.xml")?
        .ok_or_else(|| SpreadsheetError::FileError("xl/workbook.xml".to_string()))?;
    let mut sheets: Vec<(String, String)> = Vec::new();
    let mut is_1904 = false;
    match_xml_events!(reader => {
        Event::Start(event) if event.local_name().as_ref() == TAG_SHEET.as_ref() => {
            let mut name = None::<Cow<str>>;
            let mut id = None::<Cow<str>>;
            for result in event.attributes() {
                let attribute = result?;
                let key = attribute.key.local_name();
                if key.as_ref() == b"name" {
                    name = Some(attribute.get_value()?);
                } else if key.as_ref() == b"id" {
                    id = Some(attribute.get_value()?);
                }
            }
            if let Some((name, id)) = name.zip(id) {
                if let Some(path) = relationships.get(id.as_ref()) {
                    sheets.push((name.to_string(), path.to_owned()));
                }
            }
        }
        Event::Start(event) if event.name() == TAG_WORKBOOK_PROPERTIES => {
            is_1904 = event.get_attribute_value("date1904")?
                .map(|value| value == "1" || value == "true")
                .unwrap_or(false);
        }
    });
    Ok((sheets, is_1904))
}

/// Maps every cell style index to the cell type implied by its number format.
fn load_number_formats(zip: &mut ZipArchive<FileReader>, is_1904: bool) -> Result<Vec<CellType>, ReaddirError> {
    let mut reader = match zip.xml_reader("xl/styles.xml")? {
        Some(reader) => reader,
        None => return Ok(Vec::new()),
    };

    let mut custom_formats_context = false;
    let mut custom_formats = HashMap::<String, CellType>::new();
    let mut format_indexes_context = false;
    let mut format_indexes = Vec::<String>::new();

    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_CUSTOM_FORMATS => custom_formats_context = true,
        Event::End(event) if event.name() == TAG_CUSTOM_FORMATS => custom_formats_context = false,
        Event::Start(event) if custom_formats_context && event.name() == TAG_CUSTOM_FORMAT => {
            let id = event.get_attribute_value("numFmtId")?;
            let format = event.get_attribute_value("formatCode")?;
            if let Some((id, format)) = id.zip(format) {
                custom_formats.insert(id.to_string(), CellType::parse_custom_number_format(&format, is_1904));
            }
        }
        Event::Start(event) if event.name() == TAG_FORMAT_INDEXES => format_indexes_context = true,
        Event::End(event) if event.name() == TAG_FORMAT_INDEXES => break,
        Event::Start(event) if format_indexes_context && event.name() == TAG_FORMAT_INDEX => {
            format_indexes.push(event.get_attribute_value("numFmtId")?.map(|id| id.to_string()).unwrap_or_default());
        }
    });

    Ok(format_indexes
        .iter()
        .map(|id| {
            custom_formats
                .get(id)
                .copied()
                .or_else(|| CellType::parse_builtin_number_format_id(id, is_1904))
                .unwrap_or(CellType::Number)
        })
        .collect())
}

fn load_shared_strings(zip: &mut ZipArchive<FileReader>) -> Result<Vec<String>, ReaddirError> {
    let mut shared_strings = Vec::<String>::new();
    let mut reader = match zip.xml_reader("xl/sharedStrings.xml")? {
        Some(reader) => reader,
        None => return Ok(shared_strings),
    };
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_SHARED_STRING_ITEM => {
            shared_strings.push(read_string_value(&mut reader, TAG_SHARED_STRING_ITEM, false)?);
        }
    });
    Ok(shared_strings)
}

/// Reads the text of a string element up to `end_tag`, skipping phonetic runs.
///
/// `is_text_content` is set for `<v>` whose text is the value itself rather than nested `<t>` runs.
fn read_string_value(
    reader: &mut XmlReader<BufReader<ZipFile<'_, FileReader>>>,
    end_tag: QName,
    is_text_content: bool,
) -> Result<String, ReaddirError> {
    let mut is_phonetic_text = false;
    let mut is_text = is_text_content;
    let mut text = String::new();
    match_xml_events!(reader => {
        Event::End(event) if event.name() == end_tag => break,
        Event::Start(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = true,
        Event::End(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = false,
        Event::Start(event) if !is_phonetic_text && event.name() == TAG_TEXT => is_text = true,
        Event::End(event) if is_text && event.name() == TAG_TEXT => is_text = false,
        Event::Text(event) if is_text => text.push_bytes_text(&event)?,
        Event::CData(event) if is_text => text.push_str(&event.xml_content()?),
        Event::GeneralRef(event) if is_text => text.push_bytes_ref(&event)?,
    });
    Ok(text)
}
