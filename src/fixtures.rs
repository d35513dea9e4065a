//! Workbooks written at test time.

use crate::table::Value;
use chrono::NaiveDate;
use quick_xml::escape::escape;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;
use zip::ZipWriter;

/// A sheet as its name and rows; the first row is usually the header.
pub(crate) type SheetData<'a> = (&'a str, Vec<Vec<Value>>);

/// Builds a header row followed by `rows` of values.
pub(crate) fn sheet<'a>(name: &'a str, header: &[&str], rows: Vec<Vec<Value>>) -> SheetData<'a> {
    let mut data = vec![header.iter().map(|label| Value::from(*label)).collect::<Vec<_>>()];
    data.extend(rows);
    (name, data)
}

fn excel_serial(value: &Value) -> Option<f64> {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    match value {
        Value::Date(date) => Some((date.and_hms_opt(0, 0, 0)? - epoch).num_days() as f64),
        Value::DateTime(datetime) => Some((*datetime - epoch).num_milliseconds() as f64 / 86_400_000.0),
        _ => None,
    }
}

fn column_name(mut col: usize) -> String {
    let mut name = Vec::new();
    loop {
        name.push(b'A' + (col % 26) as u8);
        if col < 26 {
            break;
        }
        col = col / 26 - 1;
    }
    name.reverse();
    String::from_utf8_lossy(&name).into_owned()
}

/// Writes an xlsx workbook; text goes to the shared string table, dates use date styles.
pub(crate) fn write_xlsx(path: &Path, sheets: &[SheetData]) -> anyhow::Result<()> {
    let mut zip = ZipWriter::new(File::create(path)?);
    let options = SimpleFileOptions::default();

    zip.start_file("[Content_Types].xml", options)?;
    zip.write_all(br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/></Types>"#)?;

    let mut workbook = String::from(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><workbookPr/><sheets>"#);
    let mut relationships = String::from(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#);
    for (index, (name, _)) in sheets.iter().enumerate() {
        let number = index + 1;
        workbook.push_str(&format!(r#"<sheet name="{}" sheetId="{number}" r:id="rId{number}"/>"#, escape(*name)));
        relationships.push_str(&format!(
            r#"<Relationship Id="rId{number}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{number}.xml"/>"#
        ));
    }
    workbook.push_str("</sheets></workbook>");
    relationships.push_str("</Relationships>");

    zip.start_file("xl/workbook.xml", options)?;
    zip.write_all(workbook.as_bytes())?;
    zip.start_file("xl/_rels/workbook.xml.rels", options)?;
    zip.write_all(relationships.as_bytes())?;
    zip.start_file("xl/styles.xml", options)?;
    zip.write_all(br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><cellXfs count="3"><xf numFmtId="0"/><xf numFmtId="14"/><xf numFmtId="22"/></cellXfs></styleSheet>"#)?;

    let mut shared_strings = Vec::<String>::new();
    for (index, (_, rows)) in sheets.iter().enumerate() {
        let mut xml = String::from(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#);
        for (row, values) in rows.iter().enumerate() {
            xml.push_str(&format!(r#"<row r="{}">"#, row + 1));
            for (col, value) in values.iter().enumerate() {
                let reference = format!("{}{}", column_name(col), row + 1);
                let cell = match value {
                    Value::Null => continue,
                    Value::Text(text) => {
                        shared_strings.push(text.to_owned());
                        format!(r#"<c r="{reference}" t="s"><v>{}</v></c>"#, shared_strings.len() - 1)
                    }
                    Value::Bool(truth) => format!(r#"<c r="{reference}" t="b"><v>{}</v></c>"#, u8::from(*truth)),
                    Value::Int(number) => format!(r#"<c r="{reference}"><v>{number}</v></c>"#),
                    Value::Float(number) => format!(r#"<c r="{reference}"><v>{number:?}</v></c>"#),
                    Value::Date(_) | Value::DateTime(_) => {
                        let style = if matches!(value, Value::Date(_)) { 1 } else { 2 };
                        let serial = excel_serial(value).unwrap_or_default();
                        format!(r#"<c r="{reference}" s="{style}"><v>{serial}</v></c>"#)
                    }
                    Value::Time(time) => format!(r#"<c r="{reference}" t="inlineStr"><is><t>{time}</t></is></c>"#),
                };
                xml.push_str(&cell);
            }
            xml.push_str("</row>");
        }
        xml.push_str("</sheetData></worksheet>");
        zip.start_file(format!("xl/worksheets/sheet{}.xml", index + 1), options)?;
        zip.write_all(xml.as_bytes())?;
    }

    let mut xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{0}" uniqueCount="{0}">"#,
        shared_strings.len()
    );
    for text in &shared_strings {
        xml.push_str(&format!(r#"<si><t xml:space="preserve">{}</t></si>"#, escape(text.as_str())));
    }
    xml.push_str("</sst>");
    zip.start_file("xl/sharedStrings.xml", options)?;
    zip.write_all(xml.as_bytes())?;

    zip.finish()?;
    Ok(())
}

/// Writes an ods workbook; runs of empty cells use `table:number-columns-repeated`.
pub(crate) fn write_ods(path: &Path, sheets: &[SheetData]) -> anyhow::Result<()> {
    let mut zip = ZipWriter::new(File::create(path)?);
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let options = SimpleFileOptions::default();

    zip.start_file("mimetype", stored)?;
    zip.write_all(b"application/vnd.oasis.opendocument.spreadsheet")?;
    zip.start_file("META-INF/manifest.xml", options)?;
    zip.write_all(br#"<?xml version="1.0" encoding="UTF-8"?>
<manifest:manifest xmlns:manifest="urn:oasis:names:tc:opendocument:xmlns:manifest:1.0" manifest:version="1.2"><manifest:file-entry manifest:full-path="/" manifest:media-type="application/vnd.oasis.opendocument.spreadsheet"/><manifest:file-entry manifest:full-path="content.xml" manifest:media-type="text/xml"/></manifest:manifest>"#)?;

    let mut xml = String::from(r#"<?xml version="1.0" encoding="UTF-8"?>
<office:document-content xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0" xmlns:table="urn:oasis:names:tc:opendocument:xmlns:table:1.0" xmlns:text="urn:oasis:names:tc:opendocument:xmlns:text:1.0" office:version="1.2"><office:body><office:spreadsheet>"#);
    for (name, rows) in sheets {
        xml.push_str(&format!(r#"<table:table table:name="{}">"#, escape(*name)));
        for values in rows {
            xml.push_str("<table:table-row>");
            let mut empty = 0usize;
            for value in values {
                if value.is_null() {
                    empty += 1;
                    continue;
                }
                if empty > 0 {
                    xml.push_str(&format!(r#"<table:table-cell table:number-columns-repeated="{empty}"/>"#));
                    empty = 0;
                }
                let cell = match value {
                    Value::Text(text) => format!(
                        r#"<table:table-cell office:value-type="string"><text:p>{}</text:p></table:table-cell>"#,
                        escape(text.as_str())
                    ),
                    Value::Bool(truth) => format!(
                        r#"<table:table-cell office:value-type="boolean" office:boolean-value="{truth}"><text:p>{}</text:p></table:table-cell>"#,
                        if *truth { "TRUE" } else { "FALSE" }
                    ),
                    Value::Int(number) => format!(
                        r#"<table:table-cell office:value-type="float" office:value="{number}"><text:p>{number}</text:p></table:table-cell>"#
                    ),
                    Value::Float(number) => format!(
                        r#"<table:table-cell office:value-type="float" office:value="{number:?}"><text:p>{number}</text:p></table:table-cell>"#
                    ),
                    Value::Date(date) => format!(
                        r#"<table:table-cell office:value-type="date" office:date-value="{}"><text:p>{date}</text:p></table:table-cell>"#,
                        date.format("%Y-%m-%d")
                    ),
                    Value::DateTime(datetime) => format!(
                        r#"<table:table-cell office:value-type="date" office:date-value="{}"><text:p>{datetime}</text:p></table:table-cell>"#,
                        datetime.format("%Y-%m-%dT%H:%M:%S")
                    ),
                    Value::Time(time) => format!(
                        r#"<table:table-cell office:value-type="time" office:time-value="{}"><text:p>{time}</text:p></table:table-cell>"#,
                        time.format("PT%HH%MM%SS")
                    ),
                    Value::Null => String::new(),
                };
                xml.push_str(&cell);
            }
            xml.push_str("</table:table-row>");
        }
        xml.push_str(r#"<table:table-row table:number-rows-repeated="1048570"><table:table-cell table:number-columns-repeated="1024"/></table:table-row>"#);
        xml.push_str("</table:table>");
    }
    xml.push_str("</office:spreadsheet></office:body></office:document-content>");
    zip.start_file("content.xml", options)?;
    zip.write_all(xml.as_bytes())?;

    zip.finish()?;
    Ok(())
}
