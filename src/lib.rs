//! # Rusty Readdir
//!
//! Loads every spreadsheet matching a glob pattern in a directory into one table.
//!
//! ## Features
//!
//! - **Multi-format support**: Excel (`.xlsx`, `.xlsm`, `.xlam`) and OpenDocument (`.ods`)
//!   workbooks, detected by content rather than by extension
//! - **Every sheet of every file**: rows are tagged with `file_name` and `sheet_name`
//! - **Outer-union concatenation**: sheets with different columns are combined, missing
//!   values are null; a strict mode rejects differing schemas instead
//! - **Normalized labels**: whitespace runs become `_` and labels are lower-cased
//! - **Typed values**: booleans, integers, floats, text, dates, date-times and times
//! - **Post-processing**: composable row filters, column drops and derived sums
//!
//! ```no_run
//! let table = rusty_readdir::load("data/", "sample_*.xlsx")?;
//! for row in table.rows() {
//!     println!("{row:?}");
//! }
//! # Ok::<(), rusty_readdir::ReaddirError>(())
//! ```

mod error;
mod helpers;
mod loader;
mod spreadsheet;
mod table;

#[cfg(test)]
mod fixtures;

pub use error::ReaddirError;
pub use helpers::xml::XmlError;
pub use loader::load;
pub use loader::LoadOptions;
pub use loader::Loader;
pub use loader::LoaderError;
pub use loader::NoMatchPolicy;
pub use loader::PostProcess;
pub use loader::SourceFile;
pub use loader::DEFAULT_NULLS;
pub use spreadsheet::ods::OdsError;
pub use spreadsheet::range::Range;
pub use spreadsheet::range::RangeError;
pub use spreadsheet::SpreadsheetError;
pub use table::normalize_label;
pub use table::ResultTable;
pub use table::SchemaMode;
pub use table::TableError;
pub use table::Value;
pub use table::FILE_NAME;
pub use table::SHEET_NAME;
