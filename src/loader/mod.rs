//! Directory loading: glob enumeration, workbook reading and table assembly.

pub(crate) mod post_process;

pub use post_process::PostProcess;

use crate::error::ReaddirError;
use crate::spreadsheet::cell::Conversion;
use crate::spreadsheet::criteria::Criteria;
use crate::spreadsheet::open_spreadsheet;
use crate::spreadsheet::range::Range;
use crate::spreadsheet::sheet::Frame;
use crate::table::builder::TableBuilder;
use crate::table::ResultTable;
use crate::table::SchemaMode;
use glob::Pattern;
use std::collections::HashSet;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;
use tracing::info;

/// Cell texts read as missing values unless `LoadOptions::nulls` says otherwise.
pub const DEFAULT_NULLS: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Directory '{0}' does not exist or is not a directory")]
    NotFound(String),

    #[error("No file in '{dir}' matches '{pattern}'")]
    NoMatch { dir: String, pattern: String },

    #[error("Cannot read workbook '{file}': {source}")]
    MalformedWorkbook {
        file: String,
        source: Box<ReaddirError>,
    },
}

/// What a load returns when the pattern matches no file.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum NoMatchPolicy {
    /// An empty table with only the `file_name` and `sheet_name` columns.
    /// Post-processing is not applied to it.
    #[default]
    Empty,
    Error,
}

/// Options of a load.
#[derive(Clone, Debug)]
pub struct LoadOptions {
    /// Use the first non-empty row of every sheet as its header.
    pub header: bool,
    /// Sheet name glob patterns; `None` reads every sheet.
    pub sheets: Option<Vec<String>>,
    /// Cell range read from every sheet.
    pub range: Option<Range>,
    /// Text values read as null.
    pub nulls: Vec<String>,
    pub error_as_null: bool,
    pub skip_empty_rows: bool,
    /// Stop reading a sheet at the first empty row after its data.
    pub end_at_empty_row: bool,
    pub schema: SchemaMode,
    pub on_no_match: NoMatchPolicy,
    /// Columns placed right after `file_name` and `sheet_name` when present.
    pub leading_columns: Vec<String>,
    pub post_process: Option<PostProcess>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            header: true,
            sheets: None,
            range: None,
            nulls: DEFAULT_NULLS.iter().map(|null| null.to_string()).collect(),
            error_as_null: false,
            skip_empty_rows: true,
            end_at_empty_row: false,
            schema: SchemaMode::OuterUnion,
            on_no_match: NoMatchPolicy::Empty,
            leading_columns: vec!["cat".to_owned()],
            post_process: None,
        }
    }
}

/// A file matched by the load pattern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    /// The matched path with the base directory string removed from its front.
    pub name: String,
}

/// Loads every sheet of every workbook matching a pattern into one table.
#[derive(Debug)]
pub struct Loader {
    options: LoadOptions,
    criteria: Criteria,
    nulls: HashSet<String>,
}

impl Loader {
    pub fn new(options: LoadOptions) -> Result<Self, ReaddirError> {
        let sheet_name_patterns = options.sheets
            .as_ref()
            .map(|patterns| patterns.iter().map(|pattern| Pattern::new(pattern)).collect::<Result<Vec<_>, _>>())
            .transpose()?;
        let criteria = Criteria {
            sheet_name_patterns,
            range: options.range,
            skip_empty_rows: options.skip_empty_rows,
            end_at_empty_row: options.end_at_empty_row,
        };
        let nulls = options.nulls.iter().cloned().collect();
        Ok(Self { options, criteria, nulls })
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// Lists the regular files of `base_dir` matching `pattern`, sorted by path.
    pub fn matched_files(&self, base_dir: &str, pattern: &str) -> Result<Vec<SourceFile>, ReaddirError> {
        if !Path::new(base_dir).is_dir() {
            Err(LoaderError::NotFound(base_dir.to_owned()))?
        }
        let mut paths = Vec::<PathBuf>::new();
        for entry in glob::glob(&join_pattern(base_dir, pattern))? {
            let path = entry?;
            if path.is_file() {
                paths.push(literal_path(base_dir, &path));
            }
        }
        paths.sort();
        Ok(paths
            .into_iter()
            .map(|path| {
                let name = display_name(base_dir, &path);
                SourceFile { path, name }
            })
            .collect())
    }

    /// Reads all matched workbooks into one table and applies the post-processing, if any.
    pub fn load(&self, base_dir: &str, pattern: &str) -> Result<ResultTable, ReaddirError> {
        let files = self.matched_files(base_dir, pattern)?;
        if files.is_empty() {
            debug!(dir = base_dir, pattern, "no file matched");
            return match self.options.on_no_match {
                NoMatchPolicy::Empty => Ok(ResultTable::empty()),
                NoMatchPolicy::Error => Err(LoaderError::NoMatch {
                    dir: base_dir.to_owned(),
                    pattern: pattern.to_owned(),
                }
                .into()),
            };
        }

        let mut builder = TableBuilder::new(self.options.schema);
        let mut sheet_count = 0usize;
        for file in &files {
            debug!(file = %file.name, path = %file.path.display(), "reading workbook");
            let frames = self.read_workbook(file).map_err(|source| LoaderError::MalformedWorkbook {
                file: file.name.to_owned(),
                source: Box::new(source),
            })?;
            for (sheet_name, frame) in frames {
                debug!(file = %file.name, sheet = %sheet_name, rows = frame.rows.len(), columns = frame.labels.len(), "read sheet");
                builder.push(&file.name, &sheet_name, frame)?;
                sheet_count += 1;
            }
        }

        let mut table = builder.finish(&self.options.leading_columns);
        if let Some(post_process) = &self.options.post_process {
            post_process.apply(&mut table)?;
        }
        info!(files = files.len(), sheets = sheet_count, rows = table.len(), columns = table.columns().len(), "loaded spreadsheets");
        Ok(table)
    }

    fn read_workbook(&self, file: &SourceFile) -> Result<Vec<(String, Frame)>, ReaddirError> {
        let mut spreadsheet = open_spreadsheet(&file.path, &file.name)?;
        let conversion = Conversion {
            nulls: &self.nulls,
            error_as_null: self.options.error_as_null,
        };
        let sheets = spreadsheet.read_sheets(&self.criteria)?;
        debug!(workbook = spreadsheet.name(), sheets = sheets.len(), "opened workbook");
        let mut frames = Vec::with_capacity(sheets.len());
        for sheet in sheets {
            let frame = sheet.to_frame(self.options.header, conversion)?;
            frames.push((sheet.name, frame));
        }
        Ok(frames)
    }
}

/// Loads `pattern` matches in `base_dir` with the default options.
pub fn load(base_dir: &str, pattern: &str) -> Result<ResultTable, ReaddirError> {
    Loader::new(LoadOptions::default())?.load(base_dir, pattern)
}

/// Joins the pattern to the base directory, escaping glob characters in the directory.
fn join_pattern(base_dir: &str, pattern: &str) -> String {
    let base = Pattern::escape(base_dir);
    if base.is_empty() || base.ends_with('/') || base.ends_with(std::path::MAIN_SEPARATOR) {
        format!("{base}{pattern}")
    } else {
        format!("{base}{}{pattern}", std::path::MAIN_SEPARATOR)
    }
}

/// Rebuilds a matched path on top of `base_dir` as written, since glob drops `.` components.
fn literal_path(base_dir: &str, path: &Path) -> PathBuf {
    let normalized = Path::new(base_dir)
        .components()
        .filter(|component| *component != Component::CurDir)
        .collect::<PathBuf>();
    match path.strip_prefix(&normalized) {
        Ok(relative) if !base_dir.is_empty() => Path::new(base_dir).join(relative),
        _ => path.to_path_buf(),
    }
}

fn display_name(base_dir: &str, path: &Path) -> String {
    let path = path.to_string_lossy();
    path.strip_prefix(base_dir).unwrap_or(&*path).to_owned()
}
