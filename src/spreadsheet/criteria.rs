use crate::spreadsheet::range::Range;
use glob::Pattern;

/// Criteria for selecting which sheets and cells are read from a workbook.
#[derive(Clone, Debug, Default)]
pub(crate) struct Criteria {
    /// Sheet name patterns; `None` reads every sheet.
    pub(crate) sheet_name_patterns: Option<Vec<Pattern>>,

    /// Data range within sheets to extract.
    pub(crate) range: Option<Range>,

    /// Skip rows where all columns are empty.
    pub(crate) skip_empty_rows: bool,

    /// Stop reading a sheet at the first empty row after data started.
    pub(crate) end_at_empty_row: bool,
}

impl Criteria {
    /// Checks if a sheet name matches the criteria patterns.
    /// Returns true if no patterns are specified or if name matches any pattern.
    pub(crate) fn accept(&self, sheet_name: &str) -> bool {
        match &self.sheet_name_patterns {
            Some(patterns) => patterns.iter().any(|pattern| pattern.matches(sheet_name)),
            None => true,
        }
    }
}
