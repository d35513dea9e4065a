use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::Conversion;
use crate::spreadsheet::criteria::Criteria;
use crate::spreadsheet::range::Range;
use crate::spreadsheet::SpreadsheetError;
use crate::table::Value;
use std::collections::HashSet;

/// A sheet read from a spreadsheet file, holding its non-empty cells in row-major order.
pub(crate) struct Sheet {
    /// Source file name
    pub(crate) file_name: String,
    /// Sheet name
    pub(crate) name: String,
    /// All non-empty cells in the sheet
    pub(crate) cells: Vec<Cell>,
    /// Expected data range (user-specified)
    pub(super) range: Range,
    /// Whether to skip empty rows
    pub(super) skip_empty_rows: bool,
    /// Whether to stop at the first gap between rows
    pub(super) end_at_empty_row: bool,
    /// Actual data range (determined from cell data)
    pub(crate) row_lower_bound: Option<usize>,
    pub(crate) row_upper_bound: Option<usize>,
    pub(crate) col_lower_bound: Option<usize>,
    pub(crate) col_upper_bound: Option<usize>,
}

/// Labels and typed rows of one sheet, before it joins the result table.
#[derive(Debug, Default)]
pub(crate) struct Frame {
    pub(crate) labels: Vec<String>,
    pub(crate) rows: Vec<Vec<Value>>,
}

impl Sheet {
    pub(super) fn new(file_name: &str, name: &str, criteria: &Criteria) -> Self {
        Self {
            file_name: file_name.to_owned(),
            name: name.to_owned(),
            cells: Vec::new(),
            range: criteria.range.unwrap_or_default(),
            skip_empty_rows: criteria.skip_empty_rows,
            end_at_empty_row: criteria.end_at_empty_row,
            row_lower_bound: None,
            row_upper_bound: None,
            col_lower_bound: None,
            col_upper_bound: None,
        }
    }

    pub(super) fn before_row_lower_bound(&self, row: usize) -> bool {
        self.range.row_lower_bound
            .map(|row_lower_bound| row < row_lower_bound)
            .unwrap_or(false)
    }

    pub(super) fn after_row_upper_bound(&self, row: usize) -> bool {
        self.range.row_upper_bound
            .map(|row_upper_bound| row_upper_bound < row)
            .unwrap_or(false)
    }

    pub(super) fn before_col_lower_bound(&self, col: usize) -> bool {
        self.range.col_lower_bound
            .map(|col_lower_bound| col < col_lower_bound)
            .unwrap_or(false)
    }

    pub(super) fn after_col_upper_bound(&self, col: usize) -> bool {
        self.range.col_upper_bound
            .map(|col_upper_bound| col_upper_bound < col)
            .unwrap_or(false)
    }

    /// Checks if a cell at (row, col) is within the specified range.
    pub(super) fn contains(&self, row: usize, col: usize) -> bool {
        !self.before_row_lower_bound(row)
            && !self.after_row_upper_bound(row)
            && !self.before_col_lower_bound(col)
            && !self.after_col_upper_bound(col)
    }

    /// True when `end_at_empty_row` is set and `row` leaves a gap after the data read so far.
    pub(super) fn ends_before(&self, row: usize) -> bool {
        self.end_at_empty_row
            && self.row_upper_bound
                .map(|row_upper_bound| row_upper_bound + 1 < row)
                .unwrap_or(false)
    }

    /// Adds a cell to the sheet, updating the data bounds.
    pub(super) fn push(&mut self, cell: Cell) {
        self.update_bound(cell.row, cell.col);
        self.cells.push(cell);
    }

    fn update_bound(&mut self, row: usize, col: usize) {
        if self.row_lower_bound.map(|row_lower_bound| row < row_lower_bound).unwrap_or(true) {
            self.row_lower_bound = Some(row);
        }
        if self.row_upper_bound.map(|row_upper_bound| row_upper_bound < row).unwrap_or(true) {
            self.row_upper_bound = Some(row);
        }
        if self.col_lower_bound.map(|col_lower_bound| col < col_lower_bound).unwrap_or(true) {
            self.col_lower_bound = Some(col);
        }
        if self.col_upper_bound.map(|col_upper_bound| col_upper_bound < col).unwrap_or(true) {
            self.col_upper_bound = Some(col);
        }
    }

    /// Restores row-major order; writers are allowed to emit cells out of order.
    pub(super) fn finish(&mut self) {
        self.cells.sort_by_key(|cell| (cell.row, cell.col));
    }

    /// Lays the cells out as a grid from the first to the last non-empty row.
    ///
    /// Columns span the requested range, or the data bounds where the range is open.
    /// Rows without any cell are omitted when `skip_empty_rows` is set.
    pub(crate) fn records(&self) -> Vec<Vec<Option<&Cell>>> {
        let (Some(row_lower), Some(row_upper)) = (self.row_lower_bound, self.row_upper_bound) else {
            return Vec::new();
        };
        let col_lower = self.range.col_lower_bound.or(self.col_lower_bound).unwrap_or(0);
        let col_upper = self.range.col_upper_bound.or(self.col_upper_bound).unwrap_or(col_lower);

        let mut index = 0usize;
        let mut table = Vec::<Vec<Option<&Cell>>>::new();
        for row in row_lower..=row_upper {
            let mut record = vec![None; col_upper + 1 - col_lower];
            let mut has_cell = false;
            while index < self.cells.len() && self.cells[index].row == row {
                let cell = &self.cells[index];
                if col_lower <= cell.col && cell.col <= col_upper {
                    record[cell.col - col_lower] = Some(cell);
                    has_cell = true;
                }
                index += 1;
            }
            if has_cell || !self.skip_empty_rows {
                table.push(record);
            }
        }
        table
    }

    /// Splits the grid into labels and typed rows.
    ///
    /// With `header` the first record names the columns: empty header cells become
    /// `Unnamed: <position>` and repeated labels get `.1`, `.2` suffixes.
    /// Without it columns are named `column1`, `column2`, ...
    pub(crate) fn to_frame(&self, header: bool, conversion: Conversion) -> Result<Frame, SpreadsheetError> {
        let mut records = self.records().into_iter();
        let labels = if header {
            match records.next() {
                Some(record) => header_labels(&record),
                None => return Ok(Frame::default()),
            }
        } else {
            let width = self.records_width();
            (1..=width).map(|index| format!("column{index}")).collect()
        };

        let rows = records
            .map(|record| {
                record
                    .iter()
                    .map(|cell| match cell {
                        Some(cell) => cell.to_value(conversion).map_err(|message| {
                            SpreadsheetError::CellValueError(
                                self.file_name.to_owned(),
                                self.name.to_owned(),
                                cell.reference(),
                                message,
                            )
                        }),
                        None => Ok(Value::Null),
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Frame { labels, rows })
    }

    fn records_width(&self) -> usize {
        match (
            self.range.col_lower_bound.or(self.col_lower_bound),
            self.range.col_upper_bound.or(self.col_upper_bound),
        ) {
            (Some(col_lower), Some(col_upper)) if col_lower <= col_upper => col_upper + 1 - col_lower,
            _ => 0,
        }
    }
}

fn header_labels(record: &[Option<&Cell>]) -> Vec<String> {
    let mut seen = HashSet::<String>::new();
    record
        .iter()
        .enumerate()
        .map(|(position, cell)| {
            let label = cell
                .map(|cell| cell.to_string())
                .filter(|label| !label.is_empty())
                .unwrap_or_else(|| format!("Unnamed: {position}"));
            let mut unique = label.clone();
            let mut suffix = 0usize;
            while seen.contains(&unique) {
                suffix += 1;
                unique = format!("{label}.{suffix}");
            }
            seen.insert(unique.clone());
            unique
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::cell::CellType;

    fn push(sheet: &mut Sheet, row: usize, col: usize, value: &str) {
        sheet.push(Cell {
            row,
            col,
            kind: CellType::Text,
            value: value.to_owned(),
        });
    }

    fn frame(sheet: &Sheet, header: bool) -> Frame {
        let nulls = HashSet::new();
        sheet.to_frame(header, Conversion { nulls: &nulls, error_as_null: false }).unwrap()
    }

    #[test]
    fn sheet_initial() {
        let sheet = Sheet::new("", "", &Criteria::default());

        assert!(sheet.cells.is_empty());
        assert_eq!(sheet.row_lower_bound, None);
        assert_eq!(sheet.row_upper_bound, None);
        assert_eq!(sheet.col_lower_bound, None);
        assert_eq!(sheet.col_upper_bound, None);
        assert!(sheet.records().is_empty());
        assert!(frame(&sheet, true).labels.is_empty());
    }

    #[test]
    fn sheet_update() {
        let mut sheet = Sheet::new("", "", &Criteria::default());
        push(&mut sheet, 3, 3, "d");
        push(&mut sheet, 1, 1, "a");
        push(&mut sheet, 1, 3, "b");
        push(&mut sheet, 3, 1, "c");
        sheet.finish();

        assert_eq!(sheet.row_lower_bound, Some(1));
        assert_eq!(sheet.row_upper_bound, Some(3));
        assert_eq!(sheet.col_lower_bound, Some(1));
        assert_eq!(sheet.col_upper_bound, Some(3));

        let records = sheet.records();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].len(), 3);
        assert_eq!(records[0][0].map(|cell| cell.value.as_str()), Some("a"));
        assert!(records[0][1].is_none());
        assert!(records[1].iter().all(Option::is_none));
        assert_eq!(records[2][2].map(|cell| cell.value.as_str()), Some("d"));
    }

    #[test]
    fn sheet_keeps_empty_rows_on_request() {
        let mut sheet = Sheet::new("", "", &Criteria::default());
        push(&mut sheet, 0, 0, "h");
        push(&mut sheet, 2, 0, "v");
        sheet.finish();
        assert_eq!(sheet.records().len(), 3);

        let mut sheet = Sheet::new("", "", &Criteria { skip_empty_rows: true, ..Criteria::default() });
        push(&mut sheet, 0, 0, "h");
        push(&mut sheet, 2, 0, "v");
        sheet.finish();
        let frame = frame(&sheet, true);
        assert_eq!(frame.labels, vec!["h"]);
        assert_eq!(frame.rows, vec![vec![Value::Text("v".to_owned())]]);
    }

    #[test]
    fn sheet_with_range_fixes_columns() {
        let criteria = Criteria {
            range: Some(Range {
                row_lower_bound: None,
                row_upper_bound: None,
                col_lower_bound: Some(0),
                col_upper_bound: Some(3),
            }),
            ..Criteria::default()
        };
        let mut sheet = Sheet::new("", "", &criteria);
        push(&mut sheet, 1, 1, "x");
        push(&mut sheet, 2, 1, "y");
        sheet.finish();

        let frame = frame(&sheet, false);
        assert_eq!(frame.labels, vec!["column1", "column2", "column3", "column4"]);
        assert_eq!(frame.rows.len(), 2);
        assert_eq!(frame.rows[0][1], Value::Text("x".to_owned()));
        assert_eq!(frame.rows[1][3], Value::Null);
    }

    #[test]
    fn sheet_end_at_empty_row() {
        let criteria = Criteria { end_at_empty_row: true, ..Criteria::default() };
        let mut sheet = Sheet::new("", "", &criteria);
        assert!(!sheet.ends_before(5));
        push(&mut sheet, 1, 1, "a");
        assert!(!sheet.ends_before(2));
        assert!(sheet.ends_before(3));
    }

    #[test]
    fn header_labels_are_mangled() {
        let mut sheet = Sheet::new("", "", &Criteria::default());
        push(&mut sheet, 0, 0, "a");
        push(&mut sheet, 0, 1, "a");
        push(&mut sheet, 0, 3, "a");
        push(&mut sheet, 1, 2, "v");
        sheet.finish();

        let frame = frame(&sheet, true);
        assert_eq!(frame.labels, vec!["a", "a.1", "Unnamed: 2", "a.2"]);
        assert_eq!(frame.rows[0][2], Value::Text("v".to_owned()));
    }
}
