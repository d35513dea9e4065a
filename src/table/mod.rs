//! The in-memory result table and the operations applied to it after loading.

pub(crate) mod builder;
pub(crate) mod label;
pub(crate) mod value;

pub use label::normalize_label;
pub use value::Value;

use crate::error::ReaddirError;
use thiserror::Error;

/// Provenance column holding the display name of the source file.
pub const FILE_NAME: &str = "file_name";
/// Provenance column holding the sheet name.
pub const SHEET_NAME: &str = "sheet_name";

#[derive(Error, Debug)]
pub enum TableError {
    #[error("Column '{0}' does not exist")]
    MissingColumn(String),

    #[error("Sheet '{sheet}' of '{file}' has columns {actual:?}, expected {expected:?}")]
    HeterogeneousSchema {
        file: String,
        sheet: String,
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("Column '{column}' holds non-numeric value '{value}' at row {row}")]
    TypeMismatch {
        column: String,
        row: usize,
        value: String,
    },
}

/// How sheets with different columns are combined.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum SchemaMode {
    /// Columns are the union of all sheet columns; absent values are null.
    #[default]
    OuterUnion,
    /// Every sheet with columns must carry the same label set.
    Strict,
}

/// Ordered column labels and rows of values; every row is as wide as the label list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResultTable {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl ResultTable {
    /// An empty table carrying only the provenance columns.
    pub fn empty() -> Self {
        Self {
            columns: vec![FILE_NAME.to_owned(), SHEET_NAME.to_owned()],
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|label| label == column)
    }

    fn require(&self, column: &str) -> Result<usize, ReaddirError> {
        Ok(self.column_index(column).ok_or_else(|| TableError::MissingColumn(column.to_owned()))?)
    }

    /// Value of `column` in row `row`, `None` when either is out of the table.
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let index = self.column_index(column)?;
        self.rows.get(row).and_then(|values| values.get(index))
    }

    pub fn column_values(&self, column: &str) -> Result<Vec<&Value>, ReaddirError> {
        let index = self.require(column)?;
        Ok(self.rows.iter().map(|row| &row[index]).collect())
    }

    /// Keeps the rows whose `column` value satisfies `predicate`.
    pub fn retain_rows<P>(&mut self, column: &str, mut predicate: P) -> Result<(), ReaddirError>
    where
        P: FnMut(&Value) -> bool,
    {
        let index = self.require(column)?;
        self.rows.retain(|row| predicate(&row[index]));
        Ok(())
    }

    pub fn drop_column(&mut self, column: &str) -> Result<(), ReaddirError> {
        let index = self.require(column)?;
        self.columns.remove(index);
        for row in self.rows.iter_mut() {
            row.remove(index);
        }
        Ok(())
    }

    /// Sets `target` to the element-wise sum of `left` and `right`.
    ///
    /// The column is appended unless it already exists, in which case it is overwritten.
    /// Fails with `TypeMismatch` on the first operand that is neither numeric nor null.
    pub fn add_sum_column(&mut self, target: &str, left: &str, right: &str) -> Result<(), ReaddirError> {
        let left_index = self.require(left)?;
        let right_index = self.require(right)?;

        let mut sums = Vec::with_capacity(self.rows.len());
        for (number, row) in self.rows.iter().enumerate() {
            let (lhs, rhs) = (&row[left_index], &row[right_index]);
            let sum = lhs.checked_sum(rhs).ok_or_else(|| {
                let (column, value) = if lhs.as_f64().is_none() && !lhs.is_null() {
                    (left, lhs)
                } else {
                    (right, rhs)
                };
                TableError::TypeMismatch {
                    column: column.to_owned(),
                    row: number,
                    value: value.to_string(),
                }
            })?;
            sums.push(sum);
        }

        match self.column_index(target) {
            Some(index) => {
                for (row, sum) in self.rows.iter_mut().zip(sums) {
                    row[index] = sum;
                }
            }
            None => {
                self.columns.push(target.to_owned());
                for (row, sum) in self.rows.iter_mut().zip(sums) {
                    row.push(sum);
                }
            }
        }
        Ok(())
    }

    /// Counts rows per distinct combination of `columns`, in first-seen order.
    pub fn group_sizes(&self, columns: &[&str]) -> Result<Vec<(Vec<Value>, usize)>, ReaddirError> {
        let indexes = columns
            .iter()
            .map(|column| self.require(column))
            .collect::<Result<Vec<_>, _>>()?;
        let mut groups = Vec::<(Vec<Value>, usize)>::new();
        for row in &self.rows {
            let key = indexes.iter().map(|index| row[*index].clone()).collect::<Vec<_>>();
            match groups.iter_mut().find(|(group, _)| *group == key) {
                Some((_, count)) => *count += 1,
                None => groups.push((key, 1)),
            }
        }
        Ok(groups)
    }
}
