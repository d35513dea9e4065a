use crate::error::ReaddirError;
use crate::table::ResultTable;
use crate::table::Value;

#[derive(Clone, Debug, PartialEq)]
enum Step {
    ExcludeRows { column: String, value: Value },
    DropColumn(String),
    Sum { target: String, left: String, right: String },
}

/// Post-processing steps applied, in order, to a loaded table.
///
/// Every step names its columns after normalization and fails with
/// `MissingColumn` when one is absent.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PostProcess {
    steps: Vec<Step>,
}

impl PostProcess {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops `cat == "b"` rows, drops `col_3` and adds `col_1_plus_col_2`.
    pub fn standard() -> Self {
        Self::new()
            .exclude_rows("cat", "b")
            .drop_column("col_3")
            .sum("col_1_plus_col_2", "col_1", "col_2")
    }

    /// Removes the rows whose `column` equals `value`.
    pub fn exclude_rows(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.steps.push(Step::ExcludeRows {
            column: column.into(),
            value: value.into(),
        });
        self
    }

    pub fn drop_column(mut self, column: impl Into<String>) -> Self {
        self.steps.push(Step::DropColumn(column.into()));
        self
    }

    /// Sets `target` to `left + right`, see [`ResultTable::add_sum_column`].
    pub fn sum(mut self, target: impl Into<String>, left: impl Into<String>, right: impl Into<String>) -> Self {
        self.steps.push(Step::Sum {
            target: target.into(),
            left: left.into(),
            right: right.into(),
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn apply(&self, table: &mut ResultTable) -> Result<(), ReaddirError> {
        for step in &self.steps {
            match step {
                Step::ExcludeRows { column, value } => table.retain_rows(column, |cell| cell != value)?,
                Step::DropColumn(column) => table.drop_column(column)?,
                Step::Sum { target, left, right } => table.add_sum_column(target, left, right)?,
            }
        }
        Ok(())
    }
}
