use crate::error::ReaddirError;
use crate::spreadsheet::sheet::Frame;
use crate::table::label::normalize_label;
use crate::table::ResultTable;
use crate::table::SchemaMode;
use crate::table::TableError;
use crate::table::Value;
use crate::table::FILE_NAME;
use crate::table::SHEET_NAME;
use std::collections::HashMap;
use std::collections::HashSet;
use tracing::warn;

/// Rows of one sheet, with values laid out by label position at the time they were appended.
struct Block {
    file_name: String,
    sheet_name: String,
    rows: Vec<Vec<Value>>,
}

/// Accumulates sheet frames into one table.
///
/// Labels are kept in first-seen order; a row appended before a label existed
/// reads `Null` for it when the table is finished.
pub(crate) struct TableBuilder {
    schema: SchemaMode,
    labels: Vec<String>,
    positions: HashMap<String, usize>,
    /// Label set of the first sheet with columns, checked in strict mode
    expected: Option<Vec<String>>,
    blocks: Vec<Block>,
}

impl TableBuilder {
    pub(crate) fn new(schema: SchemaMode) -> Self {
        Self {
            schema,
            labels: Vec::new(),
            positions: HashMap::new(),
            expected: None,
            blocks: Vec::new(),
        }
    }

    /// Appends the rows of one sheet, tagged with their file and sheet names.
    pub(crate) fn push(&mut self, file_name: &str, sheet_name: &str, frame: Frame) -> Result<(), ReaddirError> {
        let labels = sheet_labels(file_name, sheet_name, &frame.labels);
        if self.schema == SchemaMode::Strict && labels.iter().any(Option::is_some) {
            let mut actual = labels.iter().flatten().cloned().collect::<Vec<_>>();
            actual.sort();
            match &self.expected {
                Some(expected) if *expected != actual => Err(TableError::HeterogeneousSchema {
                    file: file_name.to_owned(),
                    sheet: sheet_name.to_owned(),
                    expected: expected.clone(),
                    actual,
                })?,
                Some(_) => (),
                None => self.expected = Some(actual),
            }
        }

        let targets = labels
            .iter()
            .map(|label| label.as_ref().map(|label| self.position(label)))
            .collect::<Vec<_>>();
        let width = self.labels.len();
        let rows = frame
            .rows
            .into_iter()
            .map(|row| {
                let mut values = vec![Value::Null; width];
                for (target, value) in targets.iter().zip(row) {
                    if let Some(position) = target {
                        values[*position] = value;
                    }
                }
                values
            })
            .collect();

        self.blocks.push(Block {
            file_name: file_name.to_owned(),
            sheet_name: sheet_name.to_owned(),
            rows,
        });
        Ok(())
    }

    fn position(&mut self, label: &str) -> usize {
        if let Some(position) = self.positions.get(label) {
            return *position;
        }
        let position = self.labels.len();
        self.labels.push(label.to_owned());
        self.positions.insert(label.to_owned(), position);
        position
    }

    /// Orders the columns as `file_name`, `sheet_name`, the `leading` labels that exist,
    /// then every other label in first-seen order, and pads short rows with nulls.
    pub(crate) fn finish(self, leading: &[String]) -> ResultTable {
        let mut order = Vec::<usize>::with_capacity(self.labels.len());
        for label in leading.iter().map(|label| normalize_label(label)) {
            if let Some(position) = self.positions.get(&label) {
                if !order.contains(position) {
                    order.push(*position);
                }
            }
        }
        for position in 0..self.labels.len() {
            if !order.contains(&position) {
                order.push(position);
            }
        }

        let mut columns = vec![FILE_NAME.to_owned(), SHEET_NAME.to_owned()];
        columns.extend(order.iter().map(|position| self.labels[*position].to_owned()));

        let mut rows = Vec::<Vec<Value>>::new();
        for block in self.blocks {
            for values in block.rows {
                let mut row = Vec::with_capacity(columns.len());
                row.push(Value::Text(block.file_name.to_owned()));
                row.push(Value::Text(block.sheet_name.to_owned()));
                row.extend(order.iter().map(|position| values.get(*position).cloned().unwrap_or_default()));
                rows.push(row);
            }
        }
        ResultTable { columns, rows }
    }
}

/// Normalizes the labels of one sheet.
///
/// Labels made equal by normalization get `.1`, `.2` suffixes; labels naming a
/// synthetic column are dropped and map to `None`.
fn sheet_labels(file_name: &str, sheet_name: &str, labels: &[String]) -> Vec<Option<String>> {
    let mut seen = HashSet::<String>::new();
    labels
        .iter()
        .map(|label| {
            let label = normalize_label(label);
            if label == FILE_NAME || label == SHEET_NAME {
                warn!(file = file_name, sheet = sheet_name, column = %label, "dropping column that shadows a provenance column");
                return None;
            }
            let mut unique = label.clone();
            let mut suffix = 0usize;
            while seen.contains(&unique) {
                suffix += 1;
                unique = format!("{label}.{suffix}");
            }
            seen.insert(unique.clone());
            Some(unique)
        })
        .collect()
}
