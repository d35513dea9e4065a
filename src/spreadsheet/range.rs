use crate::error::ReaddirError;
use crate::helpers::reference::col_to_index;
use crate::helpers::reference::row_to_index;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

static RANGE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z]*)(\d*)(:([A-Z]*)(\d*))?$").expect("Hardcode regex pattern"));

/// Errors related to Excel-style range parsing.
#[derive(Error, Debug)]
pub enum RangeError {
    #[error("Invalid range format '{0}'")]
    FormatError(String),
}

/// An Excel-style cell range with optional boundaries.
///
/// Any bound may be open, so `A1:`, `B:D`, `2:10` and `:C5` are all valid.
/// Bounds are 0-based and inclusive.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Range {
    pub row_lower_bound: Option<usize>,
    pub row_upper_bound: Option<usize>,
    pub col_lower_bound: Option<usize>,
    pub col_upper_bound: Option<usize>,
}

impl TryFrom<&str> for Range {
    type Error = ReaddirError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let value = value.trim().to_ascii_uppercase();
        let captures = RANGE_PATTERN
            .captures(value.as_str())
            .ok_or_else(|| RangeError::FormatError(value.to_owned()))?;
        let text = |index: usize| captures.get(index).map(|matcher| matcher.as_str());
        let range = Range {
            col_lower_bound: text(1).and_then(col_to_index),
            row_lower_bound: text(2).and_then(row_to_index),
            col_upper_bound: text(4).and_then(col_to_index),
            row_upper_bound: text(5).and_then(row_to_index),
        };
        // A single reference such as `B3` selects exactly that cell
        if captures.get(3).is_none() {
            return Ok(Range {
                row_upper_bound: range.row_lower_bound,
                col_upper_bound: range.col_lower_bound,
                ..range
            });
        }
        Ok(range)
    }
}

impl std::str::FromStr for Range {
    type Err = ReaddirError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Range::try_from(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_and_open_ranges() {
        let range = Range::try_from("a2:c10").unwrap();
        assert_eq!(range, Range {
            row_lower_bound: Some(1),
            row_upper_bound: Some(9),
            col_lower_bound: Some(0),
            col_upper_bound: Some(2),
        });

        let range: Range = "B:D".parse().unwrap();
        assert_eq!(range.row_lower_bound, None);
        assert_eq!(range.row_upper_bound, None);
        assert_eq!(range.col_lower_bound, Some(1));
        assert_eq!(range.col_upper_bound, Some(3));

        let range = Range::try_from("3:").unwrap();
        assert_eq!(range.row_lower_bound, Some(2));
        assert_eq!(range.row_upper_bound, None);
        assert_eq!(range.col_lower_bound, None);
    }

    #[test]
    fn single_reference_selects_one_cell() {
        let range = Range::try_from("B3").unwrap();
        assert_eq!(range.row_lower_bound, Some(2));
        assert_eq!(range.row_upper_bound, Some(2));
        assert_eq!(range.col_lower_bound, Some(1));
        assert_eq!(range.col_upper_bound, Some(1));
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            Range::try_from("A1-B2"),
            Err(ReaddirError::RangeError(RangeError::FormatError(_)))
        ));
    }
}
