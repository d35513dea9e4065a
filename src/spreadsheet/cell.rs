use crate::helpers::reference::index_to_reference;
use crate::table::Value;
use chrono::Duration;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::NaiveTime;
use iso8601_duration::Duration as IsoDuration;
use std::collections::HashSet;
use std::fmt::Display;

/// Types of cell data in spreadsheet files.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub(crate) enum CellType {
    #[default]
    Empty,
    /// Boolean values stored as `1` / `0`
    Boolean,
    /// Numeric values
    Number,
    /// Date/time values stored as serial numbers from the 1900 epoch
    NumberDateTime1900,
    NumberDate1900,
    NumberTime1900,
    /// Date/time values stored as serial numbers from the 1904 epoch
    NumberDateTime1904,
    NumberDate1904,
    NumberTime1904,
    /// ISO 8601 date/time strings
    IsoDateTime,
    /// ISO 8601 duration strings (ods time cells)
    IsoDuration,
    /// Text, either inline or already resolved from the shared string table
    Text,
    /// Index into the xlsx shared string table
    SharedString,
    /// Error values such as `#DIV/0!`
    Error,
}

impl CellType {
    /// Parses built-in Excel number format IDs to determine cell type.
    pub(crate) fn parse_builtin_number_format_id(id: &str, is_1904: bool) -> Option<Self> {
        match id {
            "22" => Some(if is_1904 { Self::NumberDateTime1904 } else { Self::NumberDateTime1900 }),
            "14" | "15" | "16" | "17" => Some(if is_1904 { Self::NumberDate1904 } else { Self::NumberDate1900 }),
            "18" | "19" | "20" | "21" | "45" | "46" | "47" => Some(if is_1904 { Self::NumberTime1904 } else { Self::NumberTime1900 }),
            _ => None,
        }
    }

    /// Parses custom number format strings to determine cell type.
    /// Quoted literals, escapes and bracketed sections are ignored.
    pub(crate) fn parse_custom_number_format(format: &str, is_1904: bool) -> Self {
        let mut is_escaped = false;
        let mut is_literal = false;
        let mut is_bracket = false;
        let mut is_date = false;
        let mut is_time = false;
        for character in format.chars() {
            match character {
                _ if is_escaped => is_escaped = false,
                '_' | '\\' if !is_literal => is_escaped = true,

                '"' if is_literal => is_literal = false,
                '"' if !is_bracket => is_literal = true,

                ']' if is_bracket => is_bracket = false,
                '[' if !is_literal => is_bracket = true,
                _ if is_literal || is_bracket => (),

                'Y' | 'y' | 'D' | 'd' => is_date = true,
                'H' | 'h' | 'S' | 's' => is_time = true,
                _ => (),
            }
        }

        match (is_date, is_time, is_1904) {
            (true, true, false) => Self::NumberDateTime1900,
            (true, true, true) => Self::NumberDateTime1904,
            (true, false, false) => Self::NumberDate1900,
            (true, false, true) => Self::NumberDate1904,
            (false, true, false) => Self::NumberTime1900,
            (false, true, true) => Self::NumberTime1904,
            (false, false, _) => Self::Number,
        }
    }

    fn is_1904(&self) -> bool {
        matches!(self, Self::NumberDateTime1904 | Self::NumberDate1904 | Self::NumberTime1904)
    }
}

/// Options applied when a raw cell becomes a [`Value`].
#[derive(Copy, Clone, Debug)]
pub(crate) struct Conversion<'a> {
    pub(crate) nulls: &'a HashSet<String>,
    pub(crate) error_as_null: bool,
}

/// A single cell with position, type and its raw stored text.
#[derive(Clone, Debug)]
pub(crate) struct Cell {
    /// Row index (0-based)
    pub(crate) row: usize,
    /// Column index (0-based)
    pub(crate) col: usize,
    pub(crate) kind: CellType,
    pub(crate) value: String,
}

impl Cell {
    /// Returns the Excel-style cell reference (e.g., "A1", "B2").
    pub(crate) fn reference(&self) -> String {
        index_to_reference(self.row, self.col)
    }

    /// Converts the raw text into a typed value.
    ///
    /// Returns `Err` with a message when the stored text does not fit the cell type.
    pub(crate) fn to_value(&self, conversion: Conversion) -> Result<Value, String> {
        let value = match self.kind {
            CellType::Empty => Value::Null,
            CellType::Boolean => Value::Bool(self.value == "1" || self.value.eq_ignore_ascii_case("true")),
            CellType::Number => self.to_number()?,
            CellType::NumberDateTime1900 | CellType::NumberDateTime1904 => {
                Value::DateTime(self.to_serial_datetime()?)
            }
            CellType::NumberDate1900 | CellType::NumberDate1904 => {
                Value::Date(self.to_serial_datetime()?.date())
            }
            CellType::NumberTime1900 | CellType::NumberTime1904 => {
                let fraction = self.to_double()?.fract();
                Value::Time(to_time(fraction))
            }
            CellType::IsoDateTime => self.to_iso_datetime()?,
            CellType::IsoDuration => Value::Time(self.to_iso_time()?),
            CellType::Text | CellType::SharedString => {
                if conversion.nulls.contains(&self.value) {
                    Value::Null
                } else {
                    Value::Text(self.value.to_owned())
                }
            }
            CellType::Error => {
                if conversion.error_as_null || conversion.nulls.contains(&self.value) {
                    Value::Null
                } else {
                    Value::Text(self.value.to_owned())
                }
            }
        };
        Ok(value)
    }

    fn to_double(&self) -> Result<f64, String> {
        self.value.trim().parse::<f64>().map_err(|_| format!("parse '{}' to double failed", self.value))
    }

    /// Integer literals stay integers, everything else becomes a float.
    fn to_number(&self) -> Result<Value, String> {
        let text = self.value.trim();
        if let Ok(integer) = text.parse::<i64>() {
            Ok(Value::Int(integer))
        } else {
            Ok(Value::Float(self.to_double()?))
        }
    }

    /// Converts an Excel serial number to a timestamp.
    /// Serials before 60 are shifted by one day to undo the Lotus 1-2-3 leap year bug.
    fn to_serial_datetime(&self) -> Result<NaiveDateTime, String> {
        let serial = self.to_double()?;
        let days = serial.trunc() as i64;
        let offset = if self.kind.is_1904() {
            1_462
        } else if days < 60 {
            1
        } else {
            0
        };
        let epoch = NaiveDate::from_ymd_opt(1899, 12, 30).expect("NaiveDate literal");
        let date = days
            .checked_add(offset)
            .and_then(Duration::try_days)
            .and_then(|duration| epoch.checked_add_signed(duration))
            .ok_or_else(|| format!("serial '{}' is out of date range", self.value))?;
        Ok(date.and_time(to_time(serial.fract())))
    }

    fn to_iso_datetime(&self) -> Result<Value, String> {
        let text = self.value.trim();
        if text.contains('T') {
            let datetime = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
                .map_err(|_| format!("parse '{}' to datetime failed", self.value))?;
            Ok(Value::DateTime(datetime))
        } else {
            let date = NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .map_err(|_| format!("parse '{}' to date failed", self.value))?;
            Ok(Value::Date(date))
        }
    }

    fn to_iso_time(&self) -> Result<NaiveTime, String> {
        let duration = self.value.trim().parse::<IsoDuration>()
            .map_err(|_| format!("parse '{}' to iso8601 duration failed", self.value))?;
        let seconds = duration.day as f64 * 86_400.0
            + duration.hour as f64 * 3_600.0
            + duration.minute as f64 * 60.0
            + duration.second as f64;
        Ok(to_time(seconds / 86_400.0))
    }
}

/// Converts a fraction of a day to a time of day, rounded to the millisecond.
fn to_time(fraction: f64) -> NaiveTime {
    let milliseconds = (fraction.abs() * 86_400_000f64).round() as u64 % 86_400_000;
    let seconds = (milliseconds / 1_000) as u32;
    let nanoseconds = (milliseconds % 1_000) as u32 * 1_000_000;
    NaiveTime::from_num_seconds_from_midnight_opt(seconds, nanoseconds).expect("Time within a day")
}

/// Renders a cell the way it reads in the sheet; used for header labels.
impl Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let nulls = HashSet::new();
        let conversion = Conversion { nulls: &nulls, error_as_null: false };
        match self.to_value(conversion) {
            Ok(value) => write!(f, "{value}"),
            Err(_) => write!(f, "{}", self.value),
        }
    }
}
