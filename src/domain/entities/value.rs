use std::cmp::Ordering;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};

/// A single stored value as a data source hands it to the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f64),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Text written into a result cell. `Null` becomes an empty string.
    pub fn to_cell_text(&self) -> String {
        match self {
            CellValue::Null => String::new(),
            other => other.to_string(),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            CellValue::Null => 0,
            CellValue::Bool(_) | CellValue::Integer(_) | CellValue::Real(_) => 1,
            CellValue::Date(_) | CellValue::DateTime(_) => 2,
            CellValue::Text(_) => 3,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Bool(value) => Some(f64::from(u8::from(*value))),
            CellValue::Integer(value) => Some(*value as f64),
            CellValue::Real(value) => Some(*value),
            _ => None,
        }
    }

    fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            CellValue::Date(value) => value.and_hms_opt(0, 0, 0),
            CellValue::DateTime(value) => Some(*value),
            _ => None,
        }
    }

    /// Total order used for sorting: nulls first, then numbers, dates, text.
    pub fn sort_cmp(&self, other: &CellValue) -> Ordering {
        let by_rank = self.rank().cmp(&other.rank());
        if by_rank != Ordering::Equal {
            return by_rank;
        }
        match (self, other) {
            (CellValue::Text(left), CellValue::Text(right)) => left.cmp(right),
            _ => {
                if let (Some(left), Some(right)) = (self.as_f64(), other.as_f64()) {
                    return left.total_cmp(&right);
                }
                if let (Some(left), Some(right)) = (self.as_datetime(), other.as_datetime()) {
                    return left.cmp(&right);
                }
                Ordering::Equal
            }
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Bool(value) => write!(f, "{value}"),
            CellValue::Integer(value) => write!(f, "{value}"),
            CellValue::Real(value) => write!(f, "{value}"),
            CellValue::Text(value) => f.write_str(value),
            CellValue::Date(value) => write!(f, "{}", value.format("%Y-%m-%d")),
            CellValue::DateTime(value) => write!(f, "{}", value.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Integer(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Real(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(value: NaiveDate) -> Self {
        CellValue::Date(value)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(value: NaiveDateTime) -> Self {
        CellValue::DateTime(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(CellValue::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_renders_as_empty_cell() {
        assert_eq!(CellValue::Null.to_cell_text(), "");
        assert_eq!(CellValue::Integer(30).to_cell_text(), "30");
    }

    #[test]
    fn sort_cmp_places_nulls_first_and_compares_numbers_numerically() {
        assert_eq!(
            CellValue::Null.sort_cmp(&CellValue::Integer(1)),
            Ordering::Less
        );
        assert_eq!(
            CellValue::Integer(9).sort_cmp(&CellValue::Real(10.5)),
            Ordering::Less
        );
        assert_eq!(
            CellValue::from("b").sort_cmp(&CellValue::from("a")),
            Ordering::Greater
        );
    }

    #[test]
    fn dates_render_in_iso_format() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).expect("valid date");
        let datetime = date.and_hms_opt(8, 5, 0).expect("valid time");
        assert_eq!(CellValue::from(date).to_cell_text(), "2024-03-09");
        assert_eq!(
            CellValue::from(datetime).to_cell_text(),
            "2024-03-09 08:05:00"
        );
    }
}
