//! Field values and input coercion.
//!
//! Every row field holds a [`CellValue`]; computed-column results are
//! ordinary fields from the cache's point of view. Raw user input is
//! coerced by the column's declared [`DataType`] before it enters the
//! cache. Structural equality on `CellValue` backs the unchanged-value
//! check that keeps repeated recomputes from generating writes.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::column::ColumnId;

/// One row's fields, keyed by column id.
pub type Row = HashMap<ColumnId, CellValue>;

/// Declared shape of a column's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    #[default]
    Text,
    Number,
    Currency,
    Date,
    Boolean,
    Select,
}

/// A single field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Null,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
    List(Vec<CellValue>),
}

impl CellValue {
    /// Coerce raw user input by the column's declared data type.
    ///
    /// Number and currency parse as floats, booleans accept `"true"`/`"1"`,
    /// dates parse ISO `YYYY-MM-DD`; everything else passes through as text.
    /// Unparseable input and empty input coerce to `Null` rather than erroring.
    pub fn coerce(raw: &str, data_type: DataType) -> CellValue {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return CellValue::Null;
        }
        match data_type {
            DataType::Number | DataType::Currency => trimmed
                .parse::<f64>()
                .map(CellValue::Number)
                .unwrap_or(CellValue::Null),
            DataType::Boolean => CellValue::Bool(trimmed == "true" || trimmed == "1"),
            DataType::Date => NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .map(CellValue::Date)
                .unwrap_or(CellValue::Null),
            DataType::Text | DataType::Select => CellValue::Text(raw.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Null
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_number_and_currency() {
        assert_eq!(
            CellValue::coerce("42.5", DataType::Number),
            CellValue::Number(42.5)
        );
        assert_eq!(
            CellValue::coerce(" 100 ", DataType::Currency),
            CellValue::Number(100.0)
        );
        assert_eq!(CellValue::coerce("abc", DataType::Number), CellValue::Null);
    }

    #[test]
    fn test_coerce_boolean() {
        assert_eq!(
            CellValue::coerce("true", DataType::Boolean),
            CellValue::Bool(true)
        );
        assert_eq!(
            CellValue::coerce("1", DataType::Boolean),
            CellValue::Bool(true)
        );
        assert_eq!(
            CellValue::coerce("yes", DataType::Boolean),
            CellValue::Bool(false)
        );
    }

    #[test]
    fn test_coerce_date() {
        assert_eq!(
            CellValue::coerce("2026-08-29", DataType::Date),
            CellValue::Date(NaiveDate::from_ymd_opt(2026, 8, 29).unwrap())
        );
        assert_eq!(
            CellValue::coerce("29/08/2026", DataType::Date),
            CellValue::Null
        );
    }

    #[test]
    fn test_coerce_empty_is_null() {
        assert_eq!(CellValue::coerce("   ", DataType::Text), CellValue::Null);
    }

    #[test]
    fn test_coerce_text_preserves_raw() {
        assert_eq!(
            CellValue::coerce("Paris ", DataType::Text),
            CellValue::Text("Paris ".to_string())
        );
    }

    #[test]
    fn test_structural_equality_on_lists() {
        let a = CellValue::List(vec![CellValue::Number(1.0), CellValue::Text("x".into())]);
        let b = CellValue::List(vec![CellValue::Number(1.0), CellValue::Text("x".into())]);
        assert_eq!(a, b);
    }
}
