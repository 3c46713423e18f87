//! The cell record
//!
//! A cell stores the exact text the user typed (`raw`), the formula text if
//! the raw text is formula-shaped, the last calculated value for formula
//! cells, and optional formatting. Display falls back to `raw` when there is
//! no calculated value.

use crate::style::Style;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// A single cell in the sheet
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Cell {
    /// The exact text the user typed (empty string if never set)
    #[serde(default)]
    pub raw: String,

    /// Formula text, present iff `raw` begins with `=`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,

    /// Evaluated value; absent for non-formula cells
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calculated: Option<Value>,

    /// Optional formatting, independent of value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<Style>,
}

impl Cell {
    /// Create a cell from raw user input
    ///
    /// Text beginning with `=` is recorded as a formula; its calculated
    /// value is filled in by the next recalculation pass.
    pub fn from_raw<S: Into<String>>(raw: S) -> Self {
        let raw = raw.into();
        let formula = raw.starts_with('=').then(|| raw.clone());
        Self {
            raw,
            formula,
            calculated: None,
            style: None,
        }
    }

    /// Check if this cell holds a formula
    pub fn is_formula(&self) -> bool {
        self.formula.is_some()
    }

    /// Check if this cell has no content (it may still carry a style)
    pub fn is_blank(&self) -> bool {
        self.raw.is_empty()
    }

    /// Check if the whole record is empty (no content, no style)
    pub fn is_empty(&self) -> bool {
        self.is_blank() && self.style.as_ref().map_or(true, |s| s.is_empty())
    }

    /// The text shown in the grid: calculated value if present, else raw
    pub fn display_text(&self) -> Cow<'_, str> {
        match &self.calculated {
            Some(value) => Cow::Owned(value.to_string()),
            None => Cow::Borrowed(self.raw.as_str()),
        }
    }

    /// The cell's value as seen by formulas referencing it
    ///
    /// Formula cells expose their calculated value; literal cells expose
    /// their raw text coerced to a number when it parses as one.
    pub fn effective_value(&self) -> Value {
        if let Some(value) = &self.calculated {
            return value.clone();
        }
        match self.raw.trim().parse::<f64>() {
            Ok(n) => Value::Number(n),
            Err(_) => Value::Text(self.raw.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ErrorKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_from_raw_literal() {
        let cell = Cell::from_raw("hello");
        assert!(!cell.is_formula());
        assert_eq!(cell.display_text(), "hello");
        assert_eq!(cell.effective_value(), Value::text("hello"));
    }

    #[test]
    fn test_from_raw_numeric_coercion() {
        let cell = Cell::from_raw("42");
        assert_eq!(cell.effective_value(), Value::Number(42.0));
    }

    #[test]
    fn test_from_raw_formula() {
        let cell = Cell::from_raw("=A1+1");
        assert!(cell.is_formula());
        assert_eq!(cell.formula.as_deref(), Some("=A1+1"));
        // No calculated value until a recalculation pass runs
        assert_eq!(cell.display_text(), "=A1+1");
    }

    #[test]
    fn test_display_prefers_calculated() {
        let mut cell = Cell::from_raw("=1/0");
        cell.calculated = Some(Value::Error(ErrorKind::Div0));
        assert_eq!(cell.display_text(), "#DIV0");
        // Formula text is retained so the user can correct it
        assert_eq!(cell.formula.as_deref(), Some("=1/0"));
    }

    #[test]
    fn test_emptiness() {
        assert!(Cell::default().is_empty());
        let styled = Cell {
            style: Some(Style::new().bold(true)),
            ..Cell::default()
        };
        assert!(styled.is_blank());
        assert!(!styled.is_empty());
    }
}
