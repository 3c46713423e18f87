//! Calculated cell values
//!
//! A formula cell's result is one of four variants; making errors a value
//! variant (rather than a Result) lets error propagation flow through the
//! same channels as ordinary values during recalculation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The evaluated value of a formula cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum Value {
    /// Numeric value (all numbers are f64)
    Number(f64),
    /// Text value
    Text(String),
    /// Boolean value
    Bool(bool),
    /// Error tag (#REF, #CYCLE, ...)
    Error(ErrorKind),
}

impl Value {
    /// Create a text value
    pub fn text<S: Into<String>>(s: S) -> Self {
        Value::Text(s.into())
    }

    /// Try to interpret the value as a number
    ///
    /// Text parses leniently ("42" coerces); booleans map to 0/1; errors
    /// never coerce.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Bool(true) => Some(1.0),
            Value::Bool(false) => Some(0.0),
            Value::Text(s) => s.trim().parse().ok(),
            Value::Error(_) => None,
        }
    }

    /// Truthiness used by IF conditions
    ///
    /// JavaScript-style: 0, empty text, and error values are false;
    /// everything else is true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Number(n) => *n != 0.0,
            Value::Text(s) => !s.is_empty(),
            Value::Bool(b) => *b,
            Value::Error(_) => false,
        }
    }

    /// Check if this is an error value
    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    /// Get the error kind if this is one
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Value::Error(e) => Some(*e),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::Text(s) => write!(f, "{}", s),
            Value::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            Value::Error(e) => write!(f, "{}", e),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::text(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<ErrorKind> for Value {
    fn from(e: ErrorKind) -> Self {
        Value::Error(e)
    }
}

/// Error tags a cell can calculate to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// #REF - reference outside bounds, deleted dependency, or lookup miss
    Ref,
    /// #CYCLE - formula participates in a reference cycle
    Cycle,
    /// #VALUE - malformed formula or type error
    Value,
    /// #DIV0 - division by zero
    Div0,
    /// #NAME - unknown function name
    Name,
}

impl ErrorKind {
    /// Display code for this error
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Ref => "#REF",
            ErrorKind::Cycle => "#CYCLE",
            ErrorKind::Value => "#VALUE",
            ErrorKind::Div0 => "#DIV0",
            ErrorKind::Name => "#NAME",
        }
    }

    /// Parse an error code string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "#REF" => Some(ErrorKind::Ref),
            "#CYCLE" => Some(ErrorKind::Cycle),
            "#VALUE" => Some(ErrorKind::Value),
            "#DIV0" => Some(ErrorKind::Div0),
            "#NAME" => Some(ErrorKind::Name),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
