//! Formula error types

use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors that can occur while parsing a formula
///
/// Evaluation never fails with a Rust error: evaluation problems become
/// error *values* (`#REF`, `#DIV0`, ...) contained in the affected cell.
#[derive(Debug, Error)]
pub enum FormulaError {
    /// Malformed formula syntax
    #[error("Parse error: {0}")]
    Parse(String),
}
