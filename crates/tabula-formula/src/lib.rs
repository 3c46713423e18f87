//! Formula engine for tabula
//!
//! Parses `=`-prefixed formula text into an expression tree, tracks the
//! dependencies between formula cells, and recalculates the whole sheet in
//! dependency order. Evaluation problems become error values (`#REF`,
//! `#CYCLE`, `#VALUE`, `#DIV0`, `#NAME`) in the affected cells; only
//! malformed syntax is a Rust-level error, and even that is absorbed into a
//! `#VALUE` cell during recalculation.
//!
//! # Example
//!
//! ```
//! use tabula_core::{Address, Sheet};
//! use tabula_formula::recalculate;
//!
//! let mut sheet = Sheet::default();
//! sheet.set_raw(Address::parse("A1")?, "10")?;
//! sheet.set_raw(Address::parse("B1")?, "=A1*2")?;
//! recalculate(&mut sheet);
//! assert_eq!(sheet.get(Address::parse("B1")?).unwrap().display_text(), "20");
//! # Ok::<(), tabula_core::Error>(())
//! ```

pub mod ast;
pub mod catalog;
pub mod dependency;
pub mod error;
pub mod eval;
pub mod functions;
pub mod parser;
pub mod recalc;

pub use ast::{BinaryOp, Expr, RefItem, UnaryOp};
pub use catalog::{FunctionSpec, CATALOG};
pub use dependency::DependencyGraph;
pub use error::{FormulaError, FormulaResult};
pub use eval::{evaluate, Context, EvalValue};
pub use parser::parse_formula;
pub use recalc::{recalculate, RecalcOutcome};
