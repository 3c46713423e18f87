//! # tabula-core
//!
//! Core data structures for the tabula reporting-grid engine:
//! - [`Address`] and [`Range`] - A1-style cell addressing
//! - [`Value`] - calculated values (numbers, text, booleans, error tags)
//! - [`Cell`] - the raw/formula/calculated/style record
//! - [`Sheet`] - the sparse cell store with declared bounds and merge regions
//!
//! ## Example
//!
//! ```rust
//! use tabula_core::{Address, Sheet};
//!
//! let mut sheet = Sheet::default();
//! sheet.set_raw(Address::parse("A1").unwrap(), "12").unwrap();
//! sheet.set_raw(Address::parse("B1").unwrap(), "=A1*2").unwrap();
//!
//! let b1 = sheet.cell("B1").unwrap().unwrap();
//! assert!(b1.is_formula());
//! ```

pub mod address;
pub mod cell;
pub mod error;
pub mod sheet;
pub mod style;
pub mod value;

// Re-exports for convenience
pub use address::{Address, Range, RangeIter};
pub use cell::Cell;
pub use error::{Error, Result};
pub use sheet::{MergeRegion, Sheet, SheetEvent, DEFAULT_COLS, DEFAULT_ROWS};
pub use style::{Alignment, Style};
pub use value::{ErrorKind, Value};
