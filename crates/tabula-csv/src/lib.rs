//! CSV import and export for tabula sheets
//!
//! Export writes the grid as the user sees it addressed: a header row of
//! column letters and a leading 1-based row-number column, with formula
//! cells exporting their formula text. Import goes the other way but stays
//! literal: every field becomes a cell's raw text, with no formula
//! interpretation.

pub mod error;
pub mod reader;
pub mod writer;

pub use error::{CsvError, CsvResult};
pub use reader::{read_sheet, read_sheet_from_path, read_sheet_from_str};
pub use writer::{write_sheet, write_sheet_to_path, write_sheet_to_string};
