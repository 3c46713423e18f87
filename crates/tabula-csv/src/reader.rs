//! CSV import
//!
//! Imports produce a fresh sheet snapshot: one cell per delimited field,
//! every field kept as literal text. No formula interpretation happens on
//! import, so a field reading `=A1` stays the three characters `=A1`.

use std::io::Read;
use std::path::Path;

use tabula_core::{Address, Cell, Sheet, DEFAULT_COLS, DEFAULT_ROWS};

use crate::error::CsvResult;

/// Import a CSV stream into a fresh sheet
///
/// The sheet's bounds are the larger of the CSV's dimensions and the
/// default grid size, so a small import still presents a workable grid.
pub fn read_sheet<R: Read>(input: R) -> CsvResult<Sheet> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(input);

    let mut fields: Vec<(Address, String)> = Vec::new();
    let mut max_row = 0u32;
    let mut max_col = 0u32;

    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let row = row as u32;
        for (col, field) in record.iter().enumerate() {
            let col = col as u32;
            if field.is_empty() {
                continue;
            }
            max_row = max_row.max(row);
            max_col = max_col.max(col);
            fields.push((Address::new(row, col), field.to_string()));
        }
    }

    let mut sheet = Sheet::new(
        (max_row + 1).max(DEFAULT_ROWS),
        (max_col + 1).max(DEFAULT_COLS),
    );
    for (addr, raw) in fields {
        // Literal insert: no formula detection on imported text
        sheet.insert_cell(
            addr,
            Cell {
                raw,
                ..Cell::default()
            },
        )?;
    }

    log::debug!("imported {} cells", sheet.cell_count());
    Ok(sheet)
}

/// Import a CSV file into a fresh sheet
pub fn read_sheet_from_path<P: AsRef<Path>>(path: P) -> CsvResult<Sheet> {
    let file = std::fs::File::open(path)?;
    read_sheet(file)
}

/// Import a CSV string into a fresh sheet
pub fn read_sheet_from_str(input: &str) -> CsvResult<Sheet> {
    read_sheet(input.as_bytes())
}
