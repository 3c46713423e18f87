//! CSV export
//!
//! The exported layout mirrors the on-screen grid: the first record is a
//! header of column letters, and each following record starts with its
//! 1-based row number. Formula cells export their formula text rather than
//! the calculated value, so a sheet can be reviewed (or re-keyed) with its
//! logic intact. Quoting is handled by the csv crate.

use std::io::Write;
use std::path::Path;

use tabula_core::{Address, Sheet};

use crate::error::CsvResult;

/// Export a sheet to a CSV writer
///
/// Covers the populated extent of the sheet, not its full declared bounds,
/// so an empty 100x26 sheet exports as just the header row.
pub fn write_sheet<W: Write>(sheet: &Sheet, out: W) -> CsvResult<()> {
    let mut writer = csv::Writer::from_writer(out);

    let (max_row, max_col) = match sheet.populated_extent() {
        Some(extent) => extent,
        None => {
            writer.write_record([""])?;
            writer.flush()?;
            return Ok(());
        }
    };

    // Header: blank corner, then column letters
    let mut header = vec![String::new()];
    header.extend((0..=max_col).map(Address::column_to_letters));
    writer.write_record(&header)?;

    for row in 0..=max_row {
        let mut record = vec![(row + 1).to_string()];
        for col in 0..=max_col {
            let field = match sheet.get(Address::new(row, col)) {
                Some(cell) => match &cell.formula {
                    Some(formula) => formula.clone(),
                    None => cell.raw.clone(),
                },
                None => String::new(),
            };
            record.push(field);
        }
        writer.write_record(&record)?;
    }

    writer.flush()?;
    log::debug!("exported {} rows x {} cols", max_row + 1, max_col + 1);
    Ok(())
}

/// Export a sheet to a CSV file
pub fn write_sheet_to_path<P: AsRef<Path>>(sheet: &Sheet, path: P) -> CsvResult<()> {
    let file = std::fs::File::create(path)?;
    write_sheet(sheet, file)
}

/// Export a sheet to a CSV string
pub fn write_sheet_to_string(sheet: &Sheet) -> CsvResult<String> {
    let mut buf = Vec::new();
    write_sheet(sheet, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn addr(s: &str) -> Address {
        Address::parse(s).unwrap()
    }

    #[test]
    fn test_header_and_row_numbers() {
        let mut sheet = Sheet::default();
        sheet.set_raw(addr("A1"), "x").unwrap();
        sheet.set_raw(addr("B2"), "y").unwrap();

        let out = write_sheet_to_string(&sheet).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines, vec![",A,B", "1,x,", "2,,y"]);
    }

    #[test]
    fn test_formula_cells_export_formula_text() {
        let mut sheet = Sheet::default();
        sheet.set_raw(addr("A1"), "2").unwrap();
        sheet.set_raw(addr("B1"), "=A1*2").unwrap();

        let out = write_sheet_to_string(&sheet).unwrap();
        assert!(out.contains("=A1*2"));
    }

    #[test]
    fn test_comma_fields_are_quoted() {
        let mut sheet = Sheet::default();
        sheet.set_raw(addr("A1"), "a,b").unwrap();

        let out = write_sheet_to_string(&sheet).unwrap();
        assert!(out.contains("\"a,b\""));
    }

    #[test]
    fn test_write_to_file() {
        let mut sheet = Sheet::default();
        sheet.set_raw(addr("A1"), "hello").unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheet.csv");
        write_sheet_to_path(&sheet, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("hello"));
    }
}
