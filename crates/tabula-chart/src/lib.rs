//! Chart data extraction
//!
//! Projects a labelled region of a sheet into ordered rows for chart
//! rendering. Extraction scans downward from the label start address and
//! stops at the first row whose label cell is empty, so the series length
//! follows the data rather than a fixed row count.

use tabula_core::{Address, Result, Sheet, Value};

/// One extracted chart row: a label and one value per data series
#[derive(Debug, Clone, PartialEq)]
pub struct ChartRow {
    pub label: String,
    pub values: Vec<f64>,
}

/// Extract chart rows from a sheet
///
/// `label_start` addresses the first label cell; `series_cols` names the
/// data columns by letter ("B", "C", ...). Each scanned row reads one value
/// per series column from the same row as its label, coercing to a number
/// with non-numeric cells contributing 0.
pub fn extract(sheet: &Sheet, label_start: Address, series_cols: &[&str]) -> Result<Vec<ChartRow>> {
    let cols = series_cols
        .iter()
        .map(|letters| Address::letters_to_column(letters))
        .collect::<Result<Vec<u32>>>()?;

    let mut rows = Vec::new();
    for row in label_start.row..sheet.row_count() {
        let label = label_text(sheet, Address::new(row, label_start.col));
        // First empty label terminates the series
        if label.is_empty() {
            break;
        }

        let values = cols
            .iter()
            .map(|&col| numeric_value(sheet, Address::new(row, col)))
            .collect();
        rows.push(ChartRow { label, values });
    }
    Ok(rows)
}

fn label_text(sheet: &Sheet, addr: Address) -> String {
    sheet
        .get(addr)
        .map(|cell| cell.display_text().into_owned())
        .unwrap_or_default()
}

/// A cell's numeric reading for charting: non-numeric contributes 0
fn numeric_value(sheet: &Sheet, addr: Address) -> f64 {
    match sheet.effective_value(addr) {
        Value::Number(n) => n,
        Value::Bool(true) => 1.0,
        Value::Text(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}
