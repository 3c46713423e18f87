//! The sheet: a sparse cell store with declared bounds
//!
//! Cells never written are absent from the map, not materialized as empty.
//! Declared `row_count`/`col_count` bounds may exceed the populated extent
//! (the grid can grow without data). All mutation goes through the defined
//! operations here; the engine facade layers change notification on top.

use crate::address::{Address, Range};
use crate::cell::Cell;
use crate::error::{Error, Result};
use crate::style::Style;
use crate::value::Value;
use ahash::RandomState;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default number of rows for a new sheet
pub const DEFAULT_ROWS: u32 = 100;

/// Default number of columns for a new sheet
pub const DEFAULT_COLS: u32 = 26;

/// A rectangular group of cells rendered as one, anchored at its top-left
///
/// Only the anchor renders content; covered cells are suppressed from
/// independent rendering but remain addressable in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeRegion {
    /// Top-left cell of the region
    pub anchor: Address,
    /// Number of spanned rows (>= 1)
    pub row_span: u32,
    /// Number of spanned columns (>= 1)
    pub col_span: u32,
}

impl MergeRegion {
    /// Create a merge region; spans must be at least 1
    pub fn new(anchor: Address, row_span: u32, col_span: u32) -> Result<Self> {
        if row_span == 0 || col_span == 0 {
            return Err(Error::InvalidMerge(format!(
                "spans must be >= 1, got {}x{}",
                row_span, col_span
            )));
        }
        Ok(Self {
            anchor,
            row_span,
            col_span,
        })
    }

    /// The rectangular range covered by this region
    pub fn range(&self) -> Range {
        Range::from_indices(
            self.anchor.row,
            self.anchor.col,
            self.anchor.row + self.row_span - 1,
            self.anchor.col + self.col_span - 1,
        )
    }

    /// Check if an address falls inside the region
    pub fn covers(&self, addr: Address) -> bool {
        self.range().contains(addr)
    }
}

/// Change notifications emitted after each committed operation
///
/// The host subscribes to these through the engine rather than polling the
/// store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetEvent {
    /// A cell's content changed
    CellChanged(Address),
    /// A cell's style changed
    StyleChanged(Address),
    /// Rows or columns were added or removed
    StructureChanged,
    /// The merge-region list changed
    MergesChanged,
    /// A recalculation pass completed
    Recalculated,
    /// The whole sheet was replaced (e.g. CSV import)
    Replaced,
}

/// A sparse spreadsheet: address → cell mapping plus declared bounds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sheet {
    /// Populated cells only
    cells: HashMap<Address, Cell, RandomState>,
    /// Declared row count (may exceed populated rows)
    row_count: u32,
    /// Declared column count (may exceed populated columns)
    col_count: u32,
    /// Merge regions (non-overlapping)
    #[serde(default)]
    merges: Vec<MergeRegion>,
}

impl Default for Sheet {
    fn default() -> Self {
        Self::new(DEFAULT_ROWS, DEFAULT_COLS)
    }
}

impl Sheet {
    /// Create an empty sheet with the given bounds
    pub fn new(row_count: u32, col_count: u32) -> Self {
        Self {
            cells: HashMap::default(),
            row_count,
            col_count,
            merges: Vec::new(),
        }
    }

    /// Declared row count
    pub fn row_count(&self) -> u32 {
        self.row_count
    }

    /// Declared column count
    pub fn col_count(&self) -> u32 {
        self.col_count
    }

    /// Check if an address lies within the declared bounds
    pub fn in_bounds(&self, addr: Address) -> bool {
        addr.row < self.row_count && addr.col < self.col_count
    }

    /// Number of populated cells
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Check if no cells are populated
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    // === Cell access ===

    /// Get a cell, if populated
    pub fn get(&self, addr: Address) -> Option<&Cell> {
        self.cells.get(&addr)
    }

    /// Get a cell by address string (e.g. "A1")
    pub fn cell(&self, address: &str) -> Result<Option<&Cell>> {
        Ok(self.get(Address::parse(address)?))
    }

    /// The value of a cell as seen by formulas referencing it
    ///
    /// Unpopulated cells read as empty text.
    pub fn effective_value(&self, addr: Address) -> Value {
        self.get(addr)
            .map(Cell::effective_value)
            .unwrap_or_else(|| Value::text(""))
    }

    /// Iterate over all populated cells
    pub fn iter(&self) -> impl Iterator<Item = (Address, &Cell)> {
        self.cells.iter().map(|(&a, c)| (a, c))
    }

    /// Iterate over all formula cells: (address, formula text)
    pub fn formula_cells(&self) -> impl Iterator<Item = (Address, &str)> {
        self.cells.iter().filter_map(|(&addr, cell)| {
            cell.formula.as_deref().map(|formula| (addr, formula))
        })
    }

    /// Bounds of the populated region, if any: (max_row, max_col)
    pub fn populated_extent(&self) -> Option<(u32, u32)> {
        self.cells.keys().fold(None, |acc, addr| match acc {
            None => Some((addr.row, addr.col)),
            Some((r, c)) => Some((r.max(addr.row), c.max(addr.col))),
        })
    }

    // === Cell mutation ===

    /// Write raw text to a cell, creating it on first write
    ///
    /// Formula-shaped text (leading `=`) records the formula; the calculated
    /// value is filled in by the next recalculation pass. Writing an empty
    /// string clears content but keeps the entry until [`Sheet::prune`]
    /// decides whether any live formula still references it.
    pub fn set_raw<S: Into<String>>(&mut self, addr: Address, raw: S) -> Result<()> {
        self.check_bounds(addr)?;
        let raw = raw.into();
        let style = self.cells.get(&addr).and_then(|c| c.style.clone());

        if raw.is_empty() {
            if let Some(cell) = self.cells.get_mut(&addr) {
                cell.raw.clear();
                cell.formula = None;
                cell.calculated = None;
            }
            return Ok(());
        }

        let mut cell = Cell::from_raw(raw);
        cell.style = style;
        self.cells.insert(addr, cell);
        Ok(())
    }

    /// Insert a fully-formed cell record, replacing any existing one
    ///
    /// Unlike [`Sheet::set_raw`] this performs no formula detection; CSV
    /// import uses it to keep imported text literal.
    pub fn insert_cell(&mut self, addr: Address, cell: Cell) -> Result<()> {
        self.check_bounds(addr)?;
        self.cells.insert(addr, cell);
        Ok(())
    }

    /// Set the calculated value of a formula cell (recalculation writeback)
    pub fn set_calculated(&mut self, addr: Address, value: Option<Value>) {
        if let Some(cell) = self.cells.get_mut(&addr) {
            cell.calculated = value;
        }
    }

    /// Merge style attributes into a cell, creating the cell if needed
    pub fn apply_style(&mut self, addr: Address, style: &Style) -> Result<()> {
        self.check_bounds(addr)?;
        let cell = self.cells.entry(addr).or_default();
        match &mut cell.style {
            Some(existing) => existing.merge(style),
            None => cell.style = Some(style.clone()),
        }
        Ok(())
    }

    /// Remove cleared cells that no live formula references
    ///
    /// A cell written back to empty stays in the map (as `raw = ""`) while a
    /// formula still reads it; once unreferenced and style-free it is
    /// dropped entirely. The referenced set comes from the recalculation
    /// pass, which knows every address reachable from a formula.
    pub fn prune<F: Fn(Address) -> bool>(&mut self, is_referenced: F) {
        self.cells
            .retain(|&addr, cell| !cell.is_empty() || is_referenced(addr));
    }

    // === Structural operations ===

    /// Append a row at the bottom (bounds grow; no cells move)
    pub fn append_row(&mut self) {
        self.row_count += 1;
    }

    /// Append a column at the right (bounds grow; no cells move)
    pub fn append_col(&mut self) {
        self.col_count += 1;
    }

    /// Insert a row before `index`, shifting subsequent rows down
    pub fn insert_row(&mut self, index: u32) -> Result<()> {
        if index > self.row_count {
            return Err(Error::RowOutOfBounds(index, self.row_count));
        }
        self.shift_rows(index, 1);
        self.row_count += 1;
        Ok(())
    }

    /// Insert a column before `index`, shifting subsequent columns right
    pub fn insert_col(&mut self, index: u32) -> Result<()> {
        if index > self.col_count {
            return Err(Error::ColumnOutOfBounds(index, self.col_count));
        }
        self.shift_cols(index, 1);
        self.col_count += 1;
        Ok(())
    }

    /// Remove the row at `index`, collapsing subsequent addresses upward
    ///
    /// Removing the final row only shrinks the bounds; cells stored there
    /// are left in place out of range, and formulas referencing them
    /// resolve to `#REF` on the next pass.
    pub fn remove_row(&mut self, index: u32) -> Result<()> {
        if index >= self.row_count {
            return Err(Error::RowOutOfBounds(index, self.row_count));
        }
        if index + 1 < self.row_count {
            self.cells.retain(|addr, _| addr.row != index);
            self.merges.retain(|m| !(m.range().start.row <= index && index <= m.range().end.row));
            self.shift_rows(index + 1, -1);
        }
        self.row_count -= 1;
        Ok(())
    }

    /// Remove the column at `index`, collapsing subsequent addresses leftward
    ///
    /// Same out-of-range rule as [`Sheet::remove_row`] for the final column.
    pub fn remove_col(&mut self, index: u32) -> Result<()> {
        if index >= self.col_count {
            return Err(Error::ColumnOutOfBounds(index, self.col_count));
        }
        if index + 1 < self.col_count {
            self.cells.retain(|addr, _| addr.col != index);
            self.merges.retain(|m| !(m.range().start.col <= index && index <= m.range().end.col));
            self.shift_cols(index + 1, -1);
        }
        self.col_count -= 1;
        Ok(())
    }

    fn shift_rows(&mut self, from: u32, delta: i64) {
        let moved: Vec<(Address, Cell)> = self
            .cells
            .iter()
            .filter(|(addr, _)| addr.row >= from)
            .map(|(&a, c)| (a, c.clone()))
            .collect();
        for (addr, _) in &moved {
            self.cells.remove(addr);
        }
        for (addr, cell) in moved {
            let row = (i64::from(addr.row) + delta) as u32;
            self.cells.insert(Address::new(row, addr.col), cell);
        }
        for merge in &mut self.merges {
            if merge.anchor.row >= from {
                merge.anchor.row = (i64::from(merge.anchor.row) + delta) as u32;
            }
        }
    }

    fn shift_cols(&mut self, from: u32, delta: i64) {
        let moved: Vec<(Address, Cell)> = self
            .cells
            .iter()
            .filter(|(addr, _)| addr.col >= from)
            .map(|(&a, c)| (a, c.clone()))
            .collect();
        for (addr, _) in &moved {
            self.cells.remove(addr);
        }
        for (addr, cell) in moved {
            let col = (i64::from(addr.col) + delta) as u32;
            self.cells.insert(Address::new(addr.row, col), cell);
        }
        for merge in &mut self.merges {
            if merge.anchor.col >= from {
                merge.anchor.col = (i64::from(merge.anchor.col) + delta) as u32;
            }
        }
    }

    // === Merge regions ===

    /// The merge-region list
    pub fn merges(&self) -> &[MergeRegion] {
        &self.merges
    }

    /// Add a merge region
    ///
    /// Overlapping requests are rejected outright; the caller must unmerge
    /// first.
    pub fn merge(&mut self, region: MergeRegion) -> Result<()> {
        let range = region.range();
        if !self.in_bounds(range.end) {
            return Err(Error::InvalidMerge(format!(
                "region {} exceeds sheet bounds",
                range
            )));
        }
        for existing in &self.merges {
            if existing.range().overlaps(&range) {
                return Err(Error::MergeConflict(range.to_a1_string()));
            }
        }
        self.merges.push(region);
        Ok(())
    }

    /// Remove the merge region anchored at `anchor`; returns whether one existed
    pub fn unmerge(&mut self, anchor: Address) -> bool {
        let before = self.merges.len();
        self.merges.retain(|m| m.anchor != anchor);
        self.merges.len() != before
    }

    /// The merge region covering an address, if any
    pub fn merge_at(&self, addr: Address) -> Option<&MergeRegion> {
        self.merges.iter().find(|m| m.covers(addr))
    }

    /// Check if an address is covered by a merge without being its anchor
    pub fn is_merge_shadowed(&self, addr: Address) -> bool {
        self.merge_at(addr)
            .map_or(false, |m| m.anchor != addr)
    }

    fn check_bounds(&self, addr: Address) -> Result<()> {
        if addr.row >= self.row_count {
            return Err(Error::RowOutOfBounds(addr.row, self.row_count));
        }
        if addr.col >= self.col_count {
            return Err(Error::ColumnOutOfBounds(addr.col, self.col_count));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ErrorKind;
    use pretty_assertions::assert_eq;

    fn addr(s: &str) -> Address {
        Address::parse(s).unwrap()
    }

    #[test]
    fn test_sparse_store() {
        let mut sheet = Sheet::default();
        assert!(sheet.is_empty());

        sheet.set_raw(addr("A1"), "hello").unwrap();
        sheet.set_raw(addr("C5"), "42").unwrap();

        assert_eq!(sheet.cell_count(), 2);
        assert!(sheet.get(addr("B2")).is_none());
        assert_eq!(sheet.get(addr("A1")).unwrap().raw, "hello");
        assert_eq!(sheet.effective_value(addr("C5")), Value::Number(42.0));
        assert_eq!(sheet.effective_value(addr("Z9")), Value::text(""));
    }

    #[test]
    fn test_bounds_enforced() {
        let mut sheet = Sheet::new(10, 5);
        assert!(sheet.set_raw(addr("A10"), "x").is_ok());
        assert!(sheet.set_raw(addr("A11"), "x").is_err());
        assert!(sheet.set_raw(addr("F1"), "x").is_err());
    }

    #[test]
    fn test_formula_cells_iterator() {
        let mut sheet = Sheet::default();
        sheet.set_raw(addr("A1"), "1").unwrap();
        sheet.set_raw(addr("B1"), "=A1*2").unwrap();
        sheet.set_raw(addr("B2"), "=SUM(A1:A3)").unwrap();

        let mut formulas: Vec<_> = sheet.formula_cells().collect();
        formulas.sort();
        assert_eq!(
            formulas,
            vec![(addr("B1"), "=A1*2"), (addr("B2"), "=SUM(A1:A3)")]
        );
    }

    #[test]
    fn test_clear_and_prune_lifecycle() {
        let mut sheet = Sheet::default();
        sheet.set_raw(addr("A1"), "5").unwrap();
        sheet.set_raw(addr("A2"), "6").unwrap();

        // Clearing keeps the entry until pruned
        sheet.set_raw(addr("A1"), "").unwrap();
        sheet.set_raw(addr("A2"), "").unwrap();
        assert_eq!(sheet.cell_count(), 2);

        // A1 is still referenced by a live formula, A2 is not
        sheet.prune(|a| a == addr("A1"));
        assert_eq!(sheet.cell_count(), 1);
        assert_eq!(sheet.get(addr("A1")).unwrap().raw, "");
        assert!(sheet.get(addr("A2")).is_none());
    }

    #[test]
    fn test_prune_keeps_styled_cells() {
        let mut sheet = Sheet::default();
        sheet.apply_style(addr("B2"), &Style::new().bold(true)).unwrap();
        sheet.prune(|_| false);
        assert!(sheet.get(addr("B2")).is_some());
    }

    #[test]
    fn test_style_survives_rewrite() {
        let mut sheet = Sheet::default();
        sheet.apply_style(addr("A1"), &Style::new().bold(true)).unwrap();
        sheet.set_raw(addr("A1"), "text").unwrap();
        assert!(sheet.get(addr("A1")).unwrap().style.as_ref().unwrap().bold);
    }

    #[test]
    fn test_insert_row_shifts_cells() {
        let mut sheet = Sheet::new(10, 5);
        sheet.set_raw(addr("A1"), "top").unwrap();
        sheet.set_raw(addr("A3"), "bottom").unwrap();

        sheet.insert_row(1).unwrap();
        assert_eq!(sheet.row_count(), 11);
        assert_eq!(sheet.get(addr("A1")).unwrap().raw, "top");
        assert!(sheet.get(addr("A3")).is_none());
        assert_eq!(sheet.get(addr("A4")).unwrap().raw, "bottom");
    }

    #[test]
    fn test_remove_row_collapses() {
        let mut sheet = Sheet::new(10, 5);
        sheet.set_raw(addr("A1"), "one").unwrap();
        sheet.set_raw(addr("A2"), "two").unwrap();
        sheet.set_raw(addr("A3"), "three").unwrap();

        sheet.remove_row(1).unwrap();
        assert_eq!(sheet.row_count(), 9);
        assert_eq!(sheet.get(addr("A1")).unwrap().raw, "one");
        assert_eq!(sheet.get(addr("A2")).unwrap().raw, "three");
        assert!(sheet.get(addr("A3")).is_none());
    }

    #[test]
    fn test_remove_last_row_orphans_cells() {
        let mut sheet = Sheet::new(3, 3);
        sheet.set_raw(addr("A3"), "stray").unwrap();

        sheet.remove_row(2).unwrap();
        assert_eq!(sheet.row_count(), 2);
        // The entry survives out of range; formulas referencing it get #REF
        assert_eq!(sheet.get(addr("A3")).unwrap().raw, "stray");
        assert!(!sheet.in_bounds(addr("A3")));
    }

    #[test]
    fn test_remove_col_collapses() {
        let mut sheet = Sheet::new(5, 5);
        sheet.set_raw(addr("A1"), "a").unwrap();
        sheet.set_raw(addr("B1"), "b").unwrap();
        sheet.set_raw(addr("C1"), "c").unwrap();

        sheet.remove_col(0).unwrap();
        assert_eq!(sheet.col_count(), 4);
        assert_eq!(sheet.get(addr("A1")).unwrap().raw, "b");
        assert_eq!(sheet.get(addr("B1")).unwrap().raw, "c");
    }

    #[test]
    fn test_merge_rejects_overlap() {
        let mut sheet = Sheet::default();
        let first = MergeRegion::new(addr("A1"), 2, 2).unwrap();
        sheet.merge(first).unwrap();

        let overlapping = MergeRegion::new(addr("B2"), 2, 2).unwrap();
        assert!(matches!(
            sheet.merge(overlapping),
            Err(Error::MergeConflict(_))
        ));

        let disjoint = MergeRegion::new(addr("D4"), 1, 2).unwrap();
        sheet.merge(disjoint).unwrap();
        assert_eq!(sheet.merges().len(), 2);
    }

    #[test]
    fn test_merge_shadowing() {
        let mut sheet = Sheet::default();
        sheet
            .merge(MergeRegion::new(addr("B2"), 2, 3).unwrap())
            .unwrap();

        assert!(!sheet.is_merge_shadowed(addr("B2"))); // anchor renders
        assert!(sheet.is_merge_shadowed(addr("C3")));
        assert!(sheet.is_merge_shadowed(addr("D3")));
        assert!(!sheet.is_merge_shadowed(addr("A1")));

        assert!(sheet.unmerge(addr("B2")));
        assert!(!sheet.is_merge_shadowed(addr("C3")));
    }

    #[test]
    fn test_merge_zero_span_rejected() {
        assert!(MergeRegion::new(addr("A1"), 0, 1).is_err());
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut sheet = Sheet::new(20, 8);
        sheet.set_raw(addr("A1"), "label").unwrap();
        sheet.set_raw(addr("B1"), "=A1").unwrap();
        sheet.set_calculated(addr("B1"), Some(Value::Error(ErrorKind::Value)));
        sheet
            .merge(MergeRegion::new(addr("C1"), 1, 2).unwrap())
            .unwrap();

        let json = serde_json::to_string(&sheet).unwrap();
        let back: Sheet = serde_json::from_str(&json).unwrap();

        assert_eq!(back.row_count(), 20);
        assert_eq!(back.col_count(), 8);
        assert_eq!(back.get(addr("A1")), sheet.get(addr("A1")));
        assert_eq!(back.get(addr("B1")), sheet.get(addr("B1")));
        assert_eq!(back.merges(), sheet.merges());
    }
}
