//! The sheet engine facade
//!
//! Owns one sheet and its interaction state, funnels every mutation through
//! the defined operations, runs the recalculation pass after each commit,
//! and notifies subscribed observers. The host holds a read-only view of
//! the sheet between events.

use tabula_core::{Address, MergeRegion, Result, Sheet, SheetEvent, Style};
use tabula_formula::recalculate;
use tabula_grid::{EditAction, InputEvent, Selection, SelectionMachine};

/// Callback invoked after each committed change
pub type Observer = Box<dyn FnMut(&SheetEvent)>;

/// Result of processing one input event
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CommitOutcome {
    /// Cells written during this event
    pub committed: Vec<Address>,
    /// Parse-failure message for the directly edited cell, surfaced once at
    /// commit time (transitive errors show only as inline markers)
    pub parse_error: Option<String>,
}

/// An engine instance: one sheet, its selection state, and its observers
pub struct SheetEngine {
    sheet: Sheet,
    machine: SelectionMachine,
    observers: Vec<Observer>,
}

impl Default for SheetEngine {
    fn default() -> Self {
        Self::new(Sheet::default())
    }
}

impl SheetEngine {
    pub fn new(sheet: Sheet) -> Self {
        let mut engine = Self {
            sheet,
            machine: SelectionMachine::new(),
            observers: Vec::new(),
        };
        // Loaded snapshots may carry formulas with stale values
        engine.recalc();
        engine
    }

    /// Read-only view of the sheet
    pub fn sheet(&self) -> &Sheet {
        &self.sheet
    }

    /// Current selection
    pub fn selection(&self) -> &Selection {
        self.machine.selection()
    }

    /// The cell being edited and its buffer, if editing
    pub fn editing(&self) -> Option<(Address, &str)> {
        self.machine.editing()
    }

    /// Subscribe to change notifications
    pub fn subscribe(&mut self, observer: Observer) {
        self.observers.push(observer);
    }

    // === Input events ===

    /// Process one pointer or keyboard event
    ///
    /// Commits produced by the event are written to the store, followed by
    /// a full recalculation pass, before control returns to the renderer.
    pub fn handle(&mut self, event: InputEvent) -> Result<CommitOutcome> {
        let actions = self.machine.handle(event, &self.sheet);
        let mut outcome = CommitOutcome::default();

        for action in actions {
            match action {
                EditAction::Commit { addr, text } => {
                    log::debug!("commit {} = {:?}", addr, text);
                    self.sheet.set_raw(addr, text)?;
                    outcome.committed.push(addr);
                    self.notify(SheetEvent::CellChanged(addr));
                }
            }
        }

        if !outcome.committed.is_empty() {
            let recalc = self.recalc();
            // Only the directly edited cell's own parse failure is surfaced
            // as a notification
            outcome.parse_error = recalc
                .parse_errors
                .iter()
                .find(|(addr, _)| outcome.committed.contains(addr))
                .map(|(_, msg)| msg.clone());
        }

        Ok(outcome)
    }

    // === Host-issued operations ===

    /// Apply style attributes to every cell in the current selection
    pub fn style_selection(&mut self, style: &Style) -> Result<()> {
        let cells = self
            .machine
            .selection()
            .cells(self.sheet.row_count(), self.sheet.col_count());
        for addr in cells {
            self.sheet.apply_style(addr, style)?;
            self.notify(SheetEvent::StyleChanged(addr));
        }
        Ok(())
    }

    /// Merge the current range selection into one region
    pub fn merge_selection(&mut self) -> Result<()> {
        let Some(range) = self.machine.selection().as_range() else {
            return Err(tabula_core::Error::InvalidMerge(
                "selection is not rectangular".into(),
            ));
        };
        let region = MergeRegion::new(range.start, range.row_count(), range.col_count())?;
        self.sheet.merge(region)?;
        self.notify(SheetEvent::MergesChanged);
        Ok(())
    }

    /// Remove the merge region anchored at the given address
    pub fn unmerge(&mut self, anchor: Address) {
        if self.sheet.unmerge(anchor) {
            self.notify(SheetEvent::MergesChanged);
        }
    }

    /// Replace the whole sheet (e.g. CSV import)
    pub fn replace(&mut self, sheet: Sheet) {
        self.sheet = sheet;
        self.machine = SelectionMachine::new();
        self.notify(SheetEvent::Replaced);
        self.recalc();
    }

    pub fn append_row(&mut self) {
        self.sheet.append_row();
        self.notify(SheetEvent::StructureChanged);
    }

    pub fn append_col(&mut self) {
        self.sheet.append_col();
        self.notify(SheetEvent::StructureChanged);
    }

    pub fn insert_row(&mut self, index: u32) -> Result<()> {
        self.sheet.insert_row(index)?;
        self.structure_changed();
        Ok(())
    }

    pub fn insert_col(&mut self, index: u32) -> Result<()> {
        self.sheet.insert_col(index)?;
        self.structure_changed();
        Ok(())
    }

    pub fn remove_row(&mut self, index: u32) -> Result<()> {
        self.sheet.remove_row(index)?;
        self.structure_changed();
        Ok(())
    }

    pub fn remove_col(&mut self, index: u32) -> Result<()> {
        self.sheet.remove_col(index)?;
        self.structure_changed();
        Ok(())
    }

    /// Chart data for the current sheet (see [`tabula_chart::extract`])
    pub fn chart_data(
        &self,
        label_start: Address,
        series_cols: &[&str],
    ) -> Result<Vec<tabula_chart::ChartRow>> {
        tabula_chart::extract(&self.sheet, label_start, series_cols)
    }

    // === Internals ===

    /// Structural edits move formulas around, so references resolve anew
    fn structure_changed(&mut self) {
        self.notify(SheetEvent::StructureChanged);
        self.recalc();
    }

    fn recalc(&mut self) -> tabula_formula::RecalcOutcome {
        let outcome = recalculate(&mut self.sheet);
        // Cleared cells survive only while some live formula reads them
        let referenced = outcome.referenced.clone();
        self.sheet.prune(|addr| referenced.contains(&addr));
        self.notify(SheetEvent::Recalculated);
        outcome
    }

    fn notify(&mut self, event: SheetEvent) {
        for observer in &mut self.observers {
            observer(&event);
        }
    }
}
