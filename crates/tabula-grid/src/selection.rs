//! Selection and editing state machine
//!
//! A pure model of the grid's interaction state: which cells are selected,
//! whether a cell is being edited, and what the edit buffer holds. Input
//! events go in, [`EditAction`]s come out; the machine never touches the
//! sheet itself, so the host decides when commits hit the store and trigger
//! recalculation.

use tabula_core::{Address, Range, Sheet};

/// Arrow-key directions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    fn step(self, from: Address, max_row: u32, max_col: u32) -> Address {
        let Address { row, col } = from;
        match self {
            Direction::Up => Address::new(row.saturating_sub(1), col),
            Direction::Down => Address::new((row + 1).min(max_row), col),
            Direction::Left => Address::new(row, col.saturating_sub(1)),
            Direction::Right => Address::new(row, (col + 1).min(max_col)),
        }
    }
}

/// A keyboard input, modifiers already resolved by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Enter,
    Escape,
    F2,
    Tab,
    Backspace,
    Delete,
    Arrow(Direction),
    ShiftArrow(Direction),
    /// A printable character
    Char(char),
}

/// A pointer or keyboard event the grid surface forwards to the machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Click(Address),
    ShiftClick(Address),
    /// Ctrl on Linux/Windows, Cmd on macOS
    CtrlClick(Address),
    DoubleClick(Address),
    DragStart(Address),
    DragOver(Address),
    DragEnd,
    Key(Key),
    ColumnHeaderClick(u32),
    RowHeaderClick(u32),
    /// The top-left corner between the header strips
    CornerClick,
    /// The editing surface lost focus
    Blur,
}

/// What is currently selected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    None,
    Cell(Address),
    Range(Range),
    /// Discontiguous cells accumulated by ctrl-click
    Multi(Vec<Address>),
    Columns(Vec<u32>),
    Rows(Vec<u32>),
    All,
}

impl Selection {
    /// Every cell address the selection covers, within the given bounds
    pub fn cells(&self, row_count: u32, col_count: u32) -> Vec<Address> {
        match self {
            Selection::None => Vec::new(),
            Selection::Cell(addr) => vec![*addr],
            Selection::Range(range) => range.cells().collect(),
            Selection::Multi(cells) => cells.clone(),
            Selection::Columns(cols) => {
                let mut out = Vec::new();
                for &col in cols {
                    for row in 0..row_count {
                        out.push(Address::new(row, col));
                    }
                }
                out
            }
            Selection::Rows(rows) => {
                let mut out = Vec::new();
                for &row in rows {
                    for col in 0..col_count {
                        out.push(Address::new(row, col));
                    }
                }
                out
            }
            Selection::All => Range::new(
                Address::new(0, 0),
                Address::new(row_count.saturating_sub(1), col_count.saturating_sub(1)),
            )
            .cells()
            .collect(),
        }
    }

    /// The rectangular range, if the selection is a single cell or range
    pub fn as_range(&self) -> Option<Range> {
        match self {
            Selection::Cell(addr) => Some(Range::new(*addr, *addr)),
            Selection::Range(range) => Some(*range),
            _ => None,
        }
    }
}

/// Interaction state
#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    Idle,
    Selected,
    Editing {
        addr: Address,
        buffer: String,
    },
}

/// An effect the host must apply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditAction {
    /// Write the text to the cell and run a recalculation pass
    Commit { addr: Address, text: String },
}

/// The selection/editing state machine
///
/// Hosts construct one per sheet view, feed it [`InputEvent`]s along with a
/// read-only view of the sheet (for bounds and for seeding the edit buffer
/// with a cell's raw text), and apply the returned actions.
#[derive(Debug)]
pub struct SelectionMachine {
    state: State,
    selection: Selection,
    /// Anchor for shift-click and shift-arrow range extension
    anchor: Option<Address>,
    /// Set while a pointer drag is in progress
    drag_anchor: Option<Address>,
}

impl Default for SelectionMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionMachine {
    pub fn new() -> Self {
        Self {
            state: State::Idle,
            selection: Selection::None,
            anchor: None,
            drag_anchor: None,
        }
    }

    /// Current selection
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// The cell being edited and its buffer, if editing
    pub fn editing(&self) -> Option<(Address, &str)> {
        match &self.state {
            State::Editing { addr, buffer } => Some((*addr, buffer)),
            _ => None,
        }
    }

    /// The active cell (edit target, or the selection anchor)
    pub fn active_cell(&self) -> Option<Address> {
        match &self.state {
            State::Editing { addr, .. } => Some(*addr),
            _ => self.anchor,
        }
    }

    /// Process one input event, returning the actions the host must apply
    pub fn handle(&mut self, event: InputEvent, sheet: &Sheet) -> Vec<EditAction> {
        let mut actions = Vec::new();

        // Pointer events and header clicks implicitly end an in-progress
        // edit, committing it like a blur.
        if matches!(self.state, State::Editing { .. })
            && !matches!(event, InputEvent::Key(_) | InputEvent::Blur)
        {
            self.commit(&mut actions, None);
        }

        match event {
            InputEvent::Click(addr) => self.select_cell(addr),

            InputEvent::ShiftClick(addr) => self.extend_to(addr),

            InputEvent::CtrlClick(addr) => self.toggle_cell(addr, sheet),

            InputEvent::DoubleClick(addr) => {
                self.select_cell(addr);
                self.begin_edit(addr, raw_of(sheet, addr));
            }

            InputEvent::DragStart(addr) => {
                self.select_cell(addr);
                self.drag_anchor = Some(addr);
            }
            InputEvent::DragOver(addr) => {
                if let Some(anchor) = self.drag_anchor {
                    self.selection = if addr == anchor {
                        Selection::Cell(anchor)
                    } else {
                        Selection::Range(Range::new(anchor, addr))
                    };
                    self.state = State::Selected;
                }
            }
            InputEvent::DragEnd => self.drag_anchor = None,

            InputEvent::ColumnHeaderClick(col) => {
                self.selection = Selection::Columns(vec![col]);
                self.state = State::Selected;
                self.anchor = Some(Address::new(0, col));
            }
            InputEvent::RowHeaderClick(row) => {
                self.selection = Selection::Rows(vec![row]);
                self.state = State::Selected;
                self.anchor = Some(Address::new(row, 0));
            }
            InputEvent::CornerClick => {
                self.selection = Selection::All;
                self.state = State::Selected;
                self.anchor = Some(Address::new(0, 0));
            }

            InputEvent::Key(key) => self.handle_key(key, sheet, &mut actions),

            InputEvent::Blur => {
                if matches!(self.state, State::Editing { .. }) {
                    self.commit(&mut actions, None);
                }
            }
        }

        actions
    }

    // === Event handlers ===

    fn handle_key(&mut self, key: Key, sheet: &Sheet, actions: &mut Vec<EditAction>) {
        let max_row = sheet.row_count().saturating_sub(1);
        let max_col = sheet.col_count().saturating_sub(1);

        if let State::Editing { addr, buffer } = &mut self.state {
            let addr = *addr;
            match key {
                Key::Enter => {
                    // Commit and move one row down
                    let next = Direction::Down.step(addr, max_row, max_col);
                    self.commit(actions, Some(next));
                }
                Key::Tab => {
                    let next = Direction::Right.step(addr, max_row, max_col);
                    self.commit(actions, Some(next));
                }
                Key::Escape => {
                    // Discard the buffer; the cell keeps its pre-edit value
                    self.state = State::Selected;
                    self.select_cell(addr);
                }
                Key::Char(c) => buffer.push(c),
                Key::Backspace => {
                    buffer.pop();
                }
                Key::Delete | Key::F2 | Key::Arrow(_) | Key::ShiftArrow(_) => {}
            }
            return;
        }

        let Some(anchor) = self.anchor else {
            return;
        };

        match key {
            Key::Enter | Key::F2 => {
                self.begin_edit(anchor, raw_of(sheet, anchor));
            }
            Key::Char(c) => {
                // Typing over a selected cell starts a fresh edit
                self.begin_edit(anchor, String::from(c));
            }
            Key::Backspace | Key::Delete => {
                self.begin_edit(anchor, String::new());
            }
            Key::Arrow(dir) => {
                let next = dir.step(self.focus_cell(), max_row, max_col);
                self.select_cell(next);
            }
            Key::Tab => {
                let next = Direction::Right.step(self.focus_cell(), max_row, max_col);
                self.select_cell(next);
            }
            Key::ShiftArrow(dir) => {
                let next = dir.step(self.focus_cell(), max_row, max_col);
                self.extend_to(next);
            }
            Key::Escape => {}
        }
    }

    fn select_cell(&mut self, addr: Address) {
        self.selection = Selection::Cell(addr);
        self.anchor = Some(addr);
        self.state = State::Selected;
    }

    /// Extend from the anchor to the given cell, order-independently
    fn extend_to(&mut self, addr: Address) {
        let anchor = self.anchor.unwrap_or(addr);
        self.selection = if anchor == addr {
            Selection::Cell(anchor)
        } else {
            Selection::Range(Range::new(anchor, addr))
        };
        self.state = State::Selected;
    }

    /// Toggle a cell in the discontiguous selection set
    fn toggle_cell(&mut self, addr: Address, sheet: &Sheet) {
        let mut cells = match &self.selection {
            Selection::Multi(cells) => cells.clone(),
            other => other.cells(sheet.row_count(), sheet.col_count()),
        };
        if let Some(pos) = cells.iter().position(|&a| a == addr) {
            cells.remove(pos);
        } else {
            cells.push(addr);
        }
        if cells.is_empty() {
            self.selection = Selection::None;
            self.anchor = None;
            self.state = State::Idle;
        } else {
            self.anchor = Some(addr);
            self.selection = Selection::Multi(cells);
            self.state = State::Selected;
        }
    }

    /// The moving end of the selection: the non-anchor corner of a range,
    /// or the anchor itself
    fn focus_cell(&self) -> Address {
        let anchor = self.anchor.unwrap_or(Address::new(0, 0));
        match &self.selection {
            Selection::Range(range) => {
                // Whichever corner is not the anchor
                let focus_row = if range.start.row == anchor.row {
                    range.end.row
                } else {
                    range.start.row
                };
                let focus_col = if range.start.col == anchor.col {
                    range.end.col
                } else {
                    range.start.col
                };
                Address::new(focus_row, focus_col)
            }
            _ => anchor,
        }
    }

    fn begin_edit(&mut self, addr: Address, buffer: String) {
        self.state = State::Editing { addr, buffer };
    }

    /// Commit the current edit buffer; optionally move the selection after
    fn commit(&mut self, actions: &mut Vec<EditAction>, move_to: Option<Address>) {
        if let State::Editing { addr, buffer } = std::mem::replace(&mut self.state, State::Idle) {
            actions.push(EditAction::Commit {
                addr,
                text: buffer,
            });
            self.select_cell(move_to.unwrap_or(addr));
        }
    }
}

fn raw_of(sheet: &Sheet, addr: Address) -> String {
    sheet.get(addr).map(|c| c.raw.clone()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn addr(s: &str) -> Address {
        Address::parse(s).unwrap()
    }

    fn machine() -> (SelectionMachine, Sheet) {
        (SelectionMachine::new(), Sheet::default())
    }

    #[test]
    fn test_click_selects_cell() {
        let (mut m, sheet) = machine();
        m.handle(InputEvent::Click(addr("B2")), &sheet);
        assert_eq!(m.selection(), &Selection::Cell(addr("B2")));
    }

    #[test]
    fn test_shift_click_spans_range_either_order() {
        let (mut m, sheet) = machine();
        m.handle(InputEvent::Click(addr("A1")), &sheet);
        m.handle(InputEvent::ShiftClick(addr("C3")), &sheet);
        let forward = m.selection().clone();

        let (mut m, sheet) = machine();
        m.handle(InputEvent::Click(addr("C3")), &sheet);
        m.handle(InputEvent::ShiftClick(addr("A1")), &sheet);
        assert_eq!(&forward, m.selection());

        let cells = forward.cells(sheet.row_count(), sheet.col_count());
        assert_eq!(cells.len(), 9);
        assert!(cells.contains(&addr("B2")));
    }

    #[test]
    fn test_ctrl_click_toggles_membership() {
        let (mut m, sheet) = machine();
        m.handle(InputEvent::Click(addr("A1")), &sheet);
        m.handle(InputEvent::CtrlClick(addr("C5")), &sheet);
        assert_eq!(
            m.selection(),
            &Selection::Multi(vec![addr("A1"), addr("C5")])
        );
        m.handle(InputEvent::CtrlClick(addr("A1")), &sheet);
        assert_eq!(m.selection(), &Selection::Multi(vec![addr("C5")]));
    }

    #[test]
    fn test_drag_extends_range_until_release() {
        let (mut m, sheet) = machine();
        m.handle(InputEvent::DragStart(addr("B2")), &sheet);
        m.handle(InputEvent::DragOver(addr("C3")), &sheet);
        m.handle(InputEvent::DragOver(addr("D5")), &sheet);
        m.handle(InputEvent::DragEnd, &sheet);
        assert_eq!(
            m.selection(),
            &Selection::Range(Range::new(addr("B2"), addr("D5")))
        );
        // Movement after release does not extend
        m.handle(InputEvent::DragOver(addr("F9")), &sheet);
        assert_eq!(
            m.selection(),
            &Selection::Range(Range::new(addr("B2"), addr("D5")))
        );
    }

    #[test]
    fn test_double_click_enters_editing_with_raw() {
        let (mut m, mut sheet) = machine();
        sheet.set_raw(addr("A1"), "hello").unwrap();
        m.handle(InputEvent::DoubleClick(addr("A1")), &sheet);
        assert_eq!(m.editing(), Some((addr("A1"), "hello")));
    }

    #[test]
    fn test_printable_key_seeds_overwrite_edit() {
        let (mut m, mut sheet) = machine();
        sheet.set_raw(addr("A1"), "old").unwrap();
        m.handle(InputEvent::Click(addr("A1")), &sheet);
        m.handle(InputEvent::Key(Key::Char('7')), &sheet);
        assert_eq!(m.editing(), Some((addr("A1"), "7")));
    }

    #[test]
    fn test_delete_key_seeds_empty_edit() {
        let (mut m, mut sheet) = machine();
        sheet.set_raw(addr("A1"), "old").unwrap();
        m.handle(InputEvent::Click(addr("A1")), &sheet);
        m.handle(InputEvent::Key(Key::Delete), &sheet);
        assert_eq!(m.editing(), Some((addr("A1"), "")));
    }

    #[test]
    fn test_enter_commits_and_moves_down() {
        let (mut m, sheet) = machine();
        m.handle(InputEvent::Click(addr("B2")), &sheet);
        m.handle(InputEvent::Key(Key::Char('5')), &sheet);
        let actions = m.handle(InputEvent::Key(Key::Enter), &sheet);
        assert_eq!(
            actions,
            vec![EditAction::Commit {
                addr: addr("B2"),
                text: "5".into()
            }]
        );
        assert_eq!(m.selection(), &Selection::Cell(addr("B3")));
    }

    #[test]
    fn test_escape_discards_edit() {
        let (mut m, mut sheet) = machine();
        sheet.set_raw(addr("A1"), "keep").unwrap();
        m.handle(InputEvent::DoubleClick(addr("A1")), &sheet);
        m.handle(InputEvent::Key(Key::Char('x')), &sheet);
        let actions = m.handle(InputEvent::Key(Key::Escape), &sheet);
        assert!(actions.is_empty());
        assert_eq!(m.selection(), &Selection::Cell(addr("A1")));
        assert_eq!(m.editing(), None);
    }

    #[test]
    fn test_blur_commits_without_moving() {
        let (mut m, sheet) = machine();
        m.handle(InputEvent::Click(addr("C4")), &sheet);
        m.handle(InputEvent::Key(Key::Char('9')), &sheet);
        let actions = m.handle(InputEvent::Blur, &sheet);
        assert_eq!(
            actions,
            vec![EditAction::Commit {
                addr: addr("C4"),
                text: "9".into()
            }]
        );
        assert_eq!(m.selection(), &Selection::Cell(addr("C4")));
    }

    #[test]
    fn test_arrows_move_clamped_to_bounds() {
        let (mut m, _) = machine();
        let sheet = Sheet::new(3, 3);
        m.handle(InputEvent::Click(addr("A1")), &sheet);
        m.handle(InputEvent::Key(Key::Arrow(Direction::Up)), &sheet);
        assert_eq!(m.selection(), &Selection::Cell(addr("A1")));
        m.handle(InputEvent::Key(Key::Arrow(Direction::Right)), &sheet);
        m.handle(InputEvent::Key(Key::Arrow(Direction::Right)), &sheet);
        m.handle(InputEvent::Key(Key::Arrow(Direction::Right)), &sheet);
        assert_eq!(m.selection(), &Selection::Cell(addr("C1")));
    }

    #[test]
    fn test_shift_arrow_extends_selection() {
        let (mut m, sheet) = machine();
        m.handle(InputEvent::Click(addr("B2")), &sheet);
        m.handle(InputEvent::Key(Key::ShiftArrow(Direction::Down)), &sheet);
        m.handle(InputEvent::Key(Key::ShiftArrow(Direction::Right)), &sheet);
        assert_eq!(
            m.selection(),
            &Selection::Range(Range::new(addr("B2"), addr("C3")))
        );
        // Plain arrow collapses back to a single cell from the focus
        m.handle(InputEvent::Key(Key::Arrow(Direction::Down)), &sheet);
        assert_eq!(m.selection(), &Selection::Cell(addr("C4")));
    }

    #[test]
    fn test_header_clicks() {
        let (mut m, sheet) = machine();
        m.handle(InputEvent::ColumnHeaderClick(2), &sheet);
        assert_eq!(m.selection(), &Selection::Columns(vec![2]));
        m.handle(InputEvent::RowHeaderClick(4), &sheet);
        assert_eq!(m.selection(), &Selection::Rows(vec![4]));
        m.handle(InputEvent::CornerClick, &sheet);
        assert_eq!(m.selection(), &Selection::All);
    }

    #[test]
    fn test_click_elsewhere_while_editing_commits_first() {
        let (mut m, sheet) = machine();
        m.handle(InputEvent::Click(addr("A1")), &sheet);
        m.handle(InputEvent::Key(Key::Char('1')), &sheet);
        let actions = m.handle(InputEvent::Click(addr("D4")), &sheet);
        assert_eq!(
            actions,
            vec![EditAction::Commit {
                addr: addr("A1"),
                text: "1".into()
            }]
        );
        assert_eq!(m.selection(), &Selection::Cell(addr("D4")));
    }
}
