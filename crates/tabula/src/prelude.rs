//! Commonly used types, re-exported for hosts

pub use crate::engine::{CommitOutcome, SheetEngine};
pub use tabula_chart::ChartRow;
pub use tabula_core::{
    Address, Cell, ErrorKind, MergeRegion, Range, Sheet, SheetEvent, Style, Value,
};
pub use tabula_grid::{
    Direction, GridLayout, InputEvent, Key, ScrollOffset, Selection, ViewportSize,
};
