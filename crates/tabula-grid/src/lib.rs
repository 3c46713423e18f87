//! Grid interaction and layout for tabula
//!
//! Two pure models the rendering host drives:
//!
//! - [`SelectionMachine`] turns pointer and keyboard events into selection
//!   state and commit actions, without touching the sheet.
//! - [`GridLayout`] maps scroll position and viewport size to the window of
//!   rows and columns worth rendering, with per-track size overrides and
//!   merge-aware cell rectangles.

pub mod selection;
pub mod viewport;

pub use selection::{Direction, EditAction, InputEvent, Key, Selection, SelectionMachine};
pub use viewport::{
    Axis, CellRect, GridLayout, GridWindow, ScrollOffset, ViewportSize, Window,
    DEFAULT_COL_WIDTH, DEFAULT_OVERSCAN, DEFAULT_ROW_HEIGHT,
};
