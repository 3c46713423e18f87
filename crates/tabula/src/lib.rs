//! Embedded spreadsheet engine with a virtualized grid model
//!
//! Glues the engine crates together behind one facade:
//!
//! - [`tabula_core`] — addresses, cells, the sparse sheet store
//! - [`tabula_formula`] — formula parsing, dependencies, recalculation
//! - [`tabula_grid`] — selection state machine and virtualized layout
//! - [`tabula_csv`] — CSV import and export
//! - [`tabula_chart`] — chart data extraction
//!
//! Hosts construct a [`SheetEngine`] per sheet, feed it input events, and
//! subscribe to change notifications; the sheet itself is read-only from
//! outside.
//!
//! # Example
//!
//! ```
//! use tabula::prelude::*;
//!
//! let mut engine = SheetEngine::default();
//! engine.handle(InputEvent::Click(Address::parse("A1")?))?;
//! engine.handle(InputEvent::Key(Key::Char('5')))?;
//! engine.handle(InputEvent::Key(Key::Enter))?;
//!
//! assert_eq!(engine.sheet().get(Address::parse("A1")?).unwrap().raw, "5");
//! # Ok::<(), tabula_core::Error>(())
//! ```

pub mod engine;
pub mod prelude;

pub use engine::{CommitOutcome, Observer, SheetEngine};

pub use tabula_chart as chart;
pub use tabula_core as core;
pub use tabula_csv as csv;
pub use tabula_formula as formula;
pub use tabula_grid as grid;
