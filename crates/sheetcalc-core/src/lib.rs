//! # sheetcalc-core
//!
//! Core data structures for the sheetcalc spreadsheet engine.
//!
//! This crate provides the fundamental types used throughout sheetcalc:
//! - [`CellAddress`], [`CellReference`] and [`CellRange`] - Cell addressing
//! - [`CellContent`] and [`CellValue`] - Raw input and computed results
//! - [`CellStore`] - The grid itself
//! - [`Snapshot`] - Content-only copies of the grid for undo and persistence
//!
//! ## Example
//!
//! ```rust
//! use sheetcalc_core::{CellAddress, CellContent, CellStore};
//!
//! let mut store = CellStore::new(10, 10);
//! let a1 = CellAddress::parse("A1").unwrap();
//! store.set_content(a1, CellContent::from_raw("=B1+1"));
//! assert!(store.content(a1).is_formula());
//! ```

pub mod cell;
pub mod error;
pub mod snapshot;

pub use cell::{
    format_number, parse_number, CellAddress, CellContent, CellData, CellError, CellRange,
    CellRangeIterator, CellReference, CellStore, CellType, CellValue,
};
pub use error::{Error, Result};
pub use snapshot::{Snapshot, SnapshotCell};

/// Maximum number of rows any grid can address
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns any grid can address
pub const MAX_COLS: u32 = 16_384;
