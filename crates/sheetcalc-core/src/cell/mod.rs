//! Cell-related types and utilities
//!
//! This module contains:
//! - [`CellAddress`], [`CellReference`] and [`CellRange`] - cell locations
//! - [`CellContent`] - what a user typed into a cell
//! - [`CellValue`] and [`CellError`] - what a cell computes to
//! - [`CellStore`] - sparse storage for the whole grid

mod address;
mod storage;
mod value;

pub use address::{CellAddress, CellRange, CellRangeIterator, CellReference};
pub use storage::{CellData, CellStore};
pub use value::{format_number, parse_number, CellContent, CellError, CellType, CellValue};
