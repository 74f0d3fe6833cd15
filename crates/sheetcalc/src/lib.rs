//! # sheetcalc
//!
//! A spreadsheet computation core: a bounded grid of cells holding literals
//! or formulas, kept consistent by incremental recalculation.
//!
//! ## Features
//!
//! - A1-style addresses with `$`-fixed axes and rectangular ranges
//! - Formulas with arithmetic, comparison, concatenation and the functions
//!   `SUM, AVERAGE, MAX, MIN, COUNT, MEDIAN, STDEV, IF`
//! - Incremental recalculation over a dependency graph, with reference
//!   cycles reported as `#CIRCULAR!` instead of looping
//! - Copying blocks with relative reference adjustment
//! - Declared cell types (numeric, date) with input validation
//! - Bounded undo/redo and JSON snapshots
//!
//! ## Example
//!
//! ```rust
//! use sheetcalc::prelude::*;
//!
//! let mut sheet = Spreadsheet::new();
//!
//! sheet.edit("A1", "10").unwrap();
//! sheet.edit("A2", "20").unwrap();
//! sheet.edit("A3", "30").unwrap();
//! sheet.edit("A4", "=SUM(A1:A3)").unwrap();
//! assert_eq!(sheet.display("A4").unwrap(), "60");
//!
//! sheet.edit("A1", "15").unwrap();
//! assert_eq!(sheet.display("A4").unwrap(), "65");
//!
//! sheet.edit("B1", "=10/0").unwrap();
//! assert_eq!(sheet.display("B1").unwrap(), "#DIV/0!");
//! ```

pub mod calculation;
pub mod history;
pub mod prelude;
pub mod spreadsheet;
pub mod tools;

pub use calculation::{RecalcEngine, RecalcStats};
pub use history::{HistoryManager, DEFAULT_UNDO_CAPACITY};
pub use spreadsheet::{Spreadsheet, SpreadsheetOptions};
pub use tools::TextTransform;

// Re-export core types
pub use sheetcalc_core::{
    format_number, CellAddress, CellContent, CellData, CellError, CellRange, CellReference,
    CellStore, CellType, CellValue, Error, Result, Snapshot, SnapshotCell, MAX_COLS, MAX_ROWS,
};

// Re-export formula types
pub use sheetcalc_formula::{
    evaluate, parse_formula, precedent_cells, shift_references, CellResolver, DependencyGraph,
    EvaluationContext, FormulaError, FormulaExpr, FormulaResult, FormulaValue,
};
