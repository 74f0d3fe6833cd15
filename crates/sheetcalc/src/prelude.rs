//! Prelude module - common imports for sheetcalc users
//!
//! ```rust
//! use sheetcalc::prelude::*;
//! ```

pub use crate::{
    // Addressing
    CellAddress,
    CellRange,
    // Cell types
    CellContent,
    CellError,
    CellType,
    CellValue,
    // Error types
    Error,
    Result,
    // Grid limits
    MAX_COLS,
    MAX_ROWS,
    // Persistence
    Snapshot,
    // Main types
    Spreadsheet,
    SpreadsheetOptions,
    TextTransform,
};
