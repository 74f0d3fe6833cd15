//! Error types for sheetcalc-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in sheetcalc-core
///
/// These are API-level failures. Problems inside formulas never surface here;
/// they become a cell's [`CellError`](crate::CellError) value instead.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid cell address format
    #[error("Invalid cell address: {0}")]
    InvalidAddress(String),

    /// Invalid cell range format
    #[error("Invalid cell range: {0}")]
    InvalidRange(String),

    /// Row number beyond the addressable limit
    #[error("Row {0} out of bounds (max: {1})")]
    RowOutOfBounds(String, u32),

    /// Column beyond the addressable limit
    #[error("Column {0} out of bounds (max: {1})")]
    ColumnOutOfBounds(String, u32),

    /// Address outside the current grid bounds
    #[error("Cell {address} is outside the grid ({rows} rows x {cols} columns)")]
    OutsideGrid {
        address: String,
        rows: u32,
        cols: u32,
    },

    /// Literal rejected by the cell's declared type
    #[error("Invalid value for {cell_type} cell {address}: '{text}'")]
    Validation {
        address: String,
        cell_type: &'static str,
        text: String,
    },

    /// Invalid search pattern
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    /// Snapshot blob could not be encoded or decoded
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),

    /// Snapshot decoded but describes an impossible grid
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a new "other" error with a message
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }
}
