//! Grid snapshots
//!
//! A snapshot is an immutable copy of everything a user entered: content,
//! declared types and grid bounds. Computed values are deliberately absent;
//! restoring a snapshot always goes through a full recalculation.

use serde::{Deserialize, Serialize};

use crate::cell::{CellAddress, CellContent, CellType};
use crate::error::{Error, Result};
use crate::{MAX_COLS, MAX_ROWS};

/// One stored cell inside a [`Snapshot`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotCell {
    pub address: CellAddress,
    pub content: CellContent,
    #[serde(default)]
    pub cell_type: CellType,
}

/// Full grid content at one point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Number of rows
    pub rows: u32,
    /// Number of columns
    pub cols: u32,
    /// Non-empty cells in row-major order
    pub cells: Vec<SnapshotCell>,
}

impl Snapshot {
    /// Encode as an opaque JSON blob for an external storage collaborator
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode a blob produced by [`Snapshot::to_json`]
    ///
    /// Well-formed JSON describing an impossible grid is rejected too.
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: Self = serde_json::from_str(json)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Check bounds and that every cell lies inside them
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_ROWS).contains(&self.rows) {
            return Err(Error::InvalidSnapshot(format!(
                "row count {} not in 1..={}",
                self.rows, MAX_ROWS
            )));
        }
        if !(1..=MAX_COLS).contains(&self.cols) {
            return Err(Error::InvalidSnapshot(format!(
                "column count {} not in 1..={}",
                self.cols, MAX_COLS
            )));
        }
        match self
            .cells
            .iter()
            .find(|cell| !cell.address.is_within(self.rows, self.cols))
        {
            Some(cell) => Err(Error::InvalidSnapshot(format!(
                "cell at row {} column {} is outside {} x {}",
                cell.address.row, cell.address.col, self.rows, self.cols
            ))),
            None => Ok(()),
        }
    }
}
