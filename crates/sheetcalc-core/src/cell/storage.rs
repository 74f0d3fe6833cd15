//! Sparse cell store
//!
//! The single source of truth for grid state: raw content, computed value
//! and declared type per address, plus the grid bounds. Only cells that hold
//! something are stored, using a row-based BTreeMap structure.
//!
//! The store never evaluates anything. Writing content leaves the value
//! untouched; the recalculation engine writes values afterwards.

use std::collections::BTreeMap;

use super::{CellAddress, CellContent, CellRange, CellType, CellValue};
use crate::error::{Error, Result};
use crate::snapshot::{Snapshot, SnapshotCell};
use crate::{MAX_COLS, MAX_ROWS};

/// Complete data for a single cell
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellData {
    /// What the user entered
    pub content: CellContent,
    /// Last computed value
    pub value: CellValue,
    /// Declared type (validation and literal interpretation)
    pub cell_type: CellType,
}

impl CellData {
    /// Create a cell holding the given content
    pub fn new(content: CellContent) -> Self {
        Self {
            content,
            ..Default::default()
        }
    }

    /// Check if this cell is effectively empty (nothing entered, nothing computed, default type)
    pub fn is_empty(&self) -> bool {
        self.content.is_empty() && self.value.is_empty() && self.cell_type == CellType::General
    }
}

/// Sparse row-major storage for grid cells, with grid bounds
///
/// Structure: `BTreeMap<row, BTreeMap<col, CellData>>`. Cells never written
/// read back as empty literal content with an [`CellValue::Empty`] value.
#[derive(Debug, Clone)]
pub struct CellStore {
    /// Row number → column map
    rows: BTreeMap<u32, BTreeMap<u32, CellData>>,
    /// Number of addressable rows
    row_count: u32,
    /// Number of addressable columns
    col_count: u32,
}

impl CellStore {
    /// Create an empty store of `rows` x `cols` (each at least 1)
    pub fn new(rows: u32, cols: u32) -> Self {
        Self {
            rows: BTreeMap::new(),
            row_count: rows.max(1),
            col_count: cols.max(1),
        }
    }

    /// Number of addressable rows
    pub fn row_count(&self) -> u32 {
        self.row_count
    }

    /// Number of addressable columns
    pub fn col_count(&self) -> u32 {
        self.col_count
    }

    /// Grid bounds as (rows, cols)
    pub fn size(&self) -> (u32, u32) {
        (self.row_count, self.col_count)
    }

    /// The whole addressable grid as a range
    pub fn bounds(&self) -> CellRange {
        CellRange::new(
            CellAddress::new(1, 1),
            CellAddress::new(self.row_count, self.col_count),
        )
    }

    /// Check if an address lies inside the grid
    pub fn contains(&self, addr: CellAddress) -> bool {
        addr.is_within(self.row_count, self.col_count)
    }

    /// Fail with [`Error::OutsideGrid`] unless the address is inside the grid
    pub fn check_bounds(&self, addr: CellAddress) -> Result<()> {
        if self.contains(addr) {
            Ok(())
        } else {
            Err(Error::OutsideGrid {
                address: addr.to_string(),
                rows: self.row_count,
                cols: self.col_count,
            })
        }
    }

    /// Get a cell's data, if anything is stored there
    pub fn get(&self, addr: CellAddress) -> Option<&CellData> {
        self.rows.get(&addr.row).and_then(|r| r.get(&addr.col))
    }

    fn get_mut(&mut self, addr: CellAddress) -> Option<&mut CellData> {
        self.rows.get_mut(&addr.row).and_then(|r| r.get_mut(&addr.col))
    }

    fn entry(&mut self, addr: CellAddress) -> &mut CellData {
        self.rows
            .entry(addr.row)
            .or_default()
            .entry(addr.col)
            .or_default()
    }

    /// Drop the cell if it no longer holds anything
    fn prune(&mut self, addr: CellAddress) {
        if let Some(row_map) = self.rows.get_mut(&addr.row) {
            if row_map.get(&addr.col).map_or(false, CellData::is_empty) {
                row_map.remove(&addr.col);
            }
            if row_map.is_empty() {
                self.rows.remove(&addr.row);
            }
        }
    }

    /// Raw content of a cell
    pub fn content(&self, addr: CellAddress) -> CellContent {
        self.get(addr).map(|c| c.content.clone()).unwrap_or_default()
    }

    /// Replace a cell's content without evaluating it
    pub fn set_content(&mut self, addr: CellAddress, content: CellContent) {
        self.entry(addr).content = content;
        self.prune(addr);
    }

    /// Computed value of a cell
    pub fn value(&self, addr: CellAddress) -> CellValue {
        self.get(addr).map(|c| c.value.clone()).unwrap_or_default()
    }

    /// Store a computed value
    pub fn set_value(&mut self, addr: CellAddress, value: CellValue) {
        if let Some(cell) = self.get_mut(addr) {
            cell.value = value;
            self.prune(addr);
        } else if !value.is_empty() {
            self.entry(addr).value = value;
        }
    }

    /// Declared type of a cell
    pub fn cell_type(&self, addr: CellAddress) -> CellType {
        self.get(addr).map(|c| c.cell_type).unwrap_or_default()
    }

    /// Declare a cell's type
    pub fn set_cell_type(&mut self, addr: CellAddress, cell_type: CellType) {
        self.entry(addr).cell_type = cell_type;
        self.prune(addr);
    }

    /// Remove a cell entirely
    pub fn remove(&mut self, addr: CellAddress) -> Option<CellData> {
        let result = self.rows.get_mut(&addr.row).and_then(|r| r.remove(&addr.col));
        if self.rows.get(&addr.row).map_or(false, BTreeMap::is_empty) {
            self.rows.remove(&addr.row);
        }
        result
    }

    /// Change the grid bounds
    ///
    /// No address moves. Cells that fall outside the new bounds are dropped
    /// and their addresses returned.
    pub fn resize(&mut self, rows: u32, cols: u32) -> Vec<CellAddress> {
        self.row_count = rows.max(1);
        self.col_count = cols.max(1);

        let dropped: Vec<CellAddress> = self
            .iter()
            .map(|(addr, _)| addr)
            .filter(|addr| !addr.is_within(self.row_count, self.col_count))
            .collect();
        for addr in &dropped {
            self.remove(*addr);
        }
        dropped
    }

    /// Remove every cell, keeping bounds
    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// Get the number of stored cells
    pub fn cell_count(&self) -> usize {
        self.rows.values().map(|r| r.len()).sum()
    }

    /// Check if nothing is stored
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate over all stored cells in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (CellAddress, &CellData)> {
        self.rows.iter().flat_map(|(&row, cols)| {
            cols.iter()
                .map(move |(&col, data)| (CellAddress { row, col }, data))
        })
    }

    /// Iterate over cells holding formulas, with their formula text
    pub fn formula_cells(&self) -> impl Iterator<Item = (CellAddress, &str)> {
        self.iter()
            .filter_map(|(addr, data)| data.content.formula_text().map(|f| (addr, f)))
    }

    /// Capture content, types and bounds (never values)
    pub fn snapshot(&self) -> Snapshot {
        let cells = self
            .iter()
            .filter(|(_, data)| !data.content.is_empty() || data.cell_type != CellType::General)
            .map(|(address, data)| SnapshotCell {
                address,
                content: data.content.clone(),
                cell_type: data.cell_type,
            })
            .collect();
        Snapshot {
            rows: self.row_count,
            cols: self.col_count,
            cells,
        }
    }

    /// Build a store from a snapshot; all values start out empty
    ///
    /// Bounds are clamped to the addressable limits and cells outside them
    /// are dropped. [`Snapshot::validate`] reports such snapshots as errors.
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let mut store = Self::new(
            snapshot.rows.clamp(1, MAX_ROWS),
            snapshot.cols.clamp(1, MAX_COLS),
        );
        for cell in &snapshot.cells {
            if !store.contains(cell.address) {
                continue;
            }
            let data = store.entry(cell.address);
            data.content = cell.content.clone();
            data.cell_type = cell.cell_type;
            store.prune(cell.address);
        }
        store
    }
}

impl Default for CellStore {
    fn default() -> Self {
        Self::new(10, 10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn addr(s: &str) -> CellAddress {
        CellAddress::parse(s).unwrap()
    }

    #[test]
    fn test_unwritten_cells_read_blank() {
        let store = CellStore::new(5, 5);
        assert_eq!(store.content(addr("C3")), CellContent::empty());
        assert_eq!(store.value(addr("C3")), CellValue::Empty);
        assert!(store.is_empty());
    }

    #[test]
    fn test_set_content_does_not_evaluate() {
        let mut store = CellStore::new(5, 5);
        store.set_content(addr("A1"), CellContent::from_raw("42"));

        assert_eq!(store.content(addr("A1")), CellContent::Literal("42".into()));
        assert_eq!(store.value(addr("A1")), CellValue::Empty);
    }

    #[test]
    fn test_empty_cells_not_stored() {
        let mut store = CellStore::new(5, 5);
        store.set_content(addr("A1"), CellContent::from_raw("x"));
        store.set_value(addr("A1"), CellValue::text("x"));
        assert_eq!(store.cell_count(), 1);

        store.set_content(addr("A1"), CellContent::empty());
        store.set_value(addr("A1"), CellValue::Empty);
        assert_eq!(store.cell_count(), 0);
    }

    #[test]
    fn test_resize_drops_out_of_bounds_cells() {
        let mut store = CellStore::new(5, 5);
        store.set_content(addr("A1"), CellContent::from_raw("1"));
        store.set_content(addr("E5"), CellContent::from_raw("2"));
        store.set_content(addr("B4"), CellContent::from_raw("3"));

        let dropped = store.resize(3, 5);
        assert_eq!(dropped, vec![addr("B4"), addr("E5")]);
        assert_eq!(store.row_count(), 3);
        assert!(!store.contains(addr("A4")));
        assert!(store.contains(addr("E3")));
    }

    #[test]
    fn test_formula_cells() {
        let mut store = CellStore::new(5, 5);
        store.set_content(addr("A1"), CellContent::from_raw("10"));
        store.set_content(addr("B1"), CellContent::from_raw("=A1*2"));

        let formulas: Vec<_> = store.formula_cells().collect();
        assert_eq!(formulas, vec![(addr("B1"), "=A1*2")]);
    }

    #[test]
    fn test_snapshot_keeps_content_not_values() {
        let mut store = CellStore::new(4, 4);
        store.set_content(addr("A1"), CellContent::from_raw("=1+1"));
        store.set_value(addr("A1"), CellValue::Number(2.0));
        store.set_cell_type(addr("B2"), CellType::Numeric);

        let snapshot = store.snapshot();
        assert_eq!(snapshot.cells.len(), 2);

        let restored = CellStore::from_snapshot(&snapshot);
        assert_eq!(restored.content(addr("A1")), CellContent::Formula("=1+1".into()));
        assert_eq!(restored.value(addr("A1")), CellValue::Empty);
        assert_eq!(restored.cell_type(addr("B2")), CellType::Numeric);
    }
}
