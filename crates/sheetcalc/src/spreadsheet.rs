//! The spreadsheet facade
//!
//! [`Spreadsheet`] owns the cell store, the recalculation engine and the
//! undo history, and is the only way callers mutate the grid. Every
//! mutating operation records an undo step and runs to completion,
//! recalculation included, before returning.

use crate::calculation::{RecalcEngine, RecalcStats};
use crate::history::{HistoryManager, DEFAULT_UNDO_CAPACITY};
use crate::{
    parse_formula, shift_references, CellAddress, CellContent, CellRange, CellStore, CellType,
    CellValue, Error, Result, Snapshot, MAX_COLS, MAX_ROWS,
};
use tracing::debug;

/// Options for a new spreadsheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpreadsheetOptions {
    /// Initial number of rows (default: 10)
    pub rows: u32,
    /// Initial number of columns (default: 10)
    pub cols: u32,
    /// Maximum number of undo steps kept (default: 50)
    pub undo_capacity: usize,
}

impl Default for SpreadsheetOptions {
    fn default() -> Self {
        Self {
            rows: 10,
            cols: 10,
            undo_capacity: DEFAULT_UNDO_CAPACITY,
        }
    }
}

/// A grid of cells with live formula recalculation
///
/// `Spreadsheet` is `Send` but does no locking of its own; wrap it in a
/// `Mutex` to share it, so each edit and its recalculation form one critical
/// section.
///
/// # Example
///
/// ```rust
/// use sheetcalc::Spreadsheet;
///
/// let mut sheet = Spreadsheet::new();
/// sheet.edit("A1", "10").unwrap();
/// sheet.edit("A2", "20").unwrap();
/// sheet.edit("A3", "=SUM(A1:A2)").unwrap();
/// assert_eq!(sheet.display("A3").unwrap(), "30");
///
/// sheet.edit("A1", "=A3").unwrap();
/// assert_eq!(sheet.display("A1").unwrap(), "#CIRCULAR!");
/// ```
#[derive(Debug)]
pub struct Spreadsheet {
    pub(crate) store: CellStore,
    pub(crate) engine: RecalcEngine,
    pub(crate) history: HistoryManager,
    pub(crate) last_stats: RecalcStats,
}

impl Spreadsheet {
    /// Create an empty 10 x 10 spreadsheet
    pub fn new() -> Self {
        Self::with_options(SpreadsheetOptions::default())
    }

    /// Create an empty spreadsheet with custom options
    pub fn with_options(options: SpreadsheetOptions) -> Self {
        Self {
            store: CellStore::new(options.rows.min(MAX_ROWS), options.cols.min(MAX_COLS)),
            engine: RecalcEngine::new(),
            history: HistoryManager::new(options.undo_capacity),
            last_stats: RecalcStats::default(),
        }
    }

    // === Read access ===

    /// Number of rows
    pub fn rows(&self) -> u32 {
        self.store.row_count()
    }

    /// Number of columns
    pub fn cols(&self) -> u32 {
        self.store.col_count()
    }

    /// The underlying cell store
    pub fn store(&self) -> &CellStore {
        &self.store
    }

    /// The recalculation engine (dependency graph included)
    pub fn engine(&self) -> &RecalcEngine {
        &self.engine
    }

    /// Undo/redo history
    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    /// Statistics of the most recent recalculation
    pub fn last_stats(&self) -> RecalcStats {
        self.last_stats
    }

    /// Rendered value of a cell by address string (e.g., "A1")
    pub fn display(&self, address: &str) -> Result<String> {
        Ok(self.display_at(self.locate(address)?))
    }

    /// Rendered value of a cell: the value, or its error token
    pub fn display_at(&self, addr: CellAddress) -> String {
        self.store.value(addr).to_string()
    }

    /// Computed value of a cell by address string
    pub fn value(&self, address: &str) -> Result<CellValue> {
        Ok(self.store.value(self.locate(address)?))
    }

    /// Raw content of a cell by address string
    pub fn content(&self, address: &str) -> Result<CellContent> {
        Ok(self.store.content(self.locate(address)?))
    }

    /// Declared type of a cell by address string
    pub fn cell_type(&self, address: &str) -> Result<CellType> {
        Ok(self.store.cell_type(self.locate(address)?))
    }

    // === Editing ===

    /// Set a cell's raw text and recompute everything affected
    ///
    /// Formula problems never fail here; they become the cell's error value.
    /// Text rejected by the cell's declared type clears the cell and returns
    /// [`Error::Validation`].
    pub fn edit(&mut self, address: &str, raw: &str) -> Result<()> {
        let addr = self.locate(address)?;
        self.edit_at(addr, raw)
    }

    /// Set a cell's raw text by address
    pub fn edit_at(&mut self, addr: CellAddress, raw: &str) -> Result<()> {
        self.store.check_bounds(addr)?;
        self.record_undo();

        let result = self.write_content(addr, raw);
        self.last_stats = self.engine.on_edit(&mut self.store, addr);
        result
    }

    /// Apply many edits, recomputing once at the end
    ///
    /// Every address is checked before anything changes. Entries rejected by
    /// their cell's declared type are cleared; the first such failure is
    /// returned after the recalculation.
    pub fn bulk_load<I, A, R>(&mut self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (A, R)>,
        A: AsRef<str>,
        R: AsRef<str>,
    {
        let entries = entries
            .into_iter()
            .map(|(address, raw)| Ok((self.locate(address.as_ref())?, raw)))
            .collect::<Result<Vec<_>>>()?;

        self.record_undo();

        let mut first_error = None;
        for (addr, raw) in &entries {
            if let Err(e) = self.write_content(*addr, raw.as_ref()) {
                first_error.get_or_insert(e);
            }
        }

        debug!(entries = entries.len(), "bulk load");
        self.last_stats = self.engine.recalc_all(&mut self.store);
        first_error.map_or(Ok(()), Err)
    }

    /// Declare the type of every cell in a range
    ///
    /// Existing literals are re-read under the new type; text the type does
    /// not accept keeps its untyped reading until edited.
    pub fn set_cell_type(&mut self, range: &str, cell_type: CellType) -> Result<()> {
        let range = self.locate_range(range)?;
        self.record_undo();

        let cells: Vec<CellAddress> = range.cells().collect();
        for &addr in &cells {
            self.store.set_cell_type(addr, cell_type);
        }
        self.last_stats = self.engine.on_edits(&mut self.store, &cells);
        Ok(())
    }

    /// Copy a block of cells so its top-left lands on `target`
    ///
    /// Formulas are relocated by the offset between the two corners; fixed
    /// axes stay and references pushed past row or column 1 become `#REF!`.
    /// Target cells outside the grid are skipped.
    pub fn relocate(&mut self, source: &str, target: &str) -> Result<()> {
        let source = self.locate_range(source)?;
        let target = self.locate(target)?;
        self.record_undo();

        let col_offset = target.col as i64 - source.start.col as i64;
        let row_offset = target.row as i64 - source.start.row as i64;

        // Read the whole block first, so overlapping targets copy the originals
        let block: Vec<(CellAddress, CellContent, CellType)> = source
            .cells()
            .map(|addr| (addr, self.store.content(addr), self.store.cell_type(addr)))
            .collect();

        let mut changed = Vec::with_capacity(block.len());
        for (addr, content, cell_type) in block {
            let dest = match addr.offset(col_offset, row_offset) {
                Some(dest) if self.store.contains(dest) => dest,
                _ => continue,
            };
            let content = relocate_content(&content, col_offset, row_offset);
            self.store.set_content(dest, content);
            self.store.set_cell_type(dest, cell_type);
            changed.push(dest);
        }

        debug!(
            source = %source,
            target = %target,
            cells = changed.len(),
            "relocated block"
        );
        self.last_stats = self.engine.on_edits(&mut self.store, &changed);
        Ok(())
    }

    // === Bounds ===

    /// Grow or shrink the grid
    ///
    /// No address moves. Cells outside the new bounds are dropped; formulas
    /// that named them directly show `#REF!`, ranges over them shrink.
    pub fn resize(&mut self, rows: u32, cols: u32) -> Result<()> {
        if rows == 0 || rows > MAX_ROWS {
            return Err(Error::RowOutOfBounds(rows.to_string(), MAX_ROWS));
        }
        if cols == 0 || cols > MAX_COLS {
            return Err(Error::ColumnOutOfBounds(cols.to_string(), MAX_COLS));
        }
        self.record_undo();

        let dropped = self.store.resize(rows, cols);
        debug!(rows, cols, dropped = dropped.len(), "resized grid");
        self.last_stats = self.engine.recalc_all(&mut self.store);
        Ok(())
    }

    /// Append one row
    pub fn add_row(&mut self) -> Result<()> {
        self.resize(self.rows() + 1, self.cols())
    }

    /// Append one column
    pub fn add_column(&mut self) -> Result<()> {
        self.resize(self.rows(), self.cols() + 1)
    }

    /// Remove the last row; returns `false` if only one row is left
    pub fn delete_last_row(&mut self) -> Result<bool> {
        if self.rows() <= 1 {
            return Ok(false);
        }
        self.resize(self.rows() - 1, self.cols())?;
        Ok(true)
    }

    /// Remove the last column; returns `false` if only one column is left
    pub fn delete_last_column(&mut self) -> Result<bool> {
        if self.cols() <= 1 {
            return Ok(false);
        }
        self.resize(self.rows(), self.cols() - 1)?;
        Ok(true)
    }

    // === Snapshots and history ===

    /// Content, types and bounds of the whole grid
    pub fn snapshot(&self) -> Snapshot {
        self.store.snapshot()
    }

    /// Replace the whole grid with a snapshot and recompute it
    ///
    /// Recorded as an undo step like any other mutation. A snapshot with
    /// impossible bounds or cells outside them fails with
    /// [`Error::InvalidSnapshot`] and leaves the grid alone.
    pub fn restore(&mut self, snapshot: &Snapshot) -> Result<()> {
        snapshot.validate()?;
        self.record_undo();
        self.apply_snapshot(snapshot);
        Ok(())
    }

    /// Step back to the state before the last mutation
    pub fn undo(&mut self) -> bool {
        match self.history.undo(self.store.snapshot()) {
            Some(previous) => {
                self.apply_snapshot(&previous);
                true
            }
            None => false,
        }
    }

    /// Re-apply the last undone mutation
    pub fn redo(&mut self) -> bool {
        match self.history.redo(self.store.snapshot()) {
            Some(next) => {
                self.apply_snapshot(&next);
                true
            }
            None => false,
        }
    }

    // === Internals ===

    pub(crate) fn record_undo(&mut self) {
        self.history.push_undo(self.store.snapshot());
    }

    fn apply_snapshot(&mut self, snapshot: &Snapshot) {
        self.store = CellStore::from_snapshot(snapshot);
        self.last_stats = self.engine.recalc_all(&mut self.store);
    }

    /// Store raw text, enforcing the cell's declared type on literals
    fn write_content(&mut self, addr: CellAddress, raw: &str) -> Result<()> {
        let content = CellContent::from_raw(raw);
        let cell_type = self.store.cell_type(addr);

        if let CellContent::Literal(text) = &content {
            if cell_type.interpret(text).is_none() {
                self.store.set_content(addr, CellContent::empty());
                return Err(Error::Validation {
                    address: addr.to_string(),
                    cell_type: cell_type.name(),
                    text: text.clone(),
                });
            }
        }

        self.store.set_content(addr, content);
        Ok(())
    }

    /// Parse an address and check it lies inside the grid
    pub(crate) fn locate(&self, address: &str) -> Result<CellAddress> {
        let addr = CellAddress::parse(address.trim())?;
        self.store.check_bounds(addr)?;
        Ok(addr)
    }

    /// Parse a range and clip it to the grid
    pub(crate) fn locate_range(&self, range: &str) -> Result<CellRange> {
        let parsed = CellRange::parse(range.trim())?;
        parsed
            .clip(self.rows(), self.cols())
            .ok_or_else(|| Error::OutsideGrid {
                address: parsed.to_string(),
                rows: self.rows(),
                cols: self.cols(),
            })
    }
}

impl Default for Spreadsheet {
    fn default() -> Self {
        Self::new()
    }
}

/// Content as it reads after being copied by the given offset
fn relocate_content(content: &CellContent, col_offset: i64, row_offset: i64) -> CellContent {
    match content.formula_text().map(parse_formula) {
        Some(Ok(ast)) => {
            CellContent::Formula(shift_references(&ast, col_offset, row_offset).to_formula())
        }
        // Literals and unparseable formulas are copied verbatim
        _ => content.clone(),
    }
}
