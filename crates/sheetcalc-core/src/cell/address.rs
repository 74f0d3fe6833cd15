//! Cell address, reference and range types

use crate::error::{Error, Result};
use crate::{MAX_COLS, MAX_ROWS};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A cell address (e.g., "A1", "C20")
///
/// Both coordinates are 1-based, matching A1 notation: column 1 is `A`,
/// row 1 is the first row. Ordering is row-major.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellAddress {
    /// Row number (1-based)
    pub row: u32,
    /// Column number (1-based, A=1, B=2, ..., Z=26, AA=27)
    pub col: u32,
}

impl CellAddress {
    /// Create a new cell address from 1-based row and column numbers
    ///
    /// Zero coordinates are clamped to 1 so the `>= 1` invariant always holds.
    pub fn new(row: u32, col: u32) -> Self {
        Self {
            row: row.max(1),
            col: col.max(1),
        }
    }

    /// Parse a cell address from A1-style notation
    ///
    /// Absolute markers (`$`) are accepted and discarded.
    ///
    /// # Examples
    /// ```
    /// use sheetcalc_core::CellAddress;
    ///
    /// let addr = CellAddress::parse("B3").unwrap();
    /// assert_eq!(addr.col, 2);
    /// assert_eq!(addr.row, 3);
    ///
    /// let addr = CellAddress::parse("$AA$10").unwrap();
    /// assert_eq!(addr.col, 27);
    /// assert_eq!(addr.row, 10);
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        CellReference::parse(s).map(|r| r.address)
    }

    /// Convert a 1-based column number to letters (1 = A, 26 = Z, 27 = AA, etc.)
    pub fn column_to_letters(col: u32) -> String {
        let mut result = String::new();
        let mut n = col;

        while n > 0 {
            n -= 1;
            let c = ((n % 26) as u8 + b'A') as char;
            result.insert(0, c);
            n /= 26;
        }

        result
    }

    /// Convert column letters to a 1-based column number (A = 1, Z = 26, AA = 27, etc.)
    pub fn letters_to_column(letters: &str) -> Result<u32> {
        if letters.is_empty() {
            return Err(Error::InvalidAddress("empty column letters".into()));
        }

        let mut col: u64 = 0;
        for c in letters.chars() {
            if !c.is_ascii_alphabetic() {
                return Err(Error::InvalidAddress(format!(
                    "invalid column letter '{}'",
                    c
                )));
            }
            col = col * 26 + (c.to_ascii_uppercase() as u64 - 'A' as u64 + 1);
            if col > MAX_COLS as u64 {
                return Err(Error::ColumnOutOfBounds(letters.to_uppercase(), MAX_COLS));
            }
        }

        Ok(col as u32)
    }

    /// Translate by a column/row offset, returning `None` if either
    /// coordinate would drop below 1 or exceed the addressable limits
    pub fn offset(&self, col_offset: i64, row_offset: i64) -> Option<CellAddress> {
        let col = self.col as i64 + col_offset;
        let row = self.row as i64 + row_offset;
        if col < 1 || row < 1 || col > MAX_COLS as i64 || row > MAX_ROWS as i64 {
            return None;
        }
        Some(CellAddress {
            row: row as u32,
            col: col as u32,
        })
    }

    /// Whether this address lies inside a grid of `rows` x `cols`
    pub fn is_within(&self, rows: u32, cols: u32) -> bool {
        self.row >= 1 && self.col >= 1 && self.row <= rows && self.col <= cols
    }

    /// Format as A1-style string
    pub fn to_a1_string(&self) -> String {
        format!("{}{}", Self::column_to_letters(self.col), self.row)
    }

    /// Create a range from this address to another
    pub fn to(&self, other: CellAddress) -> CellRange {
        CellRange::new(*self, other)
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1_string())
    }
}

impl FromStr for CellAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// A cell address as written inside a formula, with its fixed-axis markers
///
/// `$A1` fixes the column, `A$1` fixes the row. Fixedness only matters when a
/// formula is relocated; evaluation reads `address` and ignores the flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellReference {
    pub address: CellAddress,
    /// Whether the column reference is fixed (`$A1`)
    pub col_fixed: bool,
    /// Whether the row reference is fixed (`A$1`)
    pub row_fixed: bool,
}

impl CellReference {
    /// A reference with both axes relative
    pub fn relative(address: CellAddress) -> Self {
        Self {
            address,
            col_fixed: false,
            row_fixed: false,
        }
    }

    /// A reference with both axes fixed (`$A$1`)
    pub fn fixed(address: CellAddress) -> Self {
        Self {
            address,
            col_fixed: true,
            row_fixed: true,
        }
    }

    /// Parse a `[$]LETTERS[$]DIGITS` reference token
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::InvalidAddress("empty address".into()));
        }

        let bytes = s.as_bytes();
        let mut pos = 0;

        let col_fixed = if bytes.get(pos) == Some(&b'$') {
            pos += 1;
            true
        } else {
            false
        };

        let col_start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_alphabetic() {
            pos += 1;
        }

        if pos == col_start {
            return Err(Error::InvalidAddress(format!(
                "no column letters in '{}'",
                s
            )));
        }

        let col = CellAddress::letters_to_column(&s[col_start..pos])?;

        let row_fixed = if bytes.get(pos) == Some(&b'$') {
            pos += 1;
            true
        } else {
            false
        };

        let row_str = &s[pos..];
        if row_str.is_empty() {
            return Err(Error::InvalidAddress(format!("no row number in '{}'", s)));
        }
        if !row_str.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidAddress(format!(
                "invalid row number in '{}'",
                s
            )));
        }

        let row: u32 = row_str
            .parse()
            .map_err(|_| Error::RowOutOfBounds(row_str.to_string(), MAX_ROWS))?;

        if row == 0 {
            return Err(Error::InvalidAddress(format!(
                "row number must be >= 1 in '{}'",
                s
            )));
        }

        if row > MAX_ROWS {
            return Err(Error::RowOutOfBounds(row.to_string(), MAX_ROWS));
        }

        Ok(Self {
            address: CellAddress { row, col },
            col_fixed,
            row_fixed,
        })
    }

    /// Relocate by an offset, leaving fixed axes untouched
    ///
    /// Returns `None` when a relative axis would move below 1 (or past the
    /// addressable limit); callers turn that into a `#REF!`.
    pub fn shift(&self, col_offset: i64, row_offset: i64) -> Option<CellReference> {
        let dc = if self.col_fixed { 0 } else { col_offset };
        let dr = if self.row_fixed { 0 } else { row_offset };
        self.address.offset(dc, dr).map(|address| CellReference {
            address,
            col_fixed: self.col_fixed,
            row_fixed: self.row_fixed,
        })
    }

    /// Format with `$` markers as originally written
    pub fn to_a1_string(&self) -> String {
        let mut result = String::new();
        if self.col_fixed {
            result.push('$');
        }
        result.push_str(&CellAddress::column_to_letters(self.address.col));
        if self.row_fixed {
            result.push('$');
        }
        result.push_str(&self.address.row.to_string());
        result
    }
}

impl fmt::Display for CellReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1_string())
    }
}

/// A rectangular range of cells (e.g., "A1:B10")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRange {
    /// Start address (top-left)
    pub start: CellAddress,
    /// End address (bottom-right)
    pub end: CellAddress,
}

impl CellRange {
    /// Create a new cell range, normalized so `start` is the top-left corner
    pub fn new(start: CellAddress, end: CellAddress) -> Self {
        Self {
            start: CellAddress {
                row: start.row.min(end.row),
                col: start.col.min(end.col),
            },
            end: CellAddress {
                row: start.row.max(end.row),
                col: start.col.max(end.col),
            },
        }
    }

    /// Create a single-cell range
    pub fn single(addr: CellAddress) -> Self {
        Self {
            start: addr,
            end: addr,
        }
    }

    /// Parse a range from A1:B10 notation (a bare address is a single-cell range)
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();

        if let Some(colon_pos) = s.find(':') {
            let start = CellAddress::parse(&s[..colon_pos])?;
            let end = CellAddress::parse(&s[colon_pos + 1..])?;
            Ok(Self::new(start, end))
        } else {
            let addr = CellAddress::parse(s)
                .map_err(|_| Error::InvalidRange(s.to_string()))?;
            Ok(Self::single(addr))
        }
    }

    /// Check if a cell is within this range
    pub fn contains(&self, addr: &CellAddress) -> bool {
        addr.row >= self.start.row
            && addr.row <= self.end.row
            && addr.col >= self.start.col
            && addr.col <= self.end.col
    }

    /// Get the number of rows in the range
    pub fn row_count(&self) -> u32 {
        self.end.row - self.start.row + 1
    }

    /// Get the number of columns in the range
    pub fn col_count(&self) -> u32 {
        self.end.col - self.start.col + 1
    }

    /// Get the total number of cells in the range
    pub fn cell_count(&self) -> u64 {
        self.row_count() as u64 * self.col_count() as u64
    }

    /// Shrink the range to a grid of `rows` x `cols`
    ///
    /// Returns `None` if nothing of the range is left inside the grid.
    pub fn clip(&self, rows: u32, cols: u32) -> Option<CellRange> {
        if self.start.row > rows || self.start.col > cols {
            return None;
        }
        Some(CellRange {
            start: self.start,
            end: CellAddress {
                row: self.end.row.min(rows),
                col: self.end.col.min(cols),
            },
        })
    }

    /// Iterate over all cell addresses in the range (row by row)
    pub fn cells(&self) -> CellRangeIterator {
        CellRangeIterator {
            range: *self,
            current_row: self.start.row,
            current_col: self.start.col,
        }
    }

    /// Format as A1:B10 string
    pub fn to_a1_string(&self) -> String {
        if self.start == self.end {
            self.start.to_a1_string()
        } else {
            format!("{}:{}", self.start.to_a1_string(), self.end.to_a1_string())
        }
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1_string())
    }
}

impl FromStr for CellRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Iterator over cells in a range
pub struct CellRangeIterator {
    range: CellRange,
    current_row: u32,
    current_col: u32,
}

impl Iterator for CellRangeIterator {
    type Item = CellAddress;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_row > self.range.end.row {
            return None;
        }

        let addr = CellAddress {
            row: self.current_row,
            col: self.current_col,
        };

        self.current_col += 1;
        if self.current_col > self.range.end.col {
            self.current_col = self.range.start.col;
            self.current_row += 1;
        }

        Some(addr)
    }
}
