//! Range text tools
//!
//! Bulk rewrites of raw cell contents over a rectangular range. Each tool is
//! one undo step followed by one recalculation of the cells it changed.

use crate::spreadsheet::Spreadsheet;
use crate::{CellAddress, CellContent, Error, Result};
use regex::Regex;
use std::collections::HashSet;
use tracing::debug;

/// Text rewrite applied to literal cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextTransform {
    /// Strip leading and trailing whitespace
    Trim,
    /// Convert to upper case
    Upper,
    /// Convert to lower case
    Lower,
}

impl TextTransform {
    /// Parse a transform name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "TRIM" => Some(TextTransform::Trim),
            "UPPER" => Some(TextTransform::Upper),
            "LOWER" => Some(TextTransform::Lower),
            _ => None,
        }
    }

    fn apply(&self, text: &str) -> String {
        match self {
            TextTransform::Trim => text.trim().to_string(),
            TextTransform::Upper => text.to_uppercase(),
            TextTransform::Lower => text.to_lowercase(),
        }
    }
}

impl Spreadsheet {
    /// Rewrite every literal in a range; formulas are left alone
    ///
    /// Returns the number of cells whose content changed.
    pub fn apply_text_transform(&mut self, range: &str, transform: TextTransform) -> Result<usize> {
        let range = self.locate_range(range)?;
        self.record_undo();

        let mut changed = Vec::new();
        for addr in range.cells() {
            if let CellContent::Literal(text) = self.store.content(addr) {
                let rewritten = transform.apply(&text);
                if rewritten != text {
                    self.store.set_content(addr, CellContent::from_raw(rewritten));
                    changed.push(addr);
                }
            }
        }

        self.finish_tool("text transform", &changed);
        Ok(changed.len())
    }

    /// Drop repeated rows inside a range
    ///
    /// Rows are compared by their raw contents. The first occurrence of each
    /// row is kept, survivors move up to the top of the range in their
    /// original order, and the freed rows at the bottom are blanked. Returns
    /// the number of rows removed.
    pub fn remove_duplicate_rows(&mut self, range: &str) -> Result<usize> {
        let range = self.locate_range(range)?;
        self.record_undo();

        let rows: Vec<Vec<CellContent>> = (range.start.row..=range.end.row)
            .map(|row| {
                (range.start.col..=range.end.col)
                    .map(|col| self.store.content(CellAddress::new(row, col)))
                    .collect()
            })
            .collect();

        let mut seen: HashSet<Vec<String>> = HashSet::new();
        let unique: Vec<&Vec<CellContent>> = rows
            .iter()
            .filter(|row| seen.insert(row.iter().map(|c| c.raw().to_string()).collect()))
            .collect();
        let removed = rows.len() - unique.len();

        let mut changed = Vec::new();
        for (i, row) in (range.start.row..=range.end.row).enumerate() {
            for (j, col) in (range.start.col..=range.end.col).enumerate() {
                let addr = CellAddress::new(row, col);
                let content = unique
                    .get(i)
                    .map(|cells| cells[j].clone())
                    .unwrap_or_default();
                if content != rows[i][j] {
                    self.store.set_content(addr, content);
                    changed.push(addr);
                }
            }
        }

        self.finish_tool("remove duplicates", &changed);
        Ok(removed)
    }

    /// Regex replace-all over the raw contents of a range
    ///
    /// Formulas are rewritten as text too, so a replacement may change what a
    /// formula references. Returns the number of cells changed.
    pub fn find_replace(
        &mut self,
        range: &str,
        pattern: &str,
        replacement: &str,
    ) -> Result<usize> {
        let range = self.locate_range(range)?;
        let regex = Regex::new(pattern).map_err(|e| Error::InvalidPattern(e.to_string()))?;
        self.record_undo();

        let mut changed = Vec::new();
        for addr in range.cells() {
            let content = self.store.content(addr);
            if content.is_empty() {
                continue;
            }
            let raw = content.raw();
            let replaced = regex.replace_all(raw, replacement);
            if replaced != raw {
                self.store.set_content(addr, CellContent::from_raw(replaced));
                changed.push(addr);
            }
        }

        self.finish_tool("find/replace", &changed);
        Ok(changed.len())
    }

    fn finish_tool(&mut self, tool: &str, changed: &[CellAddress]) {
        debug!(tool, cells = changed.len(), "range tool applied");
        self.last_stats = self.engine.on_edits(&mut self.store, changed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sheet_with(cells: &[(&str, &str)]) -> Spreadsheet {
        let mut sheet = Spreadsheet::new();
        sheet.bulk_load(cells.iter().copied()).unwrap();
        sheet
    }

    #[test]
    fn test_text_transforms_skip_formulas() {
        let mut sheet = sheet_with(&[("A1", "  hello "), ("A2", "World"), ("A3", "=A2")]);

        assert_eq!(
            sheet.apply_text_transform("A1:A3", TextTransform::Trim).unwrap(),
            1
        );
        assert_eq!(sheet.display("A1").unwrap(), "hello");

        sheet
            .apply_text_transform("A1:A3", TextTransform::Upper)
            .unwrap();
        assert_eq!(sheet.display("A1").unwrap(), "HELLO");
        assert_eq!(sheet.content("A3").unwrap().raw(), "=A2");
        assert_eq!(sheet.display("A3").unwrap(), "WORLD");

        sheet
            .apply_text_transform("A1:A3", TextTransform::Lower)
            .unwrap();
        assert_eq!(sheet.display("A3").unwrap(), "world");
    }

    #[test]
    fn test_transform_names() {
        assert_eq!(TextTransform::from_name("trim"), Some(TextTransform::Trim));
        assert_eq!(TextTransform::from_name("Upper"), Some(TextTransform::Upper));
        assert_eq!(TextTransform::from_name("title"), None);
    }

    #[test]
    fn test_remove_duplicate_rows() {
        let mut sheet = sheet_with(&[
            ("A1", "x"),
            ("B1", "1"),
            ("A2", "y"),
            ("B2", "2"),
            ("A3", "x"),
            ("B3", "1"),
            ("A4", "z"),
            ("B4", "3"),
            ("C1", "=SUM(B1:B4)"),
        ]);
        assert_eq!(sheet.display("C1").unwrap(), "7");

        assert_eq!(sheet.remove_duplicate_rows("A1:B4").unwrap(), 1);
        assert_eq!(sheet.display("A3").unwrap(), "z");
        assert_eq!(sheet.display("B3").unwrap(), "3");
        assert_eq!(sheet.display("A4").unwrap(), "");
        assert_eq!(sheet.display("C1").unwrap(), "6");

        assert!(sheet.undo());
        assert_eq!(sheet.display("C1").unwrap(), "7");
    }

    #[test]
    fn test_find_replace() {
        let mut sheet = sheet_with(&[
            ("A1", "cat"),
            ("A2", "concat"),
            ("A3", "dog"),
            ("B1", "=A1"),
        ]);

        assert_eq!(sheet.find_replace("A1:A3", "cat$", "bird").unwrap(), 2);
        assert_eq!(sheet.display("A2").unwrap(), "conbird");
        assert_eq!(sheet.display("B1").unwrap(), "bird");
        assert_eq!(sheet.history().undo_len(), 2);
    }

    #[test]
    fn test_find_replace_rewrites_formulas() {
        let mut sheet = sheet_with(&[("A1", "1"), ("A2", "2"), ("B1", "=A1*10")]);
        sheet.find_replace("B1", "A1", "A2").unwrap();
        assert_eq!(sheet.display("B1").unwrap(), "20");

        sheet.edit("A2", "3").unwrap();
        assert_eq!(sheet.display("B1").unwrap(), "30");
    }

    #[test]
    fn test_find_replace_invalid_pattern() {
        let mut sheet = sheet_with(&[("A1", "x")]);
        assert!(matches!(
            sheet.find_replace("A1", "(", "y"),
            Err(Error::InvalidPattern(_))
        ));
        assert_eq!(sheet.history().undo_len(), 1);
    }
}
