//! Tests for relocation, resizing, typed cells and range tools

use pretty_assertions::assert_eq;
use sheetcalc::prelude::*;

fn sheet_with(cells: &[(&str, &str)]) -> Spreadsheet {
    let mut sheet = Spreadsheet::new();
    sheet.bulk_load(cells.iter().copied()).unwrap();
    sheet
}

/// Test that copied formulas keep pointing at the same relative cells
#[test]
fn test_relocation_offset_law() {
    let mut sheet = sheet_with(&[
        ("A1", "1"),
        ("A2", "2"),
        ("A3", "3"),
        ("B1", "=A1*2"),
        ("C1", "=SUM(A1:A3)"),
    ]);

    sheet.relocate("B1:C1", "B2").unwrap();
    assert_eq!(sheet.content("B2").unwrap().raw(), "=A2*2");
    assert_eq!(sheet.content("C2").unwrap().raw(), "=SUM(A2:A4)");
    assert_eq!(sheet.display("B2").unwrap(), "4");
    assert_eq!(sheet.display("C2").unwrap(), "5");

    // The copy is live
    sheet.edit("A4", "10").unwrap();
    assert_eq!(sheet.display("C2").unwrap(), "15");
}

/// Test that fixed axes survive relocation
#[test]
fn test_relocation_respects_fixed_axes() {
    let mut sheet = sheet_with(&[("A1", "100"), ("B1", "=$A$1+A$1+$A1")]);

    sheet.relocate("B1", "D3").unwrap();
    assert_eq!(sheet.content("D3").unwrap().raw(), "=$A$1+C$1+$A3");
    assert_eq!(sheet.display("D3").unwrap(), "100");
}

/// Test that moving references before the first row or column yields #REF!
#[test]
fn test_relocation_past_origin() {
    let mut sheet = sheet_with(&[("A1", "1"), ("B2", "=A1"), ("C2", "=SUM(A1:B1)")]);

    sheet.relocate("B2:C2", "A2").unwrap();
    assert_eq!(sheet.content("A2").unwrap().raw(), "=#REF!");
    assert_eq!(sheet.display("A2").unwrap(), "#REF!");
    assert_eq!(sheet.content("B2").unwrap().raw(), "=SUM(#REF!)");
    assert_eq!(sheet.display("B2").unwrap(), "#REF!");
}

/// Test that unparseable formulas are copied verbatim
#[test]
fn test_relocation_keeps_broken_formula_text() {
    let mut sheet = sheet_with(&[("A1", "=SUM(B1")]);
    sheet.relocate("A1", "A2").unwrap();
    assert_eq!(sheet.content("A2").unwrap().raw(), "=SUM(B1");
    assert_eq!(sheet.display("A2").unwrap(), "#ERROR");
}

/// Test that shrinking the grid turns dangling references into #REF!
#[test]
fn test_resize_turns_dangling_references_into_ref() {
    let mut sheet = sheet_with(&[
        ("C1", "1"),
        ("E5", "5"),
        ("A2", "=E5+1"),
        ("A3", "=SUM(C1:E5)"),
        ("A4", "=SUM(F6:G7)"),
    ]);
    assert_eq!(sheet.display("A2").unwrap(), "6");
    assert_eq!(sheet.display("A3").unwrap(), "6");
    assert_eq!(sheet.display("A4").unwrap(), "0");

    sheet.resize(4, 4).unwrap();
    assert_eq!(sheet.display("A2").unwrap(), "#REF!");
    // Ranges shrink to what is left of them
    assert_eq!(sheet.display("A3").unwrap(), "1");
    assert_eq!(sheet.display("A4").unwrap(), "#REF!");

    sheet.resize(5, 5).unwrap();
    assert_eq!(sheet.display("A2").unwrap(), "1");
    assert_eq!(sheet.display("A4").unwrap(), "#REF!");
}

/// Test growing and shrinking one row or column at a time
#[test]
fn test_add_and_delete_rows_and_columns() {
    let mut sheet = Spreadsheet::new();
    sheet.add_row().unwrap();
    sheet.add_column().unwrap();
    assert_eq!((sheet.rows(), sheet.cols()), (11, 11));

    sheet.edit("K11", "corner").unwrap();
    assert!(sheet.delete_last_row().unwrap());
    assert!(sheet.delete_last_column().unwrap());
    assert_eq!((sheet.rows(), sheet.cols()), (10, 10));
    assert!(sheet.edit("K11", "x").is_err());

    assert!(sheet.resize(MAX_ROWS + 1, 10).is_err());
    assert!(sheet.resize(10, 0).is_err());
}

/// Test validation of numeric and date cells
#[test]
fn test_typed_cells() {
    let mut sheet = Spreadsheet::new();
    sheet.set_cell_type("A1:A3", CellType::Numeric).unwrap();
    sheet.set_cell_type("B1", CellType::Date).unwrap();

    sheet.edit("A1", "12.5").unwrap();
    assert_eq!(sheet.value("A1").unwrap(), CellValue::Number(12.5));

    let err = sheet.edit("A2", "12abc").unwrap_err();
    assert!(matches!(err, Error::Validation { .. }));
    assert_eq!(sheet.display("A2").unwrap(), "");

    sheet.edit("B1", "2024-01-31").unwrap();
    assert!(sheet.edit("B1", "2024-02-30").is_err());
    assert_eq!(sheet.display("B1").unwrap(), "");

    // The failed edit is still one undo step
    assert!(sheet.undo());
    assert_eq!(sheet.display("B1").unwrap(), "2024-01-31");
}

/// Test the range text tools end to end
#[test]
fn test_range_tools() {
    let mut sheet = sheet_with(&[
        ("A1", " apple "),
        ("A2", "Pear"),
        ("A3", " apple "),
    ]);

    assert_eq!(sheet.remove_duplicate_rows("A1:A3").unwrap(), 1);
    assert_eq!(sheet.display("A3").unwrap(), "");

    sheet
        .apply_text_transform("A1:A2", TextTransform::Trim)
        .unwrap();
    sheet
        .apply_text_transform("A1:A2", TextTransform::Upper)
        .unwrap();
    assert_eq!(sheet.display("A1").unwrap(), "APPLE");
    assert_eq!(sheet.display("A2").unwrap(), "PEAR");

    assert_eq!(sheet.find_replace("A1:A2", "^P", "B").unwrap(), 1);
    assert_eq!(sheet.display("A2").unwrap(), "BEAR");
}
