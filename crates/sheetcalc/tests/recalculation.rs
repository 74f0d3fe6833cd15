//! Tests for edit-driven recalculation through the public API

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use sheetcalc::prelude::*;

fn sheet_with(cells: &[(&str, &str)]) -> Spreadsheet {
    let mut sheet = Spreadsheet::new();
    for (address, raw) in cells {
        sheet.edit(address, raw).unwrap();
    }
    sheet
}

/// Test that a SUM follows edits to its inputs
#[test]
fn test_sum_follows_edits() {
    let mut sheet = sheet_with(&[
        ("A1", "10"),
        ("A2", "20"),
        ("A3", "30"),
        ("A4", "=SUM(A1:A3)"),
    ]);
    assert_eq!(sheet.display("A4").unwrap(), "60");

    sheet.edit("A1", "15").unwrap();
    assert_eq!(sheet.display("A4").unwrap(), "65");
}

/// Test that chains of formulas update transitively
#[test]
fn test_transitive_dependents() {
    let mut sheet = sheet_with(&[
        ("A1", "2"),
        ("B1", "=A1*3"),
        ("C1", "=B1+A1"),
        ("D1", "=C1&\" units\""),
    ]);
    assert_eq!(sheet.display("D1").unwrap(), "8 units");

    sheet.edit("A1", "4").unwrap();
    assert_eq!(sheet.display("B1").unwrap(), "12");
    assert_eq!(sheet.display("D1").unwrap(), "16 units");
}

/// Test that only the affected cells are re-evaluated
#[test]
fn test_unrelated_formulas_not_evaluated() {
    let mut sheet = sheet_with(&[
        ("A1", "1"),
        ("B1", "=A1+1"),
        ("A2", "5"),
        ("B2", "=A2*2"),
        ("C2", "=B2*2"),
    ]);

    sheet.edit("A1", "2").unwrap();
    assert_eq!(sheet.last_stats().cells_evaluated, 2);
    assert_eq!(sheet.display("C2").unwrap(), "20");
}

/// Test that a cycle-closing edit marks the whole cycle and its readers
#[test]
fn test_cycle_closing_edit() {
    let mut sheet = sheet_with(&[("A1", "5"), ("B1", "=A1"), ("C1", "=B1*2"), ("D1", "3")]);
    assert_eq!(sheet.display("C1").unwrap(), "10");

    sheet.edit("A1", "=B1").unwrap();
    assert_eq!(sheet.display("A1").unwrap(), "#CIRCULAR!");
    assert_eq!(sheet.display("B1").unwrap(), "#CIRCULAR!");
    assert_eq!(sheet.display("C1").unwrap(), "#CIRCULAR!");
    assert_eq!(sheet.display("D1").unwrap(), "3");
    assert_eq!(sheet.last_stats().circular_cells, 3);

    // Breaking the cycle brings everything back
    sheet.edit("A1", "7").unwrap();
    assert_eq!(sheet.display("A1").unwrap(), "7");
    assert_eq!(sheet.display("B1").unwrap(), "7");
    assert_eq!(sheet.display("C1").unwrap(), "14");
}

/// Test that two cells naming each other are both circular, whatever the edit order
#[test]
fn test_mutual_reference_by_edits() {
    let forward = sheet_with(&[("A1", "=B1"), ("B1", "=A1")]);
    let backward = sheet_with(&[("B1", "=A1"), ("A1", "=B1")]);

    for sheet in [&forward, &backward] {
        assert_eq!(sheet.display("A1").unwrap(), "#CIRCULAR!");
        assert_eq!(sheet.display("B1").unwrap(), "#CIRCULAR!");
    }
}

/// Test that a cycle built by edits survives a snapshot round trip
#[test]
fn test_cycle_survives_restore_and_undo() {
    let mut sheet = sheet_with(&[("A1", "5"), ("B1", "=A1"), ("A1", "=B1")]);
    let before = (sheet.display("A1").unwrap(), sheet.display("B1").unwrap());
    assert_eq!(before, ("#CIRCULAR!".to_string(), "#CIRCULAR!".to_string()));

    let mut fresh = Spreadsheet::new();
    fresh.restore(&sheet.snapshot()).unwrap();
    assert_eq!(
        (fresh.display("A1").unwrap(), fresh.display("B1").unwrap()),
        before
    );

    assert!(sheet.undo());
    assert!(sheet.redo());
    assert_eq!(
        (sheet.display("A1").unwrap(), sheet.display("B1").unwrap()),
        before
    );
}

/// Test that a cycle loaded in one go marks every member
#[test]
fn test_mutual_reference_cycle() {
    let mut sheet = Spreadsheet::new();
    sheet.bulk_load([("A1", "=B1"), ("B1", "=A1"), ("C1", "=A1+1")]).unwrap();

    assert_eq!(sheet.display("A1").unwrap(), "#CIRCULAR!");
    assert_eq!(sheet.display("B1").unwrap(), "#CIRCULAR!");
    assert_eq!(sheet.display("C1").unwrap(), "#CIRCULAR!");
}

/// Test that a self reference is circular
#[test]
fn test_self_reference() {
    let sheet = sheet_with(&[("A1", "=A1+1")]);
    assert_eq!(sheet.display("A1").unwrap(), "#CIRCULAR!");
}

/// Test the error tokens of the formula language
#[test]
fn test_error_tokens() {
    let sheet = sheet_with(&[
        ("A1", "=10/0"),
        ("A2", "1"),
        ("A3", "2"),
        ("A4", "=UNKNOWNFUNC(A2:A3)"),
        ("A5", "=1+"),
        ("A6", "=SUM(A2:A3"),
        ("A7", "=A1*2"),
        ("A8", "=A2:A3+1"),
    ]);

    assert_eq!(sheet.display("A1").unwrap(), "#DIV/0!");
    assert_eq!(sheet.display("A4").unwrap(), "#NAME?");
    assert_eq!(sheet.display("A5").unwrap(), "#ERROR");
    assert_eq!(sheet.display("A6").unwrap(), "#ERROR");
    assert_eq!(sheet.display("A7").unwrap(), "#DIV/0!");
    assert_eq!(sheet.display("A8").unwrap(), "#ERROR");
}

/// Test that absurdly nested formulas become #ERROR instead of exhausting the stack
#[test]
fn test_runaway_nesting() {
    let n = 100_000;
    let mut sheet = Spreadsheet::new();
    sheet
        .edit("A1", &format!("={}1{}", "(".repeat(n), ")".repeat(n)))
        .unwrap();
    sheet.edit("A2", &format!("={}1", "-".repeat(n))).unwrap();
    sheet.edit("A3", "=A1+A2").unwrap();
    sheet
        .edit("A4", &format!("=1{}", "+1".repeat(200)))
        .unwrap();

    assert_eq!(sheet.display("A1").unwrap(), "#ERROR");
    assert_eq!(sheet.display("A2").unwrap(), "#ERROR");
    assert_eq!(sheet.display("A3").unwrap(), "#ERROR");
    assert_eq!(sheet.display("A4").unwrap(), "201");

    sheet.relocate("A1:A2", "B1").unwrap();
    assert_eq!(sheet.display("B1").unwrap(), "#ERROR");
}

/// Test range aggregates over mixed content
#[test]
fn test_aggregates_over_mixed_range() {
    let sheet = sheet_with(&[
        ("A1", "4"),
        ("A2", "text"),
        ("A3", "8"),
        ("B1", "=SUM(A1:A4)"),
        ("B2", "=AVERAGE(A1:A4)"),
        ("B3", "=COUNT(A1:A4)"),
        ("B4", "=MAX(A1:A4)"),
        ("B5", "=MIN(A1:A3)"),
        ("B6", "=MEDIAN(A1,A3,6)"),
    ]);

    assert_eq!(sheet.display("B1").unwrap(), "12");
    assert_eq!(sheet.display("B2").unwrap(), "3");
    assert_eq!(sheet.display("B3").unwrap(), "2");
    assert_eq!(sheet.display("B4").unwrap(), "8");
    assert_eq!(sheet.display("B5").unwrap(), "0");
    assert_eq!(sheet.display("B6").unwrap(), "6");
}

/// Test that IF only evaluates the branch it takes
#[test]
fn test_if_is_lazy() {
    let mut sheet = sheet_with(&[("A1", "0"), ("B1", "=IF(A1=0,\"none\",10/A1)")]);
    assert_eq!(sheet.display("B1").unwrap(), "none");

    sheet.edit("A1", "4").unwrap();
    assert_eq!(sheet.display("B1").unwrap(), "2.5");
}

/// Test that clearing a formula releases its dependencies
#[test]
fn test_clearing_formula() {
    let mut sheet = sheet_with(&[("A1", "1"), ("B1", "=A1")]);
    sheet.edit("B1", "").unwrap();
    assert_eq!(sheet.display("B1").unwrap(), "");

    sheet.edit("A1", "2").unwrap();
    assert_eq!(sheet.display("B1").unwrap(), "");
    // A1 only
    assert_eq!(sheet.last_stats().cells_evaluated, 1);
}

/// A cell and the formula or literal written into it
///
/// Formulas only name cells earlier in row-major order, so any sequence of
/// edits stays acyclic.
fn arb_edit() -> impl Strategy<Value = (u32, u32, String)> {
    (1u32..=4, 1u32..=4, 0u8..7, 0u32..16, 0u32..16, -50i32..50).prop_map(
        |(row, col, kind, a, b, n)| {
            let index = (row - 1) * 4 + (col - 1);
            let earlier = |i: u32| {
                let i = if index == 0 { 0 } else { i % index };
                CellAddress::new(i / 4 + 1, i % 4 + 1).to_string()
            };
            let raw = if index == 0 || kind == 0 {
                n.to_string()
            } else {
                let (a, b) = (earlier(a), earlier(b));
                match kind {
                    1 => format!("={}+{}", a, b),
                    2 => format!("={}*2-{}", a, n.unsigned_abs()),
                    3 => format!("=SUM(A1:{})", a),
                    4 => format!("=IF({}>0,{},{})", a, a, b),
                    5 => format!("={}/{}", a, b),
                    _ => format!("=AVERAGE(A1:{})&\"\"", a),
                }
            };
            (row, col, raw)
        },
    )
}

/// A cell and a formula naming any cell of the block, so edits may form cycles
fn arb_edit_any() -> impl Strategy<Value = (u32, u32, String)> {
    let cell = (1u32..=4, 1u32..=4).prop_map(|(r, c)| CellAddress::new(r, c).to_string());
    (1u32..=4, 1u32..=4, 0u8..6, cell.clone(), cell, -20i32..20).prop_map(
        |(row, col, kind, a, b, n)| {
            let raw = match kind {
                0 => n.to_string(),
                1 => format!("={}+1", a),
                2 => format!("={}+{}", a, b),
                3 => format!("=SUM(A1:{})", a),
                4 => format!("=IF({}>0,{},{})", a, n, b),
                _ => "=(1+".to_string(),
            };
            (row, col, raw)
        },
    )
}

fn displays(sheet: &Spreadsheet) -> Vec<String> {
    CellRange::parse("A1:D4")
        .unwrap()
        .cells()
        .map(|addr| sheet.display_at(addr))
        .collect()
}

proptest! {
    /// Incremental results match a recalculation from scratch
    #[test]
    fn prop_incremental_matches_full_recalc(edits in prop::collection::vec(arb_edit(), 1..40)) {
        let mut sheet = Spreadsheet::new();
        for (row, col, raw) in &edits {
            sheet.edit_at(CellAddress::new(*row, *col), raw).unwrap();
        }

        let mut fresh = Spreadsheet::new();
        fresh.restore(&sheet.snapshot()).unwrap();

        prop_assert_eq!(displays(&sheet), displays(&fresh));
    }

    /// Displays after edits that may form cycles do not depend on how the
    /// grid was rebuilt
    #[test]
    fn prop_cyclic_edits_survive_restore_and_undo(
        edits in prop::collection::vec(arb_edit_any(), 1..30)
    ) {
        let mut sheet = Spreadsheet::new();
        for (row, col, raw) in &edits {
            sheet.edit_at(CellAddress::new(*row, *col), raw).unwrap();
        }
        let expected = displays(&sheet);

        let mut fresh = Spreadsheet::new();
        fresh.restore(&sheet.snapshot()).unwrap();
        prop_assert_eq!(displays(&fresh), expected.clone());

        prop_assert!(sheet.undo());
        prop_assert!(sheet.redo());
        prop_assert_eq!(displays(&sheet), expected);
    }
}
