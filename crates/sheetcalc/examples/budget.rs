//! Example: A small budget with live totals

use sheetcalc::prelude::*;

fn main() -> Result<()> {
    let mut sheet = Spreadsheet::new();

    // Header row
    sheet.edit("A1", "Item")?;
    sheet.edit("B1", "Cost")?;
    sheet.edit("C1", "With tax")?;

    // Data rows
    sheet.set_cell_type("B2:B3", CellType::Numeric)?;
    sheet.edit("A2", "Rent")?;
    sheet.edit("B2", "1200")?;
    sheet.edit("C2", "=B2*1.2")?;

    sheet.edit("A3", "Food")?;
    sheet.edit("B3", "300")?;
    // Copy the tax formula down one row
    sheet.relocate("C2", "C3")?;

    // Total row
    sheet.edit("A4", "Total")?;
    sheet.edit("B4", "=SUM(B2:B3)")?;
    sheet.edit("C4", "=SUM(C2:C3)")?;

    print_block(&sheet, "A1:C4");
    let stats = sheet.last_stats();
    println!(
        "Last edit evaluated {} cells ({} errors)",
        stats.cells_evaluated, stats.errors
    );

    // Change an input and watch the totals follow
    sheet.edit("B3", "450")?;
    println!();
    print_block(&sheet, "A1:C4");

    // Step back
    sheet.undo();
    println!();
    println!("After undo, total is {}", sheet.display("C4")?);

    println!();
    println!("{}", sheet.snapshot().to_json()?);

    Ok(())
}

fn print_block(sheet: &Spreadsheet, range: &str) {
    let Ok(range) = CellRange::parse(range) else {
        return;
    };
    for row in range.start.row..=range.end.row {
        let cells: Vec<String> = (range.start.col..=range.end.col)
            .map(|col| format!("{:>10}", sheet.display_at(CellAddress::new(row, col))))
            .collect();
        println!("{}", cells.join(" "));
    }
}
