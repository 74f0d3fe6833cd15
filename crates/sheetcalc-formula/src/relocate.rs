//! Formula relocation
//!
//! Rewrites the references of a parsed formula when it is copied to another
//! location. Fixed (`$`) axes stay put; relative axes move by the offset.

use crate::ast::{FormulaExpr, RangeReference};
use sheetcalc_core::CellError;

/// Translate every reference in `expr` by the given column/row offsets
///
/// A reference whose relative axis would land below 1 becomes a `#REF!`
/// node, so the formula still parses and renders but evaluates to `#REF!`.
/// A range with either corner pushed off the grid becomes `#REF!` as a whole.
pub fn shift_references(expr: &FormulaExpr, col_offset: i64, row_offset: i64) -> FormulaExpr {
    match expr {
        FormulaExpr::CellRef(r) => match r.shift(col_offset, row_offset) {
            Some(shifted) => FormulaExpr::CellRef(shifted),
            None => FormulaExpr::Error(CellError::Ref),
        },
        FormulaExpr::RangeRef(r) => {
            match (
                r.start.shift(col_offset, row_offset),
                r.end.shift(col_offset, row_offset),
            ) {
                (Some(start), Some(end)) => FormulaExpr::RangeRef(RangeReference { start, end }),
                _ => FormulaExpr::Error(CellError::Ref),
            }
        }
        FormulaExpr::BinaryOp { op, left, right } => FormulaExpr::BinaryOp {
            op: *op,
            left: Box::new(shift_references(left, col_offset, row_offset)),
            right: Box::new(shift_references(right, col_offset, row_offset)),
        },
        FormulaExpr::UnaryOp { op, operand } => FormulaExpr::UnaryOp {
            op: *op,
            operand: Box::new(shift_references(operand, col_offset, row_offset)),
        },
        FormulaExpr::Function { name, args } => FormulaExpr::Function {
            name: name.clone(),
            args: args
                .iter()
                .map(|arg| shift_references(arg, col_offset, row_offset))
                .collect(),
        },
        FormulaExpr::Number(_)
        | FormulaExpr::String(_)
        | FormulaExpr::Boolean(_)
        | FormulaExpr::Error(_) => expr.clone(),
    }
}
