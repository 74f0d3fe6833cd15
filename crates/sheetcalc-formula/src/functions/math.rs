//! Math functions

use super::collect_numbers;
use crate::error::FormulaResult;
use crate::evaluator::{EvaluationContext, FormulaValue};
use sheetcalc_core::{parse_number, CellError};

/// SUM function
pub fn fn_sum(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    Ok(FormulaValue::Number(collect_numbers(args).iter().sum()))
}

/// AVERAGE function
///
/// Divides by the number of cells aggregated, blanks included.
pub fn fn_average(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let numbers = collect_numbers(args);

    if numbers.is_empty() {
        Ok(FormulaValue::Error(CellError::Div0))
    } else {
        Ok(FormulaValue::Number(
            numbers.iter().sum::<f64>() / numbers.len() as f64,
        ))
    }
}

/// MIN function
pub fn fn_min(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let min = collect_numbers(args).into_iter().reduce(f64::min);
    Ok(FormulaValue::Number(min.unwrap_or(0.0)))
}

/// MAX function
pub fn fn_max(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let max = collect_numbers(args).into_iter().reduce(f64::max);
    Ok(FormulaValue::Number(max.unwrap_or(0.0)))
}

fn is_countable(value: &FormulaValue) -> bool {
    match value {
        FormulaValue::Number(_) => true,
        FormulaValue::String(s) => parse_number(s).is_some(),
        _ => false,
    }
}

/// COUNT function
///
/// Counts numbers and numeric-looking text; blanks are never counted.
pub fn fn_count(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let mut count = 0;

    for arg in args {
        match arg {
            FormulaValue::Array(arr) => {
                count += arr.iter().flatten().filter(|v| is_countable(v)).count();
            }
            other if is_countable(other) => count += 1,
            _ => {} // Don't count non-numeric
        }
    }

    Ok(FormulaValue::Number(count as f64))
}
