//! Statistical functions

use super::collect_numbers;
use crate::error::{FormulaError, FormulaResult};
use crate::evaluator::{EvaluationContext, FormulaValue};
use sheetcalc_core::CellError;

/// MEDIAN(value1, [value2], ...)
pub fn fn_median(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let mut numbers = collect_numbers(args);

    if numbers.is_empty() {
        return Err(FormulaError::Evaluation("MEDIAN of no values".into()));
    }

    numbers.sort_by(f64::total_cmp);

    let len = numbers.len();
    let median = if len % 2 == 1 {
        // Odd count: middle value
        numbers[len / 2]
    } else {
        // Even count: average of two middle values
        (numbers[len / 2 - 1] + numbers[len / 2]) / 2.0
    };

    Ok(FormulaValue::Number(median))
}

/// STDEV(value1, [value2], ...) - sample standard deviation (n - 1)
pub fn fn_stdev(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let numbers = collect_numbers(args);
    let n = numbers.len();

    if n < 2 {
        return Ok(FormulaValue::Error(CellError::Div0));
    }

    let mean = numbers.iter().sum::<f64>() / n as f64;
    let variance = numbers.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64;

    Ok(FormulaValue::Number(variance.sqrt()))
}
