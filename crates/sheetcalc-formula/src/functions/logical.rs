//! Logical functions

use crate::ast::FormulaExpr;
use crate::error::{FormulaError, FormulaResult};
use crate::evaluator::{evaluate, evaluate_scalar, EvaluationContext, FormulaValue};

/// IF(condition, value_if_true, [value_if_false])
///
/// Only the taken branch is evaluated, so a broken reference in the other
/// branch never surfaces. A missing false branch yields FALSE.
pub fn fn_if(args: &[FormulaExpr], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let (condition, if_true) = match args {
        [condition, if_true, ..] => (condition, if_true),
        _ => {
            return Err(FormulaError::ArgumentCount {
                function: "IF".into(),
                expected: "at least 2".into(),
                actual: args.len(),
            })
        }
    };

    let condition = evaluate_scalar(condition, ctx)?;
    if let Some(e) = condition.get_error() {
        return Ok(FormulaValue::Error(e));
    }

    // Booleans as is, numbers by truthiness, TRUE/FALSE text, anything else as a number
    let condition_bool = match condition.as_bool() {
        Some(b) => b,
        None => condition.to_number()? != 0.0,
    };

    if condition_bool {
        evaluate(if_true, ctx)
    } else {
        match args.get(2) {
            Some(if_false) => evaluate(if_false, ctx),
            None => Ok(FormulaValue::Boolean(false)),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::evaluator::{evaluate, EvaluationContext, FormulaValue};
    use crate::parser::parse_formula;
    use sheetcalc_core::CellError;

    fn eval(formula: &str) -> FormulaValue {
        let ast = parse_formula(formula).unwrap();
        evaluate(&ast, &EvaluationContext::simple()).unwrap()
    }

    #[test]
    fn test_if_branches() {
        assert_eq!(eval("=IF(TRUE,1,2)"), FormulaValue::Number(1.0));
        assert_eq!(eval("=IF(FALSE,1,2)"), FormulaValue::Number(2.0));
        assert_eq!(
            eval("=IF(1>0,\"Yes\",\"No\")"),
            FormulaValue::String("Yes".into())
        );
        assert_eq!(eval("=IF(0,1)"), FormulaValue::Boolean(false));
    }

    #[test]
    fn test_if_condition_coercion() {
        assert_eq!(eval("=IF(2,\"a\",\"b\")"), FormulaValue::String("a".into()));
        assert_eq!(eval("=IF(\"true\",\"a\",\"b\")"), FormulaValue::String("a".into()));
        assert_eq!(eval("=IF(\"abc\",\"a\",\"b\")"), FormulaValue::String("b".into()));
    }

    #[test]
    fn test_untaken_branch_is_not_evaluated() {
        assert_eq!(eval("=IF(TRUE,1,1/0)"), FormulaValue::Number(1.0));
        assert_eq!(eval("=IF(FALSE,#REF!,3)"), FormulaValue::Number(3.0));
        assert_eq!(
            eval("=IF(TRUE,#REF!,3)"),
            FormulaValue::Error(CellError::Ref)
        );
    }

    #[test]
    fn test_if_condition_error_propagates() {
        assert_eq!(eval("=IF(1/0,1,2)"), FormulaValue::Error(CellError::Div0));
    }
}
