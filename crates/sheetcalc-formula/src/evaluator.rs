//! Formula evaluator
//!
//! Evaluates formula ASTs to produce values.

use crate::ast::{BinaryOperator, FormulaExpr, UnaryOperator};
use crate::error::{FormulaError, FormulaResult};
use crate::functions::{FunctionKind, FunctionRegistry};
use sheetcalc_core::{
    format_number, parse_number, CellAddress, CellError, CellRange, CellStore, CellValue,
};
use std::sync::OnceLock;

/// Global function registry (lazily initialized)
static FUNCTION_REGISTRY: OnceLock<FunctionRegistry> = OnceLock::new();

pub(crate) fn get_function_registry() -> &'static FunctionRegistry {
    FUNCTION_REGISTRY.get_or_init(FunctionRegistry::new)
}

/// Value types during formula evaluation
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaValue {
    Number(f64),
    String(String),
    Boolean(bool),
    Error(CellError),
    /// Row-major values of a range
    Array(Vec<Vec<FormulaValue>>),
    Empty,
}

impl FormulaValue {
    /// Convert to number, if possible
    ///
    /// Only numeric-looking text converts; see [`FormulaValue::to_number`]
    /// for the lenient arithmetic coercion.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FormulaValue::Number(n) => Some(*n),
            FormulaValue::Boolean(true) => Some(1.0),
            FormulaValue::Boolean(false) => Some(0.0),
            FormulaValue::String(s) => parse_number(s),
            FormulaValue::Empty => Some(0.0),
            _ => None,
        }
    }

    /// Force conversion to number for arithmetic
    ///
    /// Blank and non-numeric text coerce to 0. A range in scalar position
    /// is an evaluation error.
    pub fn to_number(&self) -> FormulaResult<f64> {
        match self {
            FormulaValue::Array(_) => Err(FormulaError::Evaluation(
                "Range used where a single value is expected".into(),
            )),
            FormulaValue::Error(e) => Err(FormulaError::Evaluation(format!(
                "Cannot convert {} to number",
                e
            ))),
            other => Ok(other.as_number().unwrap_or(0.0)),
        }
    }

    /// Convert to boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FormulaValue::Boolean(b) => Some(*b),
            FormulaValue::Number(n) => Some(*n != 0.0),
            FormulaValue::Empty => Some(false),
            FormulaValue::String(s) => {
                let upper = s.trim().to_uppercase();
                if upper == "TRUE" {
                    Some(true)
                } else if upper == "FALSE" {
                    Some(false)
                } else {
                    parse_number(s).map(|n| n != 0.0)
                }
            }
            _ => None,
        }
    }

    /// Convert to string
    pub fn as_string(&self) -> String {
        match self {
            FormulaValue::Number(n) => format_number(*n),
            FormulaValue::String(s) => s.clone(),
            FormulaValue::Boolean(true) => "TRUE".to_string(),
            FormulaValue::Boolean(false) => "FALSE".to_string(),
            FormulaValue::Error(e) => e.to_string(),
            FormulaValue::Empty => String::new(),
            FormulaValue::Array(_) => CellError::Eval.to_string(),
        }
    }

    /// Check if this is an error
    pub fn is_error(&self) -> bool {
        matches!(self, FormulaValue::Error(_))
    }

    /// Get the error if this is one
    pub fn get_error(&self) -> Option<CellError> {
        match self {
            FormulaValue::Error(e) => Some(*e),
            _ => None,
        }
    }

    /// First error value anywhere in this value, including inside a range
    pub fn first_error(&self) -> Option<CellError> {
        match self {
            FormulaValue::Error(e) => Some(*e),
            FormulaValue::Array(rows) => rows.iter().flatten().find_map(FormulaValue::first_error),
            _ => None,
        }
    }
}

impl From<CellValue> for FormulaValue {
    fn from(value: CellValue) -> Self {
        match value {
            CellValue::Empty => FormulaValue::Empty,
            CellValue::Number(n) => FormulaValue::Number(n),
            CellValue::Text(s) => FormulaValue::String(s),
            CellValue::Boolean(b) => FormulaValue::Boolean(b),
            CellValue::Error(e) => FormulaValue::Error(e),
        }
    }
}

impl From<FormulaValue> for CellValue {
    fn from(value: FormulaValue) -> Self {
        match value {
            FormulaValue::Empty => CellValue::Empty,
            FormulaValue::Number(n) if !n.is_finite() => CellValue::Error(CellError::Div0),
            FormulaValue::Number(n) => CellValue::Number(n),
            FormulaValue::String(s) => CellValue::Text(s),
            FormulaValue::Boolean(b) => CellValue::Boolean(b),
            FormulaValue::Error(e) => CellValue::Error(e),
            FormulaValue::Array(_) => CellValue::Error(CellError::Eval),
        }
    }
}

/// Source of cell values during evaluation
///
/// The recalculation engine implements this over its in-progress pass so
/// that reading a stale cell can evaluate it on demand.
pub trait CellResolver {
    /// Current value of a cell inside the grid
    fn resolve(&self, addr: CellAddress) -> FormulaValue;

    /// Grid bounds as (rows, cols)
    fn bounds(&self) -> (u32, u32);
}

impl CellResolver for CellStore {
    fn resolve(&self, addr: CellAddress) -> FormulaValue {
        self.value(addr).into()
    }

    fn bounds(&self) -> (u32, u32) {
        self.size()
    }
}

/// Context for formula evaluation
pub struct EvaluationContext<'a> {
    /// Where cell values come from
    pub resolver: Option<&'a dyn CellResolver>,
    /// The cell being evaluated
    pub current: CellAddress,
}

impl<'a> EvaluationContext<'a> {
    /// Create a new evaluation context
    pub fn new(resolver: &'a dyn CellResolver, current: CellAddress) -> Self {
        Self {
            resolver: Some(resolver),
            current,
        }
    }

    /// Create a simple context without any cells (for testing)
    pub fn simple() -> Self {
        Self {
            resolver: None,
            current: CellAddress::new(1, 1),
        }
    }

    /// Get a cell value; addresses outside the grid are `#REF!`
    pub fn get_cell_value(&self, addr: CellAddress) -> FormulaValue {
        let resolver = match self.resolver {
            Some(r) => r,
            None => return FormulaValue::Empty,
        };

        let (rows, cols) = resolver.bounds();
        if !addr.is_within(rows, cols) {
            return FormulaValue::Error(CellError::Ref);
        }

        resolver.resolve(addr)
    }

    /// Get a range of cell values as an array
    ///
    /// The range is clipped to the grid; a range lying wholly outside it is
    /// `#REF!`.
    pub fn get_range_values(&self, range: CellRange) -> FormulaValue {
        let resolver = match self.resolver {
            Some(r) => r,
            None => return FormulaValue::Array(vec![]),
        };

        let (rows, cols) = resolver.bounds();
        let range = match range.clip(rows, cols) {
            Some(r) => r,
            None => return FormulaValue::Error(CellError::Ref),
        };

        let mut result = Vec::with_capacity(range.row_count() as usize);
        for row in range.start.row..=range.end.row {
            let mut values = Vec::with_capacity(range.col_count() as usize);
            for col in range.start.col..=range.end.col {
                values.push(resolver.resolve(CellAddress { row, col }));
            }
            result.push(values);
        }

        FormulaValue::Array(result)
    }
}

/// Evaluate a formula expression
///
/// Any non-finite numeric result becomes `#DIV/0!`.
pub fn evaluate(expr: &FormulaExpr, ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let value = match expr {
        // === Literals ===
        FormulaExpr::Number(n) => FormulaValue::Number(*n),
        FormulaExpr::String(s) => FormulaValue::String(s.clone()),
        FormulaExpr::Boolean(b) => FormulaValue::Boolean(*b),
        FormulaExpr::Error(e) => FormulaValue::Error(*e),

        // === References ===
        FormulaExpr::CellRef(cell_ref) => ctx.get_cell_value(cell_ref.address),

        FormulaExpr::RangeRef(range_ref) => ctx.get_range_values(range_ref.range()),

        // === Operators ===
        FormulaExpr::BinaryOp { op, left, right } => evaluate_binary_op(*op, left, right, ctx)?,

        FormulaExpr::UnaryOp { op, operand } => evaluate_unary_op(*op, operand, ctx)?,

        // === Functions ===
        FormulaExpr::Function { name, args } => evaluate_function(name, args, ctx)?,
    };

    match value {
        FormulaValue::Number(n) if !n.is_finite() => Err(FormulaError::DivideByZero),
        v => Ok(v),
    }
}

/// Evaluate a single value that must not be a range
pub(crate) fn evaluate_scalar(
    expr: &FormulaExpr,
    ctx: &EvaluationContext,
) -> FormulaResult<FormulaValue> {
    match evaluate(expr, ctx)? {
        FormulaValue::Array(_) => Err(FormulaError::Evaluation(
            "Range used where a single value is expected".into(),
        )),
        v => Ok(v),
    }
}

/// Evaluate a binary operation
fn evaluate_binary_op(
    op: BinaryOperator,
    left: &FormulaExpr,
    right: &FormulaExpr,
    ctx: &EvaluationContext,
) -> FormulaResult<FormulaValue> {
    // Evaluate operands first
    let left_val = evaluate_scalar(left, ctx)?;
    let right_val = evaluate_scalar(right, ctx)?;

    // Propagate errors
    if let Some(e) = left_val.get_error() {
        return Ok(FormulaValue::Error(e));
    }
    if let Some(e) = right_val.get_error() {
        return Ok(FormulaValue::Error(e));
    }

    if op.is_comparison() {
        let ord = compare_values(&left_val, &right_val);
        let result = match op {
            BinaryOperator::Equal => ord == 0,
            BinaryOperator::NotEqual => ord != 0,
            BinaryOperator::LessThan => ord < 0,
            BinaryOperator::LessEqual => ord <= 0,
            BinaryOperator::GreaterThan => ord > 0,
            _ => ord >= 0,
        };
        return Ok(FormulaValue::Boolean(result));
    }

    if op == BinaryOperator::Concat {
        let l = left_val.as_string();
        let r = right_val.as_string();
        return Ok(FormulaValue::String(l + &r));
    }

    let l = left_val.to_number()?;
    let r = right_val.to_number()?;

    let result = match op {
        BinaryOperator::Add => l + r,
        BinaryOperator::Subtract => l - r,
        BinaryOperator::Multiply => l * r,
        BinaryOperator::Divide => {
            if r == 0.0 {
                return Ok(FormulaValue::Error(CellError::Div0));
            }
            l / r
        }
        BinaryOperator::Power => l.powf(r),
        _ => {
            return Err(FormulaError::Evaluation(format!(
                "Unsupported operator {}",
                op.symbol()
            )))
        }
    };

    if result.is_finite() {
        Ok(FormulaValue::Number(result))
    } else {
        Ok(FormulaValue::Error(CellError::Div0))
    }
}

static BLANK_TEXT: FormulaValue = FormulaValue::String(String::new());
static BLANK_NUMBER: FormulaValue = FormulaValue::Number(0.0);

fn blank_as(other: &FormulaValue) -> &'static FormulaValue {
    if matches!(other, FormulaValue::String(_)) {
        &BLANK_TEXT
    } else {
        &BLANK_NUMBER
    }
}

/// Compare two values for ordering
///
/// Numbers compare numerically, text case-insensitively; across types
/// number < text < boolean. A blank compares as 0 against a number and as
/// empty text against text.
pub fn compare_values(left: &FormulaValue, right: &FormulaValue) -> i32 {
    let left = match left {
        FormulaValue::Empty => blank_as(right),
        v => v,
    };
    let right = match right {
        FormulaValue::Empty => blank_as(left),
        v => v,
    };

    match (left, right) {
        // Numbers compare numerically
        (FormulaValue::Number(l), FormulaValue::Number(r)) => {
            if l < r {
                -1
            } else if l > r {
                1
            } else {
                0
            }
        }

        // Strings compare case-insensitively
        (FormulaValue::String(l), FormulaValue::String(r)) => {
            l.to_lowercase().cmp(&r.to_lowercase()) as i32
        }

        // Booleans: FALSE < TRUE
        (FormulaValue::Boolean(l), FormulaValue::Boolean(r)) => (*l as i32) - (*r as i32),

        // Mixed types: number < string < boolean
        (FormulaValue::Number(_), FormulaValue::String(_)) => -1,
        (FormulaValue::String(_), FormulaValue::Number(_)) => 1,
        (FormulaValue::Number(_), FormulaValue::Boolean(_)) => -1,
        (FormulaValue::Boolean(_), FormulaValue::Number(_)) => 1,
        (FormulaValue::String(_), FormulaValue::Boolean(_)) => -1,
        (FormulaValue::Boolean(_), FormulaValue::String(_)) => 1,

        // Errors are equal to themselves
        (FormulaValue::Error(l), FormulaValue::Error(r)) => (l.code() as i32) - (r.code() as i32),

        // Other cases
        _ => 0,
    }
}

/// Evaluate a unary operation
fn evaluate_unary_op(
    op: UnaryOperator,
    operand: &FormulaExpr,
    ctx: &EvaluationContext,
) -> FormulaResult<FormulaValue> {
    let val = evaluate_scalar(operand, ctx)?;

    // Propagate errors
    if let Some(e) = val.get_error() {
        return Ok(FormulaValue::Error(e));
    }

    let n = val.to_number()?;
    match op {
        UnaryOperator::Negate => Ok(FormulaValue::Number(-n)),
        UnaryOperator::Percent => Ok(FormulaValue::Number(n / 100.0)),
    }
}

/// Evaluate a function call
fn evaluate_function(
    name: &str,
    args: &[FormulaExpr],
    ctx: &EvaluationContext,
) -> FormulaResult<FormulaValue> {
    let registry = get_function_registry();

    let func = registry
        .get(name)
        .ok_or_else(|| FormulaError::UnknownFunction(name.to_string()))?;

    // Check argument count
    if args.len() < func.min_args {
        return Err(FormulaError::ArgumentCount {
            function: name.to_string(),
            expected: format!("at least {}", func.min_args),
            actual: args.len(),
        });
    }

    if let Some(max) = func.max_args {
        if args.len() > max {
            return Err(FormulaError::ArgumentCount {
                function: name.to_string(),
                expected: format!("at most {}", max),
                actual: args.len(),
            });
        }
    }

    match func.implementation {
        FunctionKind::Lazy(implementation) => implementation(args, ctx),
        FunctionKind::Eager(implementation) => {
            // Evaluate arguments
            let mut evaluated_args = Vec::with_capacity(args.len());
            for arg in args {
                let value = evaluate(arg, ctx)?;
                // Errors anywhere in the arguments propagate
                if let Some(e) = value.first_error() {
                    return Ok(FormulaValue::Error(e));
                }
                evaluated_args.push(value);
            }

            // Call the function
            implementation(&evaluated_args, ctx)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_formula;
    use pretty_assertions::assert_eq;
    use sheetcalc_core::CellContent;

    fn eval(formula: &str) -> FormulaResult<FormulaValue> {
        let ast = parse_formula(formula)?;
        let ctx = EvaluationContext::simple();
        evaluate(&ast, &ctx)
    }

    /// Evaluate against a store whose values are the literal contents
    fn eval_with(cells: &[(&str, &str)], formula: &str) -> FormulaResult<FormulaValue> {
        let mut store = CellStore::new(10, 10);
        for (addr, raw) in cells {
            let addr = CellAddress::parse(addr).unwrap();
            store.set_content(addr, CellContent::from_raw(raw));
            store.set_value(addr, CellValue::from_literal(raw));
        }
        let ast = parse_formula(formula)?;
        let ctx = EvaluationContext::new(&store, CellAddress::new(10, 10));
        evaluate(&ast, &ctx)
    }

    fn num(n: f64) -> FormulaValue {
        FormulaValue::Number(n)
    }

    #[test]
    fn test_evaluate_literals() {
        assert_eq!(eval("=42").unwrap(), num(42.0));
        assert_eq!(eval("=\"Hello\"").unwrap(), FormulaValue::String("Hello".into()));
        assert_eq!(eval("=TRUE").unwrap(), FormulaValue::Boolean(true));
    }

    #[test]
    fn test_evaluate_arithmetic() {
        assert_eq!(eval("=1+2").unwrap(), num(3.0));
        assert_eq!(eval("=10-3").unwrap(), num(7.0));
        assert_eq!(eval("=4*5").unwrap(), num(20.0));
        assert_eq!(eval("=20/4").unwrap(), num(5.0));
        assert_eq!(eval("=2^10").unwrap(), num(1024.0));
        assert_eq!(eval("=1+2*3").unwrap(), num(7.0));
        assert_eq!(eval("=(1+2)*3").unwrap(), num(9.0));
        assert_eq!(eval("=-5+3").unwrap(), num(-2.0));
        assert_eq!(eval("=50%").unwrap(), num(0.5));
    }

    #[test]
    fn test_evaluate_comparison() {
        assert_eq!(eval("=1<2").unwrap(), FormulaValue::Boolean(true));
        assert_eq!(eval("=2<=1").unwrap(), FormulaValue::Boolean(false));
        assert_eq!(eval("=\"abc\"=\"ABC\"").unwrap(), FormulaValue::Boolean(true));
        assert_eq!(eval("=1<\"a\"").unwrap(), FormulaValue::Boolean(true));
        assert_eq!(eval("=\"z\"<TRUE").unwrap(), FormulaValue::Boolean(true));
    }

    #[test]
    fn test_evaluate_concatenation() {
        assert_eq!(
            eval("=\"Total: \"&10").unwrap(),
            FormulaValue::String("Total: 10".into())
        );
    }

    #[test]
    fn test_division_by_zero_and_non_finite() {
        assert_eq!(eval("=10/0").unwrap(), FormulaValue::Error(CellError::Div0));
        assert_eq!(eval("=10^400").unwrap(), FormulaValue::Error(CellError::Div0));
        assert_eq!(eval("=(-1)^0.5").unwrap(), FormulaValue::Error(CellError::Div0));
    }

    #[test]
    fn test_error_propagates() {
        assert_eq!(eval("=#REF!+1").unwrap(), FormulaValue::Error(CellError::Ref));
        assert_eq!(
            eval("=SUM(1,10/0)").unwrap(),
            FormulaValue::Error(CellError::Div0)
        );
    }

    #[test]
    fn test_lenient_arithmetic_coercion() {
        let cells = [("A1", "hello"), ("A2", "TRUE"), ("A3", "4")];
        assert_eq!(eval_with(&cells, "=A1+1").unwrap(), num(1.0));
        assert_eq!(eval_with(&cells, "=A2+1").unwrap(), num(2.0));
        assert_eq!(eval_with(&cells, "=B9*3").unwrap(), num(0.0));
        assert_eq!(eval_with(&cells, "=A3*\"2\"").unwrap(), num(8.0));
    }

    #[test]
    fn test_references_outside_grid() {
        assert_eq!(
            eval_with(&[], "=K1+1").unwrap(),
            FormulaValue::Error(CellError::Ref)
        );
        assert_eq!(
            eval_with(&[], "=SUM(K1:L2)").unwrap(),
            FormulaValue::Error(CellError::Ref)
        );
        // Ranges are clipped to the grid
        assert_eq!(
            eval_with(&[("J10", "5")], "=SUM(J9:Z20)").unwrap(),
            num(5.0)
        );
    }

    #[test]
    fn test_range_as_scalar_is_eval_error() {
        let err = eval_with(&[("A1", "1")], "=A1:A2+1").unwrap_err();
        assert_eq!(err.cell_error(), CellError::Eval);
    }

    #[test]
    fn test_blank_compares_as_empty_text() {
        assert_eq!(
            eval_with(&[], "=A1=\"\"").unwrap(),
            FormulaValue::Boolean(true)
        );
        assert_eq!(eval_with(&[], "=A1=0").unwrap(), FormulaValue::Boolean(true));
    }

    #[test]
    fn test_wrong_argument_count() {
        let err = eval("=IF(TRUE)").unwrap_err();
        assert_eq!(err.cell_error(), CellError::Eval);
    }

    #[test]
    fn test_number_conversion_to_cell_value() {
        assert_eq!(CellValue::from(num(2.5)), CellValue::Number(2.5));
        assert_eq!(
            CellValue::from(num(f64::INFINITY)),
            CellValue::Error(CellError::Div0)
        );
        assert_eq!(
            CellValue::from(FormulaValue::Array(vec![])),
            CellValue::Error(CellError::Eval)
        );
    }
}
