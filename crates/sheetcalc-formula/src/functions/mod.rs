//! Built-in functions
//!
//! The set is fixed: `SUM, AVERAGE, MAX, MIN, COUNT, MEDIAN, STDEV, IF`.
//! Names are matched case-insensitively.

pub mod logical;
pub mod math;
pub mod statistical;

use crate::ast::FormulaExpr;
use crate::error::FormulaResult;
use crate::evaluator::{get_function_registry, EvaluationContext, FormulaValue};
use sheetcalc_core::parse_number;
use std::collections::HashMap;

/// Function implementation over evaluated arguments
pub type FunctionImpl = fn(&[FormulaValue], &EvaluationContext) -> FormulaResult<FormulaValue>;

/// Function implementation over unevaluated arguments
///
/// Used where only some arguments may be evaluated, such as the branches
/// of `IF`.
pub type LazyFunctionImpl = fn(&[FormulaExpr], &EvaluationContext) -> FormulaResult<FormulaValue>;

/// How a function receives its arguments
#[derive(Clone, Copy)]
pub enum FunctionKind {
    /// Arguments are evaluated first; an error in any of them propagates
    Eager(FunctionImpl),
    /// The function evaluates its own arguments
    Lazy(LazyFunctionImpl),
}

/// Function definition
pub struct FunctionDef {
    /// Function name (uppercase)
    pub name: &'static str,
    /// Minimum arguments
    pub min_args: usize,
    /// Maximum arguments (None = unlimited)
    pub max_args: Option<usize>,
    /// Implementation
    pub implementation: FunctionKind,
}

/// Function registry
pub struct FunctionRegistry {
    functions: HashMap<String, FunctionDef>,
}

impl FunctionRegistry {
    /// Create a new registry with all built-in functions
    pub fn new() -> Self {
        let mut registry = Self {
            functions: HashMap::new(),
        };

        registry.register_math_functions();
        registry.register_statistical_functions();
        registry.register_logical_functions();

        registry
    }

    /// Look up a function by name
    pub fn get(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.get(&name.to_uppercase())
    }

    /// Register a function
    pub fn register(&mut self, def: FunctionDef) {
        self.functions.insert(def.name.to_uppercase(), def);
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.functions.values().map(|f| f.name).collect();
        names.sort_unstable();
        names
    }

    fn register_eager(
        &mut self,
        name: &'static str,
        min_args: usize,
        max_args: Option<usize>,
        f: FunctionImpl,
    ) {
        self.register(FunctionDef {
            name,
            min_args,
            max_args,
            implementation: FunctionKind::Eager(f),
        });
    }

    fn register_math_functions(&mut self) {
        self.register_eager("SUM", 1, None, math::fn_sum);
        self.register_eager("AVERAGE", 1, None, math::fn_average);
        self.register_eager("MAX", 1, None, math::fn_max);
        self.register_eager("MIN", 1, None, math::fn_min);
        self.register_eager("COUNT", 1, None, math::fn_count);
    }

    fn register_statistical_functions(&mut self) {
        self.register_eager("MEDIAN", 1, None, statistical::fn_median);
        self.register_eager("STDEV", 1, None, statistical::fn_stdev);
    }

    fn register_logical_functions(&mut self) {
        self.register(FunctionDef {
            name: "IF",
            min_args: 2,
            max_args: Some(3),
            implementation: FunctionKind::Lazy(logical::fn_if),
        });
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Check whether `name` is a built-in function (case-insensitive)
pub fn is_builtin(name: &str) -> bool {
    get_function_registry().get(name).is_some()
}

/// Numeric reading of a single value for aggregation
///
/// Blanks and non-numeric text count as 0, booleans as 1/0.
fn aggregate_number(value: &FormulaValue) -> f64 {
    match value {
        FormulaValue::Number(n) => *n,
        FormulaValue::Boolean(b) => f64::from(u8::from(*b)),
        FormulaValue::String(s) => parse_number(s).unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Flatten arguments into the values aggregated over, ranges row-major
///
/// Every cell of a range contributes, so a blank cell adds a 0.
pub(crate) fn collect_numbers(args: &[FormulaValue]) -> Vec<f64> {
    let mut numbers = Vec::new();
    for arg in args {
        match arg {
            FormulaValue::Array(rows) => {
                numbers.extend(rows.iter().flatten().map(aggregate_number));
            }
            other => numbers.push(aggregate_number(other)),
        }
    }
    numbers
}
