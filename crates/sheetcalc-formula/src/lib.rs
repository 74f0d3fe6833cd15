//! # sheetcalc-formula
//!
//! Formula parser and evaluator for sheetcalc.
//!
//! This crate provides:
//! - Formula parsing (text → AST) and rendering back to text
//! - Reference relocation for copied formulas
//! - Formula evaluation (AST → value) over a [`CellResolver`]
//! - The built-in functions `SUM, AVERAGE, MAX, MIN, COUNT, MEDIAN, STDEV, IF`
//! - Dependency tracking for calculation chains
//!
//! ## Example
//!
//! ```rust
//! use sheetcalc_formula::{evaluate, parse_formula, EvaluationContext, FormulaValue};
//!
//! let ast = parse_formula("=SUM(1,2,3)*2").unwrap();
//! let result = evaluate(&ast, &EvaluationContext::simple()).unwrap();
//! assert_eq!(result, FormulaValue::Number(12.0));
//! ```

pub mod ast;
pub mod dependency;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod parser;
pub mod relocate;

pub use ast::{BinaryOperator, FormulaExpr, RangeReference, Reference, UnaryOperator};
pub use dependency::{precedent_cells, DependencyGraph};
pub use error::{FormulaError, FormulaResult};
pub use evaluator::{evaluate, CellResolver, EvaluationContext, FormulaValue};
pub use functions::is_builtin;
pub use parser::{parse_formula, MAX_DEPTH, MAX_NESTING};
pub use relocate::shift_references;
