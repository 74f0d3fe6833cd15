//! Formula error types

use sheetcalc_core::CellError;
use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors that can occur during formula parsing or evaluation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    /// Formula parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Formula evaluation error
    #[error("Evaluation error: {0}")]
    Evaluation(String),

    /// Unknown function
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// Unknown bare name
    #[error("Unknown name: {0}")]
    UnknownName(String),

    /// Wrong number of arguments
    #[error("Wrong number of arguments for {function}: expected {expected}, got {actual}")]
    ArgumentCount {
        function: String,
        expected: String,
        actual: usize,
    },

    /// Division by zero or a non-finite result
    #[error("Division by zero")]
    DivideByZero,

    /// Circular reference
    #[error("Circular reference detected")]
    CircularReference,

    /// Reference to invalid cell
    #[error("Invalid reference: {0}")]
    InvalidReference(String),
}

impl FormulaError {
    /// The per-cell error value this failure is stored as
    pub fn cell_error(&self) -> CellError {
        match self {
            FormulaError::Parse(_) => CellError::Syntax,
            FormulaError::UnknownFunction(_) | FormulaError::UnknownName(_) => CellError::Name,
            FormulaError::InvalidReference(_) => CellError::Ref,
            FormulaError::DivideByZero => CellError::Div0,
            FormulaError::CircularReference => CellError::Circular,
            FormulaError::Evaluation(_) | FormulaError::ArgumentCount { .. } => CellError::Eval,
        }
    }
}
