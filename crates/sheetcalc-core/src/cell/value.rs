//! Cell content and value types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The raw content a user typed into a cell
///
/// Formula text is kept verbatim (including the leading `=`) so it can be
/// shown again for editing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellContent {
    /// Plain text, interpreted according to the cell's [`CellType`]
    Literal(String),
    /// Formula text beginning with `=`
    Formula(String),
}

impl CellContent {
    /// Classify raw input: anything starting with `=` (after trimming) is a formula
    pub fn from_raw<S: AsRef<str>>(raw: S) -> Self {
        let raw = raw.as_ref();
        let trimmed = raw.trim();
        if trimmed.starts_with('=') {
            CellContent::Formula(trimmed.to_string())
        } else {
            CellContent::Literal(raw.to_string())
        }
    }

    /// An empty literal
    pub fn empty() -> Self {
        CellContent::Literal(String::new())
    }

    /// Check if this is an empty literal
    pub fn is_empty(&self) -> bool {
        matches!(self, CellContent::Literal(s) if s.is_empty())
    }

    /// Check if the content is a formula
    pub fn is_formula(&self) -> bool {
        matches!(self, CellContent::Formula(_))
    }

    /// Get the formula text if this is a formula
    pub fn formula_text(&self) -> Option<&str> {
        match self {
            CellContent::Formula(text) => Some(text),
            CellContent::Literal(_) => None,
        }
    }

    /// The raw text as the user would see it in an edit box
    pub fn raw(&self) -> &str {
        match self {
            CellContent::Literal(s) | CellContent::Formula(s) => s,
        }
    }
}

impl Default for CellContent {
    fn default() -> Self {
        CellContent::empty()
    }
}

impl fmt::Display for CellContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw())
    }
}

/// Declared type of a cell, controlling how literals are read and validated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CellType {
    /// Numbers, booleans and text are all accepted
    #[default]
    General,
    /// Only numeric literals are accepted
    Numeric,
    /// Only `YYYY-MM-DD` calendar dates are accepted
    Date,
}

impl CellType {
    /// Lowercase name, used in messages and by the CLI
    pub fn name(&self) -> &'static str {
        match self {
            CellType::General => "general",
            CellType::Numeric => "numeric",
            CellType::Date => "date",
        }
    }

    /// Parse a type name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "general" => Some(CellType::General),
            "numeric" | "number" => Some(CellType::Numeric),
            "date" => Some(CellType::Date),
            _ => None,
        }
    }

    /// Interpret literal text under this type
    ///
    /// Returns `None` when the text is not acceptable for the type. Empty
    /// text is always accepted and yields [`CellValue::Empty`].
    pub fn interpret(&self, text: &str) -> Option<CellValue> {
        if text.trim().is_empty() {
            return Some(CellValue::Empty);
        }
        match self {
            CellType::General => Some(CellValue::from_literal(text)),
            CellType::Numeric => parse_number(text).map(CellValue::Number),
            CellType::Date => {
                parse_date(text).map(|d| CellValue::Text(d.format("%Y-%m-%d").to_string()))
            }
        }
    }
}

/// Strict numeric parse used for literals; rejects `inf`/`NaN` spellings
pub fn parse_number(text: &str) -> Option<f64> {
    let n: f64 = text.trim().parse().ok()?;
    n.is_finite().then_some(n)
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    let shape_ok = text.len() == 10
        && text.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !shape_ok {
        return None;
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()
}

/// The computed value of a cell
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    /// Blank cell
    #[default]
    Empty,

    /// Boolean value (TRUE/FALSE)
    Boolean(bool),

    /// Numeric value
    Number(f64),

    /// Text value
    Text(String),

    /// Error value (#REF!, #DIV/0!, etc.)
    Error(CellError),
}

impl CellValue {
    /// Create a new text value
    pub fn text<S: Into<String>>(s: S) -> Self {
        CellValue::Text(s.into())
    }

    /// Best-effort reading of literal text: number, then boolean, then text
    pub fn from_literal(text: &str) -> Self {
        if text.trim().is_empty() {
            return CellValue::Empty;
        }
        if let Some(n) = parse_number(text) {
            return CellValue::Number(n);
        }
        match text.trim().to_ascii_uppercase().as_str() {
            "TRUE" => CellValue::Boolean(true),
            "FALSE" => CellValue::Boolean(false),
            _ => CellValue::Text(text.to_string()),
        }
    }

    /// Check if the cell is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Check if the cell contains an error
    pub fn is_error(&self) -> bool {
        matches!(self, CellValue::Error(_))
    }

    /// Get the error if this is one
    pub fn error(&self) -> Option<CellError> {
        match self {
            CellValue::Error(e) => Some(*e),
            _ => None,
        }
    }

    /// Try to get the value as a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Boolean(true) => Some(1.0),
            CellValue::Boolean(false) => Some(0.0),
            _ => None,
        }
    }

    /// Try to get the value as a string slice
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            CellValue::Empty => "empty",
            CellValue::Boolean(_) => "boolean",
            CellValue::Number(_) => "number",
            CellValue::Text(_) => "text",
            CellValue::Error(_) => "error",
        }
    }
}

/// Render a number the way a grid shows it: integers without a fraction
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => write!(f, ""),
            CellValue::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            CellValue::Number(n) => write!(f, "{}", format_number(*n)),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Error(e) => write!(f, "{}", e),
        }
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::text(s)
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<CellError> for CellValue {
    fn from(e: CellError) -> Self {
        CellValue::Error(e)
    }
}

/// Per-cell error kinds
///
/// Every failure inside a formula ends up as one of these, stored as the
/// cell's value. None of them is fatal to a recalculation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellError {
    /// Malformed formula text
    Syntax,
    /// #NAME? - Unknown function or name
    Name,
    /// #REF! - Reference out of bounds or deleted
    Ref,
    /// #DIV/0! - Division by zero or a non-finite result
    Div0,
    /// #CIRCULAR! - Cell takes part in a reference cycle
    Circular,
    /// #ERROR - Any other evaluation failure
    Eval,
}

impl CellError {
    /// Get the display string for this error
    pub fn as_str(&self) -> &'static str {
        match self {
            CellError::Syntax => "#ERROR",
            CellError::Name => "#NAME?",
            CellError::Ref => "#REF!",
            CellError::Div0 => "#DIV/0!",
            CellError::Circular => "#CIRCULAR!",
            CellError::Eval => "#ERROR",
        }
    }

    /// Parse an error token as written in formula text
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "#NAME?" => Some(CellError::Name),
            "#REF!" => Some(CellError::Ref),
            "#DIV/0!" => Some(CellError::Div0),
            "#CIRCULAR!" => Some(CellError::Circular),
            "#ERROR" => Some(CellError::Eval),
            _ => None,
        }
    }

    /// Ordering key used when comparing two error values
    pub fn code(&self) -> u8 {
        match self {
            CellError::Syntax => 0,
            CellError::Name => 1,
            CellError::Ref => 2,
            CellError::Div0 => 3,
            CellError::Circular => 4,
            CellError::Eval => 5,
        }
    }
}

impl fmt::Display for CellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
