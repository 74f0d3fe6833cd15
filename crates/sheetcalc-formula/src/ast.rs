//! Formula Abstract Syntax Tree types

use sheetcalc_core::{format_number, CellError, CellRange, CellReference};
use std::fmt;

/// Formula expression AST
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaExpr {
    // === Literals ===
    /// Numeric literal
    Number(f64),
    /// String literal
    String(String),
    /// Boolean literal
    Boolean(bool),
    /// Error literal (also produced when relocation pushes a reference off the grid)
    Error(CellError),

    // === References ===
    /// Single cell reference
    CellRef(CellReference),
    /// Range reference
    RangeRef(RangeReference),

    // === Operators ===
    /// Binary operation
    BinaryOp {
        op: BinaryOperator,
        left: Box<FormulaExpr>,
        right: Box<FormulaExpr>,
    },
    /// Unary operation
    UnaryOp {
        op: UnaryOperator,
        operand: Box<FormulaExpr>,
    },

    // === Function call ===
    /// Name is stored uppercase
    Function { name: String, args: Vec<FormulaExpr> },
}

/// Range reference, keeping both corners as written
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeReference {
    pub start: CellReference,
    pub end: CellReference,
}

impl RangeReference {
    /// The normalized rectangle this reference covers
    pub fn range(&self) -> CellRange {
        CellRange::new(self.start.address, self.end.address)
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,

    // Comparison
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,

    // Text
    Concat,
}

impl BinaryOperator {
    /// Operator symbol as written in formula text
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Power => "^",
            BinaryOperator::Equal => "=",
            BinaryOperator::NotEqual => "<>",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterEqual => ">=",
            BinaryOperator::Concat => "&",
        }
    }

    /// Binding strength, higher binds tighter
    pub fn precedence(&self) -> u8 {
        match self {
            BinaryOperator::Equal
            | BinaryOperator::NotEqual
            | BinaryOperator::LessThan
            | BinaryOperator::LessEqual
            | BinaryOperator::GreaterThan
            | BinaryOperator::GreaterEqual => 1,
            BinaryOperator::Concat => 2,
            BinaryOperator::Add | BinaryOperator::Subtract => 3,
            BinaryOperator::Multiply | BinaryOperator::Divide => 4,
            BinaryOperator::Power => 5,
        }
    }

    /// Check if this is a comparison operator
    pub fn is_comparison(&self) -> bool {
        self.precedence() == 1
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Negate,
    Percent,
}

/// Precedence of prefix negation and postfix percent
const UNARY_PRECEDENCE: u8 = 6;
/// Precedence of anything that never needs parentheses
const ATOM_PRECEDENCE: u8 = 7;

impl FormulaExpr {
    fn precedence(&self) -> u8 {
        match self {
            FormulaExpr::BinaryOp { op, .. } => op.precedence(),
            FormulaExpr::UnaryOp { .. } => UNARY_PRECEDENCE,
            FormulaExpr::Number(n) if *n < 0.0 => UNARY_PRECEDENCE,
            _ => ATOM_PRECEDENCE,
        }
    }

    /// Render as formula text, including the leading `=`
    pub fn to_formula(&self) -> String {
        format!("={}", self)
    }

    /// Every cell and range reference in the tree, in reading order
    pub fn references(&self) -> Vec<Reference> {
        let mut refs = Vec::new();
        self.collect_references(&mut refs);
        refs
    }

    fn collect_references(&self, refs: &mut Vec<Reference>) {
        match self {
            FormulaExpr::CellRef(r) => refs.push(Reference::Cell(*r)),
            FormulaExpr::RangeRef(r) => refs.push(Reference::Range(*r)),
            FormulaExpr::BinaryOp { left, right, .. } => {
                left.collect_references(refs);
                right.collect_references(refs);
            }
            FormulaExpr::UnaryOp { operand, .. } => operand.collect_references(refs),
            FormulaExpr::Function { args, .. } => {
                for arg in args {
                    arg.collect_references(refs);
                }
            }
            FormulaExpr::Number(_)
            | FormulaExpr::String(_)
            | FormulaExpr::Boolean(_)
            | FormulaExpr::Error(_) => {}
        }
    }
}

/// A reference found in a formula
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reference {
    Cell(CellReference),
    Range(RangeReference),
}

fn write_operand(f: &mut fmt::Formatter<'_>, expr: &FormulaExpr, parens: bool) -> fmt::Result {
    if parens {
        write!(f, "({})", expr)
    } else {
        write!(f, "{}", expr)
    }
}

impl fmt::Display for FormulaExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormulaExpr::Number(n) => write!(f, "{}", format_number(*n)),
            FormulaExpr::String(s) => write!(f, "\"{}\"", s.replace('"', "\"\"")),
            FormulaExpr::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            FormulaExpr::Error(e) => write!(f, "{}", e),
            FormulaExpr::CellRef(r) => write!(f, "{}", r),
            FormulaExpr::RangeRef(r) => write!(f, "{}:{}", r.start, r.end),
            FormulaExpr::BinaryOp { op, left, right } => {
                let prec = op.precedence();
                // `^` is right associative, everything else left associative
                let (left_parens, right_parens) = if *op == BinaryOperator::Power {
                    (left.precedence() <= prec, right.precedence() < prec)
                } else {
                    (left.precedence() < prec, right.precedence() <= prec)
                };
                write_operand(f, left, left_parens)?;
                write!(f, "{}", op.symbol())?;
                write_operand(f, right, right_parens)
            }
            FormulaExpr::UnaryOp { op, operand } => match op {
                UnaryOperator::Negate => {
                    write!(f, "-")?;
                    write_operand(f, operand, operand.precedence() < UNARY_PRECEDENCE)
                }
                UnaryOperator::Percent => {
                    write_operand(f, operand, operand.precedence() <= UNARY_PRECEDENCE)?;
                    write!(f, "%")
                }
            },
            FormulaExpr::Function { name, args } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::parse_formula;

    fn roundtrip(formula: &str) -> String {
        parse_formula(formula).unwrap().to_formula()
    }

    #[test]
    fn test_render_keeps_meaningful_parentheses() {
        assert_eq!(roundtrip("=(1+2)*3"), "=(1+2)*3");
        assert_eq!(roundtrip("=1+2*3"), "=1+2*3");
        assert_eq!(roundtrip("=10-(4-3)"), "=10-(4-3)");
        assert_eq!(roundtrip("=(10-4)-3"), "=10-4-3");
        assert_eq!(roundtrip("=2^3^2"), "=2^3^2");
        assert_eq!(roundtrip("=(2^3)^2"), "=(2^3)^2");
        assert_eq!(roundtrip("=-(A1+1)"), "=-(A1+1)");
    }

    #[test]
    fn test_render_references_and_functions() {
        assert_eq!(roundtrip("=sum($A$1:b3, 4)"), "=SUM($A$1:B3,4)");
        assert_eq!(roundtrip("=IF(A1>0,\"a\"\"b\",FALSE)"), "=IF(A1>0,\"a\"\"b\",FALSE)");
        assert_eq!(roundtrip("=A1&\" \"&B1"), "=A1&\" \"&B1");
        assert_eq!(roundtrip("=#REF!+1"), "=#REF!+1");
    }

    #[test]
    fn test_references_in_reading_order() {
        let ast = parse_formula("=A1+SUM(B1:B3)*C2").unwrap();
        let refs = ast.references();
        assert_eq!(refs.len(), 3);
    }
}
