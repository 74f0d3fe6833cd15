//! Formula parser
//!
//! A recursive descent parser for formulas with proper operator precedence.

use crate::ast::{BinaryOperator, FormulaExpr, RangeReference, UnaryOperator};
use crate::error::{FormulaError, FormulaResult};
use crate::functions;
use sheetcalc_core::{CellError, CellReference};

/// Deepest nesting of parentheses, function calls and prefix operators
pub const MAX_NESTING: usize = 64;

/// Upper bound on the depth of a parsed expression tree
pub const MAX_DEPTH: usize = 256;

/// Parse a formula string into an AST
///
/// Unknown function names and bare names fail with a name error; everything
/// else that is malformed fails with [`FormulaError::Parse`]. So do formulas
/// nesting deeper than [`MAX_NESTING`] or chaining operators past
/// [`MAX_DEPTH`], which keeps every later walk of the tree shallow.
///
/// # Example
/// ```rust
/// use sheetcalc_formula::parse_formula;
///
/// let ast = parse_formula("=1+2").unwrap();
/// let ast = parse_formula("=SUM(A1:A10)").unwrap();
/// let ast = parse_formula("=IF(A1>0,\"Yes\",\"No\")").unwrap();
/// assert!(parse_formula("=NOPE(A1)").is_err());
/// ```
pub fn parse_formula(formula: &str) -> FormulaResult<FormulaExpr> {
    let formula = formula.trim();

    let formula = formula
        .strip_prefix('=')
        .ok_or_else(|| FormulaError::Parse("Formula must start with '='".into()))?;

    let mut parser = FormulaParser::new(formula);
    let expr = parser.parse_expression()?;

    if !matches!(parser.current_token(), Token::Eof) {
        return Err(FormulaError::Parse(format!(
            "Unexpected {:?} after expression",
            parser.current_token()
        )));
    }

    Ok(expr)
}

/// Token types
#[derive(Debug, Clone, PartialEq)]
enum Token {
    // Literals
    Number(f64),
    String(String),
    Boolean(bool),
    Error(CellError),

    // Identifiers and references
    Identifier(String), // Function name or unknown name
    CellRef(String),    // Cell reference like A1, $A$1

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Percent,
    Ampersand,
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    Colon,
    Comma,

    // Delimiters
    LeftParen,
    RightParen,

    // Lexical problems
    Unterminated,
    Invalid(char),

    // End of input
    Eof,
}

/// Formula parser
struct FormulaParser<'a> {
    input: &'a str,
    pos: usize,
    current_token: Option<Token>,
    /// Open parentheses, calls and prefix operators around the current token
    nesting: usize,
    /// Depth of the tree being built at the current token
    depth: usize,
}

impl<'a> FormulaParser<'a> {
    fn new(input: &'a str) -> Self {
        let mut parser = Self {
            input,
            pos: 0,
            current_token: None,
            nesting: 0,
            depth: 0,
        };
        parser.advance_token();
        parser
    }

    // === Token scanning ===

    fn advance_token(&mut self) {
        self.skip_whitespace();
        self.current_token = Some(self.scan_token());
    }

    fn scan_token(&mut self) -> Token {
        self.skip_whitespace();

        let c = match self.peek_char() {
            Some(c) => c,
            None => return Token::Eof,
        };

        // Single-character tokens
        let single = match c {
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            '*' => Some(Token::Star),
            '/' => Some(Token::Slash),
            '^' => Some(Token::Caret),
            '%' => Some(Token::Percent),
            '&' => Some(Token::Ampersand),
            ':' => Some(Token::Colon),
            ',' => Some(Token::Comma),
            '(' => Some(Token::LeftParen),
            ')' => Some(Token::RightParen),
            '=' => Some(Token::Equal),
            _ => None,
        };
        if let Some(token) = single {
            self.advance();
            return token;
        }

        // Two-character operators
        if c == '<' {
            self.advance();
            if self.peek_char() == Some('=') {
                self.advance();
                return Token::LessEqual;
            } else if self.peek_char() == Some('>') {
                self.advance();
                return Token::NotEqual;
            }
            return Token::LessThan;
        }

        if c == '>' {
            self.advance();
            if self.peek_char() == Some('=') {
                self.advance();
                return Token::GreaterEqual;
            }
            return Token::GreaterThan;
        }

        // String literal
        if c == '"' {
            return self.scan_string();
        }

        // Number
        if c.is_ascii_digit()
            || (c == '.' && self.peek_char_at(1).map_or(false, |c| c.is_ascii_digit()))
        {
            return self.scan_number();
        }

        // Identifier, cell reference, or boolean/error
        if c.is_ascii_alphabetic() || c == '_' || c == '$' || c == '#' {
            return self.scan_identifier_or_ref();
        }

        self.advance();
        Token::Invalid(c)
    }

    fn scan_string(&mut self) -> Token {
        self.advance(); // Skip opening quote

        let mut s = String::new();
        while let Some(c) = self.peek_char() {
            if c == '"' {
                // Check for escaped quote ("")
                if self.peek_char_at(1) == Some('"') {
                    s.push('"');
                    self.advance();
                    self.advance();
                } else {
                    self.advance();
                    return Token::String(s);
                }
            } else {
                s.push(c);
                self.advance();
            }
        }

        Token::Unterminated
    }

    fn scan_number(&mut self) -> Token {
        let start = self.pos;

        // Integer part
        while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
            self.advance();
        }

        // Decimal part
        if self.peek_char() == Some('.') {
            self.advance();
            while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        // Exponent part, only when digits follow
        if self.peek_char().map_or(false, |c| c == 'e' || c == 'E') {
            let sign = self.peek_char_at(1).map_or(false, |c| c == '+' || c == '-');
            let digit_at = if sign { 2 } else { 1 };
            if self
                .peek_char_at(digit_at)
                .map_or(false, |c| c.is_ascii_digit())
            {
                for _ in 0..digit_at {
                    self.advance();
                }
                while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                    self.advance();
                }
            }
        }

        match self.input[start..self.pos].parse::<f64>() {
            Ok(num) => Token::Number(num),
            Err(_) => Token::Invalid('.'),
        }
    }

    fn scan_identifier_or_ref(&mut self) -> Token {
        // Error literals (#REF!, #DIV/0!, ...)
        if self.peek_char() == Some('#') {
            let start = self.pos;
            self.advance();
            while self.peek_char().map_or(false, |c| {
                c.is_ascii_alphanumeric() || c == '!' || c == '/' || c == '?'
            }) {
                self.advance();
            }
            let error_str = &self.input[start..self.pos];
            return match CellError::from_str(error_str) {
                Some(err) => Token::Error(err),
                None => Token::Invalid('#'),
            };
        }

        let start = self.pos;

        while self.peek_char().map_or(false, |c| {
            c.is_ascii_alphanumeric() || c == '_' || c == '$' || c == '.'
        }) {
            self.advance();
        }

        let text = &self.input[start..self.pos];
        let followed_by_paren = self.peek_non_space() == Some('(');

        // Booleans, unless used as a function name
        let upper = text.to_uppercase();
        if upper == "TRUE" && !followed_by_paren {
            return Token::Boolean(true);
        }
        if upper == "FALSE" && !followed_by_paren {
            return Token::Boolean(false);
        }

        // Letters followed by digits is a cell reference, unless it is a
        // function call (e.g. LOG10(100))
        if Self::looks_like_cell_reference(text) && !followed_by_paren {
            return Token::CellRef(text.to_string());
        }

        Token::Identifier(text.to_string())
    }

    fn looks_like_cell_reference(text: &str) -> bool {
        // [$]letters[$]digits
        let bytes = text.as_bytes();
        let mut i = 0;

        if bytes.get(i) == Some(&b'$') {
            i += 1;
        }

        let letter_start = i;
        while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
            i += 1;
        }
        if i == letter_start {
            return false;
        }

        if bytes.get(i) == Some(&b'$') {
            i += 1;
        }

        let digit_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == digit_start {
            return false;
        }

        i == bytes.len()
    }

    // === Helper methods ===

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn peek_non_space(&self) -> Option<char> {
        self.input[self.pos..].chars().find(|c| !c.is_whitespace())
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().map_or(false, |c| c.is_whitespace()) {
            self.advance();
        }
    }

    fn current_token(&self) -> &Token {
        self.current_token.as_ref().unwrap_or(&Token::Eof)
    }

    fn consume(&mut self) -> Token {
        let token = self.current_token.take().unwrap_or(Token::Eof);
        self.advance_token();
        token
    }

    fn expect(&mut self, expected: &Token) -> FormulaResult<()> {
        if self.current_token() == expected {
            self.consume();
            Ok(())
        } else {
            Err(FormulaError::Parse(format!(
                "Expected {:?}, got {:?}",
                expected,
                self.current_token()
            )))
        }
    }

    // === Expression parsing with precedence ===
    // Precedence (lowest to highest):
    // 1. Comparison: =, <>, <, <=, >, >=
    // 2. Concatenation: &
    // 3. Addition/Subtraction: +, -
    // 4. Multiplication/Division: *, /
    // 5. Exponentiation: ^
    // 6. Unary: -, %
    // 7. Range: :
    // 8. Primary: literals, references, function calls, parentheses

    fn parse_expression(&mut self) -> FormulaResult<FormulaExpr> {
        self.parse_comparison()
    }

    /// Run `parse` one nesting level deeper
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> FormulaResult<T>,
    ) -> FormulaResult<T> {
        if self.nesting >= MAX_NESTING {
            return Err(FormulaError::Parse(format!(
                "Formula nests more than {} levels deep",
                MAX_NESTING
            )));
        }
        self.deepen()?;
        self.nesting += 1;
        let result = parse(self);
        self.nesting -= 1;
        self.depth -= 1;
        result
    }

    /// Account for one more level of tree below the current node
    fn deepen(&mut self) -> FormulaResult<()> {
        if self.depth >= MAX_DEPTH {
            return Err(FormulaError::Parse(format!(
                "Formula is more than {} operators deep",
                MAX_DEPTH
            )));
        }
        self.depth += 1;
        Ok(())
    }

    fn parse_comparison(&mut self) -> FormulaResult<FormulaExpr> {
        let start = self.depth;
        let mut left = self.parse_concatenation()?;

        loop {
            let op = match self.current_token() {
                Token::Equal => BinaryOperator::Equal,
                Token::NotEqual => BinaryOperator::NotEqual,
                Token::LessThan => BinaryOperator::LessThan,
                Token::LessEqual => BinaryOperator::LessEqual,
                Token::GreaterThan => BinaryOperator::GreaterThan,
                Token::GreaterEqual => BinaryOperator::GreaterEqual,
                _ => break,
            };

            self.deepen()?;
            self.consume();
            let right = self.parse_concatenation()?;
            left = FormulaExpr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        self.depth = start;
        Ok(left)
    }

    fn parse_concatenation(&mut self) -> FormulaResult<FormulaExpr> {
        let start = self.depth;
        let mut left = self.parse_additive()?;

        while matches!(self.current_token(), Token::Ampersand) {
            self.deepen()?;
            self.consume();
            let right = self.parse_additive()?;
            left = FormulaExpr::BinaryOp {
                op: BinaryOperator::Concat,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        self.depth = start;
        Ok(left)
    }

    fn parse_additive(&mut self) -> FormulaResult<FormulaExpr> {
        let start = self.depth;
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.current_token() {
                Token::Plus => BinaryOperator::Add,
                Token::Minus => BinaryOperator::Subtract,
                _ => break,
            };

            self.deepen()?;
            self.consume();
            let right = self.parse_multiplicative()?;
            left = FormulaExpr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        self.depth = start;
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> FormulaResult<FormulaExpr> {
        let start = self.depth;
        let mut left = self.parse_exponent()?;

        loop {
            let op = match self.current_token() {
                Token::Star => BinaryOperator::Multiply,
                Token::Slash => BinaryOperator::Divide,
                _ => break,
            };

            self.deepen()?;
            self.consume();
            let right = self.parse_exponent()?;
            left = FormulaExpr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        self.depth = start;
        Ok(left)
    }

    fn parse_exponent(&mut self) -> FormulaResult<FormulaExpr> {
        let left = self.parse_unary()?;

        if matches!(self.current_token(), Token::Caret) {
            self.consume();
            let right = self.nested(Self::parse_exponent)?; // Right associative
            return Ok(FormulaExpr::BinaryOp {
                op: BinaryOperator::Power,
                left: Box::new(left),
                right: Box::new(right),
            });
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> FormulaResult<FormulaExpr> {
        // Prefix unary minus
        if matches!(self.current_token(), Token::Minus) {
            self.consume();
            let operand = self.nested(Self::parse_unary)?;
            return Ok(FormulaExpr::UnaryOp {
                op: UnaryOperator::Negate,
                operand: Box::new(operand),
            });
        }

        // Prefix plus (no-op)
        if matches!(self.current_token(), Token::Plus) {
            self.consume();
            return self.nested(Self::parse_unary);
        }

        // Parse primary, then check for postfix percent
        let mut expr = self.parse_range()?;

        while matches!(self.current_token(), Token::Percent) {
            self.consume();
            expr = FormulaExpr::UnaryOp {
                op: UnaryOperator::Percent,
                operand: Box::new(expr),
            };
        }

        Ok(expr)
    }

    fn parse_range(&mut self) -> FormulaResult<FormulaExpr> {
        let left = self.parse_primary()?;

        if !matches!(self.current_token(), Token::Colon) {
            return Ok(left);
        }

        self.consume();
        let right = self.parse_primary()?;

        match (left, right) {
            (FormulaExpr::CellRef(start), FormulaExpr::CellRef(end)) => {
                Ok(FormulaExpr::RangeRef(RangeReference { start, end }))
            }
            _ => Err(FormulaError::Parse(
                "Range operator needs a cell reference on both sides".into(),
            )),
        }
    }

    fn parse_primary(&mut self) -> FormulaResult<FormulaExpr> {
        match self.consume() {
            Token::Number(n) => Ok(FormulaExpr::Number(n)),

            Token::String(s) => Ok(FormulaExpr::String(s)),

            Token::Boolean(b) => Ok(FormulaExpr::Boolean(b)),

            Token::Error(e) => Ok(FormulaExpr::Error(e)),

            Token::LeftParen => {
                let expr = self.nested(Self::parse_expression)?;
                self.expect(&Token::RightParen)?;
                Ok(expr)
            }

            Token::CellRef(ref_str) => self.parse_cell_reference(&ref_str),

            Token::Identifier(name) => {
                if matches!(self.current_token(), Token::LeftParen) {
                    self.parse_function_call(name)
                } else if name.contains('$') {
                    Err(FormulaError::Parse(format!(
                        "Malformed reference '{}'",
                        name
                    )))
                } else {
                    Err(FormulaError::UnknownName(name))
                }
            }

            Token::Unterminated => Err(FormulaError::Parse("Unterminated string literal".into())),

            other => Err(FormulaError::Parse(format!("Unexpected token: {:?}", other))),
        }
    }

    fn parse_function_call(&mut self, name: String) -> FormulaResult<FormulaExpr> {
        let name = name.to_uppercase();
        if !functions::is_builtin(&name) {
            return Err(FormulaError::UnknownFunction(name));
        }

        self.expect(&Token::LeftParen)?;

        let mut args = Vec::new();

        if !matches!(self.current_token(), Token::RightParen) {
            args.push(self.nested(Self::parse_expression)?);

            while matches!(self.current_token(), Token::Comma) {
                self.consume();
                args.push(self.nested(Self::parse_expression)?);
            }
        }

        self.expect(&Token::RightParen)?;

        Ok(FormulaExpr::Function { name, args })
    }

    fn parse_cell_reference(&mut self, ref_str: &str) -> FormulaResult<FormulaExpr> {
        let reference = CellReference::parse(ref_str).map_err(|e| {
            FormulaError::Parse(format!("Invalid cell reference '{}': {}", ref_str, e))
        })?;

        Ok(FormulaExpr::CellRef(reference))
    }
}
