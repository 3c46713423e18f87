//! Formula parser
//!
//! A recursive descent parser with standard operator precedence. Input is
//! the raw cell text including the leading `=`.

use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::error::{FormulaError, FormulaResult};
use tabula_core::{Address, Range};

/// Parse a formula string (leading `=` required) into an expression tree
///
/// # Example
/// ```rust
/// use tabula_formula::parse_formula;
///
/// parse_formula("=1+2*3").unwrap();
/// parse_formula("=SUM(A1:A10)").unwrap();
/// parse_formula("=IF(A1>0,\"yes\",\"no\")").unwrap();
/// ```
pub fn parse_formula(formula: &str) -> FormulaResult<Expr> {
    let body = formula
        .trim()
        .strip_prefix('=')
        .ok_or_else(|| FormulaError::Parse("formula must start with '='".into()))?;

    let mut parser = Parser::new(body);
    let expr = parser.parse_expression()?;

    if !matches!(parser.current(), Token::Eof) {
        return Err(FormulaError::Parse(format!(
            "unexpected trailing input near '{}'",
            &parser.input[parser.token_start..]
        )));
    }

    Ok(expr)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Text(String),
    /// A string literal missing its closing quote
    UnterminatedText,
    Bool(bool),
    Identifier(String), // Function name
    CellRef(String),    // Looks like A1 / aa10
    Plus,
    Minus,
    Star,
    Slash,
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    Colon,
    Comma,
    LeftParen,
    RightParen,
    Eof,
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    token_start: usize,
    current: Token,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        let mut parser = Self {
            input,
            pos: 0,
            token_start: 0,
            current: Token::Eof,
        };
        parser.advance();
        parser
    }

    // === Token scanning ===

    fn advance(&mut self) {
        self.skip_whitespace();
        self.token_start = self.pos;
        self.current = self.scan_token();
    }

    fn scan_token(&mut self) -> Token {
        let c = match self.peek_char() {
            Some(c) => c,
            None => return Token::Eof,
        };

        match c {
            '+' => {
                self.bump();
                return Token::Plus;
            }
            '-' => {
                self.bump();
                return Token::Minus;
            }
            '*' => {
                self.bump();
                return Token::Star;
            }
            '/' => {
                self.bump();
                return Token::Slash;
            }
            ':' => {
                self.bump();
                return Token::Colon;
            }
            ',' => {
                self.bump();
                return Token::Comma;
            }
            '(' => {
                self.bump();
                return Token::LeftParen;
            }
            ')' => {
                self.bump();
                return Token::RightParen;
            }
            '=' => {
                self.bump();
                return Token::Equal;
            }
            _ => {}
        }

        if c == '<' {
            self.bump();
            return match self.peek_char() {
                Some('=') => {
                    self.bump();
                    Token::LessEqual
                }
                Some('>') => {
                    self.bump();
                    Token::NotEqual
                }
                _ => Token::LessThan,
            };
        }

        if c == '>' {
            self.bump();
            if self.peek_char() == Some('=') {
                self.bump();
                return Token::GreaterEqual;
            }
            return Token::GreaterThan;
        }

        if c == '"' {
            return self.scan_string();
        }

        if c.is_ascii_digit() || (c == '.' && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()))
        {
            return self.scan_number();
        }

        if c.is_ascii_alphabetic() || c == '_' {
            return self.scan_word();
        }

        // Unknown character: surface it as an identifier so the parser
        // reports a useful error
        self.bump();
        Token::Identifier(c.to_string())
    }

    fn scan_string(&mut self) -> Token {
        self.bump(); // opening quote

        let mut s = String::new();
        while let Some(c) = self.peek_char() {
            if c == '"' {
                // Doubled quote is an escaped quote
                if self.peek_at(1) == Some('"') {
                    s.push('"');
                    self.bump();
                    self.bump();
                } else {
                    break;
                }
            } else {
                s.push(c);
                self.bump();
            }
        }

        if self.peek_char() != Some('"') {
            return Token::UnterminatedText;
        }
        self.bump();

        Token::Text(s)
    }

    fn scan_number(&mut self) -> Token {
        let start = self.pos;

        while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
        if self.peek_char() == Some('.') {
            self.bump();
            while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
                self.bump();
            }
        }
        if self.peek_char().is_some_and(|c| c == 'e' || c == 'E') {
            self.bump();
            if self.peek_char().is_some_and(|c| c == '+' || c == '-') {
                self.bump();
            }
            while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
                self.bump();
            }
        }

        let num = self.input[start..self.pos].parse().unwrap_or(0.0);
        Token::Number(num)
    }

    fn scan_word(&mut self) -> Token {
        let start = self.pos;
        while self
            .peek_char()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            self.bump();
        }

        let text = &self.input[start..self.pos];
        let upper = text.to_uppercase();

        // TRUE/FALSE are literals unless they open a call
        if self.peek_char() != Some('(') {
            if upper == "TRUE" {
                return Token::Bool(true);
            }
            if upper == "FALSE" {
                return Token::Bool(false);
            }
            if is_cell_reference(text) {
                return Token::CellRef(upper);
            }
        }

        Token::Identifier(upper)
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn current(&self) -> &Token {
        &self.current
    }

    fn consume(&mut self) -> Token {
        let token = std::mem::replace(&mut self.current, Token::Eof);
        self.advance();
        token
    }

    fn expect(&mut self, expected: &Token) -> FormulaResult<()> {
        if self.current() == expected {
            self.consume();
            Ok(())
        } else {
            Err(FormulaError::Parse(format!(
                "expected {:?}, got {:?}",
                expected,
                self.current()
            )))
        }
    }

    // === Expression parsing with precedence ===
    // Lowest to highest: comparison, additive, multiplicative, unary, primary.

    fn parse_expression(&mut self) -> FormulaResult<Expr> {
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> FormulaResult<Expr> {
        let mut left = self.parse_additive()?;

        loop {
            let op = match self.current() {
                Token::Equal => BinaryOp::Equal,
                Token::NotEqual => BinaryOp::NotEqual,
                Token::LessThan => BinaryOp::LessThan,
                Token::LessEqual => BinaryOp::LessEqual,
                Token::GreaterThan => BinaryOp::GreaterThan,
                Token::GreaterEqual => BinaryOp::GreaterEqual,
                _ => break,
            };

            self.consume();
            let right = self.parse_additive()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_additive(&mut self) -> FormulaResult<Expr> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.current() {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Subtract,
                _ => break,
            };

            self.consume();
            let right = self.parse_multiplicative()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> FormulaResult<Expr> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.current() {
                Token::Star => BinaryOp::Multiply,
                Token::Slash => BinaryOp::Divide,
                _ => break,
            };

            self.consume();
            let right = self.parse_unary()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> FormulaResult<Expr> {
        if matches!(self.current(), Token::Minus) {
            self.consume();
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Negate,
                operand: Box::new(operand),
            });
        }

        // Prefix plus is a no-op
        if matches!(self.current(), Token::Plus) {
            self.consume();
            return self.parse_unary();
        }

        self.parse_primary()
    }

    fn parse_primary(&mut self) -> FormulaResult<Expr> {
        match self.current().clone() {
            Token::Number(n) => {
                self.consume();
                Ok(Expr::Number(n))
            }

            Token::Text(s) => {
                self.consume();
                Ok(Expr::Text(s))
            }

            Token::UnterminatedText => Err(FormulaError::Parse(
                "unterminated string literal".into(),
            )),

            Token::Bool(b) => {
                self.consume();
                Ok(Expr::Bool(b))
            }

            Token::LeftParen => {
                self.consume();
                let expr = self.parse_expression()?;
                self.expect(&Token::RightParen)?;
                Ok(expr)
            }

            Token::CellRef(ref_str) => {
                self.consume();
                let start = parse_address(&ref_str)?;

                // A colon after a cell reference makes a range
                if matches!(self.current(), Token::Colon) {
                    self.consume();
                    match self.consume() {
                        Token::CellRef(end_str) => {
                            let end = parse_address(&end_str)?;
                            Ok(Expr::RangeRef(Range::new(start, end)))
                        }
                        other => Err(FormulaError::Parse(format!(
                            "expected cell reference after ':', got {:?}",
                            other
                        ))),
                    }
                } else {
                    Ok(Expr::CellRef(start))
                }
            }

            Token::Identifier(name) => {
                self.consume();
                if matches!(self.current(), Token::LeftParen) {
                    self.parse_call(name)
                } else {
                    Err(FormulaError::Parse(format!(
                        "unexpected identifier '{}'",
                        name
                    )))
                }
            }

            other => Err(FormulaError::Parse(format!("unexpected token: {:?}", other))),
        }
    }

    fn parse_call(&mut self, name: String) -> FormulaResult<Expr> {
        self.expect(&Token::LeftParen)?;

        let mut args = Vec::new();
        if !matches!(self.current(), Token::RightParen) {
            args.push(self.parse_expression()?);
            while matches!(self.current(), Token::Comma) {
                self.consume();
                args.push(self.parse_expression()?);
            }
        }

        self.expect(&Token::RightParen)?;
        Ok(Expr::Call { name, args })
    }
}

fn parse_address(s: &str) -> FormulaResult<Address> {
    Address::parse(s).map_err(|e| FormulaError::Parse(format!("invalid cell reference: {}", e)))
}

/// Check if a word looks like a cell reference: letters then digits
fn is_cell_reference(text: &str) -> bool {
    let letters = text.chars().take_while(|c| c.is_ascii_alphabetic()).count();
    let digits = text.chars().skip(letters).count();
    letters > 0
        && digits > 0
        && text.chars().skip(letters).all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn addr(s: &str) -> Address {
        Address::parse(s).unwrap()
    }

    #[test]
    fn test_parse_literals() {
        assert_eq!(parse_formula("=42").unwrap(), Expr::Number(42.0));
        assert_eq!(parse_formula("=3.14").unwrap(), Expr::Number(3.14));
        assert_eq!(parse_formula("=1e3").unwrap(), Expr::Number(1000.0));
        assert_eq!(
            parse_formula("=\"hi\"").unwrap(),
            Expr::Text("hi".into())
        );
        assert_eq!(
            parse_formula("=\"a\"\"b\"").unwrap(),
            Expr::Text("a\"b".into())
        );
        assert_eq!(parse_formula("=TRUE").unwrap(), Expr::Bool(true));
    }

    #[test]
    fn test_parse_precedence() {
        // 1+(2*3), not (1+2)*3
        let ast = parse_formula("=1+2*3").unwrap();
        let Expr::Binary { op, left, right } = ast else {
            panic!("expected binary op");
        };
        assert_eq!(op, BinaryOp::Add);
        assert_eq!(*left, Expr::Number(1.0));
        assert!(matches!(
            *right,
            Expr::Binary {
                op: BinaryOp::Multiply,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_parens_override() {
        let ast = parse_formula("=(1+2)*3").unwrap();
        let Expr::Binary { op, left, .. } = ast else {
            panic!("expected binary op");
        };
        assert_eq!(op, BinaryOp::Multiply);
        assert!(matches!(
            *left,
            Expr::Binary {
                op: BinaryOp::Add,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_unary_minus() {
        let ast = parse_formula("=-A1").unwrap();
        assert!(matches!(
            ast,
            Expr::Unary {
                op: UnaryOp::Negate,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_references() {
        assert_eq!(parse_formula("=A1").unwrap(), Expr::CellRef(addr("A1")));
        // Lowercase refs are accepted in formulas and normalized
        assert_eq!(parse_formula("=b2").unwrap(), Expr::CellRef(addr("B2")));
        assert_eq!(
            parse_formula("=A1:B10").unwrap(),
            Expr::RangeRef(Range::parse("A1:B10").unwrap())
        );
        // Unordered corners normalize
        assert_eq!(
            parse_formula("=B10:A1").unwrap(),
            Expr::RangeRef(Range::parse("A1:B10").unwrap())
        );
    }

    #[test]
    fn test_parse_function_calls() {
        let ast = parse_formula("=SUM(A1:A10)").unwrap();
        let Expr::Call { name, args } = ast else {
            panic!("expected call");
        };
        assert_eq!(name, "SUM");
        assert_eq!(args.len(), 1);

        // Function names are case-insensitive
        let ast = parse_formula("=sum(1,2,3)").unwrap();
        let Expr::Call { name, args } = ast else {
            panic!("expected call");
        };
        assert_eq!(name, "SUM");
        assert_eq!(args.len(), 3);
    }

    #[test]
    fn test_parse_nested_call() {
        let ast = parse_formula("=IF(A1>0,SUM(B1:B5),0)").unwrap();
        let Expr::Call { name, args } = ast else {
            panic!("expected call");
        };
        assert_eq!(name, "IF");
        assert_eq!(args.len(), 3);
        assert!(matches!(
            &args[0],
            Expr::Binary {
                op: BinaryOp::GreaterThan,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_comparison() {
        let ast = parse_formula("=A1<>B1").unwrap();
        assert!(matches!(
            ast,
            Expr::Binary {
                op: BinaryOp::NotEqual,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_formula("1+2").is_err()); // No leading '='
        assert!(parse_formula("=1+").is_err());
        assert!(parse_formula("=(1+2").is_err());
        assert!(parse_formula("=SUM(1,").is_err());
        assert!(parse_formula("=1 2").is_err());
        assert!(parse_formula("=A1:").is_err());
        assert!(parse_formula("=FOO").is_err()); // Bare identifier
    }

    #[test]
    fn test_unterminated_string_is_parse_error() {
        assert!(parse_formula("=\"abc").is_err());
        assert!(parse_formula("=IF(A1,\"yes,\"no\")").is_err());
        // A doubled quote is an escape, not a terminator
        assert!(parse_formula("=\"ab\"\"").is_err());
    }

    #[test]
    fn test_references_collection() {
        let ast = parse_formula("=IF(A1>0,SUM(B1:B3),C9)").unwrap();
        let mut refs = Vec::new();
        ast.references(&mut refs);
        assert_eq!(
            refs,
            vec![
                crate::ast::RefItem::Cell(addr("A1")),
                crate::ast::RefItem::Range(Range::parse("B1:B3").unwrap()),
                crate::ast::RefItem::Cell(addr("C9")),
            ]
        );
    }
}
