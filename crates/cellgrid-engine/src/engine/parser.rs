//! Arithmetic expression parser
//!
//! A recursive descent parser producing an [`Expr`] tree. Grammar, loosest
//! binding first:
//!
//! ```text
//! additive := term (('+' | '-') term)*
//! term     := unary (('*' | '/') unary)*
//! unary    := ('+' | '-') unary | power
//! power    := primary ('^' unary)?
//! primary  := NUMBER | REFERENCE | '(' additive ')'
//! ```
//!
//! `^` is right-associative and binds tighter than a leading minus, so
//! `-2^2` is `-(2^2)` while `2^-1` is accepted.

use super::ast::{BinaryOp, Expr, UnaryOp};
use crate::error::{FormulaError, FormulaResult};

/// Parse an arithmetic expression (no leading `=`) into an AST.
pub fn parse_expression(input: &str) -> FormulaResult<Expr> {
    let mut parser = Parser::new(input)?;
    if parser.current == Token::Eof {
        return Err(FormulaError::Parse {
            position: 0,
            message: "empty expression".to_string(),
        });
    }

    let node = parser.parse_additive()?;
    if parser.current != Token::Eof {
        return Err(parser.unexpected());
    }
    Ok(node.expr)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Reference(String),
    Identifier(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LeftParen,
    RightParen,
    Comma,
    Eof,
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn peek_byte(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    fn peek_byte_at(&self, offset: usize) -> Option<u8> {
        self.input.as_bytes().get(self.pos + offset).copied()
    }

    fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek_byte() {
            if b.is_ascii_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    /// Returns the next token and the byte offset it starts at.
    fn next_token(&mut self) -> FormulaResult<(Token, usize)> {
        self.skip_whitespace();
        let start = self.pos;

        let Some(b) = self.peek_byte() else {
            return Ok((Token::Eof, start));
        };

        let single = match b {
            b'+' => Some(Token::Plus),
            b'-' => Some(Token::Minus),
            b'*' => Some(Token::Star),
            b'/' => Some(Token::Slash),
            b'^' => Some(Token::Caret),
            b'(' => Some(Token::LeftParen),
            b')' => Some(Token::RightParen),
            b',' => Some(Token::Comma),
            _ => None,
        };
        if let Some(token) = single {
            self.pos += 1;
            return Ok((token, start));
        }

        if b.is_ascii_digit() || b == b'.' {
            return self.scan_number(start).map(|n| (Token::Number(n), start));
        }

        if b.is_ascii_alphabetic() {
            return Ok((self.scan_word(start), start));
        }

        let ch = self.input[start..].chars().next().unwrap_or('?');
        Err(FormulaError::Parse {
            position: start,
            message: format!("unexpected character '{}'", ch),
        })
    }

    fn scan_number(&mut self, start: usize) -> FormulaResult<f64> {
        let mut digits = 0usize;
        while matches!(self.peek_byte(), Some(b) if b.is_ascii_digit()) {
            self.pos += 1;
            digits += 1;
        }
        if self.peek_byte() == Some(b'.') {
            self.pos += 1;
            while matches!(self.peek_byte(), Some(b) if b.is_ascii_digit()) {
                self.pos += 1;
                digits += 1;
            }
        }
        if digits == 0 {
            return Err(FormulaError::Parse {
                position: start,
                message: "malformed number".to_string(),
            });
        }

        // Exponent only when a digit actually follows, so `2E` stays an error
        // at the identifier rather than inside the number.
        if matches!(self.peek_byte(), Some(b'e' | b'E')) {
            let sign = usize::from(matches!(self.peek_byte_at(1), Some(b'+' | b'-')));
            if matches!(self.peek_byte_at(1 + sign), Some(b) if b.is_ascii_digit()) {
                self.pos += 1 + sign;
                while matches!(self.peek_byte(), Some(b) if b.is_ascii_digit()) {
                    self.pos += 1;
                }
            }
        }

        let text = &self.input[start..self.pos];
        text.parse::<f64>().map_err(|_| FormulaError::Parse {
            position: start,
            message: format!("malformed number '{}'", text),
        })
    }

    /// Letters followed by digits. Uppercase letters with at least one digit
    /// form a cell reference; anything else is a bare identifier.
    fn scan_word(&mut self, start: usize) -> Token {
        while matches!(self.peek_byte(), Some(b) if b.is_ascii_alphabetic()) {
            self.pos += 1;
        }
        let letters_end = self.pos;
        while matches!(self.peek_byte(), Some(b) if b.is_ascii_digit()) {
            self.pos += 1;
        }

        let word = &self.input[start..self.pos];
        let letters = &self.input[start..letters_end];
        let has_digits = self.pos > letters_end;
        if has_digits && letters.bytes().all(|b| b.is_ascii_uppercase()) {
            Token::Reference(word.to_string())
        } else {
            Token::Identifier(word.to_string())
        }
    }
}

/// Deepest parser recursion accepted (parentheses, unary signs, exponents).
const MAX_NESTING: usize = 256;
/// Tallest expression tree accepted; long operator chains grow the tree too.
const MAX_HEIGHT: usize = 1024;

/// A parsed subtree and its height.
struct Node {
    expr: Expr,
    height: usize,
}

impl Node {
    fn leaf(expr: Expr) -> Node {
        Node { expr, height: 1 }
    }
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    current_pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> FormulaResult<Self> {
        let mut lexer = Lexer::new(input);
        let (current, current_pos) = lexer.next_token()?;
        Ok(Self {
            lexer,
            current,
            current_pos,
            depth: 0,
        })
    }

    fn advance(&mut self) -> FormulaResult<Token> {
        let (next, pos) = self.lexer.next_token()?;
        self.current_pos = pos;
        Ok(std::mem::replace(&mut self.current, next))
    }

    fn unexpected(&self) -> FormulaError {
        let message = match &self.current {
            Token::Eof => "unexpected end of expression".to_string(),
            Token::Identifier(name) => format!("unknown identifier '{}'", name),
            other => format!("unexpected token {:?}", other),
        };
        FormulaError::Parse {
            position: self.current_pos,
            message,
        }
    }

    fn too_deep(&self) -> FormulaError {
        FormulaError::Parse {
            position: self.current_pos,
            message: "expression nested too deeply".to_string(),
        }
    }

    fn unary(&self, op: UnaryOp, operand: Node) -> FormulaResult<Node> {
        let height = operand.height + 1;
        if height > MAX_HEIGHT {
            return Err(self.too_deep());
        }
        Ok(Node {
            expr: Expr::Unary {
                op,
                operand: Box::new(operand.expr),
            },
            height,
        })
    }

    fn binary(&self, op: BinaryOp, left: Node, right: Node) -> FormulaResult<Node> {
        let height = left.height.max(right.height) + 1;
        if height > MAX_HEIGHT {
            return Err(self.too_deep());
        }
        Ok(Node {
            expr: Expr::Binary {
                op,
                left: Box::new(left.expr),
                right: Box::new(right.expr),
            },
            height,
        })
    }

    fn parse_additive(&mut self) -> FormulaResult<Node> {
        let mut left = self.parse_term()?;
        loop {
            let op = match self.current {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Subtract,
                _ => return Ok(left),
            };
            self.advance()?;
            let right = self.parse_term()?;
            left = self.binary(op, left, right)?;
        }
    }

    fn parse_term(&mut self) -> FormulaResult<Node> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.current {
                Token::Star => BinaryOp::Multiply,
                Token::Slash => BinaryOp::Divide,
                _ => return Ok(left),
            };
            self.advance()?;
            let right = self.parse_unary()?;
            left = self.binary(op, left, right)?;
        }
    }

    /// Every recursive path (groups, signs, exponents) passes through here.
    fn parse_unary(&mut self) -> FormulaResult<Node> {
        if self.depth >= MAX_NESTING {
            return Err(self.too_deep());
        }
        self.depth += 1;
        let node = self.parse_signed();
        self.depth -= 1;
        node
    }

    fn parse_signed(&mut self) -> FormulaResult<Node> {
        let op = match self.current {
            Token::Minus => UnaryOp::Negate,
            Token::Plus => UnaryOp::Plus,
            _ => return self.parse_power(),
        };
        self.advance()?;
        let operand = self.parse_unary()?;
        self.unary(op, operand)
    }

    fn parse_power(&mut self) -> FormulaResult<Node> {
        let base = self.parse_primary()?;
        if self.current != Token::Caret {
            return Ok(base);
        }
        self.advance()?;
        let exponent = self.parse_unary()?;
        self.binary(BinaryOp::Power, base, exponent)
    }

    fn parse_primary(&mut self) -> FormulaResult<Node> {
        match &self.current {
            Token::Number(n) => {
                let n = *n;
                self.advance()?;
                Ok(Node::leaf(Expr::Number(n)))
            }
            Token::Reference(name) => {
                let name = name.clone();
                self.advance()?;
                Ok(Node::leaf(Expr::Reference(name)))
            }
            Token::LeftParen => {
                self.advance()?;
                let inner = self.parse_additive()?;
                if self.current != Token::RightParen {
                    return Err(self.unexpected());
                }
                self.advance()?;
                Ok(inner)
            }
            _ => Err(self.unexpected()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(text: &str) -> FormulaResult<f64> {
        parse_expression(text)?.evaluate()
    }

    #[test]
    fn test_precedence() {
        assert_eq!(eval("2+3*4"), Ok(14.0));
        assert_eq!(eval("(2+3)*4"), Ok(20.0));
        assert_eq!(eval("10-4-3"), Ok(3.0));
        assert_eq!(eval("12/3/2"), Ok(2.0));
    }

    #[test]
    fn test_power_is_right_associative() {
        assert_eq!(eval("2^3^2"), Ok(512.0));
        assert_eq!(eval("-2^2"), Ok(-4.0));
        assert_eq!(eval("2^-1"), Ok(0.5));
        assert_eq!(eval("2*3^2"), Ok(18.0));
    }

    #[test]
    fn test_number_forms() {
        assert_eq!(eval(".5 + 1.25"), Ok(1.75));
        assert_eq!(eval("1e3"), Ok(1000.0));
        assert_eq!(eval("2.5E-1"), Ok(0.25));
        assert_eq!(eval("  7  "), Ok(7.0));
    }

    #[test]
    fn test_references_are_collected_in_order() {
        let expr = parse_expression("B2 * (A1 + B2) - AA10").unwrap();
        assert_eq!(expr.references(), vec!["B2", "A1", "B2", "AA10"]);
    }

    #[test]
    fn test_lowercase_word_is_unknown_identifier() {
        let err = parse_expression("a1 + 1").unwrap_err();
        assert!(err.to_string().contains("unknown identifier 'a1'"));
    }

    #[test]
    fn test_malformed_expressions() {
        for text in ["2++", "", "   ", "(1+2", "1+2)", "3 4", "1,2", "2 $ 3", ".", "POW"] {
            assert!(
                matches!(parse_expression(text), Err(FormulaError::Parse { .. })),
                "expected parse error for {:?}",
                text
            );
        }
    }

    #[test]
    fn test_error_position_points_at_token() {
        let err = parse_expression("1 + * 2").unwrap_err();
        assert_eq!(
            err,
            FormulaError::Parse {
                position: 4,
                message: "unexpected token Star".to_string(),
            }
        );
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        let too_deep = |text: String| {
            matches!(
                parse_expression(&text),
                Err(FormulaError::Parse { message, .. }) if message == "expression nested too deeply"
            )
        };

        let n = 200_000;
        assert!(too_deep(format!("{}1{}", "(".repeat(n), ")".repeat(n))));
        assert!(too_deep(format!("{}1", "-".repeat(n))));
        assert!(too_deep(format!("2{}", "^2".repeat(n))));
        assert!(too_deep(format!("1{}", "+1".repeat(n))));
    }

    #[test]
    fn test_moderate_nesting_is_accepted() {
        let n = 200;
        assert_eq!(eval(&format!("{}1{}", "(".repeat(n), ")".repeat(n))), Ok(1.0));
        assert_eq!(eval(&format!("1{}", "+1".repeat(500))), Ok(501.0));
        assert_eq!(eval(&format!("{}5", "-".repeat(100))), Ok(5.0));
    }
}
