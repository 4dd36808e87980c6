//! Expression tree for the arithmetic part of a formula.
//!
//! References stay symbolic ([`Expr::Reference`]) until the resolver swaps
//! them for [`Expr::Number`] literals. Only a fully resolved tree evaluates.

use std::fmt;

use crate::error::{FormulaError, FormulaResult};

/// Arithmetic expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Numeric literal
    Number(f64),
    /// Cell reference token as written, e.g. `B12`
    Reference(String),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Negate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
}

const PREC_ADDITIVE: u8 = 1;
const PREC_MULTIPLICATIVE: u8 = 2;
const PREC_UNARY: u8 = 3;
const PREC_POWER: u8 = 4;
const PREC_ATOM: u8 = 5;

impl BinaryOp {
    fn precedence(self) -> u8 {
        match self {
            BinaryOp::Add | BinaryOp::Subtract => PREC_ADDITIVE,
            BinaryOp::Multiply | BinaryOp::Divide => PREC_MULTIPLICATIVE,
            BinaryOp::Power => PREC_POWER,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Power => "^",
        }
    }

    fn apply(self, left: f64, right: f64) -> FormulaResult<f64> {
        match self {
            BinaryOp::Add => Ok(left + right),
            BinaryOp::Subtract => Ok(left - right),
            BinaryOp::Multiply => Ok(left * right),
            BinaryOp::Divide => {
                if right == 0.0 {
                    Err(FormulaError::DivisionByZero)
                } else {
                    Ok(left / right)
                }
            }
            BinaryOp::Power => Ok(left.powf(right)),
        }
    }
}

impl Expr {
    /// Evaluate a fully resolved expression.
    pub fn evaluate(&self) -> FormulaResult<f64> {
        let value = match self {
            Expr::Number(n) => *n,
            Expr::Reference(name) => {
                return Err(FormulaError::UnresolvedReference(name.clone()));
            }
            Expr::Unary { op, operand } => {
                let v = operand.evaluate()?;
                match op {
                    UnaryOp::Plus => v,
                    UnaryOp::Negate => -v,
                }
            }
            Expr::Binary { op, left, right } => {
                // Left before right keeps error reporting in source order.
                let l = left.evaluate()?;
                let r = right.evaluate()?;
                op.apply(l, r)?
            }
        };

        if value.is_finite() {
            Ok(value)
        } else {
            Err(FormulaError::NonFinite)
        }
    }

    /// Reference tokens in source order, duplicates included.
    pub fn references(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_references(&mut out);
        out
    }

    fn collect_references<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expr::Number(_) => {}
            Expr::Reference(name) => out.push(name),
            Expr::Unary { operand, .. } => operand.collect_references(out),
            Expr::Binary { left, right, .. } => {
                left.collect_references(out);
                right.collect_references(out);
            }
        }
    }

    /// Rebuild the tree, replacing every reference node via `f`.
    pub fn map_references<F>(self, f: &mut F) -> Expr
    where
        F: FnMut(String) -> Expr,
    {
        match self {
            Expr::Reference(name) => f(name),
            Expr::Number(n) => Expr::Number(n),
            Expr::Unary { op, operand } => Expr::Unary {
                op,
                operand: Box::new(operand.map_references(f)),
            },
            Expr::Binary { op, left, right } => {
                let left = left.map_references(f);
                let right = right.map_references(f);
                Expr::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                }
            }
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Expr::Number(n) if n.is_sign_negative() => PREC_UNARY,
            Expr::Number(_) | Expr::Reference(_) => PREC_ATOM,
            Expr::Unary { .. } => PREC_UNARY,
            Expr::Binary { op, .. } => op.precedence(),
        }
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, expr: &Expr, parens: bool) -> fmt::Result {
    if parens {
        write!(f, "({})", expr)
    } else {
        write!(f, "{}", expr)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(n) => write!(f, "{}", n),
            Expr::Reference(name) => f.write_str(name),
            Expr::Unary { op, operand } => {
                f.write_str(match op {
                    UnaryOp::Plus => "+",
                    UnaryOp::Negate => "-",
                })?;
                write_operand(f, operand, operand.precedence() < PREC_UNARY)
            }
            Expr::Binary { op, left, right } => {
                let prec = op.precedence();
                // `^` is right-associative, everything else left-associative.
                let (left_parens, right_parens) = if *op == BinaryOp::Power {
                    (left.precedence() <= prec, right.precedence() < PREC_UNARY)
                } else {
                    (left.precedence() < prec, right.precedence() <= prec)
                };
                write_operand(f, left, left_parens)?;
                write!(f, " {} ", op.symbol())?;
                write_operand(f, right, right_parens)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> Box<Expr> {
        Box::new(Expr::Number(n))
    }

    #[test]
    fn test_divide_by_zero_is_an_error() {
        let expr = Expr::Binary {
            op: BinaryOp::Divide,
            left: num(1.0),
            right: num(0.0),
        };
        assert_eq!(expr.evaluate(), Err(FormulaError::DivisionByZero));
    }

    #[test]
    fn test_unresolved_reference_does_not_evaluate() {
        let expr = Expr::Reference("A1".to_string());
        assert_eq!(
            expr.evaluate(),
            Err(FormulaError::UnresolvedReference("A1".to_string()))
        );
    }

    #[test]
    fn test_display_keeps_grouping() {
        let expr = Expr::Binary {
            op: BinaryOp::Multiply,
            left: Box::new(Expr::Binary {
                op: BinaryOp::Add,
                left: num(1.0),
                right: num(2.0),
            }),
            right: num(3.0),
        };
        assert_eq!(expr.to_string(), "(1 + 2) * 3");
    }

    #[test]
    fn test_display_parenthesises_negative_power_base() {
        let expr = Expr::Binary {
            op: BinaryOp::Power,
            left: num(-3.0),
            right: num(2.0),
        };
        assert_eq!(expr.to_string(), "(-3) ^ 2");
        assert_eq!(expr.evaluate(), Ok(9.0));
    }
}
