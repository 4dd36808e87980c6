//! Formula evaluation.
//!
//! A formula is classified by shape before anything is parsed:
//!
//! 1. body mentions `POW`: the first parenthesised group is evaluated and squared
//! 2. body mentions `SQRT`: the first group is split at its first comma into
//!    `(expression, root)`; the expression is evaluated and square-rooted.
//!    The root argument is ignored unless [`RootArgument::Apply`] is set.
//! 3. otherwise the whole body is plain arithmetic
//!
//! References inside the evaluated expression are resolved through the
//! supplied [`CellLookup`] before any arithmetic happens.

use log::debug;
use serde::{Deserialize, Serialize};

use super::ast::Expr;
use super::parser::parse_expression;
use super::resolve::{CellLookup, Substitution, resolve_references};
use crate::error::{FormulaError, FormulaResult};

/// What to do with the second argument of `SQRT(expr, root)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RootArgument {
    /// Always take the square root; the argument is only split off.
    #[default]
    Ignore,
    /// Take the n-th root, `value^(1/root)`. A missing root means 2.
    Apply,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EvalOptions {
    pub root_argument: RootArgument,
}

/// The recognised formula forms.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormulaShape<'a> {
    Power { inner: &'a str },
    Root { expression: &'a str, root: Option<&'a str> },
    Plain { body: &'a str },
}

impl<'a> FormulaShape<'a> {
    /// Classify a formula. The leading `=` is optional.
    pub fn detect(formula: &'a str) -> FormulaResult<FormulaShape<'a>> {
        let body = formula.strip_prefix('=').unwrap_or(formula);

        if body.contains("POW") {
            let inner =
                first_group(body).ok_or(FormulaError::MissingArgument { function: "POW" })?;
            return Ok(FormulaShape::Power { inner });
        }

        if body.contains("SQRT") {
            let group =
                first_group(body).ok_or(FormulaError::MissingArgument { function: "SQRT" })?;
            let (expression, root) = match group.split_once(',') {
                Some((expression, root)) => (expression.trim(), Some(root.trim())),
                None => (group.trim(), None),
            };
            return Ok(FormulaShape::Root { expression, root });
        }

        Ok(FormulaShape::Plain { body })
    }

    /// The text that gets parsed, resolved and evaluated.
    pub fn expression(&self) -> &'a str {
        match self {
            FormulaShape::Power { inner } => inner,
            FormulaShape::Root { expression, .. } => expression,
            FormulaShape::Plain { body } => body,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FormulaShape::Power { .. } => "POW",
            FormulaShape::Root { .. } => "SQRT",
            FormulaShape::Plain { .. } => "plain",
        }
    }
}

/// Text strictly between the first `(` and the `)` that closes it.
fn first_group(text: &str) -> Option<&str> {
    let open = text.find('(')?;
    let mut depth = 0usize;
    for (i, ch) in text[open..].char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[open + 1..open + i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Result of a successful evaluation.
#[derive(Clone, Debug, PartialEq)]
pub struct Evaluation {
    pub value: f64,
    /// The evaluated expression with every reference replaced by its value.
    pub expression: Expr,
    pub substitutions: Vec<Substitution>,
}

/// Evaluates formulas against injected lookups. Holds no state between calls.
#[derive(Clone, Debug, Default)]
pub struct FormulaEvaluator {
    options: EvalOptions,
}

impl FormulaEvaluator {
    pub fn new(options: EvalOptions) -> Self {
        Self { options }
    }

    pub fn evaluate<L>(&self, formula: &str, lookup: &L) -> FormulaResult<Evaluation>
    where
        L: CellLookup + ?Sized,
    {
        let shape = FormulaShape::detect(formula)?;
        debug!("evaluating {:?} as {} formula", formula, shape.name());

        let expr = parse_expression(shape.expression())?;
        let resolved = resolve_references(expr, lookup)?;
        let inner = resolved.expr.evaluate()?;

        let value = match shape {
            FormulaShape::Power { .. } => inner.powi(2),
            FormulaShape::Root { root, .. } => self.apply_root(inner, root)?,
            FormulaShape::Plain { .. } => inner,
        };

        if !value.is_finite() {
            return Err(FormulaError::NonFinite);
        }
        Ok(Evaluation {
            value,
            expression: resolved.expr,
            substitutions: resolved.substitutions,
        })
    }

    fn apply_root(&self, value: f64, root: Option<&str>) -> FormulaResult<f64> {
        match self.options.root_argument {
            RootArgument::Ignore => Ok(value.sqrt()),
            RootArgument::Apply => {
                let Some(root) = root else {
                    return Ok(value.sqrt());
                };
                let n = root
                    .parse::<f64>()
                    .ok()
                    .filter(|n| n.is_finite() && *n != 0.0)
                    .ok_or_else(|| FormulaError::InvalidRoot(root.to_string()))?;
                Ok(value.powf(1.0 / n))
            }
        }
    }
}

/// Evaluate a formula with default options, returning only the number.
pub fn evaluate_formula<L>(formula: &str, lookup: &L) -> FormulaResult<f64>
where
    L: CellLookup + ?Sized,
{
    FormulaEvaluator::default()
        .evaluate(formula, lookup)
        .map(|evaluation| evaluation.value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{CellRef, CellValue, LookupResult};

    #[test]
    fn test_detect_shapes() {
        assert_eq!(
            FormulaShape::detect("=POW(A1)"),
            Ok(FormulaShape::Power { inner: "A1" })
        );
        assert_eq!(
            FormulaShape::detect("=SQRT( A1 + 1 , 3 )"),
            Ok(FormulaShape::Root {
                expression: "A1 + 1",
                root: Some("3"),
            })
        );
        assert_eq!(
            FormulaShape::detect("=SQRT(A1)"),
            Ok(FormulaShape::Root {
                expression: "A1",
                root: None,
            })
        );
        assert_eq!(
            FormulaShape::detect("=A1+B1"),
            Ok(FormulaShape::Plain { body: "A1+B1" })
        );
    }

    #[test]
    fn test_pow_takes_precedence_over_sqrt() {
        let shape = FormulaShape::detect("=POW(SQRT(A1, 2))").unwrap();
        assert_eq!(shape.name(), "POW");
        assert_eq!(shape.expression(), "SQRT(A1, 2)");
    }

    #[test]
    fn test_first_group_matches_nested_parens() {
        assert_eq!(first_group("POW((1+2)*3)"), Some("(1+2)*3"));
        assert_eq!(first_group("POW(1)+(2)"), Some("1"));
        assert_eq!(first_group("POW(1"), None);
        assert_eq!(first_group("POW"), None);
    }

    #[test]
    fn test_wrapper_without_group_is_invalid() {
        assert_eq!(
            FormulaShape::detect("=POW A1"),
            Err(FormulaError::MissingArgument { function: "POW" })
        );
        assert_eq!(
            FormulaShape::detect("=SQRT"),
            Err(FormulaError::MissingArgument { function: "SQRT" })
        );
    }

    #[test]
    fn test_apply_root_option() {
        let evaluator = FormulaEvaluator::new(EvalOptions {
            root_argument: RootArgument::Apply,
        });
        let lookup = |_: &CellRef| -> LookupResult { Ok(None) };

        let cube = evaluator.evaluate("=SQRT(27, 3)", &lookup).unwrap();
        assert!((cube.value - 3.0).abs() < 1e-9);
        assert_eq!(evaluator.evaluate("=SQRT(16)", &lookup).unwrap().value, 4.0);
        assert_eq!(
            evaluator.evaluate("=SQRT(16, 0)", &lookup),
            Err(FormulaError::InvalidRoot("0".to_string()))
        );
    }

    #[test]
    fn test_square_root_of_negative_is_invalid() {
        let lookup = |_: &CellRef| -> LookupResult { Ok(None) };
        assert_eq!(
            evaluate_formula("=SQRT(0 - 4, 2)", &lookup),
            Err(FormulaError::NonFinite)
        );
    }

    #[test]
    fn test_evaluation_reports_resolved_expression() {
        let lookup = |_: &CellRef| -> LookupResult { Ok(Some(CellValue::Number(2.0))) };
        let evaluation = FormulaEvaluator::default()
            .evaluate("=POW(A1 + 1)", &lookup)
            .unwrap();
        assert_eq!(evaluation.value, 9.0);
        assert_eq!(evaluation.expression.to_string(), "2 + 1");
        assert_eq!(evaluation.substitutions.len(), 1);
    }
}
