//! Reference resolution.
//!
//! Turns every [`Expr::Reference`] in a parsed expression into a numeric
//! literal fetched through a [`CellLookup`]. Lookups run one at a time in
//! the order references first appear; a reference repeated in the same
//! expression is fetched once and every occurrence gets that value.
//!
//! A failed lookup is not an error for the formula: it is logged and the
//! reference counts as `0`. Stored text that is not a number is an error,
//! since no arithmetic could use it.

use log::{trace, warn};
use std::collections::HashMap;

use super::ast::Expr;
use super::cell::CellValue;
use super::cell_ref::CellRef;
use crate::error::{FormulaError, FormulaResult, LookupError};

/// Outcome of a single value fetch. `Ok(None)` means the cell does not
/// exist or holds nothing.
pub type LookupResult = Result<Option<CellValue>, LookupError>;

/// Read access to stored cell values.
pub trait CellLookup {
    fn fetch_cell_value(&self, cell: &CellRef) -> LookupResult;
}

impl<F> CellLookup for F
where
    F: Fn(&CellRef) -> LookupResult,
{
    fn fetch_cell_value(&self, cell: &CellRef) -> LookupResult {
        self(cell)
    }
}

/// Where a substituted value came from.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueSource {
    Stored,
    /// Cell absent or blank
    Empty,
    /// Lookup failed; the value is the `0` fallback
    LookupFailed(LookupError),
}

/// One reference replaced by a number.
#[derive(Debug, Clone, PartialEq)]
pub struct Substitution {
    pub reference: String,
    pub cell: Option<CellRef>,
    pub value: f64,
    pub source: ValueSource,
}

/// An expression with no references left, plus what was substituted.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub expr: Expr,
    pub substitutions: Vec<Substitution>,
}

impl Resolved {
    /// References that fell back to `0` because their lookup failed.
    pub fn failures(&self) -> impl Iterator<Item = &Substitution> {
        self.substitutions
            .iter()
            .filter(|s| matches!(s.source, ValueSource::LookupFailed(_)))
    }
}

/// Replace every reference in `expr` with its looked-up value.
pub fn resolve_references<L>(expr: Expr, lookup: &L) -> FormulaResult<Resolved>
where
    L: CellLookup + ?Sized,
{
    let mut values: HashMap<String, f64> = HashMap::new();
    let mut substitutions = Vec::new();

    for name in expr.references() {
        if values.contains_key(name) {
            continue;
        }
        let substitution = resolve_one(name, lookup)?;
        values.insert(name.to_string(), substitution.value);
        substitutions.push(substitution);
    }

    let expr = expr.map_references(&mut |name| {
        Expr::Number(values.get(&name).copied().unwrap_or(0.0))
    });

    Ok(Resolved {
        expr,
        substitutions,
    })
}

fn resolve_one<L>(name: &str, lookup: &L) -> FormulaResult<Substitution>
where
    L: CellLookup + ?Sized,
{
    let cell = CellRef::from_str(name);
    let fetched = match &cell {
        Some(cell) => lookup.fetch_cell_value(cell),
        None => Err(LookupError::InvalidReference(name.to_string())),
    };

    let (value, source) = match fetched {
        Ok(Some(stored)) => match numeric_value(&stored) {
            Some(Some(n)) => (n, ValueSource::Stored),
            Some(None) => (0.0, ValueSource::Empty),
            None => {
                return Err(FormulaError::NonNumericReference {
                    reference: name.to_string(),
                    value: stored.to_string(),
                });
            }
        },
        Ok(None) => (0.0, ValueSource::Empty),
        Err(err) => {
            warn!("Error fetching value for reference {}: {}; using 0", name, err);
            (0.0, ValueSource::LookupFailed(err))
        }
    };

    trace!("{} -> {}", name, value);
    Ok(Substitution {
        reference: name.to_string(),
        cell,
        value,
        source,
    })
}

/// `Some(Some(n))` for a number, `Some(None)` for blank text, `None` when the
/// text is not numeric.
fn numeric_value(value: &CellValue) -> Option<Option<f64>> {
    match value {
        CellValue::Number(n) => Some(Some(*n)),
        CellValue::Text(text) => {
            let text = text.trim();
            if text.is_empty() {
                return Some(None);
            }
            text.parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(Some)
        }
    }
}
