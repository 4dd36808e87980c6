//! Cell data structures for the spreadsheet grid.
//!
//! This module provides the core data types for representing cells:
//! - [`CellValue`] - A stored value (formula result or raw static input)
//! - [`CellKind`] - Whether a cell was written as a formula or a static value
//! - [`Cell`] - A cell with its value snapshot and optional formula text
//! - [`Grid`] - Thread-safe sparse storage for cells (backed by `DashMap`)

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use super::cell_ref::CellRef;

/// A value held by a cell.
///
/// Static input is kept verbatim as text; only formula results are numbers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

/// How a cell's value was produced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellKind {
    #[default]
    Static,
    Formula,
}

impl CellKind {
    /// Classify raw input: anything starting with `=` is a formula.
    pub fn of_input(raw: &str) -> CellKind {
        if raw.starts_with('=') {
            CellKind::Formula
        } else {
            CellKind::Static
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CellKind::Static => "static",
            CellKind::Formula => "formula",
        }
    }
}

/// A cell in the spreadsheet grid.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// Last stored value. `None` for blank cells created by row/column inserts.
    pub value: Option<CellValue>,
    pub kind: CellKind,
    /// Formula text, present only when `kind` is [`CellKind::Formula`].
    pub formula: Option<String>,
}

impl Cell {
    pub fn new_blank() -> Cell {
        Cell::default()
    }

    /// Create a static cell holding the raw input unchanged.
    pub fn new_static(raw: &str) -> Cell {
        Cell {
            value: Some(CellValue::Text(raw.to_string())),
            kind: CellKind::Static,
            formula: None,
        }
    }

    /// Create a formula cell with the value it evaluated to at write time.
    /// The stored formula text is trimmed and always starts with `=`.
    pub fn new_formula(formula: &str, value: f64) -> Cell {
        let formula = formula.trim();
        let formula = if formula.starts_with('=') {
            formula.to_string()
        } else {
            format!("={}", formula)
        };
        Cell {
            value: Some(CellValue::Number(value)),
            kind: CellKind::Formula,
            formula: Some(formula),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.value.is_none() && self.formula.is_none()
    }
}

/// Thread-safe sparse grid storage.
/// DashMap is wrapped in an Arc so clones share the same cells.
pub type Grid = Arc<DashMap<CellRef, Cell>>;
