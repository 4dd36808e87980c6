//! Formula engine API.
//!
//! This module provides the formula-evaluation core:
//!
//! - [`Cell`], [`CellValue`], [`CellKind`], [`Grid`] - Data structures for cell storage
//! - [`CellRef`] - Cell reference parsing (A1 notation ↔ row/col indices)
//! - [`parse_expression`] - Tokenize and parse arithmetic into an [`Expr`] tree
//! - [`resolve_references`] - Replace references with looked-up values
//! - [`FormulaEvaluator`], [`evaluate_formula`] - Shape detection and evaluation
//! - [`format_number`] - Format values for display

mod ast;
mod cell;
mod cell_ref;
mod eval;
mod format;
mod parser;
mod resolve;

pub use ast::{BinaryOp, Expr, UnaryOp};
pub use cell::{Cell, CellKind, CellValue, Grid};
pub use cell_ref::CellRef;
pub use eval::{
    EvalOptions, Evaluation, FormulaEvaluator, FormulaShape, RootArgument, evaluate_formula,
};
pub use format::{format_cell_value, format_number};
pub use parser::parse_expression;
pub use resolve::{
    CellLookup, LookupResult, Resolved, Substitution, ValueSource, resolve_references,
};
