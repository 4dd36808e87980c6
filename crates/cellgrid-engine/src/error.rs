//! Error types for formula evaluation.

use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors that make a formula unusable. Every variant aborts the cell write.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FormulaError {
    /// The expression text could not be tokenized or parsed
    #[error("Invalid formula: {message} at position {position}")]
    Parse { position: usize, message: String },

    #[error("Invalid formula: division by zero")]
    DivisionByZero,

    /// Arithmetic produced NaN or infinity
    #[error("Invalid formula: result is not a finite number")]
    NonFinite,

    /// A referenced cell holds text that is not a number
    #[error("Invalid formula: {reference} holds non-numeric value {value:?}")]
    NonNumericReference { reference: String, value: String },

    /// `POW`/`SQRT` without a parenthesised argument list
    #[error("Invalid formula: {function} requires a parenthesised argument")]
    MissingArgument { function: &'static str },

    #[error("Invalid formula: root argument {0:?} is not a usable number")]
    InvalidRoot(String),

    /// Arithmetic was attempted before a reference was replaced by its value
    #[error("Invalid formula: unresolved reference {0}")]
    UnresolvedReference(String),
}

/// A single reference could not be fetched.
///
/// Never surfaced to callers of the evaluator: the resolver substitutes `0`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LookupError {
    /// The token looks like a reference but maps to no coordinate (e.g. `A0`)
    #[error("invalid cell reference {0}")]
    InvalidReference(String),

    /// The backing store failed to answer
    #[error("store error: {0}")]
    Store(String),
}
