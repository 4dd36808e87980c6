//! Error types for cellgrid core.

use thiserror::Error;

use cellgrid_engine::FormulaError;

use crate::storage::StoreError;

/// Errors that can occur while reading or changing a grid
#[derive(Error, Debug)]
pub enum CellgridError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// The formula could not be evaluated; nothing was written
    #[error(transparent)]
    Formula(#[from] FormulaError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Some inserts of a row/column batch failed. Successful ones are kept.
    #[error("Failed to {operation}: {failed} of {total} inserts failed (first: {first})")]
    Batch {
        operation: &'static str,
        failed: usize,
        total: usize,
        #[source]
        first: StoreError,
    },

    /// A row or column index with no A1 name (its 1-based number overflows)
    #[error("{axis} index {index} is out of range")]
    OutOfRange { axis: &'static str, index: usize },

    #[error("No file path set")]
    NoFilePath,
}

pub type Result<T> = std::result::Result<T, CellgridError>;
