//! cellgrid_engine - Formula evaluation for the cellgrid store.

pub mod engine;
pub mod error;

pub use error::{FormulaError, FormulaResult, LookupError};
