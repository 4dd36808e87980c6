use crate::error::Result;
use crate::storage::{CellStore, MemoryStore, StoreLookup};
use cellgrid_engine::engine::{EvalOptions, Evaluation, FormulaEvaluator};
use log::debug;
use std::path::PathBuf;

/// A grid of cells behind a [`CellStore`], plus the evaluator used on writes.
#[derive(Debug)]
pub struct Document<S: CellStore = MemoryStore> {
    /// Where cells live. Every read and write goes through this handle.
    pub store: S,
    pub evaluator: FormulaEvaluator,
    /// Current file path
    pub file_path: Option<PathBuf>,
    /// Whether the grid has been modified since the last load or save
    pub modified: bool,
}

impl Default for Document<MemoryStore> {
    fn default() -> Self {
        Self::new(MemoryStore::new(), EvalOptions::default())
    }
}

impl<S: CellStore> Document<S> {
    /// Create a document over an existing store.
    ///
    /// This constructor is side-effect free: it does not touch the filesystem.
    pub fn new(store: S, options: EvalOptions) -> Self {
        Document {
            store,
            evaluator: FormulaEvaluator::new(options),
            file_path: None,
            modified: false,
        }
    }

    /// Evaluate a formula against the current store without writing anything.
    pub fn evaluate(&self, formula: &str) -> Result<Evaluation> {
        let evaluation = self
            .evaluator
            .evaluate(formula, &StoreLookup(&self.store))?;
        debug!(
            "{:?} = {} (evaluated {} after {} substitutions)",
            formula,
            evaluation.value,
            evaluation.expression,
            evaluation.substitutions.len()
        );
        Ok(evaluation)
    }
}
