use super::Document;
use crate::error::{CellgridError, Result};
use crate::storage::{CellStore, StoreError, StoredCell};
use cellgrid_engine::engine::{Cell, CellKind, CellRef};
use log::{debug, warn};

/// A request to write one cell.
#[derive(Clone, Debug, PartialEq)]
pub struct CellWrite {
    pub cell_ref: CellRef,
    /// Raw input. A leading `=` makes this a formula write.
    pub value: String,
    /// Formula text to evaluate instead of `value`, when non-empty.
    pub formula: Option<String>,
}

impl CellWrite {
    pub fn new(cell_ref: CellRef, value: impl Into<String>) -> Self {
        CellWrite {
            cell_ref,
            value: value.into(),
            formula: None,
        }
    }

    pub fn with_formula(mut self, formula: impl Into<String>) -> Self {
        self.formula = Some(formula.into());
        self
    }

    pub fn kind(&self) -> CellKind {
        CellKind::of_input(&self.value)
    }

    /// The text that gets evaluated for a formula write.
    fn formula_source(&self) -> &str {
        match self.formula.as_deref() {
            Some(formula) if !formula.is_empty() => formula,
            _ => &self.value,
        }
    }
}

impl<S: CellStore> Document<S> {
    /// Write a cell, evaluating it first when it is a formula.
    ///
    /// Evaluation happens before the store is touched, so a formula that
    /// fails to evaluate leaves the grid exactly as it was.
    pub fn write_cell(&mut self, write: &CellWrite) -> Result<StoredCell> {
        let cell = match write.kind() {
            CellKind::Formula => {
                let formula = write.formula_source();
                let evaluation = self.evaluate(formula)?;
                Cell::new_formula(formula, evaluation.value)
            }
            CellKind::Static => Cell::new_static(&write.value),
        };

        debug!("writing {} as {} cell", write.cell_ref, cell.kind.as_str());
        let stored = self.store.upsert_cell(&write.cell_ref, cell)?;
        self.modified = true;
        Ok(stored)
    }

    /// All cells ordered by row, then column.
    pub fn table(&self) -> Result<Vec<StoredCell>> {
        Ok(self.store.cells()?)
    }

    /// Insert blank cells at `(row, 0..columns_count)`.
    pub fn add_row(&mut self, row: usize, columns_count: usize) -> Result<usize> {
        check_index("row", row)?;
        let targets = (0..columns_count).map(|col| CellRef::new(row, col));
        self.insert_blank_cells("add row", targets, columns_count)
    }

    /// Insert a blank cell at column `columns_count` of every stored row.
    pub fn add_column(&mut self, columns_count: usize) -> Result<usize> {
        check_index("column", columns_count)?;
        let rows = self.store.row_indices()?;
        let total = rows.len();
        let targets = rows.into_iter().map(|row| CellRef::new(row, columns_count));
        self.insert_blank_cells("add column", targets, total)
    }

    /// Attempt every insert; report failures together. Successful inserts
    /// are kept even when others fail.
    fn insert_blank_cells<I>(
        &mut self,
        operation: &'static str,
        targets: I,
        total: usize,
    ) -> Result<usize>
    where
        I: IntoIterator<Item = CellRef>,
    {
        let mut first_failure: Option<StoreError> = None;
        let mut failed = 0;
        let mut inserted = 0;

        for cell_ref in targets {
            match self.store.insert_cell(&cell_ref, Cell::new_blank()) {
                Ok(_) => inserted += 1,
                Err(err) => {
                    warn!("{}: insert at {} failed: {}", operation, cell_ref, err);
                    failed += 1;
                    first_failure.get_or_insert(err);
                }
            }
        }

        if inserted > 0 {
            self.modified = true;
        }
        debug!("{}: inserted {} of {} cells", operation, inserted, total);

        match first_failure {
            None => Ok(inserted),
            Some(first) => Err(CellgridError::Batch {
                operation,
                failed,
                total,
                first,
            }),
        }
    }
}

/// Indices whose 1-based number does not fit cannot be written to a grid file.
fn check_index(axis: &'static str, index: usize) -> Result<()> {
    match index.checked_add(1) {
        Some(_) => Ok(()),
        None => Err(CellgridError::OutOfRange { axis, index }),
    }
}
