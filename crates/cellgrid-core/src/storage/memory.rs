//! In-memory cell store backed by `DashMap`.

use dashmap::mapref::entry::Entry;
use std::collections::BTreeSet;

use super::{CellStore, StoreError, StoreResult, StoredCell};
use cellgrid_engine::engine::{Cell, CellRef, Grid};

/// Thread-safe in-memory store. Clones share the same cells.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    grid: Grid,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_grid(grid: Grid) -> Self {
        Self { grid }
    }

    pub fn len(&self) -> usize {
        self.grid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grid.is_empty()
    }
}

impl CellStore for MemoryStore {
    fn fetch_cell(&self, cell_ref: &CellRef) -> StoreResult<Option<Cell>> {
        Ok(self.grid.get(cell_ref).map(|entry| entry.clone()))
    }

    fn insert_cell(&self, cell_ref: &CellRef, cell: Cell) -> StoreResult<StoredCell> {
        match self.grid.entry(cell_ref.clone()) {
            Entry::Occupied(_) => Err(StoreError::Occupied(cell_ref.clone())),
            Entry::Vacant(slot) => {
                slot.insert(cell.clone());
                Ok(StoredCell::new(cell_ref, cell))
            }
        }
    }

    fn update_cell(&self, cell_ref: &CellRef, cell: Cell) -> StoreResult<StoredCell> {
        match self.grid.get_mut(cell_ref) {
            Some(mut entry) => {
                *entry = cell.clone();
                Ok(StoredCell::new(cell_ref, cell))
            }
            None => Err(StoreError::Missing(cell_ref.clone())),
        }
    }

    fn cells(&self) -> StoreResult<Vec<StoredCell>> {
        let mut cells: Vec<StoredCell> = self
            .grid
            .iter()
            .map(|entry| StoredCell::new(entry.key(), entry.value().clone()))
            .collect();
        cells.sort_by(|a, b| {
            a.row_index
                .cmp(&b.row_index)
                .then(a.column_index.cmp(&b.column_index))
        });
        Ok(cells)
    }

    fn row_indices(&self) -> StoreResult<Vec<usize>> {
        let rows: BTreeSet<usize> = self.grid.iter().map(|entry| entry.key().row).collect();
        Ok(rows.into_iter().collect())
    }
}
