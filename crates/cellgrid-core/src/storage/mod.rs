//! Cell storage.
//!
//! [`CellStore`] is the only way the rest of the crate touches persisted
//! cells. It is passed into [`crate::Document`] explicitly, so tests can swap
//! in a fake. [`MemoryStore`] is the in-process implementation used by the
//! CLI; grid files are read and written through [`parse_grd`]/[`write_grd`].

mod memory;
mod parser;
mod writer;

pub use memory::MemoryStore;
pub use parser::{parse_grd, parse_grd_content};
pub use writer::{write_grd, write_grd_content};

use cellgrid_engine::LookupError;
use cellgrid_engine::engine::{Cell, CellKind, CellLookup, CellRef, CellValue, LookupResult};
use serde::Serialize;
use thiserror::Error;

/// Failures reported by a [`CellStore`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("cell {0} already exists")]
    Occupied(CellRef),

    #[error("cell {0} does not exist")]
    Missing(CellRef),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// A persisted cell record, shaped like a `table_structure` row.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StoredCell {
    pub row_index: usize,
    pub column_index: usize,
    pub value: Option<CellValue>,
    #[serde(rename = "type")]
    pub kind: CellKind,
    #[serde(rename = "formulas")]
    pub formula: Option<String>,
}

impl StoredCell {
    pub fn new(cell_ref: &CellRef, cell: Cell) -> StoredCell {
        StoredCell {
            row_index: cell_ref.row,
            column_index: cell_ref.col,
            value: cell.value,
            kind: cell.kind,
            formula: cell.formula,
        }
    }

    pub fn cell_ref(&self) -> CellRef {
        CellRef::new(self.row_index, self.column_index)
    }
}

/// Keyed cell storage, unique per `(row, col)`.
///
/// Implementations need no locking across coordinates: concurrent writes to
/// one coordinate are last-write-wins.
pub trait CellStore {
    fn fetch_cell(&self, cell_ref: &CellRef) -> StoreResult<Option<Cell>>;

    /// Insert a new cell. Fails with [`StoreError::Occupied`] if one exists.
    fn insert_cell(&self, cell_ref: &CellRef, cell: Cell) -> StoreResult<StoredCell>;

    /// Replace an existing cell. Fails with [`StoreError::Missing`] otherwise.
    fn update_cell(&self, cell_ref: &CellRef, cell: Cell) -> StoreResult<StoredCell>;

    /// All cells ordered by row, then column.
    fn cells(&self) -> StoreResult<Vec<StoredCell>>;

    /// Distinct row indices in ascending order.
    fn row_indices(&self) -> StoreResult<Vec<usize>>;

    fn fetch_cell_value(&self, cell_ref: &CellRef) -> StoreResult<Option<CellValue>> {
        Ok(self.fetch_cell(cell_ref)?.and_then(|cell| cell.value))
    }

    /// Update the cell in place when present, insert it otherwise.
    fn upsert_cell(&self, cell_ref: &CellRef, cell: Cell) -> StoreResult<StoredCell> {
        if self.fetch_cell(cell_ref)?.is_some() {
            self.update_cell(cell_ref, cell)
        } else {
            self.insert_cell(cell_ref, cell)
        }
    }
}

/// Adapts a [`CellStore`] to the engine's [`CellLookup`].
pub struct StoreLookup<'a, S: ?Sized>(pub &'a S);

impl<S: CellStore + ?Sized> CellLookup for StoreLookup<'_, S> {
    fn fetch_cell_value(&self, cell: &CellRef) -> LookupResult {
        self.0
            .fetch_cell_value(cell)
            .map_err(|e| LookupError::Store(e.to_string()))
    }
}
