//! cellgrid-core - store-facing document model + grid files.

pub mod document;
pub mod error;
pub mod storage;

pub use document::{CellWrite, Document};
pub use error::{CellgridError, Result};
pub use storage::{CellStore, MemoryStore, StoreError, StoreLookup, StoredCell};

pub use cellgrid_engine::engine::CellRef;
