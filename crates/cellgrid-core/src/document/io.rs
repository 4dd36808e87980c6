use super::Document;
use crate::error::{CellgridError, Result};
use crate::storage::{CellStore, MemoryStore, parse_grd, write_grd};
use cellgrid_engine::engine::EvalOptions;
use log::debug;
use std::path::{Path, PathBuf};

impl Document<MemoryStore> {
    /// Create a document and load `path` if it exists.
    ///
    /// A path that does not exist yet becomes the save target of an empty grid.
    pub fn with_file(path: Option<PathBuf>, options: EvalOptions) -> Result<Self> {
        let mut doc = Self::new(MemoryStore::new(), options);
        if let Some(p) = path {
            if p.exists() {
                doc.load_file(&p)?;
            } else {
                doc.file_path = Some(p);
            }
        }
        Ok(doc)
    }

    /// Replace the grid with the contents of a .grd file.
    pub fn load_file(&mut self, path: &Path) -> Result<()> {
        let grid = parse_grd(path)?;
        debug!("loaded {} cells from {}", grid.len(), path.display());

        self.store = MemoryStore::from_grid(grid);
        self.file_path = Some(path.to_path_buf());
        self.modified = false;
        Ok(())
    }
}

impl<S: CellStore> Document<S> {
    /// Save to current file path.
    /// Returns the path saved to.
    pub fn save_file(&mut self) -> Result<PathBuf> {
        let Some(path) = &self.file_path else {
            return Err(CellgridError::NoFilePath);
        };

        write_grd(path, &self.store.cells()?)?;
        self.modified = false;
        Ok(path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::CellWrite;
    use cellgrid_engine::engine::{CellRef, CellValue};
    use pretty_assertions::assert_eq;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("cellgrid-io-{}-{}.grd", std::process::id(), name))
    }

    #[test]
    fn test_save_without_path_fails() {
        let mut doc: Document = Document::default();
        assert!(matches!(doc.save_file(), Err(CellgridError::NoFilePath)));
    }

    #[test]
    fn test_missing_file_is_an_empty_grid() {
        let path = temp_path("missing");
        let _ = std::fs::remove_file(&path);

        let doc = Document::with_file(Some(path.clone()), EvalOptions::default()).unwrap();
        assert!(doc.store.is_empty());
        assert_eq!(doc.file_path, Some(path));
    }

    #[test]
    fn test_save_then_load_keeps_cells() {
        let path = temp_path("roundtrip");
        let mut doc = Document::with_file(Some(path.clone()), EvalOptions::default()).unwrap();
        doc.write_cell(&CellWrite::new(CellRef::new(0, 0), "3")).unwrap();
        doc.write_cell(&CellWrite::new(CellRef::new(0, 1), "=POW(A1)"))
            .unwrap();
        doc.add_row(1, 2).unwrap();
        assert!(doc.modified);

        assert_eq!(doc.save_file().unwrap(), path);
        assert!(!doc.modified);

        let loaded = Document::with_file(Some(path.clone()), EvalOptions::default()).unwrap();
        assert_eq!(loaded.table().unwrap(), doc.table().unwrap());
        assert_eq!(
            loaded.store.fetch_cell_value(&CellRef::new(0, 1)),
            Ok(Some(CellValue::Number(9.0)))
        );

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_error_reports_line() {
        let path = temp_path("broken");
        std::fs::write(&path, "A1: 1\nB1 2\n").unwrap();

        let err = Document::with_file(Some(path.clone()), EvalOptions::default()).unwrap_err();
        assert!(matches!(err, CellgridError::Parse { line: 2, .. }));

        std::fs::remove_file(&path).unwrap();
    }
}
