//! Writer for .grd file format

use crate::error::Result;
use crate::storage::StoredCell;
use cellgrid_engine::engine::{CellKind, CellValue};
use std::fs;
use std::path::Path;

/// Write cells to a .grd file
pub fn write_grd(path: &Path, cells: &[StoredCell]) -> Result<()> {
    let content = write_grd_content(cells);
    fs::write(path, content)?;
    Ok(())
}

/// Render cells in .grd format, sorted by row then column.
pub fn write_grd_content(cells: &[StoredCell]) -> String {
    let mut lines = vec!["# Cellgrid Spreadsheet".to_string()];

    let mut sorted: Vec<&StoredCell> = cells.iter().collect();
    sorted.sort_by(|a, b| {
        a.row_index
            .cmp(&b.row_index)
            .then(a.column_index.cmp(&b.column_index))
    });

    for cell in sorted {
        let cell_ref = cell.cell_ref();
        let value_str = match (&cell.kind, &cell.formula) {
            (CellKind::Formula, Some(formula)) => {
                let formula = escape_grd_text(formula);
                let formula = if formula.starts_with('=') {
                    formula
                } else {
                    format!("={}", formula)
                };
                match &cell.value {
                    Some(value) => format!("{} => {}", formula, write_value(value)),
                    None => formula,
                }
            }
            _ => match &cell.value {
                Some(value) => write_value(value),
                None => {
                    lines.push(format!("{}:", cell_ref));
                    continue;
                }
            },
        };

        lines.push(format!("{}: {}", cell_ref, value_str));
    }

    lines.join("\n") + "\n"
}

fn write_value(value: &CellValue) -> String {
    match value {
        CellValue::Number(n) => n.to_string(),
        CellValue::Text(s) if is_bare_number(s) => s.clone(),
        CellValue::Text(s) => format!("\"{}\"", escape_grd_text(s)),
    }
}

/// Text that reads back unchanged without quotes.
fn is_bare_number(s: &str) -> bool {
    !s.is_empty() && s.trim() == s && !s.contains("=>") && s.parse::<f64>().is_ok()
}

fn escape_grd_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::parse_grd_content;
    use cellgrid_engine::engine::{Cell, CellRef};
    use pretty_assertions::assert_eq;

    fn stored(name: &str, cell: Cell) -> StoredCell {
        StoredCell::new(&CellRef::from_str(name).unwrap(), cell)
    }

    #[test]
    fn test_write_static_values() {
        let content = write_grd_content(&[
            stored("A1", Cell::new_static("42")),
            stored("B1", Cell::new_static("Hello")),
            stored("C1", Cell::new_static(" 7")),
        ]);
        assert!(content.contains("A1: 42\n"));
        assert!(content.contains("B1: \"Hello\"\n"));
        assert!(content.contains("C1: \" 7\"\n"));
    }

    #[test]
    fn test_write_formula_with_snapshot() {
        let content = write_grd_content(&[stored("B1", Cell::new_formula("=A1*2", 84.0))]);
        assert!(content.contains("B1: =A1*2 => 84\n"));
    }

    #[test]
    fn test_write_blank_cells() {
        let content = write_grd_content(&[stored("A1", Cell::new_blank())]);
        assert!(content.contains("A1:\n"));
    }

    #[test]
    fn test_sorted_output() {
        let content = write_grd_content(&[
            stored("B2", Cell::new_static("3")),
            stored("A1", Cell::new_static("1")),
            stored("B1", Cell::new_static("2")),
        ]);
        let lines: Vec<_> = content.lines().collect();
        assert!(lines[0].starts_with('#'));
        assert!(lines[1].starts_with("A1"));
        assert!(lines[2].starts_with("B1"));
        assert!(lines[3].starts_with("B2"));
    }

    #[test]
    fn test_written_file_reads_back() {
        let cells = vec![
            stored("A1", Cell::new_static("He said \"hi\" \\o/")),
            stored("A2", Cell::new_static("0.50")),
            stored("B1", Cell::new_formula("=SQRT(A2, 3)", 0.7071067811865476)),
            stored("C3", Cell::new_blank()),
        ];
        let grid = parse_grd_content(&write_grd_content(&cells)).unwrap();

        for cell in &cells {
            let read = grid.get(&cell.cell_ref()).map(|c| c.clone()).unwrap();
            assert_eq!(StoredCell::new(&cell.cell_ref(), read), *cell);
        }
    }

    #[test]
    fn test_line_breaks_stay_on_one_line() {
        let cells = vec![
            stored("A1", Cell::new_static("line1\nline2\r\nend")),
            stored("A2", Cell::new_static("back\\n slash")),
            stored("B1", Cell::new_formula("=POW(2)\n+1", 4.0)),
        ];
        let content = write_grd_content(&cells);
        assert_eq!(content.lines().count(), 4);
        assert!(content.contains(r#"A1: "line1\nline2\r\nend""#));

        let grid = parse_grd_content(&content).unwrap();
        for cell in &cells {
            let read = grid.get(&cell.cell_ref()).map(|c| c.clone()).unwrap();
            assert_eq!(StoredCell::new(&cell.cell_ref(), read), *cell);
        }
    }
}
