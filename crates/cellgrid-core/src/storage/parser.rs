//! Parser for .grd file format

use crate::error::{CellgridError, Result};
use cellgrid_engine::engine::{Cell, CellKind, CellRef, CellValue, Grid};
use std::fs;
use std::path::Path;

/// Parse a .grd file and return a Grid
pub fn parse_grd(path: &Path) -> Result<Grid> {
    let content = fs::read_to_string(path)?;
    parse_grd_content(&content)
}

/// Parse .grd content from a string
pub fn parse_grd_content(content: &str) -> Result<Grid> {
    let grid: Grid = std::sync::Arc::new(dashmap::DashMap::new());

    for (line_num, line) in content.lines().enumerate() {
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((cell_ref_str, value_str)) = line.split_once(':') else {
            return Err(CellgridError::Parse {
                line: line_num + 1,
                message: "Expected 'CELLREF: VALUE' format".to_string(),
            });
        };

        let cell_ref_str = cell_ref_str.trim();
        let cell_ref = CellRef::from_str(cell_ref_str).ok_or_else(|| CellgridError::Parse {
            line: line_num + 1,
            message: format!("Invalid cell reference: {}", cell_ref_str),
        })?;

        let cell = parse_cell_value(value_str, line_num + 1)?;
        grid.insert(cell_ref, cell);
    }

    Ok(grid)
}

/// Parse the part after `CELLREF:` into a Cell
fn parse_cell_value(value: &str, line_num: usize) -> Result<Cell> {
    let value = value.trim();

    if value.is_empty() {
        return Ok(Cell::new_blank());
    }

    if value.starts_with('=') {
        return parse_formula_cell(value, line_num);
    }

    if let Some(text) = parse_quoted(value) {
        return Ok(Cell::new_static(&text));
    }

    // Bare numbers are static input too; the raw text is kept as written.
    if value.parse::<f64>().is_ok() {
        return Ok(Cell::new_static(value));
    }

    Err(CellgridError::Parse {
        line: line_num,
        message: format!("Invalid value: {}. Use quotes for text.", value),
    })
}

/// `=FORMULA => SNAPSHOT`. A formula without a snapshot loads with no value.
fn parse_formula_cell(value: &str, line_num: usize) -> Result<Cell> {
    let (formula, snapshot) = match value.rsplit_once("=>") {
        Some((formula, snapshot)) => (formula.trim(), Some(snapshot.trim())),
        None => (value, None),
    };

    let value = match snapshot {
        None => None,
        Some(snapshot) => Some(match parse_quoted(snapshot) {
            Some(text) => CellValue::Text(text),
            None => CellValue::Number(snapshot.parse::<f64>().map_err(|_| {
                CellgridError::Parse {
                    line: line_num,
                    message: format!("Invalid formula value: {}", snapshot),
                }
            })?),
        }),
    };

    Ok(Cell {
        value,
        kind: CellKind::Formula,
        formula: Some(unescape_grd_text(formula)),
    })
}

fn parse_quoted(value: &str) -> Option<String> {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        Some(unescape_grd_text(&value[1..value.len() - 1]))
    } else {
        None
    }
}

fn unescape_grd_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some('\\') => out.push('\\'),
                Some('"') => out.push('"'),
                Some('n') => out.push('\n'),
                Some('r') => out.push('\r'),
                Some(next) => {
                    out.push('\\');
                    out.push(next);
                }
                None => out.push('\\'),
            }
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cell_at(grid: &Grid, name: &str) -> Cell {
        grid.get(&CellRef::from_str(name).unwrap())
            .map(|c| c.clone())
            .unwrap()
    }

    #[test]
    fn test_parse_number_keeps_raw_text() {
        let grid = parse_grd_content("A1: 042").unwrap();
        assert_eq!(cell_at(&grid, "A1"), Cell::new_static("042"));
    }

    #[test]
    fn test_parse_text_escaped_quotes() {
        let content = r#"A1: "He said \"hi\"""#;
        let grid = parse_grd_content(content).unwrap();
        assert_eq!(cell_at(&grid, "A1"), Cell::new_static("He said \"hi\""));
    }

    #[test]
    fn test_parse_blank() {
        let grid = parse_grd_content("C2:").unwrap();
        assert!(cell_at(&grid, "C2").is_blank());
    }

    #[test]
    fn test_parse_formula_with_snapshot() {
        let grid = parse_grd_content("B1: =POW(A1) => 9").unwrap();
        assert_eq!(cell_at(&grid, "B1"), Cell::new_formula("=POW(A1)", 9.0));
    }

    #[test]
    fn test_parse_formula_without_snapshot() {
        let grid = parse_grd_content("B1: =A1 + 1").unwrap();
        let cell = cell_at(&grid, "B1");
        assert_eq!(cell.kind, CellKind::Formula);
        assert_eq!(cell.formula.as_deref(), Some("=A1 + 1"));
        assert_eq!(cell.value, None);
    }

    #[test]
    fn test_skip_comments_and_empty_lines() {
        let content = r#"
# This is a comment
A1: 42

# Another comment

AA10: "x"
"#;
        let grid = parse_grd_content(content).unwrap();
        assert_eq!(grid.len(), 2);
        assert!(grid.contains_key(&CellRef::new(9, 26)));
    }

    #[test]
    fn test_errors_carry_line_numbers() {
        let err = parse_grd_content("A1: 1\n\nnonsense").unwrap_err();
        assert!(matches!(err, CellgridError::Parse { line: 3, .. }));

        let err = parse_grd_content("A1: 1\nA0: 2").unwrap_err();
        assert!(matches!(err, CellgridError::Parse { line: 2, .. }));

        let err = parse_grd_content("A1: hello").unwrap_err();
        assert!(err.to_string().contains("Use quotes for text"));

        let err = parse_grd_content("A1: =1+1 => many").unwrap_err();
        assert!(matches!(err, CellgridError::Parse { line: 1, .. }));
    }
}
