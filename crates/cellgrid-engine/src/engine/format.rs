use super::{Cell, CellValue};

/// Format a stored cell value for display. Blank cells render as "".
pub fn format_cell_value(cell: &Cell) -> String {
    match &cell.value {
        None => String::new(),
        Some(CellValue::Number(n)) => format_number(*n),
        Some(CellValue::Text(s)) => s.clone(),
    }
}

/// Format a number for display.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "#NAN!".to_string()
    } else if n.is_infinite() {
        "#INF!".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e10 {
        format!("{:.0}", n)
    } else {
        format!("{:.2}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(9.0), "9");
        assert_eq!(format_number(-0.5), "-0.50");
        assert_eq!(format_number(1.0 / 3.0), "0.33");
        assert_eq!(format_number(f64::INFINITY), "#INF!");
    }

    #[test]
    fn test_format_cell_value_keeps_static_text() {
        assert_eq!(format_cell_value(&Cell::new_static("007")), "007");
        assert_eq!(format_cell_value(&Cell::new_blank()), "");
        assert_eq!(format_cell_value(&Cell::new_formula("=1/4", 0.25)), "0.25");
    }
}
