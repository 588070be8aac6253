//! Workbook ingestion. Cells keep their stored type, so a column holding
//! both numbers and labels reaches type inference as a mixed column.

use crate::error::{CleaningError, Result};
use crate::table::{Column, Table, Value};
use calamine::{Data, Reader, open_workbook_auto_from_rs};
use std::io::Cursor;
use tracing::{debug, warn};

/// Read the first worksheet; its first row is the header.
pub(super) fn read_first_sheet(bytes: &[u8]) -> Result<Table> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| CleaningError::Parse("workbook has no worksheets".to_string()))??;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        debug!("First worksheet is empty");
        return Ok(Table::empty());
    };

    let names: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(i, cell)| match cell_to_value(cell) {
            Some(v) => v.as_display().trim().to_string(),
            None => format!("column_{}", i + 1),
        })
        .collect();

    let mut cells: Vec<Vec<Option<Value>>> = vec![Vec::new(); names.len()];
    for row in rows {
        for (i, column_cells) in cells.iter_mut().enumerate() {
            column_cells.push(row.get(i).and_then(cell_to_value));
        }
    }

    let columns = names
        .into_iter()
        .zip(cells)
        .map(|(name, cells)| Column::unresolved(name, cells))
        .collect();
    Table::new(columns)
}

fn cell_to_value(cell: &Data) -> Option<Value> {
    match cell {
        Data::Empty => None,
        Data::Int(i) => Some(Value::Integer(*i)),
        Data::Float(f) if f.is_finite() => Some(Value::Float(*f)),
        Data::Float(_) => None,
        Data::String(s) => Some(Value::Text(s.clone())),
        Data::Bool(b) => Some(Value::Boolean(*b)),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(parsed) => Some(Value::Temporal(parsed)),
            None => {
                warn!("Spreadsheet date serial {} is out of range", dt.as_f64());
                None
            }
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(Value::Text(s.clone())),
        Data::Error(e) => Some(Value::Text(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_conversion() {
        assert_eq!(cell_to_value(&Data::Empty), None);
        assert_eq!(cell_to_value(&Data::Int(4)), Some(Value::Integer(4)));
        assert_eq!(cell_to_value(&Data::Float(2.5)), Some(Value::Float(2.5)));
        assert_eq!(cell_to_value(&Data::Float(f64::NAN)), None);
        assert_eq!(
            cell_to_value(&Data::String("n/a".to_string())),
            Some(Value::from("n/a"))
        );
        assert_eq!(cell_to_value(&Data::Bool(true)), Some(Value::Boolean(true)));
    }

    #[test]
    fn test_invalid_workbook_is_an_error() {
        assert!(read_first_sheet(b"not a zip").is_err());
    }
}
