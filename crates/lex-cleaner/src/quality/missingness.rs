use crate::table::Table;
use crate::types::{ColumnMissingness, MissingnessReport};

impl MissingnessReport {
    /// Count missing cells per column over the whole table.
    pub fn compute(table: &Table) -> Self {
        let columns: Vec<ColumnMissingness> = table
            .columns()
            .iter()
            .map(|column| ColumnMissingness {
                column: column.name().to_string(),
                missing_count: column.missing_count(),
                missing_percent: column.missing_fraction() * 100.0,
            })
            .collect();

        Self {
            total_missing: columns.iter().map(|c| c.missing_count).sum(),
            total_cells: table.total_cells(),
            columns,
        }
    }
}
