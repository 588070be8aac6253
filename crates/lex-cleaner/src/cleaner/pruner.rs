//! Sparsity pruning: drop mostly-empty columns, then mostly-empty rows.

use crate::config::DEFAULT_SPARSITY_THRESHOLD;
use crate::error::Result;
use crate::table::{RowId, Table};
use crate::types::{MissingnessReport, PruningReport};
use tracing::{debug, info};

/// Removes columns and then rows whose missing fraction reaches the threshold.
///
/// Columns go first so that rows that were sparse only because of dropped
/// columns survive. The boundary is inclusive.
#[derive(Debug, Clone, Copy)]
pub struct SparsityPruner {
    threshold: f64,
}

impl Default for SparsityPruner {
    fn default() -> Self {
        Self::new(DEFAULT_SPARSITY_THRESHOLD)
    }
}

impl SparsityPruner {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn prune(&self, mut table: Table) -> Result<(Table, PruningReport)> {
        let dropped_columns = self.prune_columns(&mut table);
        let dropped_rows = self.prune_rows(&mut table)?;

        info!(
            "Pruning: dropped {} columns and {} rows (threshold {:.0}%)",
            dropped_columns.len(),
            dropped_rows.len(),
            self.threshold * 100.0
        );

        let report = PruningReport {
            threshold: self.threshold,
            dropped_columns,
            dropped_rows,
            missingness: MissingnessReport::compute(&table),
        };
        Ok((table, report))
    }

    fn prune_columns(&self, table: &mut Table) -> Vec<String> {
        if table.height() == 0 {
            return Vec::new();
        }

        let sparse: Vec<String> = table
            .columns()
            .iter()
            .filter(|c| c.missing_fraction() >= self.threshold)
            .map(|c| {
                debug!(
                    "Dropping column '{}' ({:.1}% missing)",
                    c.name(),
                    c.missing_fraction() * 100.0
                );
                c.name().to_string()
            })
            .collect();

        table.drop_columns(&sparse)
    }

    fn prune_rows(&self, table: &mut Table) -> Result<Vec<RowId>> {
        if table.width() == 0 {
            return Ok(Vec::new());
        }

        let keep: Vec<bool> = (0..table.height())
            .map(|row| {
                table
                    .row_missing_fraction(row)
                    .is_none_or(|fraction| fraction < self.threshold)
            })
            .collect();
        let dropped = table.retain_rows(&keep)?;
        if !dropped.is_empty() {
            debug!("Dropped rows: {:?}", dropped);
        }
        Ok(dropped)
    }
}
