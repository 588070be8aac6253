//! Imputation module for handling missing values.
//!
//! Strategy depends on the declared type:
//! - Numeric: joint KNN imputation over all numeric columns
//! - Text and boolean: mode
//! - Temporal: forward fill

mod knn;
mod statistical;

pub use knn::KNNImputer;
pub use statistical::StatisticalImputer;

use crate::config::DEFAULT_KNN_NEIGHBORS;
use crate::error::Result;
use crate::table::{DeclaredType, Table};
use crate::types::{ImputationReport, ImputationSummary, MissingnessReport};
use tracing::{debug, info};

/// Fills remaining gaps using a type-dependent strategy.
pub struct Imputer {
    knn: KNNImputer,
}

impl Default for Imputer {
    fn default() -> Self {
        Self::new(DEFAULT_KNN_NEIGHBORS)
    }
}

impl Imputer {
    pub fn new(n_neighbors: usize) -> Self {
        Self {
            knn: KNNImputer::new(n_neighbors),
        }
    }

    /// Impute every column and report which columns were numeric.
    ///
    /// A table with no numeric columns skips neighbor imputation.
    pub fn impute(&self, mut table: Table) -> Result<(Table, ImputationReport)> {
        let total_missing_before = table.total_missing();
        let numeric_columns = table.columns_of_type(DeclaredType::Numeric);

        let mut columns = if numeric_columns.is_empty() {
            debug!("No numeric columns; skipping KNN imputation");
            Vec::new()
        } else {
            self.knn.fit_transform(&mut table, &numeric_columns)?
        };

        for column in table.columns_mut() {
            let result = match column.declared_type() {
                DeclaredType::Numeric => None,
                DeclaredType::Temporal => StatisticalImputer::apply_forward_fill(column),
                DeclaredType::Text | DeclaredType::Boolean | DeclaredType::Unresolved => {
                    StatisticalImputer::apply_mode(column)
                }
            };
            columns.extend(result);
        }

        let total_missing_after = table.total_missing();
        let values_imputed = total_missing_before - total_missing_after;
        let total_cells = table.total_cells();
        let imputation_percent = if total_cells == 0 {
            0.0
        } else {
            values_imputed as f64 / total_cells as f64 * 100.0
        };

        info!(
            "Imputation: {} values filled, {} still missing",
            values_imputed, total_missing_after
        );

        let report = ImputationReport {
            numeric_columns,
            summary: ImputationSummary {
                total_missing_before,
                total_missing_after,
                values_imputed,
                total_cells,
                imputation_percent,
                columns,
            },
            missingness: MissingnessReport::compute(&table),
        };
        Ok((table, report))
    }
}
