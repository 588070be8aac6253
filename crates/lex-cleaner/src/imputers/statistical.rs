//! Per-column statistical imputation: mode and forward fill.

use crate::table::Column;
use crate::types::{ColumnImputation, ImputationMethod};
use crate::utils::mode;
use tracing::{debug, warn};

/// Statistical imputation methods for filling missing values.
pub struct StatisticalImputer;

impl StatisticalImputer {
    /// Fill gaps with the most frequent value; ties go to the value seen first.
    ///
    /// Returns `None` when the column has no gaps.
    pub fn apply_mode(column: &mut Column) -> Option<ColumnImputation> {
        let missing_before = column.missing_count();
        if missing_before == 0 {
            return None;
        }

        let Some(fill) = mode(column.cells().iter().flatten()).cloned() else {
            warn!(
                "Column '{}' has no observed values; mode imputation skipped",
                column.name()
            );
            return Some(skipped(column, ImputationMethod::Mode, missing_before));
        };

        debug!("Column '{}': filling {} cells with mode '{}'", column.name(), missing_before, fill);
        for cell in column.cells_mut() {
            if cell.is_none() {
                *cell = Some(fill.clone());
            }
        }

        Some(ColumnImputation {
            column: column.name().to_string(),
            method: ImputationMethod::Mode,
            missing_before,
            values_imputed: missing_before,
            remaining_missing: 0,
        })
    }

    /// Carry the last observed value forward in row order. Leading gaps stay
    /// missing.
    pub fn apply_forward_fill(column: &mut Column) -> Option<ColumnImputation> {
        let missing_before = column.missing_count();
        if missing_before == 0 {
            return None;
        }

        let mut last = None;
        let mut values_imputed = 0;
        for cell in column.cells_mut() {
            match cell {
                Some(value) => last = Some(value.clone()),
                None => {
                    if let Some(previous) = &last {
                        *cell = Some(previous.clone());
                        values_imputed += 1;
                    }
                }
            }
        }

        let remaining_missing = missing_before - values_imputed;
        if remaining_missing > 0 {
            debug!(
                "Column '{}': {} leading cells left missing by forward fill",
                column.name(),
                remaining_missing
            );
        }

        Some(ColumnImputation {
            column: column.name().to_string(),
            method: ImputationMethod::ForwardFill,
            missing_before,
            values_imputed,
            remaining_missing,
        })
    }
}

fn skipped(column: &Column, method: ImputationMethod, missing: usize) -> ColumnImputation {
    ColumnImputation {
        column: column.name().to_string(),
        method,
        missing_before: missing,
        values_imputed: 0,
        remaining_missing: missing,
    }
}
