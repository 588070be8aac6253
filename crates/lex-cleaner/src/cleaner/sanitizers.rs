//! Hidden missing-value normalization.

use crate::table::{Table, Value};
use crate::types::{ColumnReplacements, MissingnessReport, NormalizationReport};
use crate::utils::is_hidden_missing;
use tracing::{debug, info};

/// Rewrites hidden-missing tokens (`"?"`, `"n/a"`, `"-1"`, ...) in text-like
/// columns to real missing cells.
///
/// Comparison is on the trimmed, lower-cased text form; cells that do not
/// match are stored untouched. Running it twice is a no-op.
#[derive(Debug, Default, Clone, Copy)]
pub struct MissingValueNormalizer;

impl MissingValueNormalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(&self, mut table: Table) -> (Table, NormalizationReport) {
        let mut replacements = Vec::new();

        for column in table.columns_mut() {
            if !column.declared_type().is_text_like() {
                continue;
            }

            let mut replaced = 0;
            for cell in column.cells_mut() {
                if cell.as_ref().is_some_and(is_hidden_missing_cell) {
                    *cell = None;
                    replaced += 1;
                }
            }

            if replaced > 0 {
                debug!(
                    "Column '{}': {} hidden missing values replaced",
                    column.name(),
                    replaced
                );
                replacements.push(ColumnReplacements {
                    column: column.name().to_string(),
                    replaced,
                });
            }
        }

        let total_replaced = replacements.iter().map(|r| r.replaced).sum();
        let missingness = MissingnessReport::compute(&table);
        info!(
            "Normalization: {} hidden missing values replaced, {} missing in total",
            total_replaced, missingness.total_missing
        );

        let report = NormalizationReport {
            replacements,
            total_replaced,
            missingness,
        };
        (table, report)
    }
}

/// Unresolved columns may hold non-text cells; those are compared by their
/// display form so an integer `-1` matches too.
fn is_hidden_missing_cell(value: &Value) -> bool {
    match value {
        Value::Text(s) => is_hidden_missing(s),
        Value::Integer(_) | Value::Float(_) => is_hidden_missing(&value.as_display()),
        Value::Boolean(_) | Value::Temporal(_) => false,
    }
}
