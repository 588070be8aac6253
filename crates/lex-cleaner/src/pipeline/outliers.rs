//! Outlier detection.
//!
//! Numeric columns use the IQR fence test; text columns use a frequency
//! rarity test gated on low cardinality. Masks are per column and never
//! combined into a row-level verdict.

use crate::table::{Column, DeclaredType, Table, Value};
use crate::types::{IqrBounds, OutlierCount, OutlierMask, OutlierReport, OutlierSummary};
use crate::utils::{percentile, value_counts};
use tracing::{debug, info};

/// Fence multiplier applied to the interquartile range.
pub const IQR_MULTIPLIER: f64 = 1.5;

/// Maximum distinct values, as a share of the row count, for a text column
/// to be checked for rare categories.
pub const MAX_UNIQUE_SHARE: f64 = 0.05;

/// Maximum distinct/non-missing ratio for a text column to be checked.
pub const MAX_UNIQUE_RATIO: f64 = 0.3;

/// A category is rare below this frequency share...
pub const RARE_FREQUENCY: f64 = 0.01;

/// ...and when it occurs fewer than this many times.
pub const RARE_MAX_COUNT: usize = 3;

/// Flags unusual numeric values and rare categories.
#[derive(Debug, Default, Clone, Copy)]
pub struct OutlierDetector;

impl OutlierDetector {
    pub fn new() -> Self {
        Self
    }

    /// One mask per numeric column and one per text column.
    pub fn detect(&self, table: &Table) -> OutlierReport {
        let max_unique = (MAX_UNIQUE_SHARE * table.height() as f64).floor() as usize;

        let mut numeric = Vec::new();
        let mut categorical = Vec::new();
        for column in table.columns() {
            match column.declared_type() {
                DeclaredType::Numeric => numeric.push(Self::detect_numeric(column)),
                DeclaredType::Text | DeclaredType::Unresolved => {
                    categorical.push(Self::detect_categorical(column, max_unique))
                }
                DeclaredType::Boolean | DeclaredType::Temporal => {}
            }
        }

        let summary = OutlierSummary {
            numeric: summarize(&numeric, table.height()),
            categorical: summarize(&categorical, table.height()),
        };

        let report = OutlierReport {
            numeric,
            categorical,
            summary,
        };
        info!(
            "Outlier detection: {} cells flagged across {} numeric and {} text columns",
            report.total_flagged(),
            report.numeric.len(),
            report.categorical.len()
        );
        report
    }

    /// IQR fence test. A constant column flags every differing value.
    pub fn detect_numeric(column: &Column) -> OutlierMask {
        let values = column.numeric_values();
        let mut sorted: Vec<f64> = values.iter().flatten().copied().collect();
        if sorted.is_empty() {
            return OutlierMask {
                column: column.name().to_string(),
                flags: vec![false; column.len()],
                bounds: None,
            };
        }
        sorted.sort_by(f64::total_cmp);

        let q1 = percentile(&sorted, 0.25);
        let q3 = percentile(&sorted, 0.75);
        let iqr = q3 - q1;
        let bounds = IqrBounds {
            q1,
            q3,
            lower: q1 - IQR_MULTIPLIER * iqr,
            upper: q3 + IQR_MULTIPLIER * iqr,
        };

        let flags: Vec<bool> = values
            .iter()
            .map(|v| v.is_some_and(|x| x < bounds.lower || x > bounds.upper))
            .collect();

        debug!(
            "Column '{}': IQR fences [{:.3}, {:.3}], {} outliers",
            column.name(),
            bounds.lower,
            bounds.upper,
            flags.iter().filter(|f| **f).count()
        );

        OutlierMask {
            column: column.name().to_string(),
            flags,
            bounds: Some(bounds),
        }
    }

    /// Rare-category test; `max_unique` is the distinct-value cap.
    pub fn detect_categorical(column: &Column, max_unique: usize) -> OutlierMask {
        let mut mask = OutlierMask {
            column: column.name().to_string(),
            flags: vec![false; column.len()],
            bounds: None,
        };

        let observed = column.non_missing_count();
        if observed == 0 {
            return mask;
        }

        let counts = value_counts(column.cells().iter().flatten());
        let unique = counts.len();
        let unique_ratio = unique as f64 / observed as f64;
        if unique > max_unique || unique_ratio > MAX_UNIQUE_RATIO {
            debug!(
                "Column '{}' skipped for rare categories ({} distinct, ratio {:.2})",
                column.name(),
                unique,
                unique_ratio
            );
            return mask;
        }

        let rare: Vec<&Value> = counts
            .into_iter()
            .filter(|(_, count)| {
                (*count as f64 / observed as f64) < RARE_FREQUENCY && *count < RARE_MAX_COUNT
            })
            .map(|(value, _)| value)
            .collect();

        if rare.is_empty() {
            return mask;
        }
        for (flag, cell) in mask.flags.iter_mut().zip(column.cells()) {
            *flag = cell.as_ref().is_some_and(|v| rare.contains(&v));
        }
        mask
    }
}

fn summarize(masks: &[OutlierMask], row_count: usize) -> Vec<OutlierCount> {
    let mut counts: Vec<OutlierCount> = masks
        .iter()
        .map(|mask| {
            let count = mask.count();
            OutlierCount {
                column: mask.column.clone(),
                count,
                percent: if row_count == 0 {
                    0.0
                } else {
                    count as f64 / row_count as f64 * 100.0
                },
            }
        })
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // ========================================================================
    // Numeric
    // ========================================================================

    #[test]
    fn test_numeric_iqr_flags_extreme_value() {
        let column = Column::from_f64(
            "age",
            &[Some(34.0), Some(31.0), Some(29.0), Some(31.5), Some(200.0)],
        );
        let mask = OutlierDetector::detect_numeric(&column);
        assert_eq!(mask.flags, vec![false, false, false, false, true]);

        let bounds = mask.bounds.unwrap();
        assert_eq!(bounds.q1, 31.0);
        assert_eq!(bounds.q3, 34.0);
    }

    #[test]
    fn test_numeric_constant_column_flags_differing_values() {
        let column = Column::from_f64("c", &[Some(5.0), Some(5.0), Some(5.0), Some(5.0), Some(6.0)]);
        let mask = OutlierDetector::detect_numeric(&column);
        assert_eq!(mask.flags, vec![false, false, false, false, true]);
    }

    #[test]
    fn test_numeric_missing_cells_never_flagged() {
        let column = Column::from_f64("c", &[None, Some(1.0), None]);
        let mask = OutlierDetector::detect_numeric(&column);
        assert_eq!(mask.flags, vec![false, false, false]);

        let empty = Column::from_f64("e", &[None, None]);
        assert_eq!(OutlierDetector::detect_numeric(&empty).count(), 0);
    }

    // ========================================================================
    // Categorical
    // ========================================================================

    fn rare_category_column() -> Column {
        let mut cells: Vec<Option<&str>> = vec![Some("A"); 196];
        cells.extend([Some("B"), Some("C"), Some("D"), Some("E")]);
        Column::new(
            "grade",
            DeclaredType::Text,
            cells.into_iter().map(|c| c.map(Value::from)).collect(),
        )
    }

    #[test]
    fn test_categorical_flags_rare_singletons() {
        let column = rare_category_column();
        let mask = OutlierDetector::detect_categorical(&column, 10);
        assert_eq!(mask.flagged_rows(), vec![196, 197, 198, 199]);
    }

    #[test]
    fn test_categorical_skips_identifier_like_column() {
        let ids: Vec<String> = (0..200).map(|i| format!("id-{i}")).collect();
        let column = Column::new(
            "id",
            DeclaredType::Text,
            ids.into_iter().map(|s| Some(Value::Text(s))).collect(),
        );
        let mask = OutlierDetector::detect_categorical(&column, 10);
        assert_eq!(mask.count(), 0);
        assert_eq!(mask.flags.len(), 200);
    }

    #[test]
    fn test_categorical_gate_on_distinct_count() {
        // 100 rows, 6 distinct values: over the 5-value cap.
        let mut cells: Vec<Option<&str>> = vec![Some("A"); 95];
        cells.extend([Some("B"), Some("C"), Some("D"), Some("E"), Some("F")]);
        let column = Column::from_text("g", &cells);
        let mask = OutlierDetector::detect_categorical(&column, 5);
        assert_eq!(mask.count(), 0);
    }

    // ========================================================================
    // detect()
    // ========================================================================

    #[test]
    fn test_detect_builds_sorted_summary() {
        let mut values: Vec<Option<f64>> = vec![Some(1.0); 200];
        values[0] = Some(100.0);
        let table = Table::new(vec![
            Column::from_f64("x", &values),
            rare_category_column(),
            Column::new("flag", DeclaredType::Boolean, vec![Some(Value::Boolean(true)); 200]),
        ])
        .unwrap();

        let report = OutlierDetector::new().detect(&table);
        assert_eq!(report.numeric.len(), 1);
        assert_eq!(report.categorical.len(), 1);
        assert_eq!(report.numeric_mask("x").unwrap().count(), 1);
        assert_eq!(report.categorical_mask("grade").unwrap().count(), 4);
        assert_eq!(report.summary.categorical[0].percent, 2.0);
        assert_eq!(report.total_flagged(), 5);
    }
}
