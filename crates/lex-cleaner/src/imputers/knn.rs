use crate::error::{CleaningError, Result};
use crate::table::{DeclaredType, Table, Value};
use crate::types::{ColumnImputation, ImputationMethod};
use crate::utils::mean;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use tracing::{debug, warn};

/// A candidate donor row, ordered by distance then row index so that the
/// heap evicts the farthest (and, on ties, the later) row first.
#[derive(Debug, Clone, Copy)]
struct Neighbor {
    distance: f64,
    row: usize,
}

impl PartialEq for Neighbor {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Neighbor {}

impl PartialOrd for Neighbor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Neighbor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then_with(|| self.row.cmp(&other.row))
    }
}

/// Joint nearest-neighbor imputation over a set of numeric columns.
///
/// Distances are nan-euclidean: coordinates missing in either row are
/// skipped and the sum is scaled up by `features / present`. Each gap is
/// filled with the plain mean of the `k` closest rows that have a value in
/// that column; when no row qualifies, the column mean is used.
pub struct KNNImputer {
    n_neighbors: usize,
}

impl KNNImputer {
    /// Create a new KNN imputer with specified number of neighbors
    pub fn new(n_neighbors: usize) -> Self {
        Self {
            n_neighbors: n_neighbors.max(1),
        }
    }

    pub fn n_neighbors(&self) -> usize {
        self.n_neighbors
    }

    /// Impute every missing cell of `columns`, using all of them as features.
    ///
    /// Estimates come from the observed values only, never from cells
    /// filled earlier in the same call. Columns that receive values are
    /// stored as floats.
    pub fn fit_transform(
        &self,
        table: &mut Table,
        columns: &[String],
    ) -> Result<Vec<ColumnImputation>> {
        if columns.is_empty() || table.height() == 0 {
            return Ok(Vec::new());
        }

        let matrix = create_data_matrix(table, columns)?;
        let n_rows = table.height();
        let mut results = Vec::new();

        for (col_idx, col_name) in columns.iter().enumerate() {
            let missing_rows: Vec<usize> = (0..n_rows)
                .filter(|&row| matrix[row][col_idx].is_none())
                .collect();
            if missing_rows.is_empty() {
                continue;
            }

            let observed: Vec<f64> = matrix.iter().filter_map(|row| row[col_idx]).collect();
            let Some(column_mean) = mean(&observed) else {
                warn!(
                    "Column '{}' has no observed values; leaving {} cells missing",
                    col_name,
                    missing_rows.len()
                );
                results.push(ColumnImputation {
                    column: col_name.clone(),
                    method: ImputationMethod::Knn,
                    missing_before: missing_rows.len(),
                    values_imputed: 0,
                    remaining_missing: missing_rows.len(),
                });
                continue;
            };

            let mut filled: Vec<Option<f64>> = matrix.iter().map(|row| row[col_idx]).collect();
            let mut mean_fallbacks = 0;
            for &row in &missing_rows {
                let estimate = match self.impute_value(&matrix, row, col_idx) {
                    Some(v) => v,
                    None => {
                        mean_fallbacks += 1;
                        column_mean
                    }
                };
                filled[row] = Some(estimate);
            }

            if mean_fallbacks > 0 {
                debug!(
                    "Column '{}': {} cells had no usable neighbors; used column mean",
                    col_name, mean_fallbacks
                );
            }

            let column = table
                .column_mut(col_name)
                .ok_or_else(|| CleaningError::ColumnNotFound(col_name.clone()))?;
            column.replace_cells(
                DeclaredType::Numeric,
                filled.into_iter().map(|v| v.map(Value::Float)).collect(),
            );

            results.push(ColumnImputation {
                column: col_name.clone(),
                method: ImputationMethod::Knn,
                missing_before: missing_rows.len(),
                values_imputed: missing_rows.len(),
                remaining_missing: 0,
            });
        }

        Ok(results)
    }

    /// Mean of the nearest donors' values, or `None` without any donor.
    fn impute_value(
        &self,
        matrix: &[Vec<Option<f64>>],
        target_row: usize,
        target_col: usize,
    ) -> Option<f64> {
        let mut heap: BinaryHeap<Neighbor> = BinaryHeap::with_capacity(self.n_neighbors + 1);

        for (row, values) in matrix.iter().enumerate() {
            if row == target_row || values[target_col].is_none() {
                continue;
            }
            let distance = nan_euclidean_distance(&matrix[target_row], values);
            if !distance.is_finite() {
                continue;
            }

            let candidate = Neighbor { distance, row };
            if heap.len() < self.n_neighbors {
                heap.push(candidate);
            } else if heap.peek().is_some_and(|farthest| candidate < *farthest) {
                heap.pop();
                heap.push(candidate);
            }
        }

        let donors: Vec<f64> = heap
            .into_iter()
            .filter_map(|n| matrix[n.row][target_col])
            .collect();
        mean(&donors)
    }
}

/// Collect the columns as a row-major float matrix.
fn create_data_matrix(table: &Table, columns: &[String]) -> Result<Vec<Vec<Option<f64>>>> {
    let mut matrix = vec![vec![None; columns.len()]; table.height()];

    for (col_idx, col_name) in columns.iter().enumerate() {
        let values = table.try_column(col_name)?.numeric_values();
        for (row, value) in matrix.iter_mut().zip(values) {
            row[col_idx] = value;
        }
    }

    Ok(matrix)
}

/// Euclidean distance over coordinates present in both rows, scaled by
/// `total / present`. Infinite when the rows share no coordinate.
fn nan_euclidean_distance(a: &[Option<f64>], b: &[Option<f64>]) -> f64 {
    let mut sum_squared_diff = 0.0;
    let mut present = 0usize;

    for (x, y) in a.iter().zip(b) {
        if let (Some(x), Some(y)) = (x, y) {
            let diff = x - y;
            sum_squared_diff += diff * diff;
            present += 1;
        }
    }

    if present == 0 {
        f64::INFINITY
    } else {
        (a.len() as f64 / present as f64 * sum_squared_diff).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;

    fn names(cols: &[&str]) -> Vec<String> {
        cols.iter().map(|s| s.to_string()).collect()
    }

    // ========================================================================
    // KNNImputer::new() tests
    // ========================================================================

    #[test]
    fn test_knn_imputer_new_with_valid_neighbors() {
        assert_eq!(KNNImputer::new(5).n_neighbors(), 5);
    }

    #[test]
    fn test_knn_imputer_new_with_zero_neighbors_defaults_to_one() {
        assert_eq!(KNNImputer::new(0).n_neighbors(), 1);
    }

    // ========================================================================
    // Distance
    // ========================================================================

    #[test]
    fn test_nan_euclidean_distance_scales_for_missing() {
        let a = [Some(0.0), None, Some(3.0)];
        let b = [Some(4.0), Some(1.0), Some(3.0)];
        // sqrt(3/2 * 16)
        assert!((nan_euclidean_distance(&a, &b) - 24f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_nan_euclidean_distance_no_overlap() {
        let a = [Some(1.0), None];
        let b = [None, Some(2.0)];
        assert!(nan_euclidean_distance(&a, &b).is_infinite());
    }

    // ========================================================================
    // fit_transform()
    // ========================================================================

    #[test]
    fn test_fit_transform_uses_nearest_rows() {
        let mut table = Table::new(vec![
            Column::from_f64("f1", &[Some(1.0), Some(2.0), Some(3.0), Some(10.0), Some(11.0)]),
            Column::from_f64("f2", &[Some(10.0), Some(20.0), None, Some(100.0), Some(110.0)]),
        ])
        .unwrap();

        let results = KNNImputer::new(2)
            .fit_transform(&mut table, &names(&["f1", "f2"]))
            .unwrap();

        // Row 2 (f1 = 3) is nearest to rows 1 and 0.
        assert_eq!(table.column("f2").unwrap().get(2), Some(&Value::Float(15.0)));
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].values_imputed, 1);
    }

    #[test]
    fn test_fit_transform_single_column_uses_mean() {
        // With one feature, a missing row shares no coordinate with any donor.
        let mut table = Table::new(vec![Column::from_f64(
            "x",
            &[Some(1.0), None, Some(3.0)],
        )])
        .unwrap();

        KNNImputer::new(5)
            .fit_transform(&mut table, &names(&["x"]))
            .unwrap();
        assert_eq!(table.column("x").unwrap().get(1), Some(&Value::Float(2.0)));
    }

    #[test]
    fn test_fit_transform_all_missing_column_left_alone() {
        let mut table = Table::new(vec![
            Column::from_f64("a", &[Some(1.0), Some(2.0)]),
            Column::from_f64("b", &[None, None]),
        ])
        .unwrap();

        let results = KNNImputer::new(3)
            .fit_transform(&mut table, &names(&["a", "b"]))
            .unwrap();
        assert_eq!(table.column("b").unwrap().missing_count(), 2);
        assert_eq!(results[0].remaining_missing, 2);
    }

    #[test]
    fn test_fit_transform_no_missing_values() {
        let mut table = Table::new(vec![Column::new(
            "n",
            DeclaredType::Numeric,
            vec![Some(Value::Integer(1)), Some(Value::Integer(2))],
        )])
        .unwrap();
        let before = table.clone();

        let results = KNNImputer::new(3)
            .fit_transform(&mut table, &names(&["n"]))
            .unwrap();
        assert!(results.is_empty());
        assert_eq!(table, before);
    }

    #[test]
    fn test_fit_transform_unknown_column_errors() {
        let mut table = Table::new(vec![Column::from_f64("a", &[Some(1.0)])]).unwrap();
        let result = KNNImputer::new(1).fit_transform(&mut table, &names(&["zzz"]));
        assert!(matches!(result, Err(CleaningError::ColumnNotFound(_))));
    }
}
