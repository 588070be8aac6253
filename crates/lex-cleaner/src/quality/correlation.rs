//! Correlation analysis over numeric columns.

use crate::table::{DeclaredType, Table};
use crate::types::{CorrelatedPair, CorrelationReport};
use tracing::{debug, info};

/// Default cutoff for reporting correlated pairs.
pub const DEFAULT_REPORT_THRESHOLD: f64 = 0.5;

/// Default cutoff for dropping redundant columns.
pub const DEFAULT_REMOVAL_THRESHOLD: f64 = 0.95;

/// Pearson correlation over rows where both values are present.
///
/// Returns `None` with fewer than two complete pairs or when either side is
/// constant over those pairs.
pub fn pearson(x: &[Option<f64>], y: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(a, _)| a).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, b)| b).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in &pairs {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some((cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0))
}

/// Finds and removes redundant numeric features.
#[derive(Debug, Default, Clone, Copy)]
pub struct CorrelationAnalyzer;

impl CorrelationAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Every unordered pair of numeric columns whose absolute correlation
    /// exceeds `threshold`, strongest first.
    pub fn find_correlated_pairs(&self, table: &Table, threshold: f64) -> Vec<CorrelatedPair> {
        let numeric: Vec<(&str, Vec<Option<f64>>)> = table
            .columns()
            .iter()
            .filter(|c| c.declared_type() == DeclaredType::Numeric)
            .map(|c| (c.name(), c.numeric_values()))
            .collect();

        if numeric.len() < 2 {
            debug!("Fewer than two numeric columns; skipping correlation");
            return Vec::new();
        }

        let mut pairs = Vec::new();
        for (i, (first, x)) in numeric.iter().enumerate() {
            for (second, y) in &numeric[i + 1..] {
                if let Some(r) = pearson(x, y)
                    && r.abs() > threshold
                {
                    pairs.push(CorrelatedPair {
                        first: first.to_string(),
                        second: second.to_string(),
                        correlation: r,
                    });
                }
            }
        }

        pairs.sort_by(|a, b| b.strength().total_cmp(&a.strength()));
        pairs
    }

    /// Drop the later column of every pair above `threshold`.
    pub fn remove_redundant(&self, mut table: Table, threshold: f64) -> (Table, CorrelationReport) {
        let pairs = self.find_correlated_pairs(&table, threshold);

        let mut to_drop: Vec<String> = Vec::new();
        for pair in &pairs {
            if !to_drop.contains(&pair.second) {
                to_drop.push(pair.second.clone());
            }
        }
        // Keep table order in the report.
        let dropped_columns = table.drop_columns(&to_drop);

        info!(
            "Correlation: {} pairs above {:.2}, dropped {} columns",
            pairs.len(),
            threshold,
            dropped_columns.len()
        );

        let report = CorrelationReport {
            threshold,
            pairs,
            dropped_columns,
        };
        (table, report)
    }
}
