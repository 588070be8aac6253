//! Stage metadata shared between the pipeline stages, the presentation
//! layer and the report generator.

use crate::pipeline::PipelineStage;
use crate::table::{CellType, DeclaredType, RowId, Value};
use serde::{Deserialize, Serialize};

// ============================================================================
// Type inference
// ============================================================================

/// Runtime type labels of one column's non-missing cells with their counts,
/// in first-encountered order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeHistogram {
    counts: Vec<(CellType, usize)>,
}

impl TypeHistogram {
    /// Classify every non-missing cell.
    pub fn from_cells<'a>(cells: impl IntoIterator<Item = &'a Option<Value>>) -> Self {
        let mut histogram = Self::default();
        for cell in cells {
            let label = CellType::of(cell);
            if label != CellType::Missing {
                histogram.record(label);
            }
        }
        histogram
    }

    fn record(&mut self, label: CellType) {
        match self.counts.iter_mut().find(|(l, _)| *l == label) {
            Some((_, count)) => *count += 1,
            None => self.counts.push((label, 1)),
        }
    }

    pub fn counts(&self) -> &[(CellType, usize)] {
        &self.counts
    }

    pub fn labels(&self) -> Vec<CellType> {
        self.counts.iter().map(|(l, _)| *l).collect()
    }

    pub fn count(&self, label: CellType) -> usize {
        self.counts
            .iter()
            .find(|(l, _)| *l == label)
            .map_or(0, |(_, c)| *c)
    }

    pub fn total(&self) -> usize {
        self.counts.iter().map(|(_, c)| c).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// More than one distinct runtime label.
    pub fn is_mixed(&self) -> bool {
        self.counts.len() > 1
    }

    /// Whether the only observed label is `label`.
    pub fn is_only(&self, label: CellType) -> bool {
        self.counts.len() == 1 && self.counts[0].0 == label
    }

    /// Most frequent label; ties go to the label encountered first.
    pub fn dominant(&self) -> Option<CellType> {
        let mut best: Option<(CellType, usize)> = None;
        for &(label, count) in &self.counts {
            if best.is_none_or(|(_, c)| count > c) {
                best = Some((label, count));
            }
        }
        best.map(|(l, _)| l)
    }
}

/// A column whose cells carry more than one runtime type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MixedColumn {
    pub column: String,
    pub histogram: TypeHistogram,
}

/// Every mixed column of a table, in table order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MixedTypeReport {
    pub columns: Vec<MixedColumn>,
}

impl MixedTypeReport {
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn get(&self, column: &str) -> Option<&TypeHistogram> {
        self.columns
            .iter()
            .find(|c| c.column == column)
            .map(|c| &c.histogram)
    }
}

/// Which rule settled a column's declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoercionPass {
    /// Mixed column coerced toward its dominant runtime type.
    DominantType,
    /// All-text column resolved by per-cell parse rates.
    ParseRate,
    /// Column was already homogeneous; only the declared type was recorded.
    Homogeneous,
}

/// Outcome of coercing one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoercionReport {
    pub column: String,
    pub previous_type: DeclaredType,
    pub declared_type: DeclaredType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dominant: Option<CellType>,
    pub pass: CoercionPass,
    /// Cells that were non-missing and not a hidden-missing token.
    pub cells_considered: usize,
    /// Considered cells that failed to parse and became missing.
    pub cells_lost: usize,
    pub percent_lost: f64,
    /// Placeholder tokens such as `"?"` that became real gaps here rather
    /// than in the normalizer.
    #[serde(default)]
    pub hidden_missing: usize,
}

/// Result of the type inference stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeInferenceReport {
    pub mixed_types: MixedTypeReport,
    pub columns: Vec<CoercionReport>,
    /// Sum of the per-column loss percentages.
    pub total_loss_percent: f64,
}

impl TypeInferenceReport {
    pub fn column(&self, name: &str) -> Option<&CoercionReport> {
        self.columns.iter().find(|c| c.column == name)
    }

    /// Placeholder tokens turned into gaps across all columns.
    pub fn total_hidden_missing(&self) -> usize {
        self.columns.iter().map(|c| c.hidden_missing).sum()
    }

    /// Columns whose declared type changed.
    pub fn changed_columns(&self) -> impl Iterator<Item = &CoercionReport> {
        self.columns
            .iter()
            .filter(|c| c.previous_type != c.declared_type)
    }
}

// ============================================================================
// Missingness
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMissingness {
    pub column: String,
    pub missing_count: usize,
    /// Percent of the column length.
    pub missing_percent: f64,
}

/// Missing count and percent per column, always computed from scratch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MissingnessReport {
    pub columns: Vec<ColumnMissingness>,
    pub total_missing: usize,
    pub total_cells: usize,
}

impl MissingnessReport {
    pub fn get(&self, column: &str) -> Option<&ColumnMissingness> {
        self.columns.iter().find(|c| c.column == column)
    }

    pub fn total_missing_percent(&self) -> f64 {
        if self.total_cells == 0 {
            0.0
        } else {
            self.total_missing as f64 / self.total_cells as f64 * 100.0
        }
    }

    /// Columns with at least one missing cell.
    pub fn incomplete_columns(&self) -> impl Iterator<Item = &ColumnMissingness> {
        self.columns.iter().filter(|c| c.missing_count > 0)
    }
}

/// Hidden-missing replacements made in one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnReplacements {
    pub column: String,
    pub replaced: usize,
}

/// Result of the missing-value normalization stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizationReport {
    /// Only columns with at least one replacement.
    pub replacements: Vec<ColumnReplacements>,
    pub total_replaced: usize,
    pub missingness: MissingnessReport,
}

// ============================================================================
// Pruning
// ============================================================================

/// Result of the sparsity pruning stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PruningReport {
    pub threshold: f64,
    pub dropped_columns: Vec<String>,
    pub dropped_rows: Vec<RowId>,
    pub missingness: MissingnessReport,
}

// ============================================================================
// Imputation
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImputationMethod {
    /// Uniform average over the nearest complete-enough rows.
    Knn,
    /// Most frequent value.
    Mode,
    /// Last valid value carried forward.
    ForwardFill,
}

impl ImputationMethod {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Knn => "K-nearest neighbors",
            Self::Mode => "Most frequent value",
            Self::ForwardFill => "Forward fill",
        }
    }
}

/// What imputation did to one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnImputation {
    pub column: String,
    pub method: ImputationMethod,
    pub missing_before: usize,
    pub values_imputed: usize,
    /// Cells that stayed missing (leading gaps, all-missing columns).
    pub remaining_missing: usize,
}

/// Before/after totals for the imputation stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImputationSummary {
    pub total_missing_before: usize,
    pub total_missing_after: usize,
    pub values_imputed: usize,
    pub total_cells: usize,
    /// `values_imputed` as a percent of `total_cells`.
    pub imputation_percent: f64,
    pub columns: Vec<ColumnImputation>,
}

/// Result of the imputation stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImputationReport {
    /// Columns that took part in neighbor imputation.
    pub numeric_columns: Vec<String>,
    pub summary: ImputationSummary,
    pub missingness: MissingnessReport,
}

// ============================================================================
// Outliers
// ============================================================================

/// Inclusive IQR fences of a numeric column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IqrBounds {
    pub q1: f64,
    pub q3: f64,
    pub lower: f64,
    pub upper: f64,
}

/// One flag per row, true where the cell is anomalous.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierMask {
    pub column: String,
    pub flags: Vec<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounds: Option<IqrBounds>,
}

impl OutlierMask {
    pub fn count(&self) -> usize {
        self.flags.iter().filter(|f| **f).count()
    }

    /// Row positions that are flagged.
    pub fn flagged_rows(&self) -> Vec<usize> {
        self.flags
            .iter()
            .enumerate()
            .filter(|(_, f)| **f)
            .map(|(i, _)| i)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierCount {
    pub column: String,
    pub count: usize,
    /// Percent of the row count.
    pub percent: f64,
}

/// Outlier counts per column, largest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutlierSummary {
    pub numeric: Vec<OutlierCount>,
    pub categorical: Vec<OutlierCount>,
}

/// Result of the outlier detection stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutlierReport {
    pub numeric: Vec<OutlierMask>,
    pub categorical: Vec<OutlierMask>,
    pub summary: OutlierSummary,
}

impl OutlierReport {
    pub fn numeric_mask(&self, column: &str) -> Option<&OutlierMask> {
        self.numeric.iter().find(|m| m.column == column)
    }

    pub fn categorical_mask(&self, column: &str) -> Option<&OutlierMask> {
        self.categorical.iter().find(|m| m.column == column)
    }

    pub fn total_flagged(&self) -> usize {
        self.numeric
            .iter()
            .chain(&self.categorical)
            .map(OutlierMask::count)
            .sum()
    }
}

// ============================================================================
// Correlation
// ============================================================================

/// Two numeric columns and their Pearson correlation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelatedPair {
    pub first: String,
    pub second: String,
    pub correlation: f64,
}

impl CorrelatedPair {
    pub fn strength(&self) -> f64 {
        self.correlation.abs()
    }
}

/// Result of correlation pruning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrelationReport {
    pub threshold: f64,
    pub pairs: Vec<CorrelatedPair>,
    pub dropped_columns: Vec<String>,
}

// ============================================================================
// Stage reports
// ============================================================================

/// Metadata produced by one pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stage", content = "report", rename_all = "snake_case")]
pub enum StageReport {
    TypeInference(TypeInferenceReport),
    Normalization(NormalizationReport),
    Pruning(PruningReport),
    Imputation(ImputationReport),
    OutlierDetection(OutlierReport),
    Correlation(CorrelationReport),
}

impl StageReport {
    pub fn stage(&self) -> PipelineStage {
        match self {
            Self::TypeInference(_) => PipelineStage::TypeInference,
            Self::Normalization(_) => PipelineStage::Normalization,
            Self::Pruning(_) => PipelineStage::Pruning,
            Self::Imputation(_) => PipelineStage::Imputation,
            Self::OutlierDetection(_) => PipelineStage::OutlierDetection,
            Self::Correlation(_) => PipelineStage::Correlation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_histogram_counts_in_first_seen_order() {
        let cells = vec![
            Some(Value::from("a")),
            Some(Value::Integer(1)),
            None,
            Some(Value::Integer(2)),
        ];
        let histogram = TypeHistogram::from_cells(&cells);

        assert_eq!(
            histogram.counts(),
            &[(CellType::Text, 1), (CellType::Integer, 2)]
        );
        assert!(histogram.is_mixed());
        assert_eq!(histogram.dominant(), Some(CellType::Integer));
        assert_eq!(histogram.total(), 3);
    }

    #[test]
    fn test_histogram_tie_goes_to_first_label() {
        let cells = vec![
            Some(Value::Float(1.5)),
            Some(Value::from("x")),
            Some(Value::from("y")),
            Some(Value::Float(2.5)),
        ];
        let histogram = TypeHistogram::from_cells(&cells);
        assert_eq!(histogram.dominant(), Some(CellType::Float));
    }

    #[test]
    fn test_empty_histogram() {
        let cells: Vec<Option<Value>> = vec![None, None];
        let histogram = TypeHistogram::from_cells(&cells);
        assert!(histogram.is_empty());
        assert!(!histogram.is_mixed());
        assert_eq!(histogram.dominant(), None);
    }

    #[test]
    fn test_outlier_mask_helpers() {
        let mask = OutlierMask {
            column: "x".to_string(),
            flags: vec![false, true, false, true],
            bounds: None,
        };
        assert_eq!(mask.count(), 2);
        assert_eq!(mask.flagged_rows(), vec![1, 3]);
    }

    #[test]
    fn test_stage_report_serializes_with_tag() {
        let report = StageReport::Pruning(PruningReport {
            threshold: 0.9,
            dropped_columns: vec!["notes".to_string()],
            dropped_rows: vec![RowId(3)],
            missingness: MissingnessReport::default(),
        });
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["stage"], "pruning");
        assert_eq!(json["report"]["dropped_rows"][0], 3);
    }
}
