use crate::error::Result;
use crate::ingest::write_csv;
use crate::pipeline::PipelineResult;
use crate::types::{MissingnessReport, StageReport};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

// ============================================================================
// Report Types
// ============================================================================

/// Everything a run produced except the table itself.
///
/// Used for both JSON output (`--json`) and file writing (`--emit-report`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleaningReport {
    /// When the report was generated
    pub generated_at: DateTime<Utc>,
    /// Path to the input file
    pub input_file: String,
    /// Path to the cleaned table, if written
    pub output_file: Option<String>,
    pub summary: ProcessingSummary,
    /// One entry per stage that ran, in execution order
    pub stages: Vec<StageReport>,
    pub missingness_before: MissingnessReport,
    pub missingness_after: MissingnessReport,
    /// `(old, new)` column renames
    pub renamed_columns: Vec<(String, String)>,
    /// Human-readable notes about lossy or skipped work
    pub warnings: Vec<String>,
}

/// Shape and timing of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingSummary {
    pub duration_ms: u64,
    pub rows_before: usize,
    pub rows_after: usize,
    pub columns_before: usize,
    pub columns_after: usize,
    pub missing_percent_before: f64,
    pub missing_percent_after: f64,
}

impl ProcessingSummary {
    pub fn rows_removed(&self) -> usize {
        self.rows_before.saturating_sub(self.rows_after)
    }

    pub fn columns_removed(&self) -> usize {
        self.columns_before.saturating_sub(self.columns_after)
    }
}

// ============================================================================
// Generator
// ============================================================================

/// Builds [`CleaningReport`]s and writes run artifacts to an output directory.
pub struct ReportGenerator {
    output_dir: PathBuf,
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./outputs"),
        }
    }
}

impl ReportGenerator {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Summarize a pipeline run.
    pub fn build_report(
        input_file: &str,
        output_file: Option<&str>,
        result: &PipelineResult,
    ) -> CleaningReport {
        let (rows_before, columns_before) = result.shape_before;
        let summary = ProcessingSummary {
            duration_ms: result.duration_ms,
            rows_before,
            rows_after: result.table.height(),
            columns_before,
            columns_after: result.table.width(),
            missing_percent_before: result.missingness_before.total_missing_percent(),
            missing_percent_after: result.missingness_after.total_missing_percent(),
        };

        CleaningReport {
            generated_at: Utc::now(),
            input_file: input_file.to_string(),
            output_file: output_file.map(String::from),
            summary,
            stages: result.reports.clone(),
            missingness_before: result.missingness_before.clone(),
            missingness_after: result.missingness_after.clone(),
            renamed_columns: result.renamed_columns.clone(),
            warnings: collect_warnings(&result.reports),
        }
    }

    /// Write the report as pretty JSON to `<output_dir>/<base_name>_report.json`.
    pub fn write_report_to_file(
        &self,
        report: &CleaningReport,
        report_base_name: &str,
    ) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;

        let report_path = self
            .output_dir
            .join(format!("{}_report.json", report_base_name));
        let mut file = File::create(&report_path)?;
        file.write_all(serde_json::to_string_pretty(report)?.as_bytes())?;

        info!("Report saved: {}", report_path.display());

        Ok(report_path)
    }

    /// Write the cleaned table to `<output_dir>/<base_name>_cleaned.csv`.
    pub fn write_cleaned_table(
        &self,
        result: &PipelineResult,
        base_name: &str,
    ) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;

        let data_path = self.output_dir.join(format!("{}_cleaned.csv", base_name));
        write_csv(&result.table, &data_path)?;

        info!("Cleaned data saved: {}", data_path.display());

        Ok(data_path)
    }
}

/// Lossy coercions, pruned data and gaps that could not be filled.
fn collect_warnings(reports: &[StageReport]) -> Vec<String> {
    let mut warnings = Vec::new();

    for report in reports {
        match report {
            StageReport::TypeInference(r) => {
                for column in r.columns.iter().filter(|c| c.cells_lost > 0) {
                    warnings.push(format!(
                        "Column '{}': {} of {} values could not be read as {} ({:.2}% lost)",
                        column.column,
                        column.cells_lost,
                        column.cells_considered,
                        column.declared_type,
                        column.percent_lost
                    ));
                }
                for column in r.columns.iter().filter(|c| c.hidden_missing > 0) {
                    warnings.push(format!(
                        "Column '{}': {} placeholder values treated as missing while reading as {}",
                        column.column, column.hidden_missing, column.declared_type
                    ));
                }
            }
            StageReport::Pruning(r) => {
                if !r.dropped_columns.is_empty() {
                    warnings.push(format!(
                        "Dropped {} sparse columns: {}",
                        r.dropped_columns.len(),
                        r.dropped_columns.join(", ")
                    ));
                }
                if !r.dropped_rows.is_empty() {
                    warnings.push(format!("Dropped {} sparse rows", r.dropped_rows.len()));
                }
            }
            StageReport::Imputation(r) => {
                for column in r.summary.columns.iter().filter(|c| c.remaining_missing > 0) {
                    warnings.push(format!(
                        "Column '{}': {} values left missing after {} imputation",
                        column.column,
                        column.remaining_missing,
                        column.method.display_name()
                    ));
                }
            }
            StageReport::Correlation(r) => {
                if !r.dropped_columns.is_empty() {
                    warnings.push(format!(
                        "Dropped {} correlated columns: {}",
                        r.dropped_columns.len(),
                        r.dropped_columns.join(", ")
                    ));
                }
            }
            StageReport::Normalization(_) | StageReport::OutlierDetection(_) => {}
        }
    }

    warnings
}
