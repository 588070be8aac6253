//! Stage notifications for the presentation layer.
//!
//! After every stage the pipeline hands the current table and that stage's
//! report to a [`StageObserver`]. Observers only ever see a shared
//! reference, so they can render but not modify the table.
//!
//! # Example
//!
//! ```rust,ignore
//! use lex_cleaner::Pipeline;
//!
//! let result = Pipeline::builder()
//!     .on_stage(|table, report| {
//!         println!("[{}] {} rows", report.stage().display_name(), table.height());
//!     })
//!     .build()?
//!     .process(table)?;
//! ```

use crate::table::Table;
use crate::types::StageReport;
use serde::{Deserialize, Serialize};

/// Stages of the cleaning pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Type detection and coercion
    TypeInference,
    /// Hidden missing-value replacement
    Normalization,
    /// Sparse column and row removal
    Pruning,
    /// Gap filling
    Imputation,
    /// Numeric and categorical outlier flags
    OutlierDetection,
    /// Optional removal of redundant numeric columns
    Correlation,
}

impl PipelineStage {
    /// Every stage in execution order.
    pub const ALL: [PipelineStage; 6] = [
        Self::TypeInference,
        Self::Normalization,
        Self::Pruning,
        Self::Imputation,
        Self::OutlierDetection,
        Self::Correlation,
    ];

    /// Returns a human-readable name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::TypeInference => "Inferring Types",
            Self::Normalization => "Normalizing Missing Values",
            Self::Pruning => "Pruning Sparse Data",
            Self::Imputation => "Imputing Values",
            Self::OutlierDetection => "Detecting Outliers",
            Self::Correlation => "Removing Correlated Features",
        }
    }

    /// One-based position in the pipeline.
    pub fn step(&self) -> usize {
        Self::ALL
            .iter()
            .position(|s| s == self)
            .map_or(0, |i| i + 1)
    }
}

/// Receives the table and report after each stage.
///
/// Implementations must be `Send + Sync` so that a pipeline running on a
/// background thread can notify a UI.
pub trait StageObserver: Send + Sync {
    fn on_stage(&self, table: &Table, report: &StageReport);
}

/// Wrapper that implements [`StageObserver`] using a closure.
pub struct ClosureStageObserver<F>
where
    F: Fn(&Table, &StageReport) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureStageObserver<F>
where
    F: Fn(&Table, &StageReport) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> StageObserver for ClosureStageObserver<F>
where
    F: Fn(&Table, &StageReport) + Send + Sync,
{
    fn on_stage(&self, table: &Table, report: &StageReport) {
        (self.callback)(table, report);
    }
}

static_assertions::assert_impl_all!(PipelineStage: Send, Sync);
