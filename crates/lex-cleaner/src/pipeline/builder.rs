//! Main cleaning pipeline module.
//!
//! This module provides the core `Pipeline` struct and builder for
//! orchestrating the cleaning workflow.

use crate::cleaner::{MissingValueNormalizer, SparsityPruner, TypeInferenceEngine};
use crate::config::PipelineConfig;
use crate::error::{CleaningError, Result};
use crate::imputers::Imputer;
use crate::pipeline::outliers::OutlierDetector;
use crate::pipeline::progress::{ClosureStageObserver, PipelineStage, StageObserver};
use crate::quality::CorrelationAnalyzer;
use crate::table::Table;
use crate::types::{
    CorrelationReport, ImputationReport, MissingnessReport, NormalizationReport, OutlierReport,
    PruningReport, StageReport, TypeInferenceReport,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// The cleaning pipeline.
///
/// Use [`Pipeline::builder()`] to create a new pipeline with custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// use lex_cleaner::{Pipeline, PipelineConfig};
///
/// let result = Pipeline::builder()
///     .config(PipelineConfig::builder().correlation_threshold(0.95).build()?)
///     .on_stage(|table, report| {
///         println!("{}: {} rows", report.stage().display_name(), table.height());
///     })
///     .build()?
///     .process(table)?;
/// ```
pub struct Pipeline {
    config: PipelineConfig,
    observer: Option<Arc<dyn StageObserver>>,
    type_engine: TypeInferenceEngine,
    normalizer: MissingValueNormalizer,
    pruner: SparsityPruner,
    imputer: Imputer,
    outliers: OutlierDetector,
    correlation: CorrelationAnalyzer,
}

// A pipeline may be moved to a worker thread while a UI observes it.
static_assertions::assert_impl_all!(Pipeline: Send);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage over `table`, in order.
    ///
    /// Cells that cannot be coerced, columns with nothing to impute and
    /// constant columns are reported, never raised. Errors come only from
    /// structural problems such as column names colliding after
    /// standardization.
    pub fn process(&self, mut table: Table) -> Result<PipelineResult> {
        let start_time = Instant::now();
        let shape_before = table.shape();
        info!(
            "Starting cleaning pipeline on {} rows x {} columns",
            shape_before.0, shape_before.1
        );

        let renamed_columns = if self.config.standardize_column_names {
            let renamed = table.standardize_column_names()?;
            if !renamed.is_empty() {
                debug!("Standardized {} column names", renamed.len());
            }
            renamed
        } else {
            Vec::new()
        };

        let missingness_before = MissingnessReport::compute(&table);
        let mut reports = Vec::with_capacity(PipelineStage::ALL.len());

        // Step 1: type inference and coercion
        let (table, report) = self.type_engine.infer_and_coerce(table);
        self.notify(&table, StageReport::TypeInference(report), &mut reports);

        // Step 2: hidden missing values become real gaps
        let (table, report) = self.normalizer.normalize(table);
        self.notify(&table, StageReport::Normalization(report), &mut reports);

        // Step 3: sparse columns, then sparse rows
        let (table, report) = self.pruner.prune(table)?;
        self.notify(&table, StageReport::Pruning(report), &mut reports);

        // Step 4: imputation
        let (table, report) = self.imputer.impute(table)?;
        self.notify(&table, StageReport::Imputation(report), &mut reports);

        // Step 5: outlier flags, computed on the imputed table
        let report = self.outliers.detect(&table);
        self.notify(&table, StageReport::OutlierDetection(report), &mut reports);

        // Step 6: optional correlation pruning
        let table = match self.config.correlation_threshold {
            Some(threshold) => {
                let (table, report) = self.correlation.remove_redundant(table, threshold);
                self.notify(&table, StageReport::Correlation(report), &mut reports);
                table
            }
            None => {
                debug!("Correlation pruning disabled");
                table
            }
        };

        let missingness_after = MissingnessReport::compute(&table);
        let duration_ms = start_time.elapsed().as_millis() as u64;

        info!(
            "Pipeline complete in {}ms: {} rows x {} columns -> {} rows x {} columns",
            duration_ms,
            shape_before.0,
            shape_before.1,
            table.height(),
            table.width()
        );

        Ok(PipelineResult {
            table,
            shape_before,
            reports,
            missingness_before,
            missingness_after,
            renamed_columns,
            duration_ms,
        })
    }

    fn notify(&self, table: &Table, report: StageReport, reports: &mut Vec<StageReport>) {
        if let Some(observer) = &self.observer {
            observer.on_stage(table, &report);
        }
        reports.push(report);
    }
}

/// Output of [`Pipeline::process`].
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    /// The cleaned table.
    pub table: Table,
    /// `(rows, columns)` of the input table.
    pub shape_before: (usize, usize),
    /// One report per stage that ran, in execution order.
    pub reports: Vec<StageReport>,
    pub missingness_before: MissingnessReport,
    pub missingness_after: MissingnessReport,
    /// `(old, new)` pairs for columns renamed by standardization.
    pub renamed_columns: Vec<(String, String)>,
    pub duration_ms: u64,
}

impl PipelineResult {
    /// The report of `stage`, if that stage ran.
    pub fn report(&self, stage: PipelineStage) -> Option<&StageReport> {
        self.reports.iter().find(|r| r.stage() == stage)
    }

    pub fn type_inference(&self) -> Option<&TypeInferenceReport> {
        self.reports.iter().find_map(|r| match r {
            StageReport::TypeInference(report) => Some(report),
            _ => None,
        })
    }

    pub fn normalization(&self) -> Option<&NormalizationReport> {
        self.reports.iter().find_map(|r| match r {
            StageReport::Normalization(report) => Some(report),
            _ => None,
        })
    }

    pub fn pruning(&self) -> Option<&PruningReport> {
        self.reports.iter().find_map(|r| match r {
            StageReport::Pruning(report) => Some(report),
            _ => None,
        })
    }

    pub fn imputation(&self) -> Option<&ImputationReport> {
        self.reports.iter().find_map(|r| match r {
            StageReport::Imputation(report) => Some(report),
            _ => None,
        })
    }

    pub fn outliers(&self) -> Option<&OutlierReport> {
        self.reports.iter().find_map(|r| match r {
            StageReport::OutlierDetection(report) => Some(report),
            _ => None,
        })
    }

    pub fn correlation(&self) -> Option<&CorrelationReport> {
        self.reports.iter().find_map(|r| match r {
            StageReport::Correlation(report) => Some(report),
            _ => None,
        })
    }
}

/// Builder for creating a [`Pipeline`] with custom configuration.
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<PipelineConfig>,
    observer: Option<Arc<dyn StageObserver>>,
}

impl PipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set an observer that receives the table and report after each stage.
    pub fn observer(mut self, observer: Arc<dyn StageObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Set a closure as the stage observer.
    ///
    /// This is a convenience method that wraps the closure in a
    /// [`ClosureStageObserver`].
    pub fn on_stage<F>(self, callback: F) -> Self
    where
        F: Fn(&Table, &StageReport) + Send + Sync + 'static,
    {
        self.observer(Arc::new(ClosureStageObserver::new(callback)))
    }

    /// Build the pipeline.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> Result<Pipeline> {
        let config = self.config.unwrap_or_default();
        config
            .validate()
            .map_err(|e| CleaningError::InvalidConfig(e.to_string()))?;

        Ok(Pipeline {
            type_engine: TypeInferenceEngine::new(),
            normalizer: MissingValueNormalizer::new(),
            pruner: SparsityPruner::new(config.sparsity_threshold),
            imputer: Imputer::new(config.knn_neighbors),
            outliers: OutlierDetector::new(),
            correlation: CorrelationAnalyzer::new(),
            observer: self.observer,
            config,
        })
    }
}
