//! Data Cleaning Pipeline Library
//!
//! Automatic data-quality inference and repair for messy tabular datasets.
//!
//! # Overview
//!
//! A [`Table`] goes through a fixed sequence of stages:
//!
//! - **Type Inference**: detect columns whose cells disagree on a type and
//!   coerce them toward the dominant type, reporting any loss
//! - **Missing-Value Normalization**: turn placeholder text such as `"?"`,
//!   `"N/A"` or `"-1"` into real gaps
//! - **Sparsity Pruning**: drop columns, then rows, whose missing fraction
//!   reaches the threshold
//! - **Imputation**: KNN for numeric columns, mode for text and booleans,
//!   forward fill for dates
//! - **Outlier Detection**: IQR fences for numbers, rare categories for text
//! - **Correlation Pruning** (optional): drop one column of every highly
//!   correlated numeric pair
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use lex_cleaner::{Pipeline, PipelineConfig, ingest};
//! use std::path::Path;
//!
//! let table = ingest::read_path(Path::new("data.csv"))?;
//!
//! let result = Pipeline::builder()
//!     .config(PipelineConfig::builder().correlation_threshold(0.95).build()?)
//!     .on_stage(|table, report| {
//!         println!("{} -> {} rows", report.stage().display_name(), table.height());
//!     })
//!     .build()?
//!     .process(table)?;
//!
//! let outliers = result.outliers().expect("outlier stage always runs");
//! println!("{} cells flagged", outliers.total_flagged());
//! ```
//!
//! # Errors
//!
//! Only structurally invalid input fails: unreadable files, unequal column
//! lengths, duplicate names or row ids. Cells that cannot be coerced,
//! stages with nothing to do and constant columns appear in the stage
//! reports instead.

pub mod cleaner;
pub mod config;
pub mod error;
pub mod imputers;
pub mod ingest;
pub mod pipeline;
pub mod quality;
pub mod reporting;
pub mod table;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use cleaner::{MissingValueNormalizer, SparsityPruner, TypeInferenceEngine, detect_mixed_types};
pub use config::{ConfigValidationError, PipelineConfig, PipelineConfigBuilder};
pub use error::{CleaningError, Result as CleaningResult, ResultExt};
pub use imputers::{Imputer, KNNImputer, StatisticalImputer};
pub use ingest::{InputFormat, read_bytes, read_path, write_csv};
pub use pipeline::{
    ClosureStageObserver, OutlierDetector, Pipeline, PipelineBuilder, PipelineResult,
    PipelineStage, StageObserver,
};
pub use quality::CorrelationAnalyzer;
pub use reporting::{CleaningReport, ProcessingSummary, ReportGenerator};
pub use table::{CellType, Column, DeclaredType, RowId, Table, Value};
pub use types::{
    CoercionReport, CorrelationReport, ImputationReport, ImputationSummary, MissingnessReport,
    MixedTypeReport, NormalizationReport, OutlierMask, OutlierReport, PruningReport, StageReport,
    TypeHistogram, TypeInferenceReport,
};
