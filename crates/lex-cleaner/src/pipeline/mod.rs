//! Pipeline orchestration.
//!
//! [`Pipeline`] runs the stages in a fixed order over an owned [`Table`]:
//! type inference, missing-value normalization, sparsity pruning,
//! imputation, outlier detection and, when configured, correlation pruning.
//!
//! [`Table`]: crate::table::Table

mod builder;
pub mod outliers;
pub mod progress;

pub use builder::{Pipeline, PipelineBuilder, PipelineResult};
pub use outliers::OutlierDetector;
pub use progress::{ClosureStageObserver, PipelineStage, StageObserver};
