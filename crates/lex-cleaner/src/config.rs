//! Configuration types for the cleaning pipeline.
//!
//! The statistical heuristics (parse-rate cutoffs, IQR multiplier, rarity
//! gates) are fixed constants in their modules. Only the knobs that change
//! *what* the pipeline does live here.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default missing fraction at which a column or row is dropped.
pub const DEFAULT_SPARSITY_THRESHOLD: f64 = 0.9;

/// Default number of neighbors for KNN imputation.
pub const DEFAULT_KNN_NEIGHBORS: usize = 5;

/// Configuration for the cleaning pipeline.
///
/// Use [`PipelineConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use lex_cleaner::config::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .sparsity_threshold(0.8)
///     .correlation_threshold(0.95)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Missing fraction (0.0 - 1.0) at which a column, then a row, is dropped.
    /// The boundary is inclusive.
    /// Default: 0.9
    pub sparsity_threshold: f64,

    /// Number of neighbors for KNN imputation of numeric columns.
    /// Default: 5
    pub knn_neighbors: usize,

    /// Whether to normalize column names (trim, lower-case, `_` for spaces).
    /// Default: true
    pub standardize_column_names: bool,

    /// When set, drop one column of every numeric pair whose absolute
    /// correlation exceeds this value after outlier detection.
    /// Default: None (skip)
    pub correlation_threshold: Option<f64>,

    /// Output directory for reports and cleaned data.
    /// Default: "outputs"
    pub output_dir: PathBuf,

    /// Whether to write the cleaned table and report to disk.
    /// Default: false
    pub save_to_disk: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sparsity_threshold: DEFAULT_SPARSITY_THRESHOLD,
            knn_neighbors: DEFAULT_KNN_NEIGHBORS,
            standardize_column_names: true,
            correlation_threshold: None,
            output_dir: PathBuf::from("outputs"),
            save_to_disk: false,
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !(0.0..=1.0).contains(&self.sparsity_threshold) {
            return Err(ConfigValidationError::InvalidThreshold {
                field: "sparsity_threshold".to_string(),
                value: self.sparsity_threshold,
            });
        }

        if let Some(threshold) = self.correlation_threshold
            && !(0.0..=1.0).contains(&threshold)
        {
            return Err(ConfigValidationError::InvalidThreshold {
                field: "correlation_threshold".to_string(),
                value: threshold,
            });
        }

        if self.knn_neighbors == 0 {
            return Err(ConfigValidationError::InvalidKnnNeighbors(
                self.knn_neighbors,
            ));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid threshold for '{field}': {value} (must be between 0.0 and 1.0)")]
    InvalidThreshold { field: String, value: f64 },

    #[error("Invalid KNN neighbors: {0} (must be at least 1)")]
    InvalidKnnNeighbors(usize),
}

/// Builder for [`PipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    sparsity_threshold: Option<f64>,
    knn_neighbors: Option<usize>,
    standardize_column_names: Option<bool>,
    correlation_threshold: Option<f64>,
    output_dir: Option<PathBuf>,
    save_to_disk: Option<bool>,
}

impl PipelineConfigBuilder {
    /// Set the missing fraction at which columns and rows are dropped.
    ///
    /// # Arguments
    /// * `threshold` - Value between 0.0 and 1.0 (e.g., 0.9 = 90%)
    pub fn sparsity_threshold(mut self, threshold: f64) -> Self {
        self.sparsity_threshold = Some(threshold);
        self
    }

    /// Set the number of neighbors for KNN imputation.
    pub fn knn_neighbors(mut self, k: usize) -> Self {
        self.knn_neighbors = Some(k);
        self
    }

    /// Enable or disable column name standardization.
    pub fn standardize_column_names(mut self, enable: bool) -> Self {
        self.standardize_column_names = Some(enable);
        self
    }

    /// Enable correlation pruning with the given absolute-correlation cutoff.
    pub fn correlation_threshold(mut self, threshold: f64) -> Self {
        self.correlation_threshold = Some(threshold);
        self
    }

    /// Set the output directory for reports and cleaned data.
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Enable or disable writing results to disk.
    pub fn save_to_disk(mut self, save: bool) -> Self {
        self.save_to_disk = Some(save);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PipelineConfig` or an error if validation fails.
    pub fn build(self) -> Result<PipelineConfig, ConfigValidationError> {
        let config = PipelineConfig {
            sparsity_threshold: self
                .sparsity_threshold
                .unwrap_or(DEFAULT_SPARSITY_THRESHOLD),
            knn_neighbors: self.knn_neighbors.unwrap_or(DEFAULT_KNN_NEIGHBORS),
            standardize_column_names: self.standardize_column_names.unwrap_or(true),
            correlation_threshold: self.correlation_threshold,
            output_dir: self
                .output_dir
                .unwrap_or_else(|| PathBuf::from("outputs")),
            save_to_disk: self.save_to_disk.unwrap_or(false),
        };

        config.validate()?;
        Ok(config)
    }
}
