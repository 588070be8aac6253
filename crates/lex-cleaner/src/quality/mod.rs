//! Data quality measurements.
//!
//! This module provides missingness reporting, recomputed from scratch after
//! every stage that can change it, and the optional correlation analysis of
//! numeric features.

mod correlation;
mod missingness;

pub use correlation::{
    CorrelationAnalyzer, DEFAULT_REMOVAL_THRESHOLD, DEFAULT_REPORT_THRESHOLD, pearson,
};
