//! Repair stages that run before imputation.
//!
//! - Type inference and coercion ([`TypeInferenceEngine`])
//! - Hidden missing-value normalization ([`MissingValueNormalizer`])
//! - Sparse row/column removal ([`SparsityPruner`])

mod converters;
mod pruner;
mod sanitizers;
mod type_inference;

pub use pruner::SparsityPruner;
pub use sanitizers::MissingValueNormalizer;
pub use type_inference::{
    NUMERIC_PARSE_RATE, TEMPORAL_PARSE_RATE, TypeInferenceEngine, detect_mixed_types,
};
