//! Error types for the cleaning pipeline.
//!
//! Only structurally invalid input is an error here. Cells that fail to
//! coerce, stages with nothing to do and zero-variance columns are reported
//! as data, never raised.
//!
//! Errors are serializable so a frontend can display them.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the cleaning pipeline.
#[derive(Error, Debug)]
pub enum CleaningError {
    /// The declared or detected input format is not one we can read.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The input was in a supported format but could not be parsed.
    #[error("Failed to parse input: {0}")]
    Parse(String),

    /// Columns of different lengths, or row ids that don't match the row count.
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Two columns share the same name.
    #[error("Duplicate column name '{0}'")]
    DuplicateColumn(String),

    /// Two rows share the same identifier.
    #[error("Duplicate row id {0}")]
    DuplicateRowId(u64),

    /// Column was not found in the table.
    #[error("Column '{0}' not found in table")]
    ColumnNotFound(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Spreadsheet reader error wrapper.
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<CleaningError>,
    },
}

impl CleaningError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        CleaningError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get error code for frontend handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            Self::Parse(_) => "PARSE_FAILED",
            Self::ShapeMismatch(_) => "SHAPE_MISMATCH",
            Self::DuplicateColumn(_) => "DUPLICATE_COLUMN",
            Self::DuplicateRowId(_) => "DUPLICATE_ROW_ID",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Spreadsheet(_) => "SPREADSHEET_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Whether the pipeline never started because the input could not be read.
    pub fn is_input_error(&self) -> bool {
        match self {
            Self::UnsupportedFormat(_) | Self::Parse(_) | Self::Io(_) | Self::Spreadsheet(_) => {
                true
            }
            Self::WithContext { source, .. } => source.is_input_error(),
            _ => false,
        }
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for CleaningError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("CleaningError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for cleaning operations.
pub type Result<T> = std::result::Result<T, CleaningError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| CleaningError::Polars(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(
            CleaningError::UnsupportedFormat("pdf".to_string()).error_code(),
            "UNSUPPORTED_FORMAT"
        );
        assert_eq!(
            CleaningError::ColumnNotFound("age".to_string()).error_code(),
            "COLUMN_NOT_FOUND"
        );
    }

    #[test]
    fn test_is_input_error() {
        assert!(CleaningError::UnsupportedFormat("pdf".to_string()).is_input_error());
        assert!(CleaningError::Parse("bad row".to_string()).is_input_error());
        assert!(!CleaningError::DuplicateColumn("a".to_string()).is_input_error());
    }

    #[test]
    fn test_error_serialization() {
        let error = CleaningError::ColumnNotFound("Age".to_string());
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("COLUMN_NOT_FOUND"));
        assert!(json.contains("Age"));
    }

    #[test]
    fn test_with_context() {
        let error = CleaningError::UnsupportedFormat(".pdf".to_string())
            .with_context("While reading upload");
        assert!(error.to_string().contains("While reading upload"));
        assert_eq!(error.error_code(), "UNSUPPORTED_FORMAT");
        assert!(error.is_input_error());
    }
}
