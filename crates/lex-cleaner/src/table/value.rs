//! Cell values and their runtime classification.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Output format for temporal values (ISO 8601 without offset).
pub const TEMPORAL_DISPLAY_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// A single non-missing cell value.
///
/// Missing cells are `None` in an `Option<Value>`; there is no in-band
/// missing marker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Integer(i64),
    Float(f64),
    Text(String),
    Boolean(bool),
    Temporal(NaiveDateTime),
}

impl Value {
    /// Classify the runtime representation of this value.
    pub fn cell_type(&self) -> CellType {
        match self {
            Value::Integer(_) => CellType::Integer,
            Value::Float(_) => CellType::Float,
            Value::Text(_) => CellType::Text,
            Value::Boolean(_) => CellType::Boolean,
            Value::Temporal(_) => CellType::Temporal,
        }
    }

    /// Numeric view of the value, if it is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Text form used for casting and sentinel comparison.
    pub fn as_display(&self) -> String {
        match self {
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Text(s) => s.clone(),
            Value::Boolean(b) => b.to_string(),
            Value::Temporal(dt) => dt.format(TEMPORAL_DISPLAY_FORMAT).to_string(),
        }
    }
}

// Floats compare by bit pattern so that `Value` can key frequency tables.
// Stored floats are always finite.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Temporal(a), Value::Temporal(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Integer(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Text(s) => s.hash(state),
            Value::Boolean(b) => b.hash(state),
            Value::Temporal(dt) => dt.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Value::Temporal(value)
    }
}

/// Runtime type label of a cell, used to build type histograms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellType {
    Integer,
    Float,
    Text,
    Boolean,
    Temporal,
    Missing,
}

impl CellType {
    /// Classify a cell once, up front.
    pub fn of(cell: &Option<Value>) -> Self {
        cell.as_ref().map_or(CellType::Missing, Value::cell_type)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Text => "text",
            Self::Boolean => "boolean",
            Self::Temporal => "temporal",
            Self::Missing => "missing",
        }
    }
}

impl fmt::Display for CellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The single canonical type a column has been resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeclaredType {
    Numeric,
    Text,
    Boolean,
    Temporal,
    /// Not yet typed; cells may be heterogeneous.
    #[default]
    Unresolved,
}

impl DeclaredType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::Text => "text",
            Self::Boolean => "boolean",
            Self::Temporal => "temporal",
            Self::Unresolved => "unresolved",
        }
    }

    /// Text or not-yet-typed columns, the ones that can hide sentinels.
    pub fn is_text_like(&self) -> bool {
        matches!(self, Self::Text | Self::Unresolved)
    }

    /// Whether a non-missing value conforms to this declared type.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::Numeric => matches!(value, Value::Integer(_) | Value::Float(_)),
            Self::Text => matches!(value, Value::Text(_)),
            Self::Boolean => matches!(value, Value::Boolean(_)),
            Self::Temporal => matches!(value, Value::Temporal(_)),
            Self::Unresolved => true,
        }
    }

    /// The declared type implied by a single runtime label.
    pub fn from_cell_type(cell_type: CellType) -> Self {
        match cell_type {
            CellType::Integer | CellType::Float => Self::Numeric,
            CellType::Text => Self::Text,
            CellType::Boolean => Self::Boolean,
            CellType::Temporal => Self::Temporal,
            CellType::Missing => Self::Unresolved,
        }
    }
}

impl fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
