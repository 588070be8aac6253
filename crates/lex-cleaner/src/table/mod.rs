//! In-memory tabular model shared by every pipeline stage.
//!
//! A [`Table`] is an ordered list of named [`Column`]s aligned by a shared
//! list of [`RowId`]s. Column-wise transformations never touch row ids;
//! row pruning subsets them explicitly and reports what was removed.

mod value;

pub use value::{CellType, DeclaredType, TEMPORAL_DISPLAY_FORMAT, Value};

use crate::error::{CleaningError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Stable identifier of a row. Ingested tables number rows from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(pub u64);

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named sequence of cells with a declared type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    name: String,
    declared_type: DeclaredType,
    cells: Vec<Option<Value>>,
}

impl Column {
    pub fn new(
        name: impl Into<String>,
        declared_type: DeclaredType,
        cells: Vec<Option<Value>>,
    ) -> Self {
        Self {
            name: name.into(),
            declared_type,
            cells,
        }
    }

    /// Untyped column of raw values, as ingestion produces them.
    pub fn unresolved(name: impl Into<String>, cells: Vec<Option<Value>>) -> Self {
        Self::new(name, DeclaredType::Unresolved, cells)
    }

    /// Untyped column of text cells; `None` entries are missing.
    pub fn from_text(name: impl Into<String>, cells: &[Option<&str>]) -> Self {
        Self::unresolved(
            name,
            cells.iter().map(|c| c.map(Value::from)).collect(),
        )
    }

    /// Numeric column of float cells; `None` entries are missing.
    pub fn from_f64(name: impl Into<String>, cells: &[Option<f64>]) -> Self {
        Self::new(
            name,
            DeclaredType::Numeric,
            cells.iter().map(|c| c.map(Value::Float)).collect(),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declared_type(&self) -> DeclaredType {
        self.declared_type
    }

    pub fn cells(&self) -> &[Option<Value>] {
        &self.cells
    }

    pub fn get(&self, row: usize) -> Option<&Value> {
        self.cells.get(row).and_then(Option::as_ref)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn missing_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_none()).count()
    }

    pub fn non_missing_count(&self) -> usize {
        self.cells.len() - self.missing_count()
    }

    /// Fraction of missing cells; an empty column counts as fully observed.
    pub fn missing_fraction(&self) -> f64 {
        if self.cells.is_empty() {
            0.0
        } else {
            self.missing_count() as f64 / self.cells.len() as f64
        }
    }

    /// Numeric view of every cell; non-numeric and missing cells are `None`.
    pub fn numeric_values(&self) -> Vec<Option<f64>> {
        self.cells
            .iter()
            .map(|c| c.as_ref().and_then(Value::as_f64))
            .collect()
    }

    /// Whether every non-missing cell conforms to the declared type.
    pub fn conforms(&self) -> bool {
        self.cells
            .iter()
            .flatten()
            .all(|v| self.declared_type.accepts(v))
    }

    pub(crate) fn set_declared_type(&mut self, declared_type: DeclaredType) {
        self.declared_type = declared_type;
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [Option<Value>] {
        &mut self.cells
    }

    /// Replace all cells; the caller keeps the length unchanged.
    pub(crate) fn replace_cells(&mut self, declared_type: DeclaredType, cells: Vec<Option<Value>>) {
        debug_assert_eq!(cells.len(), self.cells.len());
        self.declared_type = declared_type;
        self.cells = cells;
    }

    pub(crate) fn rename(&mut self, name: String) {
        self.name = name;
    }

    fn retain_rows(&mut self, keep: &[bool]) {
        let mut idx = 0;
        self.cells.retain(|_| {
            let k = keep[idx];
            idx += 1;
            k
        });
    }
}

/// An ordered collection of equal-length columns sharing row identifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    row_ids: Vec<RowId>,
    columns: Vec<Column>,
}

impl Table {
    /// Build a table whose rows are numbered from 1.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let height = columns.first().map_or(0, Column::len);
        let row_ids = (1..=height as u64).map(RowId).collect();
        Self::with_row_ids(row_ids, columns)
    }

    /// Build a table with explicit row identifiers.
    pub fn with_row_ids(row_ids: Vec<RowId>, columns: Vec<Column>) -> Result<Self> {
        let mut seen_ids = HashSet::with_capacity(row_ids.len());
        for id in &row_ids {
            if !seen_ids.insert(*id) {
                return Err(CleaningError::DuplicateRowId(id.0));
            }
        }

        let mut seen_names = HashSet::with_capacity(columns.len());
        for column in &columns {
            if column.len() != row_ids.len() {
                return Err(CleaningError::ShapeMismatch(format!(
                    "column '{}' has {} cells but the table has {} rows",
                    column.name(),
                    column.len(),
                    row_ids.len()
                )));
            }
            if !seen_names.insert(column.name().to_string()) {
                return Err(CleaningError::DuplicateColumn(column.name().to_string()));
            }
        }

        Ok(Self { row_ids, columns })
    }

    pub fn empty() -> Self {
        Self {
            row_ids: Vec::new(),
            columns: Vec::new(),
        }
    }

    pub fn height(&self) -> usize {
        self.row_ids.len()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.height(), self.width())
    }

    pub fn row_ids(&self) -> &[RowId] {
        &self.row_ids
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    /// Look up a column, failing with `ColumnNotFound`.
    pub fn try_column(&self, name: &str) -> Result<&Column> {
        self.column(name)
            .ok_or_else(|| CleaningError::ColumnNotFound(name.to_string()))
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name().to_string()).collect()
    }

    /// Names of the columns declared with the given type.
    pub fn columns_of_type(&self, declared_type: DeclaredType) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.declared_type() == declared_type)
            .map(|c| c.name().to_string())
            .collect()
    }

    pub(crate) fn columns_mut(&mut self) -> &mut [Column] {
        &mut self.columns
    }

    pub(crate) fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name() == name)
    }

    pub fn total_cells(&self) -> usize {
        self.height() * self.width()
    }

    pub fn total_missing(&self) -> usize {
        self.columns.iter().map(Column::missing_count).sum()
    }

    /// Missing fraction of one row over the current columns.
    /// A table without columns has no missing cells. `None` when `row` is
    /// out of range.
    pub fn row_missing_fraction(&self, row: usize) -> Option<f64> {
        if row >= self.height() {
            return None;
        }
        if self.columns.is_empty() {
            return Some(0.0);
        }
        let missing = self
            .columns
            .iter()
            .filter(|c| c.cells()[row].is_none())
            .count();
        Some(missing as f64 / self.columns.len() as f64)
    }

    /// Drop the named columns, returning the names actually removed in table order.
    pub fn drop_columns(&mut self, names: &[String]) -> Vec<String> {
        let mut dropped = Vec::new();
        self.columns.retain(|c| {
            if names.iter().any(|n| n == c.name()) {
                dropped.push(c.name().to_string());
                false
            } else {
                true
            }
        });
        dropped
    }

    /// Keep rows where `keep[i]` is true, returning the ids of removed rows.
    ///
    /// The mask must have one entry per row.
    pub fn retain_rows(&mut self, keep: &[bool]) -> Result<Vec<RowId>> {
        if keep.len() != self.height() {
            return Err(CleaningError::ShapeMismatch(format!(
                "row mask has {} entries for {} rows",
                keep.len(),
                self.height()
            )));
        }

        let dropped: Vec<RowId> = self
            .row_ids
            .iter()
            .zip(keep)
            .filter(|(_, k)| !**k)
            .map(|(id, _)| *id)
            .collect();

        if dropped.is_empty() {
            return Ok(dropped);
        }

        for column in &mut self.columns {
            column.retain_rows(keep);
        }
        let mut idx = 0;
        self.row_ids.retain(|_| {
            let k = keep[idx];
            idx += 1;
            k
        });

        Ok(dropped)
    }

    /// Normalize column names: trim, lower-case, spaces to `_`, drop parentheses.
    ///
    /// Fails with `DuplicateColumn` if two names collapse to the same form.
    pub fn standardize_column_names(&mut self) -> Result<Vec<(String, String)>> {
        let renamed: Vec<String> = self
            .columns
            .iter()
            .map(|c| standardize_column_name(c.name()))
            .collect();

        let mut seen = HashSet::with_capacity(renamed.len());
        for name in &renamed {
            if !seen.insert(name.as_str()) {
                return Err(CleaningError::DuplicateColumn(name.clone()));
            }
        }

        let mut changes = Vec::new();
        for (column, new_name) in self.columns.iter_mut().zip(renamed) {
            if column.name() != new_name {
                changes.push((column.name().to_string(), new_name.clone()));
                column.rename(new_name);
            }
        }
        Ok(changes)
    }
}

/// Standard form of a column name.
pub fn standardize_column_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .replace(' ', "_")
        .replace(['(', ')'], "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_table() -> Table {
        Table::new(vec![
            Column::from_text("Name", &[Some("a"), None, Some("c")]),
            Column::from_f64("Score (pts)", &[Some(1.0), Some(2.0), None]),
        ])
        .unwrap()
    }

    // ========================================================================
    // Construction
    // ========================================================================

    #[test]
    fn test_new_numbers_rows_from_one() {
        let table = sample_table();
        assert_eq!(table.row_ids(), &[RowId(1), RowId(2), RowId(3)]);
        assert_eq!(table.shape(), (3, 2));
    }

    #[test]
    fn test_new_rejects_unequal_columns() {
        let result = Table::new(vec![
            Column::from_text("a", &[Some("x"), Some("y")]),
            Column::from_text("b", &[Some("x")]),
        ]);
        assert!(matches!(result, Err(CleaningError::ShapeMismatch(_))));
    }

    #[test]
    fn test_new_rejects_duplicate_columns() {
        let result = Table::new(vec![
            Column::from_text("a", &[Some("x")]),
            Column::from_text("a", &[Some("y")]),
        ]);
        assert!(matches!(result, Err(CleaningError::DuplicateColumn(_))));
    }

    #[test]
    fn test_with_row_ids_rejects_duplicate_ids() {
        let result = Table::with_row_ids(
            vec![RowId(4), RowId(4)],
            vec![Column::from_text("a", &[Some("x"), Some("y")])],
        );
        assert!(matches!(result, Err(CleaningError::DuplicateRowId(4))));
    }

    #[test]
    fn test_empty_table() {
        let table = Table::new(vec![]).unwrap();
        assert_eq!(table.shape(), (0, 0));
        assert_eq!(table.total_missing(), 0);
    }

    // ========================================================================
    // Subsetting
    // ========================================================================

    #[test]
    fn test_retain_rows_reports_dropped_ids_and_keeps_identity() {
        let mut table = sample_table();
        let dropped = table.retain_rows(&[true, false, true]).unwrap();

        assert_eq!(dropped, vec![RowId(2)]);
        assert_eq!(table.row_ids(), &[RowId(1), RowId(3)]);
        let name = table.column("Name").unwrap();
        assert_eq!(name.get(1), Some(&Value::from("c")));
    }

    #[test]
    fn test_retain_rows_rejects_wrong_length_mask() {
        let mut table = sample_table();
        let result = table.retain_rows(&[true, false]);
        assert!(matches!(result, Err(CleaningError::ShapeMismatch(_))));
        assert_eq!(table.height(), 3);
    }

    #[test]
    fn test_drop_columns_returns_removed_names() {
        let mut table = sample_table();
        let dropped = table.drop_columns(&["Name".to_string(), "missing".to_string()]);
        assert_eq!(dropped, vec!["Name".to_string()]);
        assert_eq!(table.width(), 1);
    }

    #[test]
    fn test_row_missing_fraction() {
        let table = sample_table();
        assert_eq!(table.row_missing_fraction(0), Some(0.0));
        assert_eq!(table.row_missing_fraction(1), Some(0.5));
        assert_eq!(table.row_missing_fraction(2), Some(0.5));
        assert_eq!(table.row_missing_fraction(3), None);
    }

    // ========================================================================
    // Column names
    // ========================================================================

    #[test]
    fn test_standardize_column_name() {
        assert_eq!(standardize_column_name("  Score (pts) "), "score_pts");
        assert_eq!(standardize_column_name("Ticket Fare"), "ticket_fare");
        assert_eq!(standardize_column_name("age"), "age");
    }

    #[test]
    fn test_standardize_column_names_reports_changes() {
        let mut table = sample_table();
        let changes = table.standardize_column_names().unwrap();
        assert_eq!(
            changes,
            vec![
                ("Name".to_string(), "name".to_string()),
                ("Score (pts)".to_string(), "score_pts".to_string()),
            ]
        );
        assert!(table.column("score_pts").is_some());
    }

    #[test]
    fn test_standardize_column_names_detects_collisions() {
        let mut table = Table::new(vec![
            Column::from_text("Age", &[Some("1")]),
            Column::from_text("age ", &[Some("2")]),
        ])
        .unwrap();
        assert!(matches!(
            table.standardize_column_names(),
            Err(CleaningError::DuplicateColumn(_))
        ));
    }

    #[test]
    fn test_conforms() {
        let mut column = Column::from_text("a", &[Some("1"), None]);
        assert!(column.conforms());
        column.set_declared_type(DeclaredType::Numeric);
        assert!(!column.conforms());
    }
}
