//! Type inference: resolve every column to one canonical type.
//!
//! Two passes decide a column's type:
//!
//! 1. **Dominant type.** A column whose non-missing cells carry more than one
//!    runtime type is coerced toward the most frequent one.
//! 2. **Parse rate.** A column made only of text cells is re-examined cell by
//!    cell, since numbers and dates read from text files all arrive as text.
//!
//! Cells that cannot be converted become missing and are counted as loss.

use super::converters::{
    Coercion, coerce_boolean_legacy, coerce_boolean_tokens, coerce_numeric, coerce_temporal,
    coerce_text, is_hidden_missing_value, text_parse_rate,
};
use crate::table::{CellType, Column, DeclaredType, Table, Value};
use crate::types::{
    CoercionPass, CoercionReport, MixedColumn, MixedTypeReport, TypeHistogram,
    TypeInferenceReport,
};
use crate::utils::{is_boolean_string, is_numeric_string, is_temporal_string};
use tracing::{debug, info, warn};

/// Share of text cells that must parse as numbers for a numeric column.
pub const NUMERIC_PARSE_RATE: f64 = 0.9;

/// Share of text cells that must parse as dates for a temporal column.
pub const TEMPORAL_PARSE_RATE: f64 = 0.9;

/// Report every column whose cells carry more than one runtime type.
pub fn detect_mixed_types(table: &Table) -> MixedTypeReport {
    let columns = table
        .columns()
        .iter()
        .filter_map(|column| {
            let histogram = TypeHistogram::from_cells(column.cells());
            histogram.is_mixed().then(|| MixedColumn {
                column: column.name().to_string(),
                histogram,
            })
        })
        .collect();
    MixedTypeReport { columns }
}

/// Resolves column types and coerces cells to them.
#[derive(Debug, Default, Clone, Copy)]
pub struct TypeInferenceEngine;

impl TypeInferenceEngine {
    pub fn new() -> Self {
        Self
    }

    /// Coerce every column to a single declared type.
    ///
    /// Never fails: unparseable cells degrade to missing and are reported
    /// through `percent_lost`.
    pub fn infer_and_coerce(&self, mut table: Table) -> (Table, TypeInferenceReport) {
        let mixed_types = detect_mixed_types(&table);
        debug!("Found {} mixed-type columns", mixed_types.len());

        let columns: Vec<CoercionReport> = table
            .columns_mut()
            .iter_mut()
            .map(|column| self.resolve_column(column))
            .collect();

        let total_loss_percent = columns.iter().map(|c| c.percent_lost).sum();
        let hidden_missing: usize = columns.iter().map(|c| c.hidden_missing).sum();

        let changed = columns
            .iter()
            .filter(|c| c.previous_type != c.declared_type)
            .count();
        info!(
            "Type inference: {} columns resolved, {} changed, {} placeholders cleared, total loss {:.2}%",
            columns.len(),
            changed,
            hidden_missing,
            total_loss_percent
        );

        let report = TypeInferenceReport {
            mixed_types,
            columns,
            total_loss_percent,
        };
        (table, report)
    }

    fn resolve_column(&self, column: &mut Column) -> CoercionReport {
        let previous_type = column.declared_type();
        let histogram = TypeHistogram::from_cells(column.cells());

        let (declared_type, coercion, pass, dominant) = if histogram.is_mixed() {
            let dominant = histogram.dominant();
            match coerce_to_dominant(column.cells(), dominant) {
                // A text cast settles nothing: the now all-text column still
                // goes through the parse-rate pass.
                (DeclaredType::Text, cast) => {
                    let (declared, coercion) = resolve_text_column(&cast.cells);
                    (declared, Some(coercion), CoercionPass::ParseRate, dominant)
                }
                (declared, coercion) => {
                    (declared, Some(coercion), CoercionPass::DominantType, dominant)
                }
            }
        } else if histogram.is_only(CellType::Text) {
            let (declared, coercion) = resolve_text_column(column.cells());
            (declared, Some(coercion), CoercionPass::ParseRate, Some(CellType::Text))
        } else {
            let declared = match histogram.labels().first() {
                Some(label) => DeclaredType::from_cell_type(*label),
                None if previous_type == DeclaredType::Unresolved => DeclaredType::Text,
                None => previous_type,
            };
            (declared, None, CoercionPass::Homogeneous, histogram.dominant())
        };

        let (cells_considered, cells_lost, percent_lost, hidden_missing) = match coercion {
            Some(coercion) => {
                let stats = (
                    coercion.considered,
                    coercion.lost,
                    coercion.percent_lost(),
                    coercion.hidden_missing,
                );
                column.replace_cells(declared_type, coercion.cells);
                stats
            }
            None => {
                column.set_declared_type(declared_type);
                (column.non_missing_count(), 0, 0.0, 0)
            }
        };

        if hidden_missing > 0 {
            debug!(
                "Column '{}': {} placeholder tokens became missing",
                column.name(),
                hidden_missing
            );
        }

        if cells_lost > 0 {
            warn!(
                "Column '{}': {} of {} cells could not be read as {} ({:.2}% lost)",
                column.name(),
                cells_lost,
                cells_considered,
                declared_type,
                percent_lost
            );
        } else if previous_type != declared_type {
            debug!(
                "Column '{}': {} -> {} ({:?})",
                column.name(),
                previous_type,
                declared_type,
                pass
            );
        }

        CoercionReport {
            column: column.name().to_string(),
            previous_type,
            declared_type,
            dominant,
            pass,
            cells_considered,
            cells_lost,
            percent_lost,
            hidden_missing,
        }
    }
}

fn coerce_to_dominant(
    cells: &[Option<Value>],
    dominant: Option<CellType>,
) -> (DeclaredType, Coercion) {
    match dominant {
        Some(CellType::Integer | CellType::Float) => (DeclaredType::Numeric, coerce_numeric(cells)),
        Some(CellType::Boolean) => (DeclaredType::Boolean, coerce_boolean_legacy(cells)),
        Some(CellType::Temporal) => (DeclaredType::Temporal, coerce_temporal(cells)),
        Some(CellType::Text | CellType::Missing) | None => (DeclaredType::Text, coerce_text(cells)),
    }
}

/// Decide the type of an all-text column from per-cell parse rates.
fn resolve_text_column(cells: &[Option<Value>]) -> (DeclaredType, Coercion) {
    let (numeric_rate, considered) = text_parse_rate(cells, is_numeric_string);
    if considered == 0 {
        return (DeclaredType::Text, coerce_text(cells));
    }
    if numeric_rate >= NUMERIC_PARSE_RATE {
        return (DeclaredType::Numeric, coerce_numeric(cells));
    }

    let (temporal_rate, _) = text_parse_rate(cells, is_temporal_string);
    if temporal_rate >= TEMPORAL_PARSE_RATE {
        return (DeclaredType::Temporal, coerce_temporal(cells));
    }

    let all_boolean_tokens = cells
        .iter()
        .flatten()
        .filter(|v| !is_hidden_missing_value(v))
        .all(|v| matches!(v, Value::Text(s) if is_boolean_string(s)));
    if all_boolean_tokens {
        return (DeclaredType::Boolean, coerce_boolean_tokens(cells));
    }

    (DeclaredType::Text, coerce_text(cells))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn table_of(columns: Vec<Column>) -> Table {
        Table::new(columns).unwrap()
    }

    // ========================================================================
    // detect_mixed_types()
    // ========================================================================

    #[test]
    fn test_detect_mixed_types_reports_only_mixed_columns() {
        let table = table_of(vec![
            Column::unresolved(
                "mixed",
                vec![
                    Some(Value::Integer(1)),
                    Some(Value::from("two")),
                    Some(Value::Integer(3)),
                ],
            ),
            Column::from_text("plain", &[Some("a"), Some("b"), None]),
        ]);

        let report = detect_mixed_types(&table);
        assert_eq!(report.len(), 1);
        let histogram = report.get("mixed").unwrap();
        assert_eq!(
            histogram.counts(),
            &[(CellType::Integer, 2), (CellType::Text, 1)]
        );
    }

    // ========================================================================
    // Dominant-type pass
    // ========================================================================

    #[test]
    fn test_mixed_numeric_column_records_loss() {
        let table = table_of(vec![Column::unresolved(
            "score",
            vec![
                Some(Value::Integer(10)),
                Some(Value::Float(12.5)),
                Some(Value::Integer(11)),
                Some(Value::from("oops")),
                None,
            ],
        )]);

        let (table, report) = TypeInferenceEngine::new().infer_and_coerce(table);
        let column = table.column("score").unwrap();
        assert_eq!(column.declared_type(), DeclaredType::Numeric);
        assert!(column.conforms());
        assert_eq!(column.get(3), None);

        let coercion = report.column("score").unwrap();
        assert_eq!(coercion.pass, CoercionPass::DominantType);
        assert_eq!(coercion.cells_lost, 1);
        assert_eq!(coercion.cells_considered, 4);
        assert_eq!(coercion.percent_lost, 25.0);
        assert_eq!(report.total_loss_percent, 25.0);
    }

    #[test]
    fn test_mixed_text_dominant_casts_without_loss() {
        let table = table_of(vec![Column::unresolved(
            "code",
            vec![
                Some(Value::from("a")),
                Some(Value::Integer(5)),
                Some(Value::from("b")),
            ],
        )]);

        let (table, report) = TypeInferenceEngine::new().infer_and_coerce(table);
        let column = table.column("code").unwrap();
        assert_eq!(column.declared_type(), DeclaredType::Text);
        assert_eq!(column.get(1), Some(&Value::from("5")));
        assert_eq!(report.total_loss_percent, 0.0);
    }

    #[test]
    fn test_mixed_text_dominant_numbers_resolve_in_one_run() {
        let table = table_of(vec![Column::unresolved(
            "n",
            vec![
                Some(Value::from("12")),
                Some(Value::from("13")),
                Some(Value::from("14")),
                Some(Value::Integer(15)),
                Some(Value::from("?")),
            ],
        )]);

        let engine = TypeInferenceEngine::new();
        let (once, first) = engine.infer_and_coerce(table);
        let n = once.column("n").unwrap();
        assert_eq!(n.declared_type(), DeclaredType::Numeric);
        assert_eq!(
            n.cells(),
            &[
                Some(Value::Integer(12)),
                Some(Value::Integer(13)),
                Some(Value::Integer(14)),
                Some(Value::Integer(15)),
                None,
            ]
        );

        let coercion = first.column("n").unwrap();
        assert_eq!(coercion.pass, CoercionPass::ParseRate);
        assert_eq!(coercion.dominant, Some(CellType::Text));
        assert_eq!(coercion.hidden_missing, 1);
        assert_eq!(coercion.cells_lost, 0);

        let (twice, second) = engine.infer_and_coerce(once.clone());
        assert_eq!(once, twice);
        assert_eq!(second.column("n").unwrap().declared_type, DeclaredType::Numeric);
    }

    #[test]
    fn test_mixed_boolean_dominant_uses_truth_tokens() {
        let table = table_of(vec![Column::unresolved(
            "flag",
            vec![
                Some(Value::Boolean(true)),
                Some(Value::Boolean(false)),
                Some(Value::from("yes")),
                Some(Value::from("maybe")),
                Some(Value::Boolean(true)),
            ],
        )]);

        let (table, _) = TypeInferenceEngine::new().infer_and_coerce(table);
        let column = table.column("flag").unwrap();
        assert_eq!(column.declared_type(), DeclaredType::Boolean);
        assert_eq!(column.get(2), Some(&Value::Boolean(true)));
        assert_eq!(column.get(3), Some(&Value::Boolean(false)));
    }

    // ========================================================================
    // Parse-rate pass
    // ========================================================================

    #[test]
    fn test_numeric_text_column_with_hidden_missing_has_no_loss() {
        let table = table_of(vec![Column::from_text(
            "age",
            &[Some("34"), Some("?"), Some("29"), Some("n/a"), Some("200")],
        )]);

        let (table, report) = TypeInferenceEngine::new().infer_and_coerce(table);
        let age = table.column("age").unwrap();
        assert_eq!(age.declared_type(), DeclaredType::Numeric);
        assert_eq!(
            age.cells(),
            &[
                Some(Value::Integer(34)),
                None,
                Some(Value::Integer(29)),
                None,
                Some(Value::Integer(200)),
            ]
        );
        let coercion = report.column("age").unwrap();
        assert_eq!(coercion.percent_lost, 0.0);
        assert_eq!(coercion.hidden_missing, 2);
        assert_eq!(coercion.cells_considered, 3);
        assert_eq!(report.total_hidden_missing(), 2);
    }

    #[test]
    fn test_below_numeric_rate_stays_text() {
        let table = table_of(vec![Column::from_text(
            "id",
            &[Some("1"), Some("2"), Some("x3"), Some("4")],
        )]);

        let (table, _) = TypeInferenceEngine::new().infer_and_coerce(table);
        assert_eq!(
            table.column("id").unwrap().declared_type(),
            DeclaredType::Text
        );
    }

    #[test]
    fn test_date_text_column_becomes_temporal() {
        let table = table_of(vec![Column::from_text(
            "joined",
            &[Some("2024-01-15"), Some("2024-02-01"), None],
        )]);

        let (table, _) = TypeInferenceEngine::new().infer_and_coerce(table);
        let joined = table.column("joined").unwrap();
        assert_eq!(joined.declared_type(), DeclaredType::Temporal);
        assert!(joined.conforms());
    }

    #[test]
    fn test_boolean_token_column_becomes_boolean() {
        let table = table_of(vec![Column::from_text(
            "active",
            &[Some("Yes"), Some("no"), Some("Y"), Some("N")],
        )]);

        let (table, _) = TypeInferenceEngine::new().infer_and_coerce(table);
        let active = table.column("active").unwrap();
        assert_eq!(active.declared_type(), DeclaredType::Boolean);
        assert_eq!(active.get(0), Some(&Value::Boolean(true)));
        assert_eq!(active.get(3), Some(&Value::Boolean(false)));
    }

    #[test]
    fn test_all_missing_column_declared_text() {
        let table = table_of(vec![Column::from_text("empty", &[None, None])]);
        let (table, _) = TypeInferenceEngine::new().infer_and_coerce(table);
        assert_eq!(
            table.column("empty").unwrap().declared_type(),
            DeclaredType::Text
        );
    }

    // ========================================================================
    // Round trip
    // ========================================================================

    #[test]
    fn test_no_mixed_types_after_coercion() {
        let table = table_of(vec![
            Column::unresolved(
                "a",
                vec![
                    Some(Value::Integer(1)),
                    Some(Value::Float(1.5)),
                    Some(Value::from("2")),
                ],
            ),
            Column::unresolved(
                "b",
                vec![
                    Some(Value::from("x")),
                    Some(Value::Boolean(true)),
                    Some(Value::from("y")),
                ],
            ),
        ]);

        let (table, _) = TypeInferenceEngine::new().infer_and_coerce(table);
        assert!(detect_mixed_types(&table).is_empty());
        assert!(table.columns().iter().all(Column::conforms));
    }

    #[test]
    fn test_infer_is_stable_on_second_run() {
        let table = table_of(vec![Column::from_text(
            "v",
            &[Some("1.5"), Some("2"), Some("bad"), Some("3"), Some("4"),
              Some("5"), Some("6"), Some("7"), Some("8"), Some("9")],
        )]);

        let engine = TypeInferenceEngine::new();
        let (once, first) = engine.infer_and_coerce(table);
        let (twice, second) = engine.infer_and_coerce(once.clone());
        assert_eq!(once, twice);
        assert_eq!(first.column("v").unwrap().cells_lost, 1);
        assert_eq!(second.total_loss_percent, 0.0);
    }
}
