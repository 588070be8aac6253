//! Whole-column coercions toward a single canonical type.
//!
//! Hidden-missing text tokens are treated as already missing: they become
//! `None` without counting as loss. Every other cell that fails to convert
//! becomes `None` and counts as lost.

use crate::table::Value;
use crate::utils::{
    LEGACY_TRUE_TOKENS, clean_numeric_string, is_boolean_string, is_boolean_true,
    is_hidden_missing, parse_numeric_string, parse_temporal,
};

/// Largest float magnitude that is stored as an integer when integral.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Cells after a coercion plus the loss bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Coercion {
    pub cells: Vec<Option<Value>>,
    /// Non-missing cells that were not hidden-missing tokens.
    pub considered: usize,
    /// Considered cells that failed to convert.
    pub lost: usize,
    /// Hidden-missing tokens turned into real gaps.
    pub hidden_missing: usize,
}

impl Coercion {
    pub fn percent_lost(&self) -> f64 {
        if self.considered == 0 {
            0.0
        } else {
            self.lost as f64 / self.considered as f64 * 100.0
        }
    }
}

#[inline]
pub(crate) fn is_hidden_missing_value(value: &Value) -> bool {
    matches!(value, Value::Text(s) if is_hidden_missing(s))
}

fn coerce_with(cells: &[Option<Value>], convert: impl Fn(&Value) -> Option<Value>) -> Coercion {
    let mut considered = 0;
    let mut lost = 0;
    let mut hidden_missing = 0;
    let cells = cells
        .iter()
        .map(|cell| match cell {
            None => None,
            Some(v) if is_hidden_missing_value(v) => {
                hidden_missing += 1;
                None
            }
            Some(v) => {
                considered += 1;
                let converted = convert(v);
                if converted.is_none() {
                    lost += 1;
                }
                converted
            }
        })
        .collect();
    Coercion {
        cells,
        considered,
        lost,
        hidden_missing,
    }
}

/// Parse a single value as a number, keeping integers exact.
pub(crate) fn to_number(value: &Value) -> Option<Value> {
    match value {
        Value::Integer(i) => Some(Value::Integer(*i)),
        Value::Float(f) if f.is_finite() => Some(Value::Float(*f)),
        Value::Float(_) => None,
        Value::Boolean(b) => Some(Value::Integer(i64::from(*b))),
        Value::Text(s) => {
            if let Ok(i) = clean_numeric_string(s).parse::<i64>() {
                Some(Value::Integer(i))
            } else {
                parse_numeric_string(s).map(Value::Float)
            }
        }
        Value::Temporal(_) => None,
    }
}

/// Make a numeric column homogeneous: all integers if every value is
/// integral, otherwise all floats.
fn homogenize_numbers(cells: &mut [Option<Value>]) {
    let all_integral = cells.iter().flatten().all(|v| match v {
        Value::Integer(_) => true,
        Value::Float(f) => f.fract() == 0.0 && f.abs() <= MAX_EXACT_INTEGER,
        _ => false,
    });

    for cell in cells.iter_mut().flatten() {
        *cell = match (&*cell, all_integral) {
            (Value::Float(f), true) => Value::Integer(*f as i64),
            (Value::Integer(i), false) => Value::Float(*i as f64),
            (other, _) => other.clone(),
        };
    }
}

pub(crate) fn coerce_numeric(cells: &[Option<Value>]) -> Coercion {
    let mut coercion = coerce_with(cells, to_number);
    homogenize_numbers(&mut coercion.cells);
    coercion
}

pub(crate) fn coerce_temporal(cells: &[Option<Value>]) -> Coercion {
    coerce_with(cells, |v| match v {
        Value::Temporal(dt) => Some(Value::Temporal(*dt)),
        Value::Text(s) => parse_temporal(s).map(Value::Temporal),
        _ => None,
    })
}

/// Legacy truth-token mapping: recognized tokens are `true`, every other
/// non-missing value is `false`. Lossy by construction and never fails.
pub(crate) fn legacy_truth(value: &Value) -> bool {
    match value {
        Value::Boolean(b) => *b,
        Value::Text(s) => LEGACY_TRUE_TOKENS.contains(&s.as_str()),
        Value::Integer(i) => *i == 1,
        Value::Float(f) => *f == 1.0,
        Value::Temporal(_) => false,
    }
}

pub(crate) fn coerce_boolean_legacy(cells: &[Option<Value>]) -> Coercion {
    coerce_with(cells, |v| Some(Value::Boolean(legacy_truth(v))))
}

/// Case-insensitive mapping for all-text columns made only of boolean tokens.
pub(crate) fn coerce_boolean_tokens(cells: &[Option<Value>]) -> Coercion {
    coerce_with(cells, |v| match v {
        Value::Text(s) if is_boolean_string(s) => Some(Value::Boolean(is_boolean_true(s))),
        Value::Boolean(b) => Some(Value::Boolean(*b)),
        _ => None,
    })
}

/// Cast every non-missing cell to its text form. Hidden-missing tokens stay
/// as text for the normalizer.
pub(crate) fn coerce_text(cells: &[Option<Value>]) -> Coercion {
    let considered = cells
        .iter()
        .flatten()
        .filter(|v| !is_hidden_missing_value(v))
        .count();
    let cells = cells
        .iter()
        .map(|c| {
            c.as_ref().map(|v| match v {
                Value::Text(_) => v.clone(),
                other => Value::Text(other.as_display()),
            })
        })
        .collect();
    Coercion {
        cells,
        considered,
        lost: 0,
        hidden_missing: 0,
    }
}

/// Share of considered text cells that satisfy `parses`, with the count of
/// considered cells.
pub(crate) fn text_parse_rate(cells: &[Option<Value>], parses: impl Fn(&str) -> bool) -> (f64, usize) {
    let mut considered = 0;
    let mut hits = 0;
    for cell in cells.iter().flatten() {
        if let Value::Text(s) = cell {
            if is_hidden_missing(s) {
                continue;
            }
            considered += 1;
            if parses(s) {
                hits += 1;
            }
        }
    }
    if considered == 0 {
        (0.0, 0)
    } else {
        (hits as f64 / considered as f64, considered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text(values: &[Option<&str>]) -> Vec<Option<Value>> {
        values.iter().map(|v| v.map(Value::from)).collect()
    }

    // ========================================================================
    // Numeric
    // ========================================================================

    #[test]
    fn test_numeric_keeps_integers_exact() {
        let cells = vec![
            Some(Value::Integer(34)),
            Some(Value::from("29")),
            Some(Value::from("1,000")),
        ];
        let coercion = coerce_numeric(&cells);
        assert_eq!(
            coercion.cells,
            vec![
                Some(Value::Integer(34)),
                Some(Value::Integer(29)),
                Some(Value::Integer(1000)),
            ]
        );
        assert_eq!(coercion.lost, 0);
    }

    #[test]
    fn test_numeric_promotes_to_float_when_any_fractional() {
        let cells = vec![Some(Value::Integer(1)), Some(Value::from("2.5"))];
        let coercion = coerce_numeric(&cells);
        assert_eq!(
            coercion.cells,
            vec![Some(Value::Float(1.0)), Some(Value::Float(2.5))]
        );
    }

    #[test]
    fn test_numeric_loss_counts_only_considered_cells() {
        let mut cells = text(&[Some("1"), Some("abc"), Some("?"), None]);
        cells.push(Some(Value::Integer(4)));
        let coercion = coerce_numeric(&cells);

        assert_eq!(coercion.considered, 3);
        assert_eq!(coercion.lost, 1);
        assert_eq!(coercion.hidden_missing, 1);
        assert_eq!(coercion.cells[1], None);
        assert_eq!(coercion.cells[2], None);
        assert!((coercion.percent_lost() - 100.0 / 3.0).abs() < 1e-9);
    }

    // ========================================================================
    // Boolean
    // ========================================================================

    #[test]
    fn test_legacy_truth_tokens() {
        assert!(legacy_truth(&Value::from("YES")));
        assert!(legacy_truth(&Value::from("y")));
        assert!(legacy_truth(&Value::Integer(1)));
        assert!(legacy_truth(&Value::Boolean(true)));
        assert!(!legacy_truth(&Value::from("TRUE")));
        assert!(!legacy_truth(&Value::from("garbage")));
        assert!(!legacy_truth(&Value::Integer(2)));
    }

    #[test]
    fn test_legacy_boolean_never_loses() {
        let cells = vec![
            Some(Value::Boolean(true)),
            Some(Value::from("nope")),
            None,
        ];
        let coercion = coerce_boolean_legacy(&cells);
        assert_eq!(
            coercion.cells,
            vec![Some(Value::Boolean(true)), Some(Value::Boolean(false)), None]
        );
        assert_eq!(coercion.lost, 0);
    }

    #[test]
    fn test_boolean_tokens_case_insensitive() {
        let cells = text(&[Some("Yes"), Some("NO"), Some("t"), Some("f")]);
        let coercion = coerce_boolean_tokens(&cells);
        assert_eq!(
            coercion.cells,
            vec![
                Some(Value::Boolean(true)),
                Some(Value::Boolean(false)),
                Some(Value::Boolean(true)),
                Some(Value::Boolean(false)),
            ]
        );
    }

    // ========================================================================
    // Temporal and text
    // ========================================================================

    #[test]
    fn test_temporal_unparseable_becomes_missing() {
        let cells = text(&[Some("2024-01-15"), Some("soon"), Some("n/a")]);
        let coercion = coerce_temporal(&cells);
        assert!(matches!(coercion.cells[0], Some(Value::Temporal(_))));
        assert_eq!(coercion.cells[1], None);
        assert_eq!(coercion.cells[2], None);
        assert_eq!((coercion.considered, coercion.lost), (2, 1));
    }

    #[test]
    fn test_text_cast_is_lossless() {
        let cells = vec![Some(Value::Integer(7)), Some(Value::from("?")), None];
        let coercion = coerce_text(&cells);
        assert_eq!(
            coercion.cells,
            vec![Some(Value::from("7")), Some(Value::from("?")), None]
        );
        assert_eq!(coercion.lost, 0);
        assert_eq!(coercion.considered, 1);
        assert_eq!(coercion.hidden_missing, 0);
    }

    #[test]
    fn test_text_parse_rate_skips_hidden_missing() {
        let cells = text(&[Some("34"), Some("?"), Some("29"), Some("n/a"), Some("x")]);
        let (rate, considered) = text_parse_rate(&cells, |s| parse_numeric_string(s).is_some());
        assert_eq!(considered, 3);
        assert!((rate - 2.0 / 3.0).abs() < 1e-9);
    }
}
