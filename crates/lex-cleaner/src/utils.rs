//! Shared utilities for the cleaning pipeline.
//!
//! Token sets, string parsing and the small statistical helpers that several
//! stages need (percentiles, modes).

use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

// =============================================================================
// Hidden Missing Values
// =============================================================================

/// Tokens that conventionally denote an absent value, compared after
/// trimming and lower-casing.
pub const HIDDEN_MISSING_TOKENS: [&str; 13] = [
    "?",
    "n/a",
    "na",
    "null",
    "none",
    "-",
    "--",
    "",
    " ",
    "-1",
    "undefined",
    "unknown",
    "missing",
];

static HIDDEN_MISSING_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| HIDDEN_MISSING_TOKENS.into_iter().collect());

/// Check whether a text cell is a hidden missing value.
///
/// ```rust,ignore
/// assert!(is_hidden_missing(" N/A "));
/// assert!(is_hidden_missing("-1"));
/// assert!(!is_hidden_missing("0"));
/// ```
pub fn is_hidden_missing(s: &str) -> bool {
    let normalized = s.trim().to_lowercase();
    HIDDEN_MISSING_SET.contains(normalized.as_str())
}

// =============================================================================
// Numeric Parsing
// =============================================================================

/// Characters commonly used in numeric formatting that should be stripped.
pub const NUMERIC_FORMAT_CHARS: [char; 6] = [',', '$', '%', '€', '£', ' '];

/// Clean a string for numeric parsing by removing formatting characters.
pub fn clean_numeric_string(s: &str) -> String {
    let mut result = s.trim().to_string();
    for c in NUMERIC_FORMAT_CHARS {
        result = result.replace(c, "");
    }
    result
}

/// Parse a string as a finite number. `"NaN"` and `"inf"` are rejected.
pub fn parse_numeric_string(s: &str) -> Option<f64> {
    let cleaned = clean_numeric_string(s);
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn is_numeric_string(s: &str) -> bool {
    parse_numeric_string(s).is_some()
}

// =============================================================================
// Temporal Parsing
// =============================================================================

static DATE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"^\d{4}[-/]\d{1,2}[-/]\d{1,2}$").expect("Invalid regex: YYYY-MM-DD"),
        Regex::new(r"^\d{1,2}[-/]\d{1,2}[-/]\d{4}$").expect("Invalid regex: DD-MM-YYYY"),
        Regex::new(r"^\d{4}-\d{2}-\d{2}\s\d{2}:\d{2}(:\d{2})?").expect("Invalid regex: datetime"),
        Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}(:\d{2})?").expect("Invalid regex: ISO"),
    ]
});

/// Date-only formats, tried in order. Day-first wins over month-first.
pub const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%m/%d/%Y", "%d-%m-%Y"];

/// Date-time formats, tried in order.
pub const DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parse a string as a date or date-time.
///
/// Only strings shaped like dates are attempted, so plain numbers are never
/// read as timestamps.
pub fn parse_temporal(s: &str) -> Option<NaiveDateTime> {
    let trimmed = s.trim();
    if !DATE_PATTERNS.iter().any(|p| p.is_match(trimmed)) {
        return None;
    }

    // Trailing offsets are accepted and discarded.
    let without_zone = trimmed.trim_end_matches('Z');
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(without_zone, fmt) {
            return Some(dt);
        }
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_utc());
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

pub fn is_temporal_string(s: &str) -> bool {
    parse_temporal(s).is_some()
}

// =============================================================================
// Boolean Tokens
// =============================================================================

/// Text tokens treated as `true` when a mixed column is coerced to boolean.
/// Case-sensitive; everything else becomes `false`.
pub const LEGACY_TRUE_TOKENS: [&str; 6] = ["true", "True", "YES", "yes", "Y", "y"];

/// Tokens (lower-cased) that let an all-text column resolve to boolean.
pub const BOOLEAN_TRUE_VALUES: [&str; 4] = ["true", "yes", "y", "t"];
pub const BOOLEAN_FALSE_VALUES: [&str; 4] = ["false", "no", "n", "f"];

pub fn is_boolean_true(s: &str) -> bool {
    let lower = s.trim().to_lowercase();
    BOOLEAN_TRUE_VALUES.contains(&lower.as_str())
}

pub fn is_boolean_false(s: &str) -> bool {
    let lower = s.trim().to_lowercase();
    BOOLEAN_FALSE_VALUES.contains(&lower.as_str())
}

pub fn is_boolean_string(s: &str) -> bool {
    is_boolean_true(s) || is_boolean_false(s)
}

// =============================================================================
// Statistics
// =============================================================================

/// Percentile with linear interpolation between closest ranks.
///
/// `sorted` must be ascending and non-empty; `q` is in `[0, 1]`.
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    debug_assert!(!sorted.is_empty());
    if sorted.len() == 1 {
        return sorted[0];
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Frequency table in first-encountered order.
pub fn value_counts<'a, T, I>(values: I) -> Vec<(&'a T, usize)>
where
    T: Eq + Hash + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut index: HashMap<&T, usize> = HashMap::new();
    let mut counts: Vec<(&T, usize)> = Vec::new();
    for value in values {
        match index.get(value) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(value, counts.len());
                counts.push((value, 1));
            }
        }
    }
    counts
}

/// Most frequent value; ties go to the value seen first.
pub fn mode<'a, T, I>(values: I) -> Option<&'a T>
where
    T: Eq + Hash + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut best: Option<(&T, usize)> = None;
    for (value, count) in value_counts(values) {
        if best.is_none_or(|(_, c)| count > c) {
            best = Some((value, count));
        }
    }
    best.map(|(v, _)| v)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_hidden_missing() {
        assert!(is_hidden_missing("?"));
        assert!(is_hidden_missing(" N/A "));
        assert!(is_hidden_missing("NULL"));
        assert!(is_hidden_missing(""));
        assert!(is_hidden_missing("   "));
        assert!(is_hidden_missing("-1"));
        assert!(is_hidden_missing("Unknown"));
        assert!(!is_hidden_missing("0"));
        assert!(!is_hidden_missing("-1.0"));
        assert!(!is_hidden_missing("nan"));
    }

    #[test]
    fn test_clean_numeric_string() {
        assert_eq!(clean_numeric_string("$1,234.56"), "1234.56");
        assert_eq!(clean_numeric_string("  42%  "), "42");
        assert_eq!(clean_numeric_string("€100"), "100");
        assert_eq!(clean_numeric_string("1 000"), "1000");
    }

    #[test]
    fn test_parse_numeric_string() {
        assert_eq!(parse_numeric_string("42"), Some(42.0));
        assert_eq!(parse_numeric_string("$1,234.56"), Some(1234.56));
        assert_eq!(parse_numeric_string("-100"), Some(-100.0));
        assert_eq!(parse_numeric_string(""), None);
        assert_eq!(parse_numeric_string("hello"), None);
        assert_eq!(parse_numeric_string("NaN"), None);
        assert_eq!(parse_numeric_string("inf"), None);
    }

    #[test]
    fn test_parse_temporal() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(parse_temporal("2024-01-15"), Some(expected));
        assert_eq!(parse_temporal("15/01/2024"), Some(expected));
        assert_eq!(parse_temporal("2024/01/15"), Some(expected));

        let with_time = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        assert_eq!(parse_temporal("2024-01-15 10:30:00"), Some(with_time));
        assert_eq!(parse_temporal("2024-01-15T10:30:00Z"), Some(with_time));
    }

    #[test]
    fn test_parse_temporal_rejects_non_dates() {
        assert_eq!(parse_temporal("20240115"), None);
        assert_eq!(parse_temporal("42"), None);
        assert_eq!(parse_temporal("2024-13-45"), None);
        assert_eq!(parse_temporal("hello"), None);
    }

    #[test]
    fn test_boolean_tokens() {
        assert!(is_boolean_true("Yes"));
        assert!(is_boolean_true("T"));
        assert!(is_boolean_false("no"));
        assert!(is_boolean_string("FALSE"));
        assert!(!is_boolean_string("1"));
        assert!(!is_boolean_string("maybe"));
    }

    #[test]
    fn test_percentile_linear() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&sorted, 0.0), 1.0);
        assert_eq!(percentile(&sorted, 1.0), 4.0);
        assert_eq!(percentile(&sorted, 0.25), 1.75);
        assert_eq!(percentile(&sorted, 0.75), 3.25);
        assert_eq!(percentile(&[7.0], 0.25), 7.0);
    }

    #[test]
    fn test_mode_first_encountered_tie_break() {
        let values = ["b", "a", "a", "b", "c"];
        assert_eq!(mode(values.iter()), Some(&"b"));
        let values = ["x", "y", "y"];
        assert_eq!(mode(values.iter()), Some(&"y"));
        let empty: [&str; 0] = [];
        assert_eq!(mode(empty.iter()), None);
    }

    #[test]
    fn test_value_counts_order() {
        let values = [3, 1, 3, 2];
        let counts = value_counts(values.iter());
        assert_eq!(counts, vec![(&3, 2), (&1, 1), (&2, 1)]);
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[1.0, 2.0, 3.0]), Some(2.0));
        assert_eq!(mean(&[]), None);
    }
}
