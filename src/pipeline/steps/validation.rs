use super::numeric::whole_number;
use super::CleaningStep;
use crate::constants::{
    ANNUAL_INC, DEFAULT_VERIFICATION_STATUS, DELINQ_2YRS, EMP_LENGTH, EMP_LENGTH_TEN_PLUS,
    EMP_LENGTH_UNDER_ONE, INQ_LAST_6MTHS, MEMBER_ID, NOT_AVAILABLE_TOKEN, TERM, VERIFICATION_STATUS,
};
use crate::dataset::Dataset;
use crate::error::CleaningError;
use crate::metrics::CleaningMetrics;
use crate::pipeline::report::CleaningReport;
use crate::types::Value;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use tracing::{debug, info, warn};

static NON_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9]+").expect("valid regex"));

/// Row and field fixups for the loan dataset.
///
/// Unlike the earlier steps this one is strict: a missing mandatory column or
/// a `term` that cannot be re-encoded fails the run instead of being defaulted.
pub struct Validation;

impl CleaningStep for Validation {
    fn step_name(&self) -> &'static str {
        "validation"
    }

    fn apply(&self, dataset: &mut Dataset, report: &mut CleaningReport) -> Result<(), CleaningError> {
        // "n/a" must be null before any rule below looks at nulls
        report.not_available_replaced += replace_not_available(dataset);

        let duplicates = remove_duplicate_rows(dataset);
        CleaningMetrics::duplicates_removed(duplicates);
        report.duplicates_removed = duplicates;

        let filled = encode_emp_length(dataset)?;
        record_defaults(report, EMP_LENGTH, filled);

        encode_term(dataset)?;

        let filled = fill_null(dataset, ANNUAL_INC, Value::Float(0.0))?;
        record_defaults(report, ANNUAL_INC, filled);

        let filled = fill_null(dataset, VERIFICATION_STATUS, Value::text(DEFAULT_VERIFICATION_STATUS))?;
        record_defaults(report, VERIFICATION_STATUS, filled);

        let dropped = drop_rows_without_member_id(dataset)?;
        CleaningMetrics::rows_dropped("missing_member_id", dropped);
        report.rows_missing_member_id = dropped;

        let filled = fill_null(dataset, DELINQ_2YRS, Value::Int(0))?;
        record_defaults(report, DELINQ_2YRS, filled);

        let filled = fill_null(dataset, INQ_LAST_6MTHS, Value::Int(0))?;
        record_defaults(report, INQ_LAST_6MTHS, filled);

        Ok(())
    }
}

fn record_defaults(report: &mut CleaningReport, column: &str, filled: usize) {
    if filled > 0 {
        info!(column, filled, "Filled null values with default");
        *report.defaults_filled.entry(column.to_string()).or_default() += filled;
    }
}

fn required_column(dataset: &Dataset, column: &str) -> Result<usize, CleaningError> {
    dataset
        .column_index(column)
        .ok_or_else(|| CleaningError::MissingColumn(column.to_string()))
}

/// Turns every exact "n/a" cell into null
pub fn replace_not_available(dataset: &mut Dataset) -> usize {
    let mut replaced = 0;
    for value in dataset.values_mut() {
        if value.as_text() == Some(NOT_AVAILABLE_TOKEN) {
            *value = Value::Null;
            replaced += 1;
        }
    }
    replaced
}

/// Nulls "n/a" cells column by column and re-types the columns the token was
/// keeping textual, so later stages see numbers and parseable dates.
/// Returns how many cells were replaced.
pub fn null_not_available(dataset: &mut Dataset) -> usize {
    let mut replaced = 0;
    for idx in 0..dataset.width() {
        let mut in_column = 0;
        for value in dataset.column_values_mut(idx) {
            if value.as_text() == Some(NOT_AVAILABLE_TOKEN) {
                *value = Value::Null;
                in_column += 1;
            }
        }
        if in_column == 0 {
            continue;
        }
        replaced += in_column;
        if dataset.retype_numeric_text(idx) {
            debug!(column = %dataset.columns()[idx], "Column typed as numeric after nulling n/a");
        }
    }
    replaced
}

/// Removes rows identical to an earlier row, keeping the first occurrence
pub fn remove_duplicate_rows(dataset: &mut Dataset) -> usize {
    let keep: Vec<bool> = {
        let mut seen = HashSet::with_capacity(dataset.len());
        dataset.rows().iter().map(|row| seen.insert(row)).collect()
    };
    let mut keep = keep.into_iter();
    let removed = dataset.retain_rows(|_| keep.next().unwrap_or(true));
    if removed > 0 {
        info!(removed, "Removed duplicate rows");
    }
    removed
}

/// Re-encodes employment length as whole years. Nulls and values with no
/// usable digits become 0; returns how many cells were defaulted.
pub fn encode_emp_length(dataset: &mut Dataset) -> Result<usize, CleaningError> {
    let idx = required_column(dataset, EMP_LENGTH)?;
    let mut filled = 0;
    for (row, value) in dataset.column_values_mut(idx).enumerate() {
        let years = match &*value {
            Value::Null => None,
            Value::Int(i) => Some(*i),
            Value::Float(f) => whole_number(*f),
            Value::Text(s) => parse_emp_length(s),
            Value::Date(_) => None,
        };
        let years = match years {
            Some(years) => years,
            None => {
                if !value.is_null() {
                    warn!(row, value = %value, "Unreadable emp_length, using 0");
                }
                filled += 1;
                0
            }
        };
        *value = Value::Int(years);
    }
    Ok(filled)
}

/// "10+ years" -> 10, "< 1 year" -> 0, otherwise the digits in the text
pub fn parse_emp_length(raw: &str) -> Option<i64> {
    match raw.trim() {
        EMP_LENGTH_TEN_PLUS => Some(10),
        EMP_LENGTH_UNDER_ONE => Some(0),
        other => NON_DIGITS.replace_all(other, "").parse().ok(),
    }
}

/// Re-encodes "36 months" as 36. Null terms are left for the member id
/// filter, which removes the summary rows that carry them.
pub fn encode_term(dataset: &mut Dataset) -> Result<(), CleaningError> {
    let idx = required_column(dataset, TERM)?;
    for (row, value) in dataset.column_values_mut(idx).enumerate() {
        let months = match &*value {
            Value::Null => continue,
            Value::Int(i) => *i,
            Value::Float(f) => whole_number(*f).ok_or_else(|| CleaningError::MalformedTerm {
                row,
                value: f.to_string(),
            })?,
            Value::Text(s) => parse_term(s).ok_or_else(|| CleaningError::MalformedTerm {
                row,
                value: s.clone(),
            })?,
            Value::Date(d) => {
                return Err(CleaningError::MalformedTerm {
                    row,
                    value: d.to_string(),
                })
            }
        };
        *value = Value::Int(months);
    }
    Ok(())
}

/// Leading whitespace-delimited token of the trimmed text, as an integer
pub fn parse_term(raw: &str) -> Option<i64> {
    raw.split_whitespace().next()?.parse().ok()
}

/// Replaces nulls in `column` with `default`; returns how many were replaced
pub fn fill_null(dataset: &mut Dataset, column: &str, default: Value) -> Result<usize, CleaningError> {
    let idx = required_column(dataset, column)?;
    let mut filled = 0;
    for value in dataset.column_values_mut(idx) {
        if value.is_null() {
            *value = default.clone();
            filled += 1;
        }
    }
    Ok(filled)
}

/// Drops rows lacking a member id, such as the policy summary lines at the
/// end of Lending Club exports
pub fn drop_rows_without_member_id(dataset: &mut Dataset) -> Result<usize, CleaningError> {
    let idx = required_column(dataset, MEMBER_ID)?;
    let dropped = dataset.retain_rows(|row| !row[idx].is_null());
    if dropped > 0 {
        info!(dropped, "Dropped rows without member id");
    }
    Ok(dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::steps::test_support::{loan_dataset, set};
    use uuid::Uuid;

    #[test]
    fn test_emp_length_encoding() {
        assert_eq!(parse_emp_length("10+ years"), Some(10));
        assert_eq!(parse_emp_length("< 1 year"), Some(0));
        assert_eq!(parse_emp_length("3 years"), Some(3));
        assert_eq!(parse_emp_length("1 year"), Some(1));
        assert_eq!(parse_emp_length("unknown"), None);
    }

    #[test]
    fn test_term_encoding() {
        assert_eq!(parse_term("  36 months "), Some(36));
        assert_eq!(parse_term("60 months"), Some(60));
        assert_eq!(parse_term("months 36"), None);
        assert_eq!(parse_term("   "), None);
    }

    #[test]
    fn test_not_available_is_nulled_everywhere() {
        let mut ds = Dataset::from_rows(
            ["a", "b"],
            vec![vec![Value::text("n/a"), Value::text("N/A?")]],
        );
        assert_eq!(replace_not_available(&mut ds), 1);
        assert_eq!(ds.get(0, "a"), Some(&Value::Null));
        assert_eq!(ds.get(0, "b"), Some(&Value::text("N/A?")));
    }

    #[test]
    fn test_duplicates_keep_first_occurrence() {
        let mut ds = Dataset::from_rows(
            ["id", "x"],
            vec![
                vec![Value::Int(1), Value::Float(1.5)],
                vec![Value::Int(2), Value::Null],
                vec![Value::Int(1), Value::Float(1.5)],
                vec![Value::Int(2), Value::Null],
                vec![Value::Int(1), Value::Float(2.5)],
            ],
        );
        assert_eq!(remove_duplicate_rows(&mut ds), 2);
        let ids: Vec<_> = ds.column_values(0).cloned().collect();
        assert_eq!(ids, vec![Value::Int(1), Value::Int(2), Value::Int(1)]);
    }

    #[test]
    fn test_unreadable_emp_length_defaults_to_zero() {
        let mut ds = Dataset::from_rows(
            ["emp_length"],
            vec![
                vec![Value::text("unknown")],
                vec![Value::Float(2.5)],
                vec![Value::text("4 years")],
                vec![Value::Null],
            ],
        );
        assert_eq!(encode_emp_length(&mut ds).unwrap(), 3);
        let years: Vec<_> = ds.column_values(0).cloned().collect();
        assert_eq!(years, vec![Value::Int(0), Value::Int(0), Value::Int(4), Value::Int(0)]);
    }

    #[test]
    fn test_unreadable_emp_length_does_not_stop_validation() {
        let mut ds = loan_dataset(1);
        set(&mut ds, 0, "member_id", 1i64);
        set(&mut ds, 0, "term", "36 months");
        set(&mut ds, 0, "emp_length", "unknown");
        let mut report = CleaningReport::new(Uuid::nil());
        Validation.apply(&mut ds, &mut report).unwrap();
        assert_eq!(ds.get(0, "emp_length"), Some(&Value::Int(0)));
        assert_eq!(report.defaults_filled.get("emp_length"), Some(&1));
    }

    #[test]
    fn test_not_available_pass_retypes_columns() {
        let mut ds = Dataset::from_rows(
            ["annual_inc_joint", "next_pymnt_d", "desc"],
            vec![
                vec![Value::text("-300"), Value::text("Jan-2016"), Value::text("n/a")],
                vec![Value::text("n/a"), Value::text("n/a"), Value::text("car")],
            ],
        );
        assert_eq!(null_not_available(&mut ds), 3);
        assert_eq!(ds.get(0, "annual_inc_joint"), Some(&Value::Int(-300)));
        assert_eq!(ds.get(1, "annual_inc_joint"), Some(&Value::Null));
        assert_eq!(ds.get(0, "next_pymnt_d"), Some(&Value::text("Jan-2016")));
        assert_eq!(ds.get(1, "next_pymnt_d"), Some(&Value::Null));
        assert_eq!(ds.get(0, "desc"), Some(&Value::Null));
    }

    #[test]
    fn test_malformed_term_is_fatal() {
        let mut ds = loan_dataset(1);
        set(&mut ds, 0, "member_id", 1i64);
        set(&mut ds, 0, "term", "thirty-six months");
        let err = Validation
            .apply(&mut ds, &mut CleaningReport::new(Uuid::nil()))
            .unwrap_err();
        assert!(matches!(err, CleaningError::MalformedTerm { row: 0, .. }));
    }

    #[test]
    fn test_missing_mandatory_column_is_fatal() {
        let mut ds = Dataset::from_rows(["emp_length", "term"], vec![vec![Value::Null, Value::Null]]);
        let err = Validation
            .apply(&mut ds, &mut CleaningReport::new(Uuid::nil()))
            .unwrap_err();
        assert_eq!(err, CleaningError::MissingColumn("annual_inc".to_string()));
    }

    #[test]
    fn test_defaults_and_member_filter() {
        let mut ds = loan_dataset(2);
        set(&mut ds, 0, "member_id", 100i64);
        set(&mut ds, 0, "term", " 36 months");
        set(&mut ds, 0, "emp_length", "n/a");
        set(&mut ds, 1, "term", "60 months");
        set(&mut ds, 1, "annual_inc", 5.0);

        let mut report = CleaningReport::new(Uuid::nil());
        Validation.apply(&mut ds, &mut report).unwrap();

        assert_eq!(ds.len(), 1);
        assert_eq!(ds.get(0, "member_id"), Some(&Value::Int(100)));
        assert_eq!(ds.get(0, "term"), Some(&Value::Int(36)));
        assert_eq!(ds.get(0, "emp_length"), Some(&Value::Int(0)));
        assert_eq!(ds.get(0, "annual_inc"), Some(&Value::Float(0.0)));
        assert_eq!(ds.get(0, "verification_status"), Some(&Value::text("Not Verified")));
        assert_eq!(ds.get(0, "delinq_2yrs"), Some(&Value::Int(0)));
        assert_eq!(ds.get(0, "inq_last_6mths"), Some(&Value::Int(0)));
        assert_eq!(report.rows_missing_member_id, 1);
        assert_eq!(report.not_available_replaced, 1);
        // Nulls filled before the member filter still count
        assert_eq!(report.defaults_filled.get("annual_inc"), Some(&1));
        assert_eq!(report.defaults_filled.get("delinq_2yrs"), Some(&1));
    }
}
