use super::CleaningStep;
use crate::constants::{DATE_COLUMNS, DEFAULT_DAY_OF_MONTH, SOURCE_DATE_FORMAT};
use crate::dataset::Dataset;
use crate::error::CleaningError;
use crate::metrics::CleaningMetrics;
use crate::pipeline::report::CleaningReport;
use crate::types::Value;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{error, info};

const STEP: &str = "date_parsing";

static MONTH_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z]{3}-\d{4}$").expect("valid month-year regex"));

/// Parses the "Mon-YYYY" date columns into dates on the first of the month.
///
/// A column converts all-or-nothing: one unparseable value leaves the whole
/// column as it was, with an error logged, and the run continues.
pub struct DateParsing {
    columns: &'static [&'static str],
}

impl DateParsing {
    pub fn new(columns: &'static [&'static str]) -> Self {
        Self { columns }
    }
}

impl Default for DateParsing {
    fn default() -> Self {
        Self::new(&DATE_COLUMNS)
    }
}

impl CleaningStep for DateParsing {
    fn step_name(&self) -> &'static str {
        STEP
    }

    fn apply(&self, dataset: &mut Dataset, report: &mut CleaningReport) -> Result<(), CleaningError> {
        for &column in self.columns {
            let Some(idx) = dataset.column_index(column) else {
                error!(column, "Date conversion failed! Column not found");
                report.skip_column(STEP, column, "column not found");
                CleaningMetrics::column_skipped(STEP, column);
                continue;
            };

            match convert_column(dataset, idx) {
                Ok(converted) => {
                    for (cell, value) in dataset.column_values_mut(idx).zip(converted) {
                        *cell = value;
                    }
                    info!(column, "Converted column to dates");
                    report.date_columns_converted.push(column.to_string());
                }
                Err((row, bad)) => {
                    error!(column, row, value = %bad, "Date conversion failed! Column left unconverted");
                    report.skip_column(STEP, column, format!("unparseable value {bad:?} at row {row}"));
                    CleaningMetrics::column_skipped(STEP, column);
                }
            }
        }
        Ok(())
    }
}

/// Converts every cell of a column, or reports the first offending row
fn convert_column(dataset: &Dataset, idx: usize) -> Result<Vec<Value>, (usize, String)> {
    dataset
        .column_values(idx)
        .enumerate()
        .map(|(row, value)| match value {
            Value::Null => Ok(Value::Null),
            Value::Date(d) => Ok(Value::Date(*d)),
            Value::Text(s) => parse_month_year(s)
                .map(Value::Date)
                .ok_or_else(|| (row, s.clone())),
            other => Err((row, other.to_string())),
        })
        .collect()
}

/// Parses "Dec-2015" into 2015-12-01
pub fn parse_month_year(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if !MONTH_YEAR.is_match(s) {
        return None;
    }
    let with_day = format!("{DEFAULT_DAY_OF_MONTH:02}-{s}");
    NaiveDate::parse_from_str(&with_day, &format!("%d-{SOURCE_DATE_FORMAT}")).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn date(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    #[test]
    fn test_parse_month_year() {
        assert_eq!(parse_month_year("Dec-2015"), Some(date(2015, 12)));
        assert_eq!(parse_month_year(" Jan-1999 "), Some(date(1999, 1)));
        assert_eq!(parse_month_year("garbage"), None);
        assert_eq!(parse_month_year("Dec-15"), None);
        assert_eq!(parse_month_year("Foo-2015"), None);
        assert_eq!(parse_month_year("December-2015"), None);
    }

    #[test]
    fn test_column_converts_with_nulls() {
        let mut ds = Dataset::from_rows(
            ["issue_d"],
            vec![vec![Value::text("Dec-2015")], vec![Value::Null]],
        );
        let mut report = CleaningReport::new(Uuid::nil());
        DateParsing::new(&["issue_d"]).apply(&mut ds, &mut report).unwrap();

        assert_eq!(ds.get(0, "issue_d"), Some(&Value::Date(date(2015, 12))));
        assert_eq!(ds.get(1, "issue_d"), Some(&Value::Null));
        assert_eq!(report.date_columns_converted, vec!["issue_d".to_string()]);
    }

    #[test]
    fn test_bad_value_leaves_column_unconverted() {
        let mut ds = Dataset::from_rows(
            ["issue_d", "next_pymnt_d"],
            vec![
                vec![Value::text("Dec-2015"), Value::text("Jan-2016")],
                vec![Value::text("garbage"), Value::text("Feb-2016")],
            ],
        );
        let mut report = CleaningReport::new(Uuid::nil());
        DateParsing::new(&["issue_d", "next_pymnt_d"])
            .apply(&mut ds, &mut report)
            .unwrap();

        assert_eq!(ds.get(0, "issue_d"), Some(&Value::text("Dec-2015")));
        assert_eq!(ds.get(1, "issue_d"), Some(&Value::text("garbage")));
        assert_eq!(ds.get(1, "next_pymnt_d"), Some(&Value::Date(date(2016, 2))));
        assert_eq!(report.columns_skipped.len(), 1);
        assert_eq!(report.columns_skipped[0].column, "issue_d");
    }

    #[test]
    fn test_already_converted_column_is_kept() {
        let mut ds = Dataset::from_rows(["issue_d"], vec![vec![Value::Date(date(2011, 6))]]);
        let mut report = CleaningReport::new(Uuid::nil());
        DateParsing::new(&["issue_d"]).apply(&mut ds, &mut report).unwrap();
        assert_eq!(ds.get(0, "issue_d"), Some(&Value::Date(date(2011, 6))));
    }
}
