use super::CleaningStep;
use crate::constants::NUMERIC_COLUMNS;
use crate::dataset::Dataset;
use crate::error::CleaningError;
use crate::metrics::CleaningMetrics;
use crate::pipeline::report::CleaningReport;
use crate::schema::{ColumnType, TableSchema, LOAN_SCHEMA};
use crate::types::Value;
use tracing::{debug, error, warn};

const STEP: &str = "numeric_coercion";

/// Coerces the declared numeric columns to numbers; anything that does not
/// parse (garbage, empty text, null) becomes zero.
pub struct NumericCoercion {
    columns: &'static [&'static str],
    schema: TableSchema,
}

impl NumericCoercion {
    pub fn new(columns: &'static [&'static str], schema: TableSchema) -> Self {
        Self { columns, schema }
    }

    fn target_type(&self, column: &str) -> ColumnType {
        self.schema
            .column(column)
            .map(|c| c.column_type)
            .filter(|t| t.is_numeric())
            .unwrap_or(ColumnType::Float)
    }
}

impl Default for NumericCoercion {
    fn default() -> Self {
        Self::new(&NUMERIC_COLUMNS, LOAN_SCHEMA)
    }
}

impl CleaningStep for NumericCoercion {
    fn step_name(&self) -> &'static str {
        STEP
    }

    fn apply(&self, dataset: &mut Dataset, report: &mut CleaningReport) -> Result<(), CleaningError> {
        for &column in self.columns {
            let Some(idx) = dataset.column_index(column) else {
                error!(column, "Numeric conversion failed! Column not found");
                report.skip_column(STEP, column, "column not found");
                CleaningMetrics::column_skipped(STEP, column);
                continue;
            };

            let target = self.target_type(column);
            let zero = match target {
                ColumnType::Integer => Value::Int(0),
                _ => Value::Float(0.0),
            };

            let mut coerced = 0;
            for value in dataset.column_values_mut(idx) {
                match coerce_numeric(value, target) {
                    Some(v) => *value = v,
                    None => {
                        if !value.is_null() {
                            debug!(column, value = %value, "Non-numeric value replaced with zero");
                        }
                        *value = zero.clone();
                        coerced += 1;
                    }
                }
            }

            if coerced > 0 {
                warn!(column, coerced, "Replaced non-numeric values with zero");
                CleaningMetrics::cells_coerced(column, coerced);
                report.cells_coerced.insert(column.to_string(), coerced);
            }
        }
        Ok(())
    }
}

/// Parses a cell as a number of the column's declared type.
///
/// Integer columns keep whole numbers as `Int` and fall back to `Float` for
/// fractional values rather than truncating them.
pub fn coerce_numeric(value: &Value, target: ColumnType) -> Option<Value> {
    let number = match value {
        Value::Int(i) => Number::Int(*i),
        Value::Float(f) if f.is_finite() => Number::Float(*f),
        Value::Text(s) => parse_number(s)?,
        Value::Float(_) | Value::Null | Value::Date(_) => return None,
    };

    Some(match (target, number) {
        (ColumnType::Integer, Number::Int(i)) => Value::Int(i),
        (ColumnType::Integer, Number::Float(f)) => match whole_number(f) {
            Some(i) => Value::Int(i),
            None => Value::Float(f),
        },
        (_, Number::Int(i)) => Value::Float(i as f64),
        (_, Number::Float(f)) => Value::Float(f),
    })
}

enum Number {
    Int(i64),
    Float(f64),
}

fn parse_number(raw: &str) -> Option<Number> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Some(Number::Int(i));
    }
    s.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(Number::Float)
}

pub(crate) fn whole_number(f: f64) -> Option<i64> {
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::steps::test_support::{loan_dataset, set};

    #[test]
    fn test_text_numbers_are_parsed_by_declared_type() {
        assert_eq!(
            coerce_numeric(&Value::text(" 5000 "), ColumnType::Float),
            Some(Value::Float(5000.0))
        );
        assert_eq!(
            coerce_numeric(&Value::text("12"), ColumnType::Integer),
            Some(Value::Int(12))
        );
        assert_eq!(
            coerce_numeric(&Value::text("12.0"), ColumnType::Integer),
            Some(Value::Int(12))
        );
        assert_eq!(
            coerce_numeric(&Value::text("1.5"), ColumnType::Integer),
            Some(Value::Float(1.5))
        );
        assert_eq!(
            coerce_numeric(&Value::text("-3.25"), ColumnType::Float),
            Some(Value::Float(-3.25))
        );
    }

    #[test]
    fn test_unparseable_values_are_rejected() {
        for raw in ["", "abc", "10.65%", "NaN", "inf"] {
            assert_eq!(coerce_numeric(&Value::text(raw), ColumnType::Float), None, "{raw:?}");
        }
        assert_eq!(coerce_numeric(&Value::Null, ColumnType::Float), None);
    }

    #[test]
    fn test_failures_become_zero_and_are_counted() {
        let mut ds = loan_dataset(3);
        set(&mut ds, 0, "loan_amnt", "5000");
        set(&mut ds, 1, "loan_amnt", "garbage");
        set(&mut ds, 0, "delinq_2yrs", "2");

        let mut report = CleaningReport::new(uuid::Uuid::nil());
        NumericCoercion::default().apply(&mut ds, &mut report).unwrap();

        assert_eq!(ds.get(0, "loan_amnt"), Some(&Value::Float(5000.0)));
        assert_eq!(ds.get(1, "loan_amnt"), Some(&Value::Float(0.0)));
        assert_eq!(ds.get(2, "loan_amnt"), Some(&Value::Float(0.0)));
        assert_eq!(ds.get(0, "delinq_2yrs"), Some(&Value::Int(2)));
        assert_eq!(ds.get(1, "delinq_2yrs"), Some(&Value::Int(0)));
        assert_eq!(report.cells_coerced.get("loan_amnt"), Some(&2));
    }

    #[test]
    fn test_missing_column_is_skipped_not_fatal() {
        let mut ds = Dataset::from_rows(["loan_amnt"], vec![vec![Value::text("10")]]);
        let mut report = CleaningReport::new(uuid::Uuid::nil());
        NumericCoercion::default().apply(&mut ds, &mut report).unwrap();

        assert_eq!(ds.get(0, "loan_amnt"), Some(&Value::Float(10.0)));
        assert_eq!(report.columns_skipped.len(), NUMERIC_COLUMNS.len() - 1);
        assert!(report
            .columns_skipped
            .iter()
            .all(|s| s.step == "numeric_coercion"));
    }
}
