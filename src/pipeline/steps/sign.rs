use super::CleaningStep;
use crate::dataset::Dataset;
use crate::error::CleaningError;
use crate::metrics::CleaningMetrics;
use crate::pipeline::report::CleaningReport;
use crate::types::Value;
use tracing::{debug, info};

/// Replaces every value of every numeric column with its absolute value.
///
/// Columns are chosen by the variants they hold, not by name, so numeric
/// columns outside the declared list (ids, joint incomes, ...) are covered too.
pub struct SignNormalization;

impl CleaningStep for SignNormalization {
    fn step_name(&self) -> &'static str {
        "sign_normalization"
    }

    fn apply(&self, dataset: &mut Dataset, report: &mut CleaningReport) -> Result<(), CleaningError> {
        let numeric_columns: Vec<usize> = (0..dataset.width())
            .filter(|&idx| dataset.is_numeric_column(idx))
            .collect();

        let mut flipped = 0;
        for idx in numeric_columns {
            let mut column_flipped = 0;
            for value in dataset.column_values_mut(idx) {
                if make_non_negative(value) {
                    column_flipped += 1;
                }
            }
            if column_flipped > 0 {
                debug!(column = %dataset.columns()[idx], column_flipped, "Negative values made positive");
            }
            flipped += column_flipped;
        }

        if flipped > 0 {
            info!(flipped, "Converted negative numeric values to positive");
        }
        CleaningMetrics::values_sign_flipped(flipped);
        report.values_sign_flipped += flipped;
        Ok(())
    }
}

/// Returns true when the value was negative
fn make_non_negative(value: &mut Value) -> bool {
    match value {
        Value::Int(i) if *i < 0 => {
            *i = i.checked_abs().unwrap_or(i64::MAX);
            true
        }
        Value::Float(f) => {
            let negative = *f < 0.0;
            *f = f.abs();
            negative
        }
        _ => false,
    }
}
