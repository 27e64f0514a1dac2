//! Metrics for the cleaning and storage phases
//!
//! Without an installed recorder every call here is a no-op.

use metrics::{counter, histogram};
use std::time::Instant;

pub const ROWS_LOADED: &str = "loan_etl_rows_loaded_total";
pub const ROWS_CLEANED: &str = "loan_etl_rows_cleaned_total";
pub const CELLS_COERCED: &str = "loan_etl_cells_coerced_total";
pub const VALUES_SIGN_FLIPPED: &str = "loan_etl_values_sign_flipped_total";
pub const COLUMNS_SKIPPED: &str = "loan_etl_columns_skipped_total";
pub const DUPLICATES_REMOVED: &str = "loan_etl_duplicate_rows_removed_total";
pub const ROWS_DROPPED: &str = "loan_etl_rows_dropped_total";
pub const STEP_DURATION: &str = "loan_etl_step_duration_seconds";
pub const ROWS_WRITTEN: &str = "loan_etl_rows_written_total";
pub const BATCHES_WRITTEN: &str = "loan_etl_batches_written_total";
pub const STORAGE_ERRORS: &str = "loan_etl_storage_errors_total";
pub const WRITE_DURATION: &str = "loan_etl_write_duration_seconds";

/// Metrics emitted while cleaning a dataset
pub struct CleaningMetrics;

impl CleaningMetrics {
    pub fn rows_loaded(count: usize) {
        counter!(ROWS_LOADED).increment(count as u64);
    }

    pub fn rows_cleaned(count: usize) {
        counter!(ROWS_CLEANED).increment(count as u64);
    }

    pub fn cells_coerced(column: &str, count: usize) {
        counter!(CELLS_COERCED, "column" => column.to_string()).increment(count as u64);
    }

    pub fn values_sign_flipped(count: usize) {
        counter!(VALUES_SIGN_FLIPPED).increment(count as u64);
    }

    pub fn column_skipped(step: &'static str, column: &str) {
        counter!(COLUMNS_SKIPPED, "step" => step, "column" => column.to_string()).increment(1);
    }

    pub fn duplicates_removed(count: usize) {
        counter!(DUPLICATES_REMOVED).increment(count as u64);
    }

    pub fn rows_dropped(reason: &'static str, count: usize) {
        counter!(ROWS_DROPPED, "reason" => reason).increment(count as u64);
    }
}

/// Metrics emitted by storage backends
pub struct StorageMetrics;

impl StorageMetrics {
    pub fn batch_written(rows: usize) {
        counter!(BATCHES_WRITTEN).increment(1);
        counter!(ROWS_WRITTEN).increment(rows as u64);
    }

    pub fn write_failed() {
        counter!(STORAGE_ERRORS).increment(1);
    }

    pub fn write_duration(duration_secs: f64) {
        histogram!(WRITE_DURATION).record(duration_secs);
    }
}

/// Records the elapsed time of one cleaning step when dropped
pub struct StepTimer {
    start: Instant,
    step: &'static str,
}

impl StepTimer {
    pub fn start(step: &'static str) -> Self {
        Self {
            start: Instant::now(),
            step,
        }
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

impl Drop for StepTimer {
    fn drop(&mut self) {
        histogram!(STEP_DURATION, "step" => self.step).record(self.elapsed_secs());
    }
}
