use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

/// A column a tolerant step could not process
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedColumn {
    pub step: &'static str,
    pub column: String,
    pub reason: String,
}

/// Summary of one cleaning run
#[derive(Debug, Clone, Serialize)]
pub struct CleaningReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub rows_in: usize,
    pub rows_out: usize,
    /// Cells replaced with zero by numeric coercion, per column
    pub cells_coerced: BTreeMap<String, usize>,
    pub values_sign_flipped: usize,
    pub date_columns_converted: Vec<String>,
    pub columns_skipped: Vec<SkippedColumn>,
    pub not_available_replaced: usize,
    pub duplicates_removed: usize,
    pub rows_missing_member_id: usize,
    /// Nulls replaced with a documented default, per column
    pub defaults_filled: BTreeMap<String, usize>,
}

impl CleaningReport {
    pub fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            started_at: Utc::now(),
            rows_in: 0,
            rows_out: 0,
            cells_coerced: BTreeMap::new(),
            values_sign_flipped: 0,
            date_columns_converted: Vec::new(),
            columns_skipped: Vec::new(),
            not_available_replaced: 0,
            duplicates_removed: 0,
            rows_missing_member_id: 0,
            defaults_filled: BTreeMap::new(),
        }
    }

    pub fn skip_column(&mut self, step: &'static str, column: &str, reason: impl Into<String>) {
        self.columns_skipped.push(SkippedColumn {
            step,
            column: column.to_string(),
            reason: reason.into(),
        });
    }

    pub fn total_cells_coerced(&self) -> usize {
        self.cells_coerced.values().sum()
    }

    pub fn total_defaults_filled(&self) -> usize {
        self.defaults_filled.values().sum()
    }

    pub fn rows_removed(&self) -> usize {
        self.rows_in.saturating_sub(self.rows_out)
    }
}
