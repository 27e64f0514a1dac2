// Cleaning pipeline: numeric coercion, sign normalization, date parsing, validation

pub mod report;
pub mod steps;

pub use report::{CleaningReport, SkippedColumn};
pub use steps::{CleaningStep, DateParsing, NumericCoercion, SignNormalization, Validation};

use steps::validation::null_not_available;

use crate::dataset::Dataset;
use crate::error::CleaningError;
use crate::metrics::{CleaningMetrics, StepTimer};
use tracing::{error, info, info_span};
use uuid::Uuid;

/// Runs the cleaning steps over a dataset in their fixed order.
///
/// Validation fills defaults on columns numeric coercion may already have
/// zeroed, so the order between the two is not load-bearing. It is still
/// never changed at runtime.
pub struct Pipeline {
    steps: Vec<Box<dyn CleaningStep>>,
}

impl Pipeline {
    pub fn standard() -> Self {
        Self {
            steps: vec![
                Box::new(NumericCoercion::default()),
                Box::new(SignNormalization),
                Box::new(DateParsing::default()),
                Box::new(Validation),
            ],
        }
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.step_name()).collect()
    }

    /// Cleans `dataset`, returning the cleaned rows and a summary of what changed.
    ///
    /// `"n/a"` cells are nulled before the first step. Only the validation step
    /// can fail the run; the other steps log and carry on when a column is
    /// missing or unparseable.
    pub fn run(&self, mut dataset: Dataset) -> Result<(Dataset, CleaningReport), CleaningError> {
        let mut report = CleaningReport::new(Uuid::new_v4());
        let span = info_span!("clean", run_id = %report.run_id);
        let _enter = span.enter();

        report.rows_in = dataset.len();
        CleaningMetrics::rows_loaded(dataset.len());
        info!(rows = dataset.len(), columns = dataset.width(), "Cleaning dataset");

        // "n/a" is null for every step, not only validation
        report.not_available_replaced = null_not_available(&mut dataset);
        if report.not_available_replaced > 0 {
            info!(replaced = report.not_available_replaced, "Replaced n/a with null");
        }

        for step in &self.steps {
            let name = step.step_name();
            info!(step = name, "Step started");
            let timer = StepTimer::start(name);
            if let Err(e) = step.apply(&mut dataset, &mut report) {
                error!(step = name, "Cleaning aborted: {}", e);
                return Err(e);
            }
            info!(
                step = name,
                rows = dataset.len(),
                elapsed_secs = timer.elapsed_secs(),
                "Step finished"
            );
        }

        report.rows_out = dataset.len();
        CleaningMetrics::rows_cleaned(dataset.len());
        info!(
            rows_in = report.rows_in,
            rows_out = report.rows_out,
            "Dataset cleaned and validated"
        );
        Ok((dataset, report))
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::standard()
    }
}

/// Cleans and validates a loan dataset with the standard pipeline
pub fn clean_and_validate(dataset: Dataset) -> Result<(Dataset, CleaningReport), CleaningError> {
    Pipeline::standard().run(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_step_order() {
        assert_eq!(
            Pipeline::standard().step_names(),
            vec![
                "numeric_coercion",
                "sign_normalization",
                "date_parsing",
                "validation"
            ]
        );
    }
}
