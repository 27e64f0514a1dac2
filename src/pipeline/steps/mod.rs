use crate::dataset::Dataset;
use crate::error::CleaningError;
use super::report::CleaningReport;

/// One transformation over a whole dataset
pub trait CleaningStep: Send + Sync {
    /// Name used in logs, metrics and the run report
    fn step_name(&self) -> &'static str;

    /// Applies the step in place. Tolerant steps always return `Ok` and record
    /// skipped columns in `report` instead.
    fn apply(&self, dataset: &mut Dataset, report: &mut CleaningReport) -> Result<(), CleaningError>;
}

pub mod dates;
pub mod numeric;
pub mod sign;
pub mod validation;

pub use dates::DateParsing;
pub use numeric::NumericCoercion;
pub use sign::SignNormalization;
pub use validation::Validation;
