pub mod config;
pub mod constants;
pub mod csv_io;
pub mod dataset;
pub mod db;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod schema;
pub mod storage;
pub mod types;

pub use dataset::Dataset;
pub use error::{CleaningError, EtlError, Result, StorageError};
pub use pipeline::{clean_and_validate, CleaningReport, Pipeline};
pub use types::Value;
