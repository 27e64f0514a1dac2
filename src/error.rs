use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cleaning failed: {0}")]
    Cleaning(#[from] CleaningError),

    #[error("Storage failed: {0}")]
    Storage(#[from] StorageError),
}

/// Run-level failures of the cleaning pipeline. Cell and column problems in
/// the tolerant stages never surface here.
#[derive(Error, Debug, PartialEq)]
pub enum CleaningError {
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Malformed term value at row {row}: {value:?}")]
    MalformedTerm { row: usize, value: String },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Table '{0}' already exists")]
    TableExists(String),

    #[error("Invalid SQL identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("Batch size must be greater than zero")]
    ZeroBatchSize,
}

pub type Result<T> = std::result::Result<T, EtlError>;
