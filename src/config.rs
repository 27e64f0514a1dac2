use crate::csv_io::CsvOptions;
use crate::error::{EtlError, Result};
use crate::storage::{validate_identifier, IfExists, InsertMethod, WriteOptions};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Config file picked up from the working directory when no path is given
pub const DEFAULT_CONFIG_PATH: &str = "loan_etl.toml";

pub const ENV_DB_PATH: &str = "LOAN_ETL_DB_PATH";
pub const ENV_DB_TABLE: &str = "LOAN_ETL_DB_TABLE";
pub const ENV_BATCH_SIZE: &str = "LOAN_ETL_BATCH_SIZE";
pub const ENV_IF_EXISTS: &str = "LOAN_ETL_IF_EXISTS";
pub const ENV_LOG_LEVEL: &str = "LOAN_ETL_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "LOAN_ETL_LOG_DIR";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub insertion: InsertionConfig,
    pub logging: LoggingConfig,
    pub input: CsvOptions,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub table: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("lending_club.db"),
            table: "loan".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InsertionConfig {
    /// Rows written per batch
    pub batch_size: usize,
    pub if_exists: IfExists,
    pub method: InsertMethod,
}

impl Default for InsertionConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            if_exists: IfExists::Replace,
            method: InsertMethod::Multi,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    Minutely,
    Hourly,
    Daily,
    Never,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub dir: PathBuf,
    pub file_name: String,
    pub rotation: LogRotation,
    /// Rotated files kept before the oldest is deleted
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: PathBuf::from("logs"),
            file_name: "loan_etl.log".to_string(),
            rotation: LogRotation::Daily,
            max_files: 7,
        }
    }
}

impl Config {
    /// Loads `path`, or `loan_etl.toml` when present, or the defaults; then
    /// applies environment overrides and validates the result.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => Self::from_file(Path::new(DEFAULT_CONFIG_PATH))?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            EtlError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Applies `LOAN_ETL_*` overrides looked up through `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_DB_PATH) {
            self.database.path = PathBuf::from(v);
        }
        if let Some(v) = lookup(ENV_DB_TABLE) {
            self.database.table = v;
        }
        if let Some(v) = lookup(ENV_BATCH_SIZE) {
            self.insertion.batch_size = parse_env(ENV_BATCH_SIZE, &v)?;
        }
        if let Some(v) = lookup(ENV_IF_EXISTS) {
            self.insertion.if_exists = match v.to_ascii_lowercase().as_str() {
                "replace" => IfExists::Replace,
                "append" => IfExists::Append,
                "fail" => IfExists::Fail,
                other => {
                    return Err(EtlError::Config(format!("{ENV_IF_EXISTS}: unknown policy '{other}'")))
                }
            };
        }
        if let Some(v) = lookup(ENV_LOG_LEVEL) {
            self.logging.level = v;
        }
        if let Some(v) = lookup(ENV_LOG_DIR) {
            self.logging.dir = PathBuf::from(v);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.insertion.batch_size == 0 {
            return Err(EtlError::Config("insertion.batch_size must be greater than zero".to_string()));
        }
        validate_identifier(&self.database.table)
            .map_err(|e| EtlError::Config(format!("database.table: {e}")))?;
        if !self.input.delimiter.is_ascii() {
            return Err(EtlError::Config("input.delimiter must be an ASCII character".to_string()));
        }
        if self.logging.max_files == 0 {
            return Err(EtlError::Config("logging.max_files must be greater than zero".to_string()));
        }
        Ok(())
    }

    pub fn write_options(&self) -> WriteOptions {
        WriteOptions {
            table: self.database.table.clone(),
            batch_size: self.insertion.batch_size,
            if_exists: self.insertion.if_exists,
            method: self.insertion.method,
        }
    }
}

fn parse_env<T: FromStr>(key: &str, raw: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| EtlError::Config(format!("{key}: invalid value '{raw}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.database.table, "loan");
        assert_eq!(config.insertion.batch_size, 1000);
        assert_eq!(config.insertion.if_exists, IfExists::Replace);
        assert_eq!(config.insertion.method, InsertMethod::Multi);
        assert_eq!(config.logging.max_files, 7);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            [database]
            table = "loan_2019"

            [insertion]
            batch_size = 250
            if_exists = "append"

            [input]
            skip_rows = 1
            "#,
        )
        .unwrap();
        assert_eq!(config.database.table, "loan_2019");
        assert_eq!(config.database.path, PathBuf::from("lending_club.db"));
        assert_eq!(config.insertion.batch_size, 250);
        assert_eq!(config.insertion.if_exists, IfExists::Append);
        assert_eq!(config.input.skip_rows, 1);
        assert_eq!(config.logging.rotation, LogRotation::Daily);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_DB_PATH, "/tmp/loans.db"),
            (ENV_BATCH_SIZE, "50"),
            (ENV_IF_EXISTS, "FAIL"),
        ]
        .into_iter()
        .collect();
        let mut config = Config::default();
        config
            .apply_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.database.path, PathBuf::from("/tmp/loans.db"));
        assert_eq!(config.write_options().batch_size, 50);
        assert_eq!(config.write_options().if_exists, IfExists::Fail);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let mut config = Config::default();
        assert!(config
            .apply_overrides(|k| (k == ENV_BATCH_SIZE).then(|| "lots".to_string()))
            .is_err());

        let mut config = Config::default();
        config.database.table = "loan; drop".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.insertion.batch_size = 0;
        assert!(config.validate().is_err());
    }
}
