use crate::dataset::Dataset;
use crate::error::StorageError;
use crate::metrics::StorageMetrics;
use crate::schema::TableSchema;
use crate::types::Value;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier regex"));

/// What to do when the target table already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IfExists {
    /// Drop the table and write the dataset into a fresh one
    #[default]
    Replace,
    Append,
    Fail,
}

/// How rows are packed into INSERT statements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsertMethod {
    /// One row per statement
    Single,
    /// Several rows per VALUES clause
    #[default]
    Multi,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOptions {
    pub table: String,
    pub batch_size: usize,
    pub if_exists: IfExists,
    pub method: InsertMethod,
}

impl WriteOptions {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            batch_size: 1000,
            if_exists: IfExists::Replace,
            method: InsertMethod::Multi,
        }
    }

    pub fn validate(&self) -> Result<(), StorageError> {
        validate_identifier(&self.table)?;
        if self.batch_size == 0 {
            return Err(StorageError::ZeroBatchSize);
        }
        Ok(())
    }
}

/// Destination for cleaned loan datasets
pub trait Storage: Send {
    /// Creates the target table if it does not exist yet
    fn initialize(&mut self, table: &str, schema: &TableSchema) -> Result<(), StorageError>;

    /// Writes the schema columns of `dataset` in batches of `options.batch_size`
    /// rows and returns the number of rows written. Schema columns missing from
    /// the dataset are written as null.
    fn write(
        &mut self,
        dataset: &Dataset,
        schema: &TableSchema,
        options: &WriteOptions,
    ) -> Result<usize, StorageError>;
}

pub fn validate_identifier(name: &str) -> Result<(), StorageError> {
    if IDENTIFIER.is_match(name) {
        Ok(())
    } else {
        Err(StorageError::InvalidIdentifier(name.to_string()))
    }
}

/// For each schema column, the position of the matching dataset column
pub(crate) fn column_mapping(dataset: &Dataset, schema: &TableSchema) -> Vec<Option<usize>> {
    let unmapped: Vec<&str> = dataset
        .columns()
        .iter()
        .map(String::as_str)
        .filter(|name| schema.column(name).is_none())
        .collect();
    if !unmapped.is_empty() {
        warn!(count = unmapped.len(), "Dataset columns not in the table schema will not be written");
        debug!(columns = ?unmapped, "Unmapped dataset columns");
    }

    schema
        .columns()
        .iter()
        .map(|spec| {
            let idx = dataset.column_index(spec.name);
            if idx.is_none() {
                debug!(column = spec.name, "Schema column absent from dataset, writing nulls");
            }
            idx
        })
        .collect()
}

/// Logs schema columns declared NOT NULL that still hold nulls
pub(crate) fn audit_nullability(dataset: &Dataset, schema: &TableSchema, mapping: &[Option<usize>]) {
    for (spec, idx) in schema.columns().iter().zip(mapping) {
        if spec.nullable {
            continue;
        }
        let nulls = match idx {
            Some(i) => dataset.column_values(*i).filter(|v| v.is_null()).count(),
            None => dataset.len(),
        };
        if nulls > 0 {
            warn!(column = spec.name, nulls, "Non-nullable column contains nulls");
        }
    }
}

/// A table held by [`InMemoryStorage`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoredTable {
    pub columns: Vec<&'static str>,
    pub rows: Vec<Vec<Value>>,
    pub batches: usize,
}

/// In-memory storage implementation for dry runs and testing
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    tables: HashMap<String, StoredTable>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self, name: &str) -> Option<&StoredTable> {
        self.tables.get(name)
    }
}

impl Storage for InMemoryStorage {
    fn initialize(&mut self, table: &str, schema: &TableSchema) -> Result<(), StorageError> {
        validate_identifier(table)?;
        self.tables.entry(table.to_string()).or_insert_with(|| StoredTable {
            columns: schema.names().collect(),
            ..StoredTable::default()
        });
        Ok(())
    }

    fn write(
        &mut self,
        dataset: &Dataset,
        schema: &TableSchema,
        options: &WriteOptions,
    ) -> Result<usize, StorageError> {
        options.validate()?;
        let exists = self.tables.contains_key(&options.table);
        match options.if_exists {
            IfExists::Fail if exists => return Err(StorageError::TableExists(options.table.clone())),
            IfExists::Replace => {
                self.tables.remove(&options.table);
            }
            _ => {}
        }

        let mapping = column_mapping(dataset, schema);
        audit_nullability(dataset, schema, &mapping);

        let table = self
            .tables
            .entry(options.table.clone())
            .or_insert_with(|| StoredTable {
                columns: schema.names().collect(),
                ..StoredTable::default()
            });

        for chunk in dataset.rows().chunks(options.batch_size) {
            for row in chunk {
                table.rows.push(
                    mapping
                        .iter()
                        .map(|idx| idx.map_or(Value::Null, |i| row[i].clone()))
                        .collect(),
                );
            }
            table.batches += 1;
            StorageMetrics::batch_written(chunk.len());
        }

        info!(table = %options.table, rows = dataset.len(), "Dataset stored in memory");
        Ok(dataset.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnSpec, ColumnType};

    const SCHEMA: TableSchema = TableSchema::new(&[
        ColumnSpec::new("id", ColumnType::Integer, false),
        ColumnSpec::new("grade", ColumnType::Varchar(1), false),
    ]);

    fn dataset() -> Dataset {
        Dataset::from_rows(
            ["grade", "extra", "id"],
            vec![
                vec![Value::text("A"), Value::Int(9), Value::Int(1)],
                vec![Value::text("B"), Value::Int(9), Value::Int(2)],
                vec![Value::text("C"), Value::Int(9), Value::Int(3)],
            ],
        )
    }

    #[test]
    fn test_identifier_validation() {
        assert!(validate_identifier("loan").is_ok());
        assert!(validate_identifier("loan_2019").is_ok());
        assert!(validate_identifier("loan; DROP TABLE x").is_err());
        assert!(validate_identifier("1loan").is_err());
    }

    #[test]
    fn test_write_projects_schema_columns_in_batches() {
        let mut storage = InMemoryStorage::new();
        let mut options = WriteOptions::new("loan");
        options.batch_size = 2;

        let written = storage.write(&dataset(), &SCHEMA, &options).unwrap();
        assert_eq!(written, 3);

        let table = storage.table("loan").unwrap();
        assert_eq!(table.columns, vec!["id", "grade"]);
        assert_eq!(table.rows[2], vec![Value::Int(3), Value::text("C")]);
        assert_eq!(table.batches, 2);
    }

    #[test]
    fn test_if_exists_policies() {
        let mut storage = InMemoryStorage::new();
        let mut options = WriteOptions::new("loan");
        storage.write(&dataset(), &SCHEMA, &options).unwrap();
        storage.write(&dataset(), &SCHEMA, &options).unwrap();
        assert_eq!(storage.table("loan").unwrap().rows.len(), 3);

        options.if_exists = IfExists::Append;
        storage.write(&dataset(), &SCHEMA, &options).unwrap();
        assert_eq!(storage.table("loan").unwrap().rows.len(), 6);

        options.if_exists = IfExists::Fail;
        assert!(matches!(
            storage.write(&dataset(), &SCHEMA, &options),
            Err(StorageError::TableExists(_))
        ));
    }

    #[test]
    fn test_zero_batch_size_is_rejected() {
        let mut storage = InMemoryStorage::new();
        let mut options = WriteOptions::new("loan");
        options.batch_size = 0;
        assert!(matches!(
            storage.write(&dataset(), &SCHEMA, &options),
            Err(StorageError::ZeroBatchSize)
        ));
    }
}
