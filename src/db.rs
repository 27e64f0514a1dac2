use crate::dataset::Dataset;
use crate::error::StorageError;
use crate::metrics::StorageMetrics;
use crate::schema::TableSchema;
use crate::storage::{audit_nullability, column_mapping, validate_identifier, IfExists, InsertMethod, Storage, WriteOptions};
use crate::types::{Value, DATE_OUTPUT_FORMAT};
use rusqlite::types::{ToSqlOutput, Value as SqlValue, ValueRef};
use rusqlite::{params, params_from_iter, Connection, ToSql, Transaction};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info};

/// Upper bound on bound parameters per statement for older SQLite builds
const MAX_BIND_PARAMETERS: usize = 999;

static NULL: Value = Value::Null;

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(SqlValue::Null),
            Value::Int(i) => ToSqlOutput::Owned(SqlValue::Integer(*i)),
            Value::Float(f) => ToSqlOutput::Owned(SqlValue::Real(*f)),
            Value::Date(d) => ToSqlOutput::Owned(SqlValue::Text(d.format(DATE_OUTPUT_FORMAT).to_string())),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

/// Loan table storage in a SQLite database file
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self, StorageError> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        info!(path = %db_path.display(), "Opening SQLite database");
        let conn = Connection::open(db_path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn table_exists(&self, table: &str) -> Result<bool, StorageError> {
        let mut stmt = self
            .conn
            .prepare("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1")?;
        let mut rows = stmt.query(params![table])?;
        Ok(rows.next()?.is_some())
    }

    pub fn row_count(&self, table: &str) -> Result<usize, StorageError> {
        validate_identifier(table)?;
        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", quote(table)), [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn write_batch(
        tx: &Transaction<'_>,
        table: &str,
        schema: &TableSchema,
        rows: &[Vec<Value>],
        mapping: &[Option<usize>],
        method: InsertMethod,
    ) -> Result<(), StorageError> {
        let rows_per_statement = match method {
            InsertMethod::Single => 1,
            InsertMethod::Multi => (MAX_BIND_PARAMETERS / schema.len().max(1)).max(1),
        };

        for group in rows.chunks(rows_per_statement) {
            let sql = insert_sql(table, schema, group.len());
            let mut stmt = tx.prepare_cached(&sql)?;
            let values = group.iter().flat_map(|row| {
                mapping
                    .iter()
                    .map(move |idx| idx.map_or(&NULL, |i| &row[i]))
            });
            stmt.execute(params_from_iter(values))?;
        }
        Ok(())
    }
}

impl Storage for SqliteStorage {
    fn initialize(&mut self, table: &str, schema: &TableSchema) -> Result<(), StorageError> {
        validate_identifier(table)?;
        if !self.table_exists(table)? {
            info!(table, "Creating loan table");
            self.conn.execute_batch(&create_table_sql(table, schema))?;
        }
        Ok(())
    }

    fn write(
        &mut self,
        dataset: &Dataset,
        schema: &TableSchema,
        options: &WriteOptions,
    ) -> Result<usize, StorageError> {
        options.validate()?;
        let table = options.table.as_str();
        let started = Instant::now();
        info!(table, batch_size = options.batch_size, rows = dataset.len(), "Loan dataset is being inserted into the database");

        let exists = self.table_exists(table)?;
        match options.if_exists {
            IfExists::Fail if exists => return Err(StorageError::TableExists(table.to_string())),
            IfExists::Replace if exists => {
                debug!(table, "Dropping existing table");
                self.conn.execute_batch(&format!("DROP TABLE {}", quote(table)))?;
                self.conn.execute_batch(&create_table_sql(table, schema))?;
            }
            _ => self.initialize(table, schema)?,
        }

        let mapping = column_mapping(dataset, schema);
        audit_nullability(dataset, schema, &mapping);

        let mut written = 0;
        for (batch, chunk) in dataset.rows().chunks(options.batch_size).enumerate() {
            let tx = self.conn.transaction()?;
            let result = Self::write_batch(&tx, table, schema, chunk, &mapping, options.method)
                .and_then(|()| tx.commit().map_err(StorageError::from));
            if let Err(e) = result {
                error!(table, batch, written, "Error during database insertion: {}", e);
                StorageMetrics::write_failed();
                return Err(e);
            }
            written += chunk.len();
            StorageMetrics::batch_written(chunk.len());
            debug!(table, batch, written, "Batch committed");
        }

        StorageMetrics::write_duration(started.elapsed().as_secs_f64());
        info!(table, written, "Loan dataset has been inserted into the database");
        Ok(written)
    }
}

fn quote(identifier: &str) -> String {
    format!("\"{identifier}\"")
}

fn create_table_sql(table: &str, schema: &TableSchema) -> String {
    let columns: Vec<String> = schema
        .columns()
        .iter()
        .map(|c| format!("{} {}", quote(c.name), c.column_type))
        .collect();
    format!("CREATE TABLE IF NOT EXISTS {} ({})", quote(table), columns.join(", "))
}

fn insert_sql(table: &str, schema: &TableSchema, rows: usize) -> String {
    let columns: Vec<String> = schema.names().map(quote).collect();
    let placeholders = format!("({})", vec!["?"; schema.len()].join(", "));
    format!(
        "INSERT INTO {} ({}) VALUES {}",
        quote(table),
        columns.join(", "),
        vec![placeholders; rows].join(", ")
    )
}
