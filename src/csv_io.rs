//! Reading loan exports into a [`Dataset`] and writing cleaned datasets back out.

use crate::constants::is_csv_null_token;
use crate::dataset::Dataset;
use crate::error::Result;
use crate::types::Value;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;
use tracing::{debug, info};

/// Shape of the delimited input file
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CsvOptions {
    pub delimiter: char,
    /// Lines to skip before the header row (Lending Club exports start with a
    /// one-line banner)
    pub skip_rows: usize,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: ',',
            skip_rows: 0,
        }
    }
}

pub fn read_dataset(path: impl AsRef<Path>, options: &CsvOptions) -> Result<Dataset> {
    let path = path.as_ref();
    info!(path = %path.display(), "Loading CSV file into dataset");
    let file = File::open(path)?;
    let dataset = read_dataset_from_reader(file, options)?;
    info!(
        path = %path.display(),
        rows = dataset.len(),
        columns = dataset.width(),
        "CSV file loaded"
    );
    Ok(dataset)
}

/// Reads delimited text with a header row.
///
/// Null spellings become `Value::Null`; columns whose remaining cells are all
/// integers or all finite floats are typed as such, everything else stays text.
pub fn read_dataset_from_reader<R: Read>(reader: R, options: &CsvOptions) -> Result<Dataset> {
    let mut reader = BufReader::new(reader);
    let mut skipped = String::new();
    for _ in 0..options.skip_rows {
        skipped.clear();
        if reader.read_line(&mut skipped)? == 0 {
            break;
        }
    }

    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(delimiter_byte(options.delimiter))
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    let mut dataset = Dataset::new(headers);

    for record in csv_reader.records() {
        let record = record?;
        let row = record
            .iter()
            .map(|cell| {
                if is_csv_null_token(cell) {
                    Value::Null
                } else {
                    Value::text(cell)
                }
            })
            .collect();
        dataset.push_row(row);
    }

    infer_column_types(&mut dataset);
    Ok(dataset)
}

fn delimiter_byte(delimiter: char) -> u8 {
    if delimiter.is_ascii() {
        delimiter as u8
    } else {
        b','
    }
}

fn infer_column_types(dataset: &mut Dataset) {
    for idx in 0..dataset.width() {
        if dataset.retype_numeric_text(idx) {
            debug!(column = %dataset.columns()[idx], "Typed column as numeric");
        }
    }
}

pub fn write_dataset(path: impl AsRef<Path>, dataset: &Dataset) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = File::create(path)?;
    write_dataset_to_writer(file, dataset)?;
    info!(path = %path.display(), rows = dataset.len(), "Cleaned dataset written");
    Ok(())
}

/// Writes a header row and one record per row; dates as `YYYY-MM-DD`, nulls empty
pub fn write_dataset_to_writer<W: Write>(writer: W, dataset: &Dataset) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(dataset.columns())?;
    for row in dataset.rows() {
        csv_writer.write_record(row.iter().map(|v| v.to_string()))?;
    }
    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn load(input: &str) -> Dataset {
        read_dataset_from_reader(input.as_bytes(), &CsvOptions::default()).unwrap()
    }

    #[test]
    fn test_columns_are_typed_like_a_dataframe_reader() {
        let ds = load("id,member_id,loan_amnt,term,emp_length\n1,10,5000,36 months,10+ years\n2,,2500.5,60 months,n/a\n");
        assert_eq!(ds.get(0, "id"), Some(&Value::Int(1)));
        assert_eq!(ds.get(1, "member_id"), Some(&Value::Null));
        assert_eq!(ds.get(0, "loan_amnt"), Some(&Value::Float(5000.0)));
        assert_eq!(ds.get(0, "term"), Some(&Value::text("36 months")));
        assert_eq!(ds.get(1, "emp_length"), Some(&Value::text("n/a")));
    }

    #[test]
    fn test_null_tokens_and_ragged_rows() {
        let ds = load("a,b,c\nNA,x\n1,NULL,3,4\n");
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.rows()[0], vec![Value::Null, Value::text("x"), Value::Null]);
        assert_eq!(ds.get(1, "b"), Some(&Value::Null));
        assert_eq!(ds.get(1, "c"), Some(&Value::Int(3)));
    }

    #[test]
    fn test_skip_rows_and_delimiter() {
        let options = CsvOptions {
            delimiter: ';',
            skip_rows: 1,
        };
        let ds = read_dataset_from_reader(
            "Notes offered by Prospectus\nid;grade\n7;A\n".as_bytes(),
            &options,
        )
        .unwrap();
        assert_eq!(ds.columns(), &["id".to_string(), "grade".to_string()]);
        assert_eq!(ds.get(0, "grade"), Some(&Value::text("A")));
    }

    #[test]
    fn test_write_renders_typed_values() {
        let date = NaiveDate::from_ymd_opt(2015, 12, 1).unwrap();
        let ds = Dataset::from_rows(
            ["id", "issue_d", "desc"],
            vec![vec![Value::Int(1), Value::Date(date), Value::Null]],
        );
        let mut out = Vec::new();
        write_dataset_to_writer(&mut out, &ds).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "id,issue_d,desc\n1,2015-12-01,\n");
    }
}
