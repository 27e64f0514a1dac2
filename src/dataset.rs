use crate::types::Value;
use std::collections::HashMap;

/// Row-major, in-memory table with a fixed ordered set of named columns.
///
/// Every row holds exactly one value per column; constructors pad short rows
/// with `Value::Null` and drop surplus cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<Value>>,
}

impl Dataset {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        let mut index = HashMap::with_capacity(columns.len());
        for (i, name) in columns.iter().enumerate() {
            // First occurrence wins when a header repeats a name
            index.entry(name.clone()).or_insert(i);
        }
        Self {
            columns,
            index,
            rows: Vec::new(),
        }
    }

    pub fn from_rows<S: Into<String>>(
        columns: impl IntoIterator<Item = S>,
        rows: impl IntoIterator<Item = Vec<Value>>,
    ) -> Self {
        let mut dataset = Self::new(columns);
        for row in rows {
            dataset.push_row(row);
        }
        dataset
    }

    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.columns.len(), Value::Null);
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Cell lookup by row position and column name
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    pub fn column_values(&self, idx: usize) -> impl Iterator<Item = &Value> + '_ {
        self.rows.iter().map(move |row| &row[idx])
    }

    pub fn column_values_mut(&mut self, idx: usize) -> impl Iterator<Item = &mut Value> + '_ {
        self.rows.iter_mut().map(move |row| &mut row[idx])
    }

    /// All cells, row by row
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut Value> + '_ {
        self.rows.iter_mut().flat_map(|row| row.iter_mut())
    }

    /// A column is numeric when it has at least one value and every non-null
    /// value is an `Int` or `Float`.
    pub fn is_numeric_column(&self, idx: usize) -> bool {
        let mut seen = false;
        for value in self.column_values(idx) {
            match value {
                Value::Null => {}
                v if v.is_numeric() => seen = true,
                _ => return false,
            }
        }
        seen
    }

    /// Types a column whose text cells all hold numbers: `Int` when every
    /// number is an integer, otherwise `Float`. Columns with other text, with
    /// dates, or with no values are left alone. Returns true when cells changed.
    pub fn retype_numeric_text(&mut self, idx: usize) -> bool {
        let mut any_text = false;
        let mut all_int = true;
        for value in self.column_values(idx) {
            match value {
                Value::Null => {}
                Value::Int(_) => {}
                Value::Float(_) => all_int = false,
                Value::Text(s) => {
                    if s.parse::<i64>().is_err() {
                        if !s.parse::<f64>().map(f64::is_finite).unwrap_or(false) {
                            return false;
                        }
                        all_int = false;
                    }
                    any_text = true;
                }
                Value::Date(_) => return false,
            }
        }
        if !any_text {
            return false;
        }

        for value in self.column_values_mut(idx) {
            let converted = match &*value {
                Value::Text(s) if all_int => s.parse::<i64>().ok().map(Value::Int),
                Value::Text(s) => s.parse::<f64>().ok().map(Value::Float),
                Value::Int(i) if !all_int => Some(Value::Float(*i as f64)),
                _ => None,
            };
            if let Some(converted) = converted {
                *value = converted;
            }
        }
        true
    }

    /// Keeps rows matching `keep`, preserving order; returns how many were removed
    pub fn retain_rows<F>(&mut self, keep: F) -> usize
    where
        F: FnMut(&Vec<Value>) -> bool,
    {
        let before = self.rows.len();
        self.rows.retain(keep);
        before - self.rows.len()
    }
}
