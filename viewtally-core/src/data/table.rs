//! Row/column table shared by the loaders and the transform stage.

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An ordered set of named columns holding rows of JSON cells.
///
/// Missing cells are `Value::Null`. Every row has exactly `columns.len()` cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a table, padding short rows with nulls and truncating long ones.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Value::Null);
                row
            })
            .collect();
        Self { columns, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Project onto `names`, in that order.
    ///
    /// `source_name` only feeds the error message when a column is absent.
    pub fn select(self, names: &[&str], source_name: &str) -> Result<Table> {
        let indices = names
            .iter()
            .map(|name| {
                self.column_index(name)
                    .ok_or_else(|| PipelineError::MissingColumn {
                        column: (*name).to_string(),
                        source_name: source_name.to_string(),
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        let rows = self
            .rows
            .into_iter()
            .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
            .collect();

        Ok(Table {
            columns: names.iter().map(|n| (*n).to_string()).collect(),
            rows,
        })
    }
}

/// Coerce a cell to `i64`.
///
/// Accepts JSON integers, integral floats and numeric strings (surrounding
/// whitespace ignored). Returns `Ok(None)` for null or blank cells.
pub fn cell_as_i64(value: &Value, column: &str) -> Result<Option<i64>> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Some(i))
            } else {
                match n.as_f64() {
                    Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                        Ok(Some(f as i64))
                    }
                    _ => Err(PipelineError::parse(column, n, "integer")),
                }
            }
        }
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed
                .parse::<i64>()
                .map(Some)
                .map_err(|_| PipelineError::parse(column, value, "integer"))
        }
        other => Err(PipelineError::parse(column, other, "integer")),
    }
}

/// Infer a typed cell from raw delimited text.
///
/// Blank text becomes null; integers and floats become numbers; everything
/// else stays a string.
pub fn infer_cell(raw: &str) -> Value {
    let s = raw.trim();
    if s.is_empty() {
        Value::Null
    } else if let Ok(i) = s.parse::<i64>() {
        Value::Number(i.into())
    } else if let Ok(f) = s.parse::<f64>() {
        serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(raw.to_string()))
    } else {
        Value::String(raw.to_string())
    }
}
