//! Tabular loaders for delimited files and nested JSON documents.

use crate::data::table::{Table, infer_cell};
use crate::error::{PipelineError, Result};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::PathBuf;

/// Something that can be loaded into a [`Table`].
pub trait DataSource {
    fn load(&self) -> Result<Table>;

    /// Human-readable location, used in error messages and logs.
    fn location(&self) -> String;
}

// ---------------------------------------------------------------------------
// CsvSource
// ---------------------------------------------------------------------------

/// Delimited text file with a header row.
pub struct CsvSource {
    pub path: PathBuf,
    pub delimiter: u8,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            delimiter: b',',
        }
    }
}

impl DataSource for CsvSource {
    fn load(&self) -> Result<Table> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .flexible(true)
            .from_path(&self.path)?;

        let columns: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        // Short rows are padded with nulls; long rows mean a misaligned record.
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            if record.len() > columns.len() {
                return Err(PipelineError::MalformedRow {
                    source_name: self.location(),
                    line: record.position().map(|p| p.line()).unwrap_or_default(),
                    found: record.len(),
                    expected: columns.len(),
                });
            }
            rows.push(record.iter().map(infer_cell).collect());
        }

        Ok(Table::new(columns, rows))
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

// ---------------------------------------------------------------------------
// JsonItemsSource
// ---------------------------------------------------------------------------

/// JSON document whose records live in an array under `records_key`.
///
/// Every record is flattened so nested objects become dotted-path columns
/// (`{"snippet": {"title": "Music"}}` → `snippet.title`). Columns appear in
/// first-seen order across all records; absent paths are null.
pub struct JsonItemsSource {
    pub path: PathBuf,
    pub records_key: String,
}

impl JsonItemsSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            records_key: "items".to_string(),
        }
    }
}

impl DataSource for JsonItemsSource {
    fn load(&self) -> Result<Table> {
        let content = std::fs::read_to_string(&self.path)?;
        let document: Value = serde_json::from_str(&content)?;

        let items = document
            .get(&self.records_key)
            .and_then(Value::as_array)
            .ok_or_else(|| PipelineError::MissingKey {
                key: self.records_key.clone(),
                path: self.path.clone(),
            })?;

        Ok(records_to_table(items))
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// Flatten a list of JSON records into a table.
pub fn records_to_table(items: &[Value]) -> Table {
    let mut columns: Vec<String> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut flat_rows: Vec<Map<String, Value>> = Vec::with_capacity(items.len());

    for item in items {
        let flat = match item {
            Value::Object(map) => flatten_object(map),
            scalar => {
                let mut map = Map::new();
                map.insert("value".to_string(), scalar.clone());
                map
            }
        };
        for key in flat.keys() {
            if !positions.contains_key(key) {
                positions.insert(key.clone(), columns.len());
                columns.push(key.clone());
            }
        }
        flat_rows.push(flat);
    }

    let rows = flat_rows
        .into_iter()
        .map(|flat| {
            let mut row = vec![Value::Null; columns.len()];
            for (key, value) in flat {
                if let Some(&idx) = positions.get(&key) {
                    row[idx] = value;
                }
            }
            row
        })
        .collect();

    Table { columns, rows }
}

/// Flatten nested objects into dotted keys. Arrays are kept as values.
pub fn flatten_object(object: &Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::new();
    flatten_into(&mut out, None, object);
    out
}

fn flatten_into(out: &mut Map<String, Value>, prefix: Option<&str>, object: &Map<String, Value>) {
    for (key, value) in object {
        let path = match prefix {
            Some(p) => format!("{p}.{key}"),
            None => key.clone(),
        };
        match value {
            Value::Object(inner) => flatten_into(out, Some(&path), inner),
            other => {
                out.insert(path, other.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_flatten_object_nested_paths() {
        let value = json!({
            "id": "10",
            "snippet": {"title": "Music", "meta": {"assignable": true}},
            "tags": ["a", "b"]
        });
        let flat = flatten_object(value.as_object().unwrap());
        assert_eq!(flat["id"], json!("10"));
        assert_eq!(flat["snippet.title"], json!("Music"));
        assert_eq!(flat["snippet.meta.assignable"], json!(true));
        assert_eq!(flat["tags"], json!(["a", "b"]));
    }

    #[test]
    fn test_records_to_table_unions_columns() {
        let items = vec![
            json!({"id": "1", "snippet": {"title": "Film"}}),
            json!({"id": "2", "etag": "x"}),
        ];
        let table = records_to_table(&items);
        assert_eq!(table.column_count(), 3);
        let title = table.column_index("snippet.title").unwrap();
        let etag = table.column_index("etag").unwrap();
        assert_eq!(table.rows[0][title], json!("Film"));
        assert_eq!(table.rows[1][title], Value::Null);
        assert_eq!(table.rows[1][etag], json!("x"));
        assert_eq!(table.rows[0][etag], Value::Null);
    }

    #[test]
    fn test_csv_source_handles_quoted_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("videos.csv");
        std::fs::write(
            &path,
            "video_id,title,category_id,views\n\
             a1,\"Hello, world\",10,100\n\
             a2,\"multi\nline\",24,\n",
        )
        .unwrap();

        let table = CsvSource::new(&path).load().unwrap();
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows[0][1], json!("Hello, world"));
        assert_eq!(table.rows[0][2], json!(10));
        assert_eq!(table.rows[1][1], json!("multi\nline"));
        assert_eq!(table.rows[1][3], Value::Null);
    }

    #[test]
    fn test_csv_source_rejects_row_longer_than_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("videos.csv");
        std::fs::write(
            &path,
            "video_id,title,category_id,views\n\
             a1,Hello,10,100\n\
             a2,Hello, world,24,500\n",
        )
        .unwrap();

        let err = CsvSource::new(&path).load().unwrap_err();
        match err {
            PipelineError::MalformedRow {
                line,
                found,
                expected,
                ..
            } => {
                assert_eq!(line, 3);
                assert_eq!(found, 5);
                assert_eq!(expected, 4);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_csv_source_pads_short_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("videos.csv");
        std::fs::write(&path, "video_id,category_id,views\na1,10\n").unwrap();

        let table = CsvSource::new(&path).load().unwrap();
        assert_eq!(table.rows[0], vec![json!("a1"), json!(10), Value::Null]);
    }

    #[test]
    fn test_csv_source_missing_file() {
        let src = CsvSource::new("/nonexistent/videos.csv");
        assert!(src.load().is_err());
        assert_eq!(src.location(), "/nonexistent/videos.csv");
    }

    #[test]
    fn test_json_items_source_loads_items() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("categories.json");
        std::fs::write(
            &path,
            r#"{"kind": "list", "items": [
                {"id": "1", "snippet": {"title": "Film & Animation"}},
                {"id": "2", "snippet": {"title": "Autos & Vehicles"}}
            ]}"#,
        )
        .unwrap();

        let table = JsonItemsSource::new(&path).load().unwrap();
        let table = table.select(&["id", "snippet.title"], "categories").unwrap();
        assert_eq!(
            table.rows,
            vec![
                vec![json!("1"), json!("Film & Animation")],
                vec![json!("2"), json!("Autos & Vehicles")],
            ]
        );
    }

    #[test]
    fn test_json_items_source_missing_key() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("categories.json");
        std::fs::write(&path, r#"{"kind": "list"}"#).unwrap();
        let err = JsonItemsSource::new(&path).load().unwrap_err();
        assert!(matches!(err, PipelineError::MissingKey { .. }));
    }

    #[test]
    fn test_json_items_source_malformed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("categories.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = JsonItemsSource::new(&path).load().unwrap_err();
        assert!(matches!(err, PipelineError::Json(_)));
    }
}
