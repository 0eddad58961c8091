//! Tabular data loading: delimited files and flattened JSON documents.

pub mod source;
pub mod table;

pub use source::{CsvSource, DataSource, JsonItemsSource, flatten_object, records_to_table};
pub use table::{Table, cell_as_i64, infer_cell};
