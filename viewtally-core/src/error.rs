//! Error types for the viewtally-core crate.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for pipeline operations.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Cannot parse column '{column}' value {value} as {expected}")]
    Parse {
        column: String,
        value: String,
        expected: &'static str,
    },

    #[error("Line {line} of {source_name} has {found} fields, header has {expected}")]
    MalformedRow {
        source_name: String,
        line: u64,
        found: usize,
        expected: usize,
    },

    #[error("Column '{column}' not found in {source_name}")]
    MissingColumn { column: String, source_name: String },

    #[error("Key '{key}' not found in {}", path.display())]
    MissingKey { key: String, path: PathBuf },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download of {location} failed with status {status}")]
    Download { location: String, status: u16 },

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Kaggle credentials not found: {0}")]
    Credentials(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl PipelineError {
    pub fn parse(column: impl Into<String>, value: impl ToString, expected: &'static str) -> Self {
        Self::Parse {
            column: column.into(),
            value: value.to_string(),
            expected,
        }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

impl From<figment::Error> for PipelineError {
    fn from(e: figment::Error) -> Self {
        Self::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_message() {
        let err = PipelineError::parse("views", "\"abc\"", "integer");
        assert_eq!(
            err.to_string(),
            "Cannot parse column 'views' value \"abc\" as integer"
        );
    }

    #[test]
    fn test_missing_key_message() {
        let err = PipelineError::MissingKey {
            key: "items".into(),
            path: PathBuf::from("/tmp/cat.json"),
        };
        assert!(err.to_string().contains("/tmp/cat.json"));
    }
}
