//! JSON renderer: the summary as an array of row objects.

use crate::error::Result;
use crate::log::SharedLog;
use crate::output::DataOutput;
use crate::summary::CategoryViewsSummary;
use serde_json::json;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const JSON_FILE_NAME: &str = "views_to_categories.json";

/// Writes `views_to_categories.json`.
pub struct ViewsJson {
    log: SharedLog,
}

impl ViewsJson {
    pub fn new(log: SharedLog) -> Self {
        Self { log }
    }
}

impl DataOutput for ViewsJson {
    fn name(&self) -> &str {
        "json"
    }

    fn generate(&self, data: &CategoryViewsSummary, save_path: &Path) -> Result<PathBuf> {
        self.log
            .info("Starting Output ViewsToCategories as JSON", json!({"rows": data.len()}));

        if data.is_empty() {
            self.log.error(
                "Output ViewsToCategories as JSON failed empty data",
                json!({"save_path": save_path.display().to_string()}),
            );
        }

        let path = save_path.join(JSON_FILE_NAME);
        let mut writer = BufWriter::new(std::fs::File::create(&path)?);
        serde_json::to_writer(&mut writer, data)?;
        writer.flush()?;

        self.log.info(
            "Complete Output ViewsToCategories as JSON",
            json!({"path": path.display().to_string()}),
        );
        Ok(path)
    }
}
