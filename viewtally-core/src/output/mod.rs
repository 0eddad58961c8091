//! Report renderers. Each writes one artifact with a fixed file name.

pub mod bar_chart;
pub mod json;

pub use bar_chart::{BAR_CHART_FILE_NAME, ChartOptions, ViewsBarChart};
pub use json::{JSON_FILE_NAME, ViewsJson};

use crate::error::Result;
use crate::summary::CategoryViewsSummary;
use std::path::{Path, PathBuf};

/// Renders a summary into a file inside `save_path`.
///
/// `save_path` must already exist. An empty summary is logged at error level
/// but still produces an artifact.
pub trait DataOutput {
    /// Short name used in log records.
    fn name(&self) -> &str;

    /// Write the artifact and return its path.
    fn generate(&self, data: &CategoryViewsSummary, save_path: &Path) -> Result<PathBuf>;
}
