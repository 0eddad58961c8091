//! Transform stage: turn loaded tables into a summary and hand it to renderers.

pub mod views_to_categories;

pub use views_to_categories::{DEFAULT_TITLE_COLUMN, ViewsToCategories, summarize};

use crate::error::Result;
use crate::output::DataOutput;
use crate::summary::CategoryViewsSummary;
use std::path::PathBuf;

/// Input files and output directory for one transform run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformPaths {
    pub video_file: PathBuf,
    pub category_file: PathBuf,
    pub output_dir: PathBuf,
}

/// A transformation from raw dataset files to a summary.
pub trait Transform {
    /// Run the transform, then invoke each output in order with the result.
    ///
    /// Load and parse failures propagate; an empty result does not.
    fn transform(
        &self,
        paths: &TransformPaths,
        outputs: &[Box<dyn DataOutput>],
    ) -> Result<CategoryViewsSummary>;
}
