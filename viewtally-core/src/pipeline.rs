//! Orchestration: retrieve → transform → render for one dataset version.

use crate::config::PipelineConfig;
use crate::dataset::DatasetRef;
use crate::error::Result;
use crate::log::SharedLog;
use crate::output::{DataOutput, ViewsBarChart, ViewsJson};
use crate::retrieve::{DataRetrieve, KaggleCredentials, KaggleRetrieve};
use crate::summary::CategoryViewsSummary;
use crate::transform::{Transform, TransformPaths, ViewsToCategories};
use serde_json::json;
use std::path::{Path, PathBuf};

/// What a run produced.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Files were retrieved and every output was rendered.
    Completed(CategoryViewsSummary),
    /// Retrieval reported failure; transform and outputs were skipped.
    RetrievalFailed,
}

/// Directories used by a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPaths {
    pub save_path: PathBuf,
    pub output_path: PathBuf,
}

impl RunPaths {
    pub fn new(dataset: &DatasetRef, tmp_save_directory: &Path, output_root: &Path) -> Self {
        Self {
            save_path: dataset.scoped_dir(tmp_save_directory),
            output_path: dataset.scoped_dir(output_root),
        }
    }
}

/// Wires a retriever, a transform and its outputs together.
pub struct Pipeline {
    config: PipelineConfig,
    log: SharedLog,
    retriever: Box<dyn DataRetrieve>,
    transform: Box<dyn Transform>,
    outputs: Vec<Box<dyn DataOutput>>,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        log: SharedLog,
        retriever: Box<dyn DataRetrieve>,
        transform: Box<dyn Transform>,
        outputs: Vec<Box<dyn DataOutput>>,
    ) -> Self {
        Self {
            config,
            log,
            retriever,
            transform,
            outputs,
        }
    }

    /// The production wiring: Kaggle download, views-per-category transform,
    /// bar chart then JSON output. Every component shares `log`.
    pub fn from_config(config: PipelineConfig, log: SharedLog) -> Self {
        let mut retriever =
            KaggleRetrieve::new(log.clone()).with_api_base(config.kaggle.api_base.clone());
        if let (Some(username), Some(key)) = (&config.kaggle.username, &config.kaggle.key) {
            retriever = retriever.with_credentials(KaggleCredentials::new(username, key));
        }

        let transform = ViewsToCategories::new(log.clone())
            .with_title_column(config.transform.title_column.clone());

        let outputs: Vec<Box<dyn DataOutput>> = vec![
            Box::new(ViewsBarChart::with_options(log.clone(), config.chart.clone())),
            Box::new(ViewsJson::new(log.clone())),
        ];

        Self::new(config, log, Box::new(retriever), Box::new(transform), outputs)
    }

    /// Retrieve `dataset`, and if that succeeds, transform and render it.
    ///
    /// The output directory is created before retrieval. Retrieval failure
    /// is an outcome, not an error; transform and render errors propagate.
    pub async fn run(&self, dataset: &DatasetRef) -> Result<RunOutcome> {
        let tmp_dir = self.config.require_tmp_save_directory()?;
        let paths = RunPaths::new(dataset, tmp_dir, &self.config.output_root);
        std::fs::create_dir_all(&paths.output_path)?;

        self.log.info(
            "Kaggle retrieve and transform started",
            json!({
                "dataset": dataset.to_string(),
                "save_path": paths.save_path.display().to_string(),
                "output_path": paths.output_path.display().to_string(),
            }),
        );

        let retrieved = self
            .retriever
            .get(dataset, &paths.save_path, &self.config.expected_files())
            .await;

        let outcome = if retrieved {
            let transform_paths = TransformPaths {
                video_file: paths.save_path.join(&self.config.video_file_name),
                category_file: paths.save_path.join(&self.config.category_file_name),
                output_dir: paths.output_path.clone(),
            };
            let summary = self.transform.transform(&transform_paths, &self.outputs)?;
            RunOutcome::Completed(summary)
        } else {
            self.log.warning(
                "Retrieval failed, skipping transform",
                json!({"dataset": dataset.to_string()}),
            );
            RunOutcome::RetrievalFailed
        };

        self.log.info(
            "Kaggle retrieve and transform completed",
            json!({"dataset": dataset.to_string()}),
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_paths_layout() {
        let dataset = DatasetRef::new("datasnaek", "youtube-new", "115");
        let paths = RunPaths::new(
            &dataset,
            Path::new("/tmp/downloads"),
            Path::new("./downloader/visualisations"),
        );
        assert_eq!(
            paths.save_path,
            PathBuf::from("/tmp/downloads/kaggle/datasnaek/youtube-new/115")
        );
        assert_eq!(
            paths.output_path,
            PathBuf::from("./downloader/visualisations/kaggle/datasnaek/youtube-new/115")
        );
    }

    #[tokio::test]
    async fn test_run_requires_tmp_directory() {
        let log = std::sync::Arc::new(crate::log::RecordingLog::new());
        let pipeline = Pipeline::from_config(PipelineConfig::default(), log.clone());
        let err = pipeline.run(&DatasetRef::default()).await.unwrap_err();
        assert!(matches!(err, crate::error::PipelineError::Config(_)));
        assert!(log.records().is_empty());
    }
}
