//! Configuration for viewtally.
//!
//! Uses `figment` for layered configuration: defaults -> `viewtally.toml` ->
//! `VIEWTALLY_*` environment variables -> `TMP_SAVE_DIRECTORY`.
//! Nested keys use `__` in variable names, e.g. `VIEWTALLY_CHART__WIDTH=1600`.

use crate::error::{PipelineError, Result};
use crate::output::ChartOptions;
use crate::transform::DEFAULT_TITLE_COLUMN;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file, looked up in the working directory.
pub const CONFIG_FILE: &str = "viewtally.toml";
/// Overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "VIEWTALLY_CONFIG";
pub const ENV_PREFIX: &str = "VIEWTALLY_";
/// Base directory for downloads. Required.
pub const TMP_DIR_ENV: &str = "TMP_SAVE_DIRECTORY";

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Base directory for downloaded files, from `TMP_SAVE_DIRECTORY`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmp_save_directory: Option<PathBuf>,
    /// Base directory for report artifacts.
    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,
    /// Directory holding the JSON-lines log file.
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    #[serde(default = "default_log_file")]
    pub log_file: String,
    /// Delimited video table inside the dataset archive.
    #[serde(default = "default_video_file_name")]
    pub video_file_name: String,
    /// JSON category document inside the dataset archive.
    #[serde(default = "default_category_file_name")]
    pub category_file_name: String,
    #[serde(default)]
    pub kaggle: KaggleConfig,
    #[serde(default)]
    pub transform: TransformConfig,
    #[serde(default)]
    pub chart: ChartOptions,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            tmp_save_directory: None,
            output_root: default_output_root(),
            log_dir: default_log_dir(),
            log_file: default_log_file(),
            video_file_name: default_video_file_name(),
            category_file_name: default_category_file_name(),
            kaggle: KaggleConfig::default(),
            transform: TransformConfig::default(),
            chart: ChartOptions::default(),
        }
    }
}

impl PipelineConfig {
    /// The download base directory; its absence is a startup failure.
    pub fn require_tmp_save_directory(&self) -> Result<&Path> {
        self.tmp_save_directory
            .as_deref()
            .ok_or_else(|| PipelineError::config(format!("{TMP_DIR_ENV} is not set")))
    }

    /// Files that must be present after retrieval, video table first.
    pub fn expected_files(&self) -> Vec<String> {
        vec![self.video_file_name.clone(), self.category_file_name.clone()]
    }

    pub fn log_path(&self) -> PathBuf {
        self.log_dir.join(&self.log_file)
    }
}

/// Kaggle API access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KaggleConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Falls back to `KAGGLE_USERNAME` / `~/.kaggle/kaggle.json` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl Default for KaggleConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            username: None,
            key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformConfig {
    /// Flattened column holding the category display name.
    #[serde(default = "default_title_column")]
    pub title_column: String,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            title_column: default_title_column(),
        }
    }
}

fn default_output_root() -> PathBuf {
    PathBuf::from("./downloader/visualisations")
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("./downloader/logs")
}

fn default_log_file() -> String {
    "project_logs.json".to_string()
}

fn default_video_file_name() -> String {
    "GBvideos.csv".to_string()
}

fn default_category_file_name() -> String {
    "GB_category_id.json".to_string()
}

fn default_api_base() -> String {
    "https://www.kaggle.com/api/v1".to_string()
}

fn default_title_column() -> String {
    DEFAULT_TITLE_COLUMN.to_string()
}

/// Config file to read: `VIEWTALLY_CONFIG` if set, else `./viewtally.toml`.
pub fn config_file_path() -> PathBuf {
    std::env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE))
}

/// Build the layered figment without extracting it.
pub fn figment(config_file: &Path) -> Figment {
    let mut figment = Figment::from(Serialized::defaults(PipelineConfig::default()));

    if config_file.exists() {
        figment = figment.merge(Toml::file(config_file));
    }

    // VIEWTALLY_OUTPUT_ROOT, VIEWTALLY_KAGGLE__API_BASE, etc.
    figment
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .merge(Env::raw().only(&[TMP_DIR_ENV]))
}

/// Load configuration from every layer.
pub fn load_config(config_file: Option<&Path>) -> Result<PipelineConfig> {
    let path = config_file
        .map(Path::to_path_buf)
        .unwrap_or_else(config_file_path);
    Ok(figment(&path).extract()?)
}
