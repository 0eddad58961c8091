//! # viewtally-core: YouTube views-per-category reporting
//!
//! A small linear pipeline over the Kaggle YouTube trending dataset:
//!
//! 1. **Retrieve**: download and unpack the dataset archive, then verify the
//!    expected files are present ([`retrieve`]).
//! 2. **Load**: parse the video CSV and the flattened category JSON into
//!    tables ([`data`]).
//! 3. **Transform**: sum views per category, join titles, rank and scale to
//!    millions ([`transform`]).
//! 4. **Render**: write a bar chart PNG and a JSON array ([`output`]).
//!
//! Every component takes its [`log::EventLog`] at construction.

pub mod config;
pub mod data;
pub mod dataset;
pub mod error;
pub mod log;
pub mod output;
pub mod pipeline;
pub mod retrieve;
pub mod summary;
pub mod transform;

// Re-exports
pub use config::{PipelineConfig, load_config};
pub use dataset::DatasetRef;
pub use error::{PipelineError, Result};
pub use log::{EventLog, RecordingLog, Severity, SharedLog, TracingLog};
pub use output::{DataOutput, ViewsBarChart, ViewsJson};
pub use pipeline::{Pipeline, RunOutcome, RunPaths};
pub use retrieve::{DataRetrieve, KaggleRetrieve};
pub use summary::{CategoryViews, CategoryViewsSummary};
pub use transform::{Transform, TransformPaths, ViewsToCategories};
