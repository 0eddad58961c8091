//! Total views per video category.
//!
//! Video rows are grouped by `category_id` and their `views` summed. Each
//! group is matched to its category title; groups without a title are
//! dropped, as are categories that no video references. Rows are ranked by
//! total views, highest first, ties broken by ascending category id, and
//! views are reported in millions.

use crate::data::{CsvSource, DataSource, JsonItemsSource, Table, cell_as_i64};
use crate::error::{PipelineError, Result};
use crate::log::SharedLog;
use crate::output::DataOutput;
use crate::summary::{CategoryViews, CategoryViewsSummary, VIEWS_SCALE};
use crate::transform::{Transform, TransformPaths};
use serde_json::{Value, json};
use std::collections::{BTreeMap, HashMap};

/// Title column produced by flattening a YouTube category document.
pub const DEFAULT_TITLE_COLUMN: &str = "snippet.title";

const CATEGORY_ID: &str = "category_id";
const VIEWS: &str = "views";
const ID: &str = "id";

pub struct ViewsToCategories {
    log: SharedLog,
    title_column: String,
}

impl ViewsToCategories {
    pub fn new(log: SharedLog) -> Self {
        Self {
            log,
            title_column: DEFAULT_TITLE_COLUMN.to_string(),
        }
    }

    pub fn with_title_column(mut self, title_column: impl Into<String>) -> Self {
        self.title_column = title_column.into();
        self
    }
}

impl Transform for ViewsToCategories {
    fn transform(
        &self,
        paths: &TransformPaths,
        outputs: &[Box<dyn DataOutput>],
    ) -> Result<CategoryViewsSummary> {
        self.log.info(
            "Starting TransformViewsToCategories",
            json!({
                "video_file": paths.video_file.display().to_string(),
                "category_file": paths.category_file.display().to_string(),
            }),
        );

        let video_source = CsvSource::new(&paths.video_file);
        let videos = video_source
            .load()?
            .select(&[CATEGORY_ID, VIEWS], &video_source.location())?;

        let category_source = JsonItemsSource::new(&paths.category_file);
        let categories = category_source
            .load()?
            .select(&[ID, &self.title_column], &category_source.location())?;

        let (summary, dropped) = aggregate(&videos, &categories, &self.title_column)?;

        if !dropped.is_empty() {
            self.log.debug(
                "Dropped categories without a title",
                json!({"category_ids": dropped}),
            );
        }
        self.log.info(
            "Completed TransformViewsToCategories",
            json!({
                "video_rows": videos.row_count(),
                "category_rows": categories.row_count(),
                "summary_rows": summary.len(),
            }),
        );

        for output in outputs {
            let written = output.generate(&summary, &paths.output_dir)?;
            self.log.debug(
                "Output written",
                json!({"output": output.name(), "path": written.display().to_string()}),
            );
        }

        Ok(summary)
    }
}

/// Build the ranked summary from a video table (`category_id`, `views`) and a
/// category table (`id`, `title_column`).
pub fn summarize(
    videos: &Table,
    categories: &Table,
    title_column: &str,
) -> Result<CategoryViewsSummary> {
    aggregate(videos, categories, title_column).map(|(summary, _)| summary)
}

/// Returns the summary plus the ids of aggregated categories with no title.
fn aggregate(
    videos: &Table,
    categories: &Table,
    title_column: &str,
) -> Result<(CategoryViewsSummary, Vec<i64>)> {
    let totals = views_per_category(videos)?;
    let titles = titles_by_id(categories, title_column)?;

    let mut dropped = Vec::new();
    let mut joined: Vec<(i64, &str, i64)> = Vec::with_capacity(totals.len());
    for (category_id, total) in totals {
        match titles.get(&category_id) {
            Some(Some(title)) => joined.push((category_id, title.as_str(), total)),
            _ => dropped.push(category_id),
        }
    }

    joined.sort_by(|a, b| b.2.cmp(&a.2).then(a.0.cmp(&b.0)));

    let rows = joined
        .into_iter()
        .map(|(category_id, title, total)| CategoryViews {
            category_id,
            title: title.to_string(),
            views: total as f64 / VIEWS_SCALE,
        })
        .collect();

    Ok((CategoryViewsSummary::new(rows), dropped))
}

/// Sum `views` per `category_id`.
///
/// Rows with a blank category are skipped; blank views count as nothing.
fn views_per_category(videos: &Table) -> Result<BTreeMap<i64, i64>> {
    let category_idx = column(videos, CATEGORY_ID, "video table")?;
    let views_idx = column(videos, VIEWS, "video table")?;

    let mut totals: BTreeMap<i64, i64> = BTreeMap::new();
    for row in &videos.rows {
        let Some(category_id) = cell_as_i64(&row[category_idx], CATEGORY_ID)? else {
            continue;
        };
        let views = cell_as_i64(&row[views_idx], VIEWS)?.unwrap_or(0);
        if views < 0 {
            return Err(PipelineError::parse(VIEWS, views, "non-negative integer"));
        }
        let total = totals.entry(category_id).or_insert(0);
        *total = total.saturating_add(views);
    }
    Ok(totals)
}

/// Map category id to title. First occurrence of an id wins; a null title
/// is kept as `None` so the category is dropped at join time.
fn titles_by_id(categories: &Table, title_column: &str) -> Result<HashMap<i64, Option<String>>> {
    let id_idx = column(categories, ID, "category table")?;
    let title_idx = column(categories, title_column, "category table")?;

    let mut titles = HashMap::with_capacity(categories.row_count());
    for row in &categories.rows {
        let id = cell_as_i64(&row[id_idx], ID)?
            .ok_or_else(|| PipelineError::parse(ID, &row[id_idx], "integer"))?;
        let title = match &row[title_idx] {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        };
        titles.entry(id).or_insert(title);
    }
    Ok(titles)
}

fn column(table: &Table, name: &str, source_name: &str) -> Result<usize> {
    table
        .column_index(name)
        .ok_or_else(|| PipelineError::MissingColumn {
            column: name.to_string(),
            source_name: source_name.to_string(),
        })
}
