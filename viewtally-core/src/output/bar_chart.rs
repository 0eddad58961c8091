//! Bar chart renderer: views (millions) per category title, as a PNG.
//!
//! Text is drawn with `ab_glyph`, so a TrueType font has to be registered
//! before the first chart. The font comes from [`ChartOptions::font_path`] or
//! the first hit in [`FONT_CANDIDATES`]. Without any font the bars are still
//! drawn, just without caption, axis descriptions or tick labels.

use crate::error::{PipelineError, Result};
use crate::log::SharedLog;
use crate::output::DataOutput;
use crate::summary::CategoryViewsSummary;
use plotters::prelude::*;
use plotters::style::{FontStyle, register_font};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub const BAR_CHART_FILE_NAME: &str = "views_to_categories_bar_chart.png";

const CAPTION: &str = "Youtube Views by Category";
const FONT_FAMILY: &str = "sans-serif";
const SKY_BLUE: RGBColor = RGBColor(135, 206, 235);

/// System font locations tried when no font path is configured.
pub const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Outcome of the one-time font registration.
static REGISTERED_FONT: OnceLock<Option<PathBuf>> = OnceLock::new();

/// Image settings for [`ViewsBarChart`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartOptions {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// TrueType font used for all chart text. Fonts are registered once per
    /// process, so only the first chart rendered decides which font is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_path: Option<PathBuf>,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 960,
            font_path: None,
        }
    }
}

/// Writes `views_to_categories_bar_chart.png`.
pub struct ViewsBarChart {
    log: SharedLog,
    options: ChartOptions,
}

impl ViewsBarChart {
    pub fn new(log: SharedLog) -> Self {
        Self::with_options(log, ChartOptions::default())
    }

    pub fn with_options(log: SharedLog, options: ChartOptions) -> Self {
        Self { log, options }
    }

    /// Register the chart font on first use in the process.
    ///
    /// Registration happens once; later charts reuse that outcome and a
    /// different `font_path` on them is reported and ignored.
    fn font_ready(&self) -> bool {
        let mut initialized_here = false;
        let registered = REGISTERED_FONT.get_or_init(|| {
            initialized_here = true;
            let found = register_first_font(&self.options);
            match &found {
                Some(path) => self.log.debug(
                    "Chart font registered",
                    json!({"font": path.display().to_string()}),
                ),
                None => self.log.warning(
                    "No usable chart font found, drawing charts without text",
                    json!({"configured": display_path(self.options.font_path.as_deref())}),
                ),
            }
            found
        });

        if !initialized_here
            && let Some(configured) = &self.options.font_path
            && registered.as_ref() != Some(configured)
        {
            self.log.warning(
                "Chart font already chosen for this process, ignoring font_path",
                json!({
                    "configured": configured.display().to_string(),
                    "registered": display_path(registered.as_deref()),
                }),
            );
        }
        registered.is_some()
    }

    fn draw(&self, data: &CategoryViewsSummary, path: &Path, with_text: bool) -> Result<()> {
        let root = BitMapBackend::new(path, (self.options.width, self.options.height))
            .into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;

        let bar_count = data.len() as i32;
        let y_max = (data.max_views() * 1.05).max(1.0);
        let titles: Vec<String> = data.iter().map(|r| r.title.clone()).collect();

        if with_text {
            let longest = titles.iter().map(|t| t.chars().count()).max().unwrap_or(0) as u32;
            let x_label_area = (longest * 9 + 40).clamp(60, (self.options.height / 2).max(60));

            let mut chart = ChartBuilder::on(&root)
                .caption(CAPTION, (FONT_FAMILY, 28))
                .margin(20)
                .x_label_area_size(x_label_area)
                .y_label_area_size(80)
                .build_cartesian_2d((0..bar_count.max(1)).into_segmented(), 0f64..y_max)
                .map_err(render_err)?;

            let formatter = |value: &SegmentValue<i32>| match value {
                SegmentValue::CenterOf(i) => titles.get(*i as usize).cloned().unwrap_or_default(),
                _ => String::new(),
            };

            chart
                .configure_mesh()
                .disable_x_mesh()
                .label_style((FONT_FAMILY, 14))
                .x_labels(bar_count.max(1) as usize)
                .x_label_formatter(&formatter)
                .x_label_style(
                    (FONT_FAMILY, 14)
                        .into_font()
                        .transform(FontTransform::Rotate90),
                )
                .x_desc("Category")
                .y_desc("Views(millions)")
                .axis_desc_style((FONT_FAMILY, 18))
                .draw()
                .map_err(render_err)?;

            chart.draw_series(bars(data)).map_err(render_err)?;
        } else {
            let mut chart = ChartBuilder::on(&root)
                .margin(20)
                .build_cartesian_2d((0..bar_count.max(1)).into_segmented(), 0f64..y_max)
                .map_err(render_err)?;
            chart.draw_series(bars(data)).map_err(render_err)?;
        }

        root.present().map_err(render_err)?;
        Ok(())
    }
}

impl DataOutput for ViewsBarChart {
    fn name(&self) -> &str {
        "bar_chart"
    }

    fn generate(&self, data: &CategoryViewsSummary, save_path: &Path) -> Result<PathBuf> {
        self.log.info(
            "Starting Output ViewsToCategories as Bar Chart",
            json!({"rows": data.len()}),
        );

        if data.is_empty() {
            self.log.error(
                "Output ViewsToCategories as Bar Chart failed empty data",
                json!({"save_path": save_path.display().to_string()}),
            );
        }

        let path = save_path.join(BAR_CHART_FILE_NAME);
        let with_text = self.font_ready();
        self.draw(data, &path, with_text)?;

        self.log.info(
            "Complete Output ViewsToCategories as Bar Chart",
            json!({"path": path.display().to_string()}),
        );
        Ok(path)
    }
}

fn bars(
    data: &CategoryViewsSummary,
) -> impl Iterator<Item = Rectangle<(SegmentValue<i32>, f64)>> + '_ {
    data.iter().enumerate().map(|(i, row)| {
        let i = i as i32;
        let mut bar = Rectangle::new(
            [
                (SegmentValue::Exact(i), 0.0),
                (SegmentValue::Exact(i + 1), row.views),
            ],
            SKY_BLUE.filled(),
        );
        bar.set_margin(0, 0, 4, 4);
        bar
    })
}

fn register_first_font(options: &ChartOptions) -> Option<PathBuf> {
    let candidates = options
        .font_path
        .iter()
        .cloned()
        .chain(FONT_CANDIDATES.iter().map(PathBuf::from));

    for candidate in candidates {
        let Ok(bytes) = std::fs::read(&candidate) else {
            continue;
        };
        // The font registry wants 'static data; registration happens once per process.
        let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
        if register_font(FONT_FAMILY, FontStyle::Normal, bytes).is_ok() {
            return Some(candidate);
        }
    }
    None
}

fn display_path(path: Option<&Path>) -> Option<String> {
    path.map(|p| p.display().to_string())
}

fn render_err(e: impl std::fmt::Display) -> PipelineError {
    PipelineError::render(e.to_string())
}
