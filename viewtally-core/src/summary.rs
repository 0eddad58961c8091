//! The ranked views-per-category table produced by the transform stage.

use serde::{Deserialize, Serialize};

/// Views divisor: summaries report views in millions.
pub const VIEWS_SCALE: f64 = 1_000_000.0;

/// One category's total views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryViews {
    pub category_id: i64,
    pub title: String,
    /// Total views in millions.
    pub views: f64,
}

/// Categories ranked by total views, highest first.
///
/// Serializes as a plain JSON array of row objects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryViewsSummary {
    pub rows: Vec<CategoryViews>,
}

impl CategoryViewsSummary {
    pub fn new(rows: Vec<CategoryViews>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CategoryViews> {
        self.rows.iter()
    }

    /// Largest views value, or 0.0 for an empty summary.
    pub fn max_views(&self) -> f64 {
        self.rows.iter().map(|r| r.views).fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_as_array() {
        let summary = CategoryViewsSummary::new(vec![CategoryViews {
            category_id: 10,
            title: "Music".into(),
            views: 15.0,
        }]);
        let json = serde_json::to_string(&summary).unwrap();
        assert_eq!(json, r#"[{"category_id":10,"title":"Music","views":15.0}]"#);
    }

    #[test]
    fn test_empty_summary() {
        let summary = CategoryViewsSummary::default();
        assert!(summary.is_empty());
        assert_eq!(summary.max_views(), 0.0);
        assert_eq!(serde_json::to_string(&summary).unwrap(), "[]");
    }
}
