//! Remote dataset coordinates and the local directory layout derived from them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

pub const DEFAULT_OWNER_SLUG: &str = "datasnaek";
pub const DEFAULT_DATASET_SLUG: &str = "youtube-new";
pub const DEFAULT_DATASET_VERSION: &str = "115";

/// A Kaggle dataset addressed by owner slug, dataset slug and version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetRef {
    pub owner: String,
    pub dataset: String,
    pub version: String,
}

impl Default for DatasetRef {
    fn default() -> Self {
        Self::new(DEFAULT_OWNER_SLUG, DEFAULT_DATASET_SLUG, DEFAULT_DATASET_VERSION)
    }
}

impl DatasetRef {
    pub fn new(
        owner: impl Into<String>,
        dataset: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            dataset: dataset.into(),
            version: version.into(),
        }
    }

    /// `owner/dataset`, the identifier the hosting service uses.
    pub fn location(&self) -> String {
        format!("{}/{}", self.owner, self.dataset)
    }

    /// `<root>/kaggle/<owner>/<dataset>/<version>`.
    pub fn scoped_dir(&self, root: &Path) -> PathBuf {
        root.join("kaggle")
            .join(&self.owner)
            .join(&self.dataset)
            .join(&self.version)
    }
}

impl fmt::Display for DatasetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.owner, self.dataset, self.version)
    }
}
