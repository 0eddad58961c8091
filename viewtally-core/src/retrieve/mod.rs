//! Dataset retrieval: best-effort download followed by file verification.

pub mod kaggle;

pub use kaggle::{KaggleCredentials, KaggleRetrieve, extract_archive};

use crate::dataset::DatasetRef;
use crate::log::EventLog;
use async_trait::async_trait;
use serde_json::json;
use std::path::Path;

/// Fetches a dataset into a local directory.
///
/// Implementations never return errors: failures are logged at critical
/// severity and reported as `false`, so the caller can skip later stages.
#[async_trait]
pub trait DataRetrieve: Send + Sync {
    /// Download and unpack `dataset` into `save_path`, then check that every
    /// name in `file_names` exists there. `true` only if all are present.
    async fn get(&self, dataset: &DatasetRef, save_path: &Path, file_names: &[String]) -> bool;
}

/// Check each expected file under `save_path`, logging found and missing ones.
///
/// Every file is checked even after a miss so the log lists all of them.
pub fn verify_files(log: &dyn EventLog, save_path: &Path, file_names: &[String]) -> bool {
    let mut success = true;
    for file_name in file_names {
        let context = json!({
            "file": file_name,
            "save_path": save_path.display().to_string(),
        });
        if save_path.join(file_name).is_file() {
            log.info(
                &format!("{file_name} successfully downloaded and extracted"),
                context,
            );
        } else {
            log.error(&format!("{file_name} not found"), context);
            success = false;
        }
    }
    success
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::{RecordingLog, Severity};
    use tempfile::TempDir;

    #[test]
    fn test_verify_all_present() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.csv"), "x").unwrap();
        std::fs::write(dir.path().join("b.json"), "{}").unwrap();
        let log = RecordingLog::new();

        let ok = verify_files(&log, dir.path(), &["a.csv".into(), "b.json".into()]);
        assert!(ok);
        assert_eq!(log.messages_at(Severity::Info).len(), 2);
    }

    #[test]
    fn test_verify_reports_each_missing_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.csv"), "x").unwrap();
        let log = RecordingLog::new();

        let ok = verify_files(
            &log,
            dir.path(),
            &["a.csv".into(), "b.json".into(), "c.json".into()],
        );
        assert!(!ok);
        assert!(log.contains(Severity::Info, "a.csv"));
        assert_eq!(
            log.messages_at(Severity::Error),
            vec!["b.json not found", "c.json not found"]
        );
    }

    #[test]
    fn test_verify_directory_is_not_a_file() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("a.csv")).unwrap();
        let log = RecordingLog::new();
        assert!(!verify_files(&log, dir.path(), &["a.csv".into()]));
    }
}
