//! Kaggle dataset download over the public REST API.
//!
//! `GET {api_base}/datasets/download/{owner}/{dataset}?datasetVersionNumber={version}`
//! with HTTP basic auth returns the dataset as a zip archive, which is
//! unpacked into the save directory.

use crate::dataset::DatasetRef;
use crate::error::{PipelineError, Result};
use crate::log::SharedLog;
use crate::retrieve::{DataRetrieve, verify_files};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use futures::StreamExt;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

const USERNAME_ENV: &str = "KAGGLE_USERNAME";
const KEY_ENV: &str = "KAGGLE_KEY";
const CONFIG_DIR_ENV: &str = "KAGGLE_CONFIG_DIR";
const CREDENTIALS_FILE: &str = "kaggle.json";

/// Kaggle API username and key.
#[derive(Clone, Serialize, Deserialize)]
pub struct KaggleCredentials {
    pub username: String,
    pub key: String,
}

impl std::fmt::Debug for KaggleCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KaggleCredentials")
            .field("username", &self.username)
            .field("key", &"<redacted>")
            .finish()
    }
}

impl KaggleCredentials {
    pub fn new(username: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            key: key.into(),
        }
    }

    /// `KAGGLE_USERNAME` and `KAGGLE_KEY`, if both are set.
    pub fn from_env() -> Option<Self> {
        let username = std::env::var(USERNAME_ENV).ok()?;
        let key = std::env::var(KEY_ENV).ok()?;
        Some(Self::new(username, key))
    }

    /// Read a `kaggle.json` file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// `$KAGGLE_CONFIG_DIR/kaggle.json`, else `~/.kaggle/kaggle.json`.
    pub fn default_file() -> Option<PathBuf> {
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV) {
            return Some(PathBuf::from(dir).join(CREDENTIALS_FILE));
        }
        directories::BaseDirs::new().map(|d| d.home_dir().join(".kaggle").join(CREDENTIALS_FILE))
    }

    /// Environment first, then the credentials file.
    pub fn discover() -> Result<Self> {
        if let Some(creds) = Self::from_env() {
            return Ok(creds);
        }
        let path = Self::default_file().ok_or_else(|| {
            PipelineError::Credentials("no home directory to look for kaggle.json".into())
        })?;
        Self::from_file(&path).map_err(|e| {
            PipelineError::Credentials(format!(
                "set {USERNAME_ENV}/{KEY_ENV} or provide {}: {e}",
                path.display()
            ))
        })
    }
}

/// Downloads datasets from Kaggle.
pub struct KaggleRetrieve {
    log: SharedLog,
    client: reqwest::Client,
    api_base: String,
    credentials: Option<KaggleCredentials>,
}

impl KaggleRetrieve {
    pub fn new(log: SharedLog) -> Self {
        Self {
            log,
            client: reqwest::Client::new(),
            api_base: "https://www.kaggle.com/api/v1".to_string(),
            credentials: None,
        }
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Use these credentials instead of discovering them at download time.
    pub fn with_credentials(mut self, credentials: KaggleCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn download_url(&self, dataset: &DatasetRef) -> String {
        format!(
            "{}/datasets/download/{}/{}?datasetVersionNumber={}",
            self.api_base.trim_end_matches('/'),
            dataset.owner,
            dataset.dataset,
            dataset.version
        )
    }

    async fn fetch(&self, dataset: &DatasetRef, save_path: &Path) -> Result<usize> {
        let credentials = match &self.credentials {
            Some(c) => c.clone(),
            None => KaggleCredentials::discover()?,
        };

        let response = self
            .client
            .get(self.download_url(dataset))
            .basic_auth(&credentials.username, Some(&credentials.key))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PipelineError::Download {
                location: dataset.location(),
                status: response.status().as_u16(),
            });
        }

        tokio::fs::create_dir_all(save_path).await?;

        // Spool the archive to an unnamed file next to its destination.
        let mut spool = tokio::fs::File::from_std(tempfile::tempfile_in(save_path)?);
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            spool.write_all(&chunk?).await?;
        }
        spool.flush().await?;

        let mut archive = spool.into_std().await;
        archive.seek(SeekFrom::Start(0))?;
        let target = save_path.to_path_buf();
        tokio::task::spawn_blocking(move || extract_archive(archive, &target))
            .await
            .map_err(|e| PipelineError::Io(std::io::Error::other(e)))?
    }
}

#[async_trait]
impl DataRetrieve for KaggleRetrieve {
    async fn get(&self, dataset: &DatasetRef, save_path: &Path, file_names: &[String]) -> bool {
        let location = dataset.location();
        self.log.info(
            &format!("Download of {location} started."),
            json!({"version": dataset.version, "save_path": save_path.display().to_string()}),
        );

        match self.fetch(dataset, save_path).await {
            Ok(extracted) => {
                self.log.info(
                    &format!("Download and extraction of {location} completed."),
                    json!({"extracted_files": extracted}),
                );
            }
            Err(e) => {
                self.log.critical(
                    &format!("An error occurred while downloading {location}: {e}."),
                    json!({"version": dataset.version}),
                );
                return false;
            }
        }

        verify_files(self.log.as_ref(), save_path, file_names)
    }
}

/// Unpack a zip archive into `dir`, returning the number of files written.
///
/// Entries whose names would land outside `dir` are skipped.
pub fn extract_archive<R: Read + Seek>(reader: R, dir: &Path) -> Result<usize> {
    let mut archive = zip::ZipArchive::new(reader)?;
    let mut extracted = 0;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let Some(relative) = entry.enclosed_name() else {
            continue;
        };
        let out_path = dir.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&out_path)?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::File::create(&out_path)?;
        std::io::copy(&mut entry, &mut file)?;
        extracted += 1;
    }

    Ok(extracted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::{RecordingLog, Severity};
    use std::io::{Cursor, Write};
    use std::sync::Arc;
    use tempfile::TempDir;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    fn zip_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut buf);
            let options = zip::write::SimpleFileOptions::default()
                .compression_method(zip::CompressionMethod::Deflated);
            for (name, content) in entries {
                zip.start_file(*name, options).unwrap();
                zip.write_all(content.as_bytes()).unwrap();
            }
            zip.finish().unwrap();
        }
        buf.into_inner()
    }

    #[test]
    fn test_extract_archive_writes_files() {
        let dir = TempDir::new().unwrap();
        let bytes = zip_bytes(&[
            ("GBvideos.csv", "category_id,views\n1,10\n"),
            ("nested/GB_category_id.json", "{\"items\": []}"),
        ]);

        let count = extract_archive(Cursor::new(bytes), dir.path()).unwrap();
        assert_eq!(count, 2);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("GBvideos.csv")).unwrap(),
            "category_id,views\n1,10\n"
        );
        assert!(dir.path().join("nested/GB_category_id.json").is_file());
    }

    #[test]
    fn test_extract_archive_skips_path_traversal() {
        let dir = TempDir::new().unwrap();
        let inner = dir.path().join("inner");
        std::fs::create_dir(&inner).unwrap();
        let bytes = zip_bytes(&[("../escape.txt", "nope"), ("ok.txt", "yes")]);

        let count = extract_archive(Cursor::new(bytes), &inner).unwrap();
        assert_eq!(count, 1);
        assert!(!dir.path().join("escape.txt").exists());
        assert!(inner.join("ok.txt").is_file());
    }

    #[test]
    fn test_extract_archive_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let err = extract_archive(Cursor::new(b"definitely not a zip"), dir.path()).unwrap_err();
        assert!(matches!(err, PipelineError::Archive(_)));
    }

    #[test]
    fn test_download_url() {
        let retrieve = KaggleRetrieve::new(Arc::new(RecordingLog::new()))
            .with_api_base("https://example.test/api/v1/");
        assert_eq!(
            retrieve.download_url(&DatasetRef::default()),
            "https://example.test/api/v1/datasets/download/datasnaek/youtube-new?datasetVersionNumber=115"
        );
    }

    #[test]
    fn test_credentials_from_file_and_debug_redacts_key() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kaggle.json");
        std::fs::write(&path, r#"{"username": "someone", "key": "s3cret"}"#).unwrap();

        let creds = KaggleCredentials::from_file(&path).unwrap();
        assert_eq!(creds.username, "someone");
        assert_eq!(creds.key, "s3cret");
        assert!(!format!("{creds:?}").contains("s3cret"));
    }

    /// Answer one HTTP request with `body` as a zip download.
    async fn serve_once(body: Vec<u8>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/zip\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.write_all(&body).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        format!("http://{addr}/api/v1")
    }

    #[tokio::test]
    async fn test_get_streams_archive_and_verifies_files() {
        let dir = TempDir::new().unwrap();
        let save_path = dir.path().join("kaggle/datasnaek/youtube-new/115");
        let api_base = serve_once(zip_bytes(&[
            ("GBvideos.csv", "category_id,views\n1,10\n"),
            ("GB_category_id.json", "{\"items\": []}"),
        ]))
        .await;

        let log = Arc::new(RecordingLog::new());
        let retrieve = KaggleRetrieve::new(log.clone())
            .with_client(reqwest::Client::builder().no_proxy().build().unwrap())
            .with_api_base(api_base)
            .with_credentials(KaggleCredentials::new("user", "key"));

        let ok = retrieve
            .get(
                &DatasetRef::default(),
                &save_path,
                &["GBvideos.csv".to_string(), "GB_category_id.json".to_string()],
            )
            .await;

        assert!(ok);
        assert_eq!(
            std::fs::read_to_string(save_path.join("GBvideos.csv")).unwrap(),
            "category_id,views\n1,10\n"
        );
        assert!(log.contains(
            Severity::Info,
            "Download and extraction of datasnaek/youtube-new completed."
        ));
        assert_eq!(std::fs::read_dir(&save_path).unwrap().count(), 2);
    }

    #[tokio::test]
    async fn test_get_fails_soft_when_unreachable() {
        let dir = TempDir::new().unwrap();
        let log = Arc::new(RecordingLog::new());
        let retrieve = KaggleRetrieve::new(log.clone())
            .with_api_base("http://127.0.0.1:9/api/v1")
            .with_credentials(KaggleCredentials::new("user", "key"));

        let ok = retrieve
            .get(
                &DatasetRef::default(),
                dir.path(),
                &["GBvideos.csv".to_string()],
            )
            .await;

        assert!(!ok);
        assert!(log.contains(Severity::Info, "Download of datasnaek/youtube-new started."));
        assert!(log.contains(Severity::Critical, "An error occurred while downloading"));
        assert!(log.messages_at(Severity::Error).is_empty());
    }
}
