use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};

#[cfg(test)]
use mockall::automock;

use crate::output::TRANSCRIPT_EXTENSION;
use crate::utils::has_extension;

pub mod s3;

pub use s3::S3Store;

/// Key prefix objects are stored under
pub const DEFAULT_KEY_PREFIX: &str = "koopcast_transcripts";

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("No bucket configured")]
    MissingBucket,

    #[error("Failed to read local file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Upload of {key} failed: {message}")]
    Upload { key: String, message: String },
}

#[derive(thiserror::Error, Debug)]
pub enum SyncError {
    #[error("Directory '{}' does not exist", .0.display())]
    MissingDirectory(PathBuf),

    #[error("Failed to list {}: {source}", .dir.display())]
    ListDirectory {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Object store provider
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload a local file to `bucket` under `key`, replacing any existing object
    async fn upload(&self, local_path: &Path, bucket: &str, key: &str) -> Result<(), StoreError>;
}

/// Outcome of a sync run
#[derive(Debug, Default)]
pub struct SyncReport {
    /// Keys of the objects written
    pub uploaded: Vec<String>,
    /// File names that failed, with the reason
    pub failed: Vec<(String, String)>,
}

impl SyncReport {
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Remote key for a transcript file
pub fn object_key(prefix: &str, file_name: &str) -> String {
    format!("{}/{}", prefix.trim_end_matches('/'), file_name)
}

/// Regular files directly inside `dir` with the given extension, sorted by name
pub fn list_transcripts(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, SyncError> {
    if !dir.is_dir() {
        return Err(SyncError::MissingDirectory(dir.to_path_buf()));
    }

    let list_error = |source| SyncError::ListDirectory {
        dir: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs_err::read_dir(dir).map_err(list_error)? {
        let entry = entry.map_err(list_error)?;
        let path = entry.path();
        if entry.file_type().map_err(list_error)?.is_file() && has_extension(&path, extension) {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

/// Mirrors a transcript directory into a bucket
pub struct SyncPipeline<'a> {
    store: &'a dyn ObjectStore,
    bucket: String,
    key_prefix: String,
    extension: String,
    show_progress: bool,
}

impl<'a> SyncPipeline<'a> {
    pub fn new(store: &'a dyn ObjectStore, bucket: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            extension: TRANSCRIPT_EXTENSION.to_string(),
            show_progress: false,
        }
    }

    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Upload every transcript in `dir`; a failed upload is logged and the
    /// run moves on to the next file.
    pub async fn run(&self, dir: &Path) -> Result<SyncReport, SyncError> {
        let files = list_transcripts(dir, &self.extension)?;
        tracing::info!(dir = %dir.display(), files = files.len(), "Found transcripts to upload");

        let progress = if self.show_progress {
            let bar = ProgressBar::new(files.len() as u64);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            bar
        } else {
            ProgressBar::hidden()
        };

        let mut report = SyncReport::default();
        for path in &files {
            let file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            let key = object_key(&self.key_prefix, &file_name);
            progress.set_message(file_name.clone());

            tracing::info!(file = %file_name, bucket = %self.bucket, "Uploading {}", file_name);
            match self.store.upload(path, &self.bucket, &key).await {
                Ok(()) => {
                    tracing::info!(file = %file_name, key = %key, "Successfully uploaded {}", file_name);
                    report.uploaded.push(key);
                }
                Err(err) => {
                    tracing::error!(file = %file_name, error = %err, "Error uploading file");
                    tracing::warn!(file = %file_name, "Failed to upload {}", file_name);
                    report.failed.push((file_name, err.to_string()));
                }
            }
            progress.inc(1);
        }
        progress.finish_and_clear();

        tracing::info!(
            uploaded = report.uploaded.len(),
            failed = report.failed.len(),
            "Upload process completed"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(dir: &Path, name: &str) {
        fs_err::write(dir.join(name), name).unwrap();
    }

    #[test]
    fn test_object_key() {
        assert_eq!(
            object_key("koopcast_transcripts", "001_2021-01-01_Oud.txt"),
            "koopcast_transcripts/001_2021-01-01_Oud.txt"
        );
        assert_eq!(object_key("archive/", "a.txt"), "archive/a.txt");
    }

    #[test]
    fn test_list_transcripts_filters_and_sorts() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "002_b.txt");
        touch(dir.path(), "001_a.txt");
        touch(dir.path(), "notes.csv");
        touch(dir.path(), "README");
        fs_err::create_dir(dir.path().join("nested.txt")).unwrap();

        let files = list_transcripts(dir.path(), "txt").unwrap();
        assert_eq!(
            files,
            vec![dir.path().join("001_a.txt"), dir.path().join("002_b.txt")]
        );
    }

    #[test]
    fn test_list_transcripts_missing_directory() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("transcripts");

        assert!(matches!(
            list_transcripts(&missing, "txt"),
            Err(SyncError::MissingDirectory(path)) if path == missing
        ));
    }

    #[tokio::test]
    async fn test_sync_uploads_only_txt_files() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "001_2021-01-01_Oud.txt");
        touch(dir.path(), "002_2021-06-01_Midden.txt");
        touch(dir.path(), "export.csv");

        let mut store = MockObjectStore::new();
        store
            .expect_upload()
            .withf(|path, bucket, key| {
                bucket == "koop-bucket"
                    && key.ends_with(".txt")
                    && path.file_name().and_then(|n| n.to_str())
                        == key.strip_prefix("koopcast_transcripts/")
            })
            .times(2)
            .returning(|_, _, _| Ok(()));

        let report = SyncPipeline::new(&store, "koop-bucket")
            .run(dir.path())
            .await
            .unwrap();

        assert_eq!(
            report.uploaded,
            [
                "koopcast_transcripts/001_2021-01-01_Oud.txt",
                "koopcast_transcripts/002_2021-06-01_Midden.txt",
            ]
        );
        assert!(!report.has_failures());
    }

    #[tokio::test]
    async fn test_sync_continues_past_failed_upload() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "001_a.txt");
        touch(dir.path(), "002_b.txt");
        touch(dir.path(), "003_c.txt");

        let mut store = MockObjectStore::new();
        store.expect_upload().times(3).returning(|_, _, key| {
            if key.ends_with("002_b.txt") {
                Err(StoreError::Upload {
                    key: key.to_string(),
                    message: "AccessDenied".to_string(),
                })
            } else {
                Ok(())
            }
        });

        let report = SyncPipeline::new(&store, "koop-bucket")
            .key_prefix("archive")
            .run(dir.path())
            .await
            .unwrap();

        assert_eq!(report.uploaded, ["archive/001_a.txt", "archive/003_c.txt"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "002_b.txt");
        assert!(report.failed[0].1.contains("AccessDenied"));
        assert!(report.has_failures());
    }

    #[tokio::test]
    async fn test_sync_missing_directory_uploads_nothing() {
        let dir = tempdir().unwrap();
        let mut store = MockObjectStore::new();
        store.expect_upload().never();

        let result = SyncPipeline::new(&store, "koop-bucket")
            .run(&dir.path().join("transcripts"))
            .await;

        assert!(matches!(result, Err(SyncError::MissingDirectory(_))));
    }

    #[tokio::test]
    async fn test_sync_empty_directory() {
        let dir = tempdir().unwrap();
        let mut store = MockObjectStore::new();
        store.expect_upload().never();

        let report = SyncPipeline::new(&store, "koop-bucket")
            .run(dir.path())
            .await
            .unwrap();

        assert!(report.uploaded.is_empty());
        assert!(!report.has_failures());
    }
}
