//! Segment upload task with retry/backoff protocol.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep, Instant};
use tracing::{info, warn};

use crate::pool::Task;
use crate::remote::RemoteStore;

use super::config::UploadConfig;
use super::types::{SegmentRecorded, TaskError, TaskOutput, UploadRetry};

/// The backoff window grows by this much per accumulated error.
const BACKOFF_UNIT: Duration = Duration::from_secs(2);

/// How long a task inside its backoff window sleeps before re-emitting
/// itself unchanged.
const BACKOFF_POLL: Duration = Duration::from_secs(2);

/// Uploads one recorded segment to the remote store.
///
/// Two states. Inside the backoff window (`now - last_error <
/// error_count * 2s`) the task sleeps briefly and re-emits its own fields
/// as an [`UploadRetry`] so the dispatcher requeues it untouched. Outside
/// the window it attempts the transfer; a failure below the error cap
/// emits a bumped retry, a failure at the cap emits nothing and the file
/// is given up on. Success emits nothing.
pub struct UploadTask {
    pub prefix: String,
    pub recording_date: String,
    pub file_name: String,
    pub file_path: PathBuf,
    pub error_count: u32,
    pub last_error: Option<Instant>,
    config: Arc<UploadConfig>,
    store: Arc<dyn RemoteStore>,
}

impl UploadTask {
    /// First attempt for a freshly recorded segment.
    pub fn for_segment(
        segment: SegmentRecorded,
        config: Arc<UploadConfig>,
        store: Arc<dyn RemoteStore>,
    ) -> Self {
        Self {
            prefix: segment.prefix,
            recording_date: segment.recording_date,
            file_name: segment.file_name,
            file_path: segment.file_path,
            error_count: 0,
            last_error: None,
            config,
            store,
        }
    }

    /// Rebuilds a task from a retry pushed back by a previous attempt.
    pub fn for_retry(
        retry: UploadRetry,
        config: Arc<UploadConfig>,
        store: Arc<dyn RemoteStore>,
    ) -> Self {
        Self {
            prefix: retry.prefix,
            recording_date: retry.recording_date,
            file_name: retry.file_name,
            file_path: retry.file_path,
            error_count: retry.error_count,
            last_error: retry.last_error,
            config,
            store,
        }
    }

    /// True while the task has not yet earned its next attempt.
    fn in_backoff_window(&self, now: Instant) -> bool {
        match self.last_error {
            Some(last_error) => {
                now.duration_since(last_error) < BACKOFF_UNIT * self.error_count
            }
            None => false,
        }
    }

    /// Snapshot of the task's current retry fields.
    fn retry_fields(&self) -> UploadRetry {
        UploadRetry {
            prefix: self.prefix.clone(),
            recording_date: self.recording_date.clone(),
            file_name: self.file_name.clone(),
            file_path: self.file_path.clone(),
            error_count: self.error_count,
            last_error: self.last_error,
        }
    }
}

#[async_trait]
impl Task for UploadTask {
    type Output = TaskOutput;
    type Error = TaskError;

    async fn run(self, results: mpsc::Sender<TaskOutput>) -> Result<(), TaskError> {
        if self.in_backoff_window(Instant::now()) {
            sleep(BACKOFF_POLL).await;
            results
                .send(TaskOutput::UploadRetry(self.retry_fields()))
                .await
                .map_err(|_| TaskError::ResultChannelClosed)?;
            return Ok(());
        }

        let remote_dir = self
            .config
            .remote_dir
            .join(&self.prefix)
            .join(&self.recording_date);

        let begun = Instant::now();
        match self
            .store
            .upload(&self.file_path, &remote_dir, &self.file_name)
            .await
        {
            Ok(()) => {
                info!(
                    file = %self.file_name,
                    errors = self.error_count,
                    took_secs = begun.elapsed().as_secs_f64(),
                    "uploaded"
                );
                Ok(())
            }
            Err(e) => {
                warn!(file = %self.file_name, error = %e, "unable to upload");
                if self.error_count + 1 < self.config.max_errors {
                    let mut retry = self.retry_fields();
                    retry.error_count += 1;
                    retry.last_error = Some(Instant::now());
                    results
                        .send(TaskOutput::UploadRetry(retry))
                        .await
                        .map_err(|_| TaskError::ResultChannelClosed)?;
                }
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockRemoteStore;
    use tokio::time::advance;

    fn upload_config(max_errors: u32) -> Arc<UploadConfig> {
        Arc::new(UploadConfig {
            remote_dir: PathBuf::from("data"),
            max_errors,
        })
    }

    fn task(
        error_count: u32,
        last_error: Option<Instant>,
        config: Arc<UploadConfig>,
        store: Arc<MockRemoteStore>,
    ) -> UploadTask {
        UploadTask {
            prefix: "garage".to_string(),
            recording_date: "28-01-2023".to_string(),
            file_name: "23:40:27.876-cam1-001-003.mp4".to_string(),
            file_path: PathBuf::from("/data/garage/28-01-2023/23:40:27.876-cam1-001-003.mp4"),
            error_count,
            last_error,
            config,
            store,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_window() {
        let store = Arc::new(MockRemoteStore::new());
        let failed_at = Instant::now();
        advance(Duration::from_secs(10)).await;
        let now = Instant::now();

        // No failures yet: no window.
        assert!(!task(0, None, upload_config(30), store.clone()).in_backoff_window(now));

        // 10 errors -> 20s window; a failure 10s ago is still inside it.
        assert!(task(10, Some(failed_at), upload_config(30), store.clone()).in_backoff_window(now));

        // Same failure age with 3 errors -> 6s window, already elapsed.
        assert!(!task(3, Some(failed_at), upload_config(30), store).in_backoff_window(now));
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_reemits_unchanged_without_transport_call() {
        let store = Arc::new(MockRemoteStore::new());
        let failed_at = Instant::now();
        advance(Duration::from_secs(10)).await;
        // 30 errors -> 60s window, only 10s elapsed.
        let task = task(30, Some(failed_at), upload_config(30), store.clone());

        let (tx, mut rx) = mpsc::channel(3);
        task.run(tx).await.unwrap();

        match rx.try_recv().unwrap() {
            TaskOutput::UploadRetry(retry) => {
                assert_eq!(retry.error_count, 30);
                assert_eq!(retry.last_error, Some(failed_at));
            }
            other => panic!("unexpected output: {:?}", other),
        }
        assert_eq!(store.upload_count().await, 0);
    }

    #[tokio::test]
    async fn test_failure_below_cap_emits_bumped_retry() {
        let store = Arc::new(MockRemoteStore::new());
        store.fail_next_uploads(1).await;
        let task = task(10, None, upload_config(30), store.clone());

        let (tx, mut rx) = mpsc::channel(3);
        let result = task.run(tx).await;
        assert!(result.is_err());

        match rx.try_recv().unwrap() {
            TaskOutput::UploadRetry(retry) => {
                assert_eq!(retry.error_count, 11);
                assert!(retry.last_error.is_some());
            }
            other => panic!("unexpected output: {:?}", other),
        }
        assert_eq!(store.upload_count().await, 1);
    }

    #[tokio::test]
    async fn test_failure_at_cap_emits_nothing() {
        let store = Arc::new(MockRemoteStore::new());
        store.fail_next_uploads(1).await;
        let task = task(29, None, upload_config(30), store.clone());

        let (tx, mut rx) = mpsc::channel(3);
        assert!(task.run(tx).await.is_err());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_past_cap_emits_nothing_even_after_window() {
        let store = Arc::new(MockRemoteStore::new());
        store.fail_next_uploads(1).await;
        // Window long elapsed, cap already reached: attempt runs, fails,
        // and the file is given up on.
        let failed_at = Instant::now();
        advance(Duration::from_secs(3600)).await;
        let task = task(30, Some(failed_at), upload_config(30), store.clone());

        let (tx, mut rx) = mpsc::channel(3);
        assert!(task.run(tx).await.is_err());
        assert!(rx.try_recv().is_err());
        assert_eq!(store.upload_count().await, 1);
    }

    #[tokio::test]
    async fn test_success_emits_nothing() {
        let temp = tempfile::TempDir::new().unwrap();
        let local = temp.path().join("segment.mp4");
        std::fs::write(&local, b"segment").unwrap();

        let store = Arc::new(MockRemoteStore::new());
        let config = upload_config(30);
        let mut upload = task(5, None, config, store.clone());
        upload.file_path = local;

        let (tx, mut rx) = mpsc::channel(3);
        upload.run(tx).await.unwrap();

        assert!(rx.try_recv().is_err());
        let uploads = store.recorded_uploads().await;
        assert_eq!(uploads.len(), 1);
        assert!(uploads[0].success);
        assert_eq!(
            uploads[0].remote_dir,
            PathBuf::from("data/garage/28-01-2023")
        );
        assert_eq!(uploads[0].file_name, "23:40:27.876-cam1-001-003.mp4");
    }
}
