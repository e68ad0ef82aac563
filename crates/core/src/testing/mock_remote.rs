//! Mock remote store for testing.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::remote::{RemoteError, RemoteStore};

/// A recorded upload for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub local: PathBuf,
    pub remote_dir: PathBuf,
    pub file_name: String,
    pub success: bool,
}

/// Mock implementation of the [`RemoteStore`] trait.
///
/// With a mirror root configured, successful uploads copy the local file
/// under `<root>/<remote_dir>/<file_name>`, emulating the remote layout so
/// tests can assert on it. Failures can be injected for the next N calls or
/// for every Nth call.
#[derive(Debug, Clone, Default)]
pub struct MockRemoteStore {
    mirror_root: Arc<RwLock<Option<PathBuf>>>,
    uploads: Arc<RwLock<Vec<RecordedUpload>>>,
    fail_next: Arc<RwLock<u32>>,
    fail_every: Arc<RwLock<Option<u32>>>,
    calls: Arc<RwLock<u32>>,
}

impl MockRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mirror successful uploads into a local directory tree.
    pub async fn set_mirror_root(&self, root: impl Into<PathBuf>) {
        *self.mirror_root.write().await = Some(root.into());
    }

    /// Fail the next `count` uploads.
    pub async fn fail_next_uploads(&self, count: u32) {
        *self.fail_next.write().await = count;
    }

    /// Fail every `n`th upload (1-based call count).
    pub async fn fail_every(&self, n: u32) {
        *self.fail_every.write().await = Some(n);
    }

    /// Get all recorded uploads.
    pub async fn recorded_uploads(&self) -> Vec<RecordedUpload> {
        self.uploads.read().await.clone()
    }

    pub async fn upload_count(&self) -> usize {
        self.uploads.read().await.len()
    }

    pub async fn successful_upload_count(&self) -> usize {
        self.uploads.read().await.iter().filter(|u| u.success).count()
    }

    async fn should_fail(&self) -> bool {
        let call = {
            let mut calls = self.calls.write().await;
            *calls += 1;
            *calls
        };
        {
            let mut fail_next = self.fail_next.write().await;
            if *fail_next > 0 {
                *fail_next -= 1;
                return true;
            }
        }
        if let Some(n) = *self.fail_every.read().await {
            if n > 0 && call % n == 0 {
                return true;
            }
        }
        false
    }
}

#[async_trait]
impl RemoteStore for MockRemoteStore {
    async fn upload(
        &self,
        local: &Path,
        remote_dir: &Path,
        file_name: &str,
    ) -> Result<(), RemoteError> {
        if self.should_fail().await {
            self.uploads.write().await.push(RecordedUpload {
                local: local.to_path_buf(),
                remote_dir: remote_dir.to_path_buf(),
                file_name: file_name.to_string(),
                success: false,
            });
            return Err(RemoteError::Io(std::io::Error::other(
                "injected upload failure",
            )));
        }

        if let Some(root) = self.mirror_root.read().await.clone() {
            let dir = root.join(remote_dir);
            tokio::fs::create_dir_all(&dir).await?;
            tokio::fs::copy(local, dir.join(file_name)).await?;
        }

        self.uploads.write().await.push(RecordedUpload {
            local: local.to_path_buf(),
            remote_dir: remote_dir.to_path_buf(),
            file_name: file_name.to_string(),
            success: true,
        });
        Ok(())
    }
}
