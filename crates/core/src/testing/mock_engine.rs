//! Mock media engine for testing.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::media::{CaptureSpec, ConcatSpec, MediaEngine, MediaError};

/// A recorded capture invocation for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedCapture {
    pub spec: CaptureSpec,
    pub success: bool,
}

/// A recorded concat invocation for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedConcat {
    pub spec: ConcatSpec,
    pub success: bool,
}

/// Mock implementation of the [`MediaEngine`] trait.
///
/// Successful invocations write a small placeholder file at the output
/// path, so tests can assert on the persisted layout. Failures can be
/// injected for the next call or for any output path containing a marker.
#[derive(Debug, Clone, Default)]
pub struct MockMediaEngine {
    captures: Arc<RwLock<Vec<RecordedCapture>>>,
    concats: Arc<RwLock<Vec<RecordedConcat>>>,
    fail_markers: Arc<RwLock<Vec<String>>>,
    fail_next: Arc<RwLock<u32>>,
    delay: Arc<RwLock<Duration>>,
}

impl MockMediaEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded captures.
    pub async fn recorded_captures(&self) -> Vec<RecordedCapture> {
        self.captures.read().await.clone()
    }

    /// Get all recorded concats.
    pub async fn recorded_concats(&self) -> Vec<RecordedConcat> {
        self.concats.read().await.clone()
    }

    pub async fn capture_count(&self) -> usize {
        self.captures.read().await.len()
    }

    pub async fn concat_count(&self) -> usize {
        self.concats.read().await.len()
    }

    /// Fail every invocation whose output path contains `marker`.
    pub async fn fail_outputs_containing(&self, marker: impl Into<String>) {
        self.fail_markers.write().await.push(marker.into());
    }

    /// Fail the next `count` invocations regardless of output path.
    pub async fn fail_next(&self, count: u32) {
        *self.fail_next.write().await = count;
    }

    /// Simulated tool run time.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = delay;
    }

    async fn should_fail(&self, output: &std::path::Path) -> bool {
        {
            let mut fail_next = self.fail_next.write().await;
            if *fail_next > 0 {
                *fail_next -= 1;
                return true;
            }
        }
        let output = output.to_string_lossy();
        self.fail_markers
            .read()
            .await
            .iter()
            .any(|marker| output.contains(marker.as_str()))
    }

    fn injected_failure() -> MediaError {
        MediaError::Failed {
            code: Some(1),
            detail: "injected media failure".to_string(),
        }
    }

    async fn write_output(path: &std::path::Path) -> Result<(), MediaError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, b"mock media data").await?;
        Ok(())
    }
}

#[async_trait]
impl MediaEngine for MockMediaEngine {
    async fn capture(&self, spec: CaptureSpec) -> Result<(), MediaError> {
        let delay = *self.delay.read().await;
        if delay > Duration::ZERO {
            tokio::time::sleep(delay).await;
        }

        if self.should_fail(&spec.output_path).await {
            self.captures.write().await.push(RecordedCapture {
                spec,
                success: false,
            });
            return Err(Self::injected_failure());
        }

        Self::write_output(&spec.output_path).await?;
        self.captures.write().await.push(RecordedCapture {
            spec,
            success: true,
        });
        Ok(())
    }

    async fn concat(&self, spec: ConcatSpec) -> Result<(), MediaError> {
        let delay = *self.delay.read().await;
        if delay > Duration::ZERO {
            tokio::time::sleep(delay).await;
        }

        if self.should_fail(&spec.output_path).await {
            self.concats.write().await.push(RecordedConcat {
                spec,
                success: false,
            });
            return Err(Self::injected_failure());
        }

        Self::write_output(&spec.output_path).await?;
        self.concats.write().await.push(RecordedConcat {
            spec,
            success: true,
        });
        Ok(())
    }
}
