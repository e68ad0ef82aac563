//! Burst recording task.

use async_trait::async_trait;
use chrono::Local;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::{sleep, Instant};
use tracing::{error, info, warn};

use crate::media::{CaptureSpec, MediaEngine};
use crate::pool::Task;

use super::config::RecordConfig;
use super::types::{SegmentRecorded, SessionRecorded, TaskError, TaskOutput};
use super::{DATE_FORMAT, SEGMENT_EXT};

/// Capture deadline is this multiple of the segment length.
const CAPTURE_TIMEOUT_RATIO: u64 = 2;

/// Seconds by which consecutive capture windows overlap, so independent
/// startup latency can never open a coverage gap between segments.
const BURST_OVERLAP_SECS: u64 = 2;

/// Layout of the shared file name prefix's time component.
const TIME_FORMAT: &str = "%H:%M:%S%.3f";

/// Records one burst of overlapping segments from a stream.
///
/// Emits a [`TaskOutput::Segment`] per captured segment as it completes and
/// one final [`TaskOutput::Session`] after every segment has finished. A
/// segment that fails to capture is logged and left out; only a failure to
/// create the session directory fails the task itself.
pub struct RecordTask {
    pub stream: String,
    pub prefix: String,
    pub cam_name: String,
    pub length_secs: u64,
    pub burst: u64,
    config: Arc<RecordConfig>,
    engine: Arc<dyn MediaEngine>,
}

impl RecordTask {
    pub fn new(
        stream: impl Into<String>,
        prefix: impl Into<String>,
        cam_name: impl Into<String>,
        length_secs: u64,
        burst: u64,
        config: Arc<RecordConfig>,
        engine: Arc<dyn MediaEngine>,
    ) -> Self {
        Self {
            stream: stream.into(),
            prefix: prefix.into(),
            cam_name: cam_name.into(),
            length_secs,
            burst,
            config,
            engine,
        }
    }
}

#[async_trait]
impl Task for RecordTask {
    type Output = TaskOutput;
    type Error = TaskError;

    async fn run(self, results: mpsc::Sender<TaskOutput>) -> Result<(), TaskError> {
        info!(
            stream = %self.stream,
            burst = self.burst,
            length = self.length_secs,
            cam_name = %self.cam_name,
            prefix = %self.prefix,
            "recording stream"
        );

        let started = Local::now();
        let recording_date = started.format(DATE_FORMAT).to_string();
        // <root>/<prefix>/<dd-mm-yyyy>
        let dir_path = self.config.output_dir.join(&self.prefix).join(&recording_date);
        // <HH:MM:SS.mmm>-<cam>
        let file_name_prefix = format!("{}-{}", started.format(TIME_FORMAT), self.cam_name);

        if let Err(e) = tokio::fs::create_dir_all(&dir_path).await {
            error!(path = %dir_path.display(), error = %e, "unable to create session directory");
            return Err(TaskError::CreateDir {
                path: dir_path,
                source: e,
            });
        }

        let mut captures = JoinSet::new();
        for i in 0..self.burst {
            // <fileNamePrefix>-NNN-BBB.mp4
            let file_name = format!(
                "{}-{:03}-{:03}.{}",
                file_name_prefix,
                i + 1,
                self.burst,
                SEGMENT_EXT
            );
            let file_path = dir_path.join(&file_name);

            let spec = CaptureSpec {
                stream: self.stream.clone(),
                output_path: file_path.clone(),
                length_secs: self.length_secs,
                input_args: self.config.input_args.clone(),
                output_args: self.config.output_args.clone(),
                timeout: Duration::from_secs(self.length_secs * CAPTURE_TIMEOUT_RATIO),
            };
            let segment = SegmentRecorded {
                root_dir: self.config.output_dir.clone(),
                prefix: self.prefix.clone(),
                recording_date: recording_date.clone(),
                file_name,
                file_path,
                file_name_prefix: file_name_prefix.clone(),
            };
            let engine = Arc::clone(&self.engine);
            let results = results.clone();

            captures.spawn(async move {
                let begun = Instant::now();
                match engine.capture(spec).await {
                    Ok(()) => {
                        info!(
                            file = %segment.file_name,
                            took_secs = begun.elapsed().as_secs_f64(),
                            "recorded segment"
                        );
                        let path = segment.file_path.clone();
                        if results.send(TaskOutput::Segment(segment)).await.is_err() {
                            warn!("result channel closed, segment result dropped");
                        }
                        Some(path)
                    }
                    Err(e) => {
                        warn!(file = %segment.file_name, error = %e, "unable to record segment");
                        None
                    }
                }
            });

            if i + 1 < self.burst {
                sleep(Duration::from_secs(
                    self.length_secs.saturating_sub(BURST_OVERLAP_SECS),
                ))
                .await;
            }
        }

        let mut file_paths = Vec::new();
        while let Some(joined) = captures.join_next().await {
            match joined {
                Ok(Some(path)) => file_paths.push(path),
                Ok(None) => {}
                Err(e) => warn!(error = %e, "segment capture aborted"),
            }
        }

        results
            .send(TaskOutput::Session(SessionRecorded {
                root_dir: self.config.output_dir.clone(),
                prefix: self.prefix,
                recording_date,
                file_paths,
                file_name_prefix,
                total_length_secs: self.burst * self.length_secs,
            }))
            .await
            .map_err(|_| TaskError::ResultChannelClosed)?;

        Ok(())
    }
}
