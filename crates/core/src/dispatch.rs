//! Result routing between the pipeline stages.
//!
//! A single loop consumes results from the record and upload pools and
//! turns them into submissions on the upload and convert pools. Upload
//! retries come back through the same loop, which is what makes the
//! backoff protocol work without any delay primitive inside the pools.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::media::MediaEngine;
use crate::pool::WorkerPool;
use crate::remote::RemoteStore;
use crate::task::{
    ConvertConfig, ConvertTask, SegmentRecorded, SessionRecorded, TaskOutput, UploadConfig,
    UploadRetry, UploadTask,
};

/// Routes stage results to the next stage's pool.
///
/// Every submission path is gated on the target pool's `running()`; work
/// routed at a disabled or stopped stage is dropped with a warning. A full
/// target queue is likewise logged and dropped, never retried here.
pub struct Dispatcher {
    record_results: mpsc::Receiver<TaskOutput>,
    upload_results: mpsc::Receiver<TaskOutput>,
    upload_pool: Arc<WorkerPool<UploadTask>>,
    convert_pool: Arc<WorkerPool<ConvertTask>>,
    upload_config: Arc<UploadConfig>,
    convert_config: Arc<ConvertConfig>,
    remote: Arc<dyn RemoteStore>,
    engine: Arc<dyn MediaEngine>,
}

impl Dispatcher {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        record_results: mpsc::Receiver<TaskOutput>,
        upload_results: mpsc::Receiver<TaskOutput>,
        upload_pool: Arc<WorkerPool<UploadTask>>,
        convert_pool: Arc<WorkerPool<ConvertTask>>,
        upload_config: Arc<UploadConfig>,
        convert_config: Arc<ConvertConfig>,
        remote: Arc<dyn RemoteStore>,
        engine: Arc<dyn MediaEngine>,
    ) -> Self {
        Self {
            record_results,
            upload_results,
            upload_pool,
            convert_pool,
            upload_config,
            convert_config,
            remote,
            engine,
        }
    }

    /// Runs until both result streams have closed.
    pub async fn run(mut self) {
        info!("dispatcher started");
        loop {
            tokio::select! {
                Some(output) = self.record_results.recv() => self.on_record_result(output),
                Some(output) = self.upload_results.recv() => self.on_upload_result(output),
                else => break,
            }
        }
        info!("dispatcher stopped");
    }

    fn on_record_result(&self, output: TaskOutput) {
        match output {
            TaskOutput::Segment(segment) => self.queue_upload(segment),
            TaskOutput::Session(session) => self.queue_convert(session),
            TaskOutput::UploadRetry(retry) => {
                warn!(file = %retry.file_name, "unexpected upload retry on record stream");
            }
        }
    }

    fn on_upload_result(&self, output: TaskOutput) {
        match output {
            TaskOutput::UploadRetry(retry) => self.queue_upload_retry(retry),
            TaskOutput::Segment(_) | TaskOutput::Session(_) => {
                warn!("unexpected record result on upload stream");
            }
        }
    }

    /// A captured segment becomes its first upload attempt.
    fn queue_upload(&self, segment: SegmentRecorded) {
        if !self.upload_pool.running() {
            warn!(file = %segment.file_name, "upload pool not running, segment will not be uploaded");
            return;
        }
        let task = UploadTask::for_segment(
            segment,
            Arc::clone(&self.upload_config),
            Arc::clone(&self.remote),
        );
        if let Err(e) = self.upload_pool.execute(task) {
            warn!(error = %e, "unable to queue upload");
        }
    }

    /// A failed upload comes back around with its bumped retry fields.
    fn queue_upload_retry(&self, retry: UploadRetry) {
        if !self.upload_pool.running() {
            warn!(file = %retry.file_name, "upload pool not running, retry dropped");
            return;
        }
        let task = UploadTask::for_retry(
            retry,
            Arc::clone(&self.upload_config),
            Arc::clone(&self.remote),
        );
        if let Err(e) = self.upload_pool.execute(task) {
            warn!(error = %e, "unable to queue upload retry");
        }
    }

    /// A finished session becomes one merge attempt.
    fn queue_convert(&self, session: SessionRecorded) {
        if !self.convert_pool.running() {
            warn!(prefix = %session.prefix, "convert pool not running, session will not be merged");
            return;
        }
        let task = ConvertTask::for_session(
            session,
            Arc::clone(&self.convert_config),
            Arc::clone(&self.engine),
        );
        if let Err(e) = self.convert_pool.execute(task) {
            warn!(error = %e, "unable to queue convert");
        }
    }
}
