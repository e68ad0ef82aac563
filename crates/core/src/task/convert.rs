//! Session merge task.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::media::{ConcatSpec, MediaEngine};
use crate::pool::Task;

use super::config::ConvertConfig;
use super::types::{SessionRecorded, TaskError, TaskOutput};
use super::SEGMENT_EXT;

/// Merge deadline is this multiple of the nominal session length.
const MERGE_TIMEOUT_RATIO: u64 = 2;

/// Suffix of the merged session file name.
const MERGED_SUFFIX: &str = "convert";

/// Merges one session's captured segments into a single file.
///
/// A session with no successfully captured segments is a no-op. A failed
/// merge is terminal for the session; there is no retry.
pub struct ConvertTask {
    pub prefix: String,
    pub recording_date: String,
    pub file_name_prefix: String,
    pub file_paths: Vec<PathBuf>,
    pub total_length_secs: u64,
    config: Arc<ConvertConfig>,
    engine: Arc<dyn MediaEngine>,
}

impl ConvertTask {
    pub fn for_session(
        session: SessionRecorded,
        config: Arc<ConvertConfig>,
        engine: Arc<dyn MediaEngine>,
    ) -> Self {
        Self {
            prefix: session.prefix,
            recording_date: session.recording_date,
            file_name_prefix: session.file_name_prefix,
            file_paths: session.file_paths,
            total_length_secs: session.total_length_secs,
            config,
            engine,
        }
    }
}

#[async_trait]
impl Task for ConvertTask {
    type Output = TaskOutput;
    type Error = TaskError;

    async fn run(self, _results: mpsc::Sender<TaskOutput>) -> Result<(), TaskError> {
        if self.file_paths.is_empty() {
            return Ok(());
        }
        let begun = Instant::now();

        // <root>/<prefix>/<dd-mm-yyyy>/<fileNamePrefix>-convert.mp4
        let dir_path = self
            .config
            .output_dir
            .join(&self.prefix)
            .join(&self.recording_date);
        let file_name = format!("{}-{}.{}", self.file_name_prefix, MERGED_SUFFIX, SEGMENT_EXT);
        let file_path = dir_path.join(&file_name);

        if let Err(e) = tokio::fs::create_dir_all(&dir_path).await {
            error!(path = %dir_path.display(), error = %e, "unable to create output directory");
            return Err(TaskError::CreateDir {
                path: dir_path,
                source: e,
            });
        }

        let spec = ConcatSpec {
            inputs: self.file_paths.clone(),
            output_path: file_path.clone(),
            input_args: self.config.input_args.clone(),
            output_args: self.config.output_args.clone(),
            timeout: Duration::from_secs(self.total_length_secs * MERGE_TIMEOUT_RATIO),
        };
        match self.engine.concat(spec).await {
            Ok(()) => {
                info!(
                    file = %file_path.display(),
                    length_secs = self.total_length_secs,
                    took_secs = begun.elapsed().as_secs_f64(),
                    "converted session"
                );
                Ok(())
            }
            Err(e) => {
                warn!(file = %file_path.display(), error = %e, "unable to convert session");
                Err(e.into())
            }
        }
    }
}
