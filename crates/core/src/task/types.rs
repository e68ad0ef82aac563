use std::path::PathBuf;
use thiserror::Error;
use tokio::time::Instant;

use crate::media::MediaError;
use crate::remote::RemoteError;

/// One successfully captured segment, ready to be uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentRecorded {
    /// Local output tree root.
    pub root_dir: PathBuf,
    /// Logical grouping prefix under the root.
    pub prefix: String,
    /// Session date component, `dd-mm-yyyy`.
    pub recording_date: String,
    /// Bare file name, `HH:MM:SS.mmm-cam-NNN-BBB.mp4`.
    pub file_name: String,
    /// Full local path of the segment.
    pub file_path: PathBuf,
    /// Shared `HH:MM:SS.mmm-cam` prefix of the session's files.
    pub file_name_prefix: String,
}

/// End-of-session summary, emitted once every segment has finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecorded {
    pub root_dir: PathBuf,
    pub prefix: String,
    pub recording_date: String,
    /// Paths of the segments that actually captured; failed segments are
    /// missing from the list.
    pub file_paths: Vec<PathBuf>,
    pub file_name_prefix: String,
    /// Nominal session duration: burst count times segment length, not the
    /// measured duration.
    pub total_length_secs: u64,
}

/// A failed upload pushed back through the dispatcher for another attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRetry {
    pub prefix: String,
    pub recording_date: String,
    pub file_name: String,
    pub file_path: PathBuf,
    /// Failed attempts so far.
    pub error_count: u32,
    /// Time of the most recent failure, None before the first one.
    pub last_error: Option<Instant>,
}

/// Everything a pipeline task can emit into its pool's result channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutput {
    Segment(SegmentRecorded),
    Session(SessionRecorded),
    UploadRetry(UploadRetry),
}

/// Error type shared by the pipeline tasks.
#[derive(Debug, Error)]
pub enum TaskError {
    /// Output directory could not be created.
    #[error("unable to create {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Capture or merge tool failure.
    #[error(transparent)]
    Media(#[from] MediaError),

    /// Remote transport failure.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// The pool's result channel is gone.
    #[error("result channel closed")]
    ResultChannelClosed,
}
