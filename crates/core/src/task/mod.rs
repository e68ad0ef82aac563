//! The three pipeline task variants.
//!
//! A recording session flows Record -> Upload -> Convert: the record task
//! captures a burst of overlapping segments and reports each one plus an
//! end-of-session summary; every segment becomes an upload task; the
//! summary becomes one convert (merge) task. Upload retries travel back
//! through the result channel as [`UploadRetry`] values rather than living
//! in any queue, so backoff timing stays independent of pool scheduling.

mod config;
mod convert;
mod record;
mod types;
mod upload;

pub use config::{ConvertConfig, RecordConfig, UploadConfig};
pub use convert::ConvertTask;
pub use record::RecordTask;
pub use types::{SegmentRecorded, SessionRecorded, TaskError, TaskOutput, UploadRetry};
pub use upload::UploadTask;

/// Container extension for captured and merged files.
pub(crate) const SEGMENT_EXT: &str = "mp4";

/// Layout of the per-session directory component.
pub(crate) const DATE_FORMAT: &str = "%d-%m-%Y";
