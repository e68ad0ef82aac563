//! Core engine of the burstrec recording pipeline.
//!
//! Recording sessions flow through three bounded worker pools — record,
//! upload, convert — glued together by a single dispatcher loop. The HTTP
//! surface, configuration loading and metrics export live in the server
//! crate; everything here is runnable in-process against the mock
//! collaborators in [`testing`].

pub mod config;
pub mod dispatch;
pub mod media;
pub mod metrics;
pub mod pool;
pub mod remote;
pub mod task;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, ConvertSettings,
    OutputConfig, RecordSettings, ServerConfig, SshConfig, UploadSettings,
};
pub use dispatch::Dispatcher;
pub use media::{
    CaptureSpec, ConcatSpec, FfmpegEngine, FfmpegEngineConfig, MediaEngine, MediaError,
};
pub use pool::{PoolConfig, PoolError, PoolHandle, Task, WorkerPool};
pub use remote::{RemoteError, RemoteStore, SftpConfig, SftpStore};
pub use task::{
    ConvertConfig, ConvertTask, RecordConfig, RecordTask, SegmentRecorded, SessionRecorded,
    TaskError, TaskOutput, UploadConfig, UploadRetry, UploadTask,
};
