use std::path::PathBuf;
use thiserror::Error;

/// Error type for media tool invocations.
#[derive(Debug, Error)]
pub enum MediaError {
    /// The tool binary could not be found.
    #[error("media tool not found at {path}")]
    ToolNotFound { path: PathBuf },

    /// The tool ran and exited with a failure status.
    #[error("media tool exited with status {code:?}: {detail}")]
    Failed { code: Option<i32>, detail: String },

    /// The tool exceeded its deadline and was killed.
    #[error("media tool timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// I/O error while driving the tool.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
