use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::config::Config;

/// Configuration injected into every [`super::RecordTask`].
#[derive(Debug, Clone)]
pub struct RecordConfig {
    /// Local root for captured segments.
    pub output_dir: PathBuf,
    /// Capture tool input arguments.
    pub input_args: BTreeMap<String, String>,
    /// Capture tool output arguments.
    pub output_args: BTreeMap<String, String>,
}

impl From<&Config> for RecordConfig {
    fn from(config: &Config) -> Self {
        Self {
            output_dir: config.output.path.clone(),
            input_args: config.record.input_args.clone(),
            output_args: config.record.output_args.clone(),
        }
    }
}

/// Configuration injected into every [`super::UploadTask`].
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Remote root, mirrored as `remote_dir/prefix/date`.
    pub remote_dir: PathBuf,
    /// Give up on a file after this many failed attempts.
    pub max_errors: u32,
}

impl From<&Config> for UploadConfig {
    fn from(config: &Config) -> Self {
        Self {
            remote_dir: config.upload.remote_dir.clone(),
            max_errors: config.upload.max_errors,
        }
    }
}

/// Configuration injected into every [`super::ConvertTask`].
#[derive(Debug, Clone)]
pub struct ConvertConfig {
    /// Local root for merged session files.
    pub output_dir: PathBuf,
    /// Merge tool input arguments (concat demuxer flags).
    pub input_args: BTreeMap<String, String>,
    /// Merge tool output arguments (output codec).
    pub output_args: BTreeMap<String, String>,
}

impl From<&Config> for ConvertConfig {
    fn from(config: &Config) -> Self {
        Self {
            output_dir: config.output.path.clone(),
            input_args: config.convert.input_args.clone(),
            output_args: config.convert.output_args.clone(),
        }
    }
}
