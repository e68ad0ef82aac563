use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// One fixed-length capture of a stream into a local file.
#[derive(Debug, Clone)]
pub struct CaptureSpec {
    /// Stream source passed to the tool's input.
    pub stream: String,
    /// Destination file. Removed again if the capture fails.
    pub output_path: PathBuf,
    /// Capture duration in seconds.
    pub length_secs: u64,
    /// Configured key/value input arguments, merged over the defaults.
    pub input_args: BTreeMap<String, String>,
    /// Configured key/value output arguments.
    pub output_args: BTreeMap<String, String>,
    /// Hard deadline for the whole invocation.
    pub timeout: Duration,
}

/// Merge of an ordered list of files into one output file.
#[derive(Debug, Clone)]
pub struct ConcatSpec {
    /// Input files, in playback order.
    pub inputs: Vec<PathBuf>,
    /// Destination file. Removed again if the merge fails.
    pub output_path: PathBuf,
    /// Configured key/value input arguments (concat demuxer flags).
    pub input_args: BTreeMap<String, String>,
    /// Configured key/value output arguments (output codec).
    pub output_args: BTreeMap<String, String>,
    /// Hard deadline for the whole invocation.
    pub timeout: Duration,
}
