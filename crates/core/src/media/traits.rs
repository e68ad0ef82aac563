use async_trait::async_trait;

use super::error::MediaError;
use super::types::{CaptureSpec, ConcatSpec};

/// Abstraction over the external capture/merge tool.
///
/// Implementations report only success or failure; on failure any partially
/// written output file must already have been removed.
#[async_trait]
pub trait MediaEngine: Send + Sync {
    /// Records `spec.stream` into `spec.output_path` for `spec.length_secs`.
    async fn capture(&self, spec: CaptureSpec) -> Result<(), MediaError>;

    /// Merges `spec.inputs` into `spec.output_path`.
    async fn concat(&self, spec: ConcatSpec) -> Result<(), MediaError>;
}
