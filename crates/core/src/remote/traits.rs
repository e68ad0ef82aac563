use async_trait::async_trait;
use std::path::Path;

use super::error::RemoteError;

/// Abstraction over the remote recording store.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Copies `local` to `remote_dir/file_name`, creating the remote
    /// directory tree as needed.
    async fn upload(
        &self,
        local: &Path,
        remote_dir: &Path,
        file_name: &str,
    ) -> Result<(), RemoteError>;
}
