use thiserror::Error;

/// Error type for remote store operations.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// TCP connection to the remote endpoint failed.
    #[error("unable to connect to remote endpoint: {0}")]
    Connect(#[source] std::io::Error),

    /// SSH/SFTP protocol or authentication failure.
    #[error("ssh transport failed: {0}")]
    Ssh(#[from] ssh2::Error),

    /// Local or remote file I/O failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
