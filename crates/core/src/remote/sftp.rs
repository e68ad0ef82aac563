//! SFTP-backed remote store.

use async_trait::async_trait;
use ssh2::{Session, Sftp};
use std::net::TcpStream;
use std::path::{Path, PathBuf};

use super::error::RemoteError;
use super::traits::RemoteStore;

/// Configuration for [`SftpStore`].
#[derive(Debug, Clone)]
pub struct SftpConfig {
    /// Remote endpoint, host:port.
    pub server: String,
    /// SSH user name.
    pub user: String,
    /// Path to the private key file, read on every attempt.
    pub key: PathBuf,
    /// Session timeout in seconds.
    pub timeout_secs: u32,
}

/// SFTP implementation of [`RemoteStore`].
///
/// Every upload opens its own session: connect, handshake, public-key auth,
/// SFTP channel. That keeps failed attempts self-contained and lets the
/// retry protocol treat every attempt the same way.
pub struct SftpStore {
    config: SftpConfig,
}

impl SftpStore {
    pub fn new(config: SftpConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl RemoteStore for SftpStore {
    async fn upload(
        &self,
        local: &Path,
        remote_dir: &Path,
        file_name: &str,
    ) -> Result<(), RemoteError> {
        let config = self.config.clone();
        let local = local.to_path_buf();
        let remote_dir = remote_dir.to_path_buf();
        let file_name = file_name.to_string();

        // libssh2 is blocking; keep it off the async workers.
        tokio::task::spawn_blocking(move || {
            upload_blocking(&config, &local, &remote_dir, &file_name)
        })
        .await
        .map_err(|e| RemoteError::Io(std::io::Error::other(e)))?
    }
}

fn upload_blocking(
    config: &SftpConfig,
    local: &Path,
    remote_dir: &Path,
    file_name: &str,
) -> Result<(), RemoteError> {
    let tcp = TcpStream::connect(&config.server).map_err(RemoteError::Connect)?;

    let mut session = Session::new()?;
    session.set_tcp_stream(tcp);
    session.set_timeout(config.timeout_secs.saturating_mul(1000));
    session.handshake()?;
    session.userauth_pubkey_file(&config.user, None, &config.key, None)?;

    let sftp = session.sftp()?;
    ensure_remote_dir(&sftp, remote_dir)?;

    let mut remote_file = sftp.create(&remote_dir.join(file_name))?;
    let mut local_file = std::fs::File::open(local)?;
    std::io::copy(&mut local_file, &mut remote_file)?;

    Ok(())
}

/// Creates every missing component of `dir`, mkdir -p style.
fn ensure_remote_dir(sftp: &Sftp, dir: &Path) -> Result<(), RemoteError> {
    let mut current = PathBuf::new();
    for component in dir.components() {
        current.push(component);
        if sftp.stat(&current).is_ok() {
            continue;
        }
        if let Err(e) = sftp.mkdir(&current, 0o755) {
            // A concurrent upload may have created it in between.
            if sftp.stat(&current).is_err() {
                return Err(e.into());
            }
        }
    }
    Ok(())
}
