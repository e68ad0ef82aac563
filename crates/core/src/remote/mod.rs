//! Remote storage for uploaded recordings.
//!
//! The upload stage only needs three remote operations, folded into one
//! call: ensure the destination directory exists, create the remote file,
//! copy the local contents over. [`SftpStore`] implements them over SFTP
//! with per-attempt sessions; authentication is delegated entirely to the
//! SSH transport.

mod error;
mod sftp;
mod traits;

pub use error::RemoteError;
pub use sftp::{SftpConfig, SftpStore};
pub use traits::RemoteStore;
