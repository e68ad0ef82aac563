//! Mock collaborators for tests.
//!
//! These stand in for the external capture tool and the remote store so the
//! whole pipeline can be exercised in-process, without ffmpeg or an SSH
//! server.

mod mock_engine;
mod mock_remote;

pub use mock_engine::{MockMediaEngine, RecordedCapture, RecordedConcat};
pub use mock_remote::{MockRemoteStore, RecordedUpload};
