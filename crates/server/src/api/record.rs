//! Record trigger endpoint.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use burstrec_core::RecordTask;

use super::ApiError;
use crate::state::AppState;

/// Segments shorter than this are stretched to it.
const MIN_LENGTH_SECS: i64 = 5;

/// Placeholder for an absent camera name or prefix.
const UNKNOWN: &str = "unknown";

/// Request body for starting a recording session.
#[derive(Debug, Deserialize)]
pub struct RecordRequest {
    pub stream: Option<String>,
    #[serde(default)]
    pub cam_name: Option<String>,
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub length: Option<i64>,
    #[serde(default)]
    pub burst: Option<i64>,
}

/// The normalized session descriptor echoed back to the caller.
#[derive(Debug, Serialize, Deserialize)]
pub struct RecordDescriptor {
    pub stream: String,
    pub cam_name: String,
    pub prefix: String,
    pub length: u64,
    pub burst: u64,
}

impl RecordRequest {
    /// Applies the floors and placeholders; rejects a missing stream.
    fn normalize(self) -> Result<RecordDescriptor, &'static str> {
        let stream = match self.stream {
            Some(stream) if !stream.is_empty() => stream,
            _ => return Err("stream url is required"),
        };
        let cam_name = match self.cam_name {
            Some(cam_name) if !cam_name.is_empty() => cam_name,
            _ => UNKNOWN.to_string(),
        };
        let prefix = match self.prefix {
            Some(prefix) if !prefix.is_empty() => prefix,
            _ => UNKNOWN.to_string(),
        };
        let length = self.length.unwrap_or(0).max(MIN_LENGTH_SECS) as u64;
        let burst = self.burst.unwrap_or(0).max(1) as u64;

        Ok(RecordDescriptor {
            stream,
            cam_name,
            prefix,
            length,
            burst,
        })
    }
}

/// POST /api/record
///
/// Validates and normalizes the request, submits a record task, and
/// acknowledges with the normalized descriptor. Everything past this
/// acknowledgement is fire-and-forget: downstream failures surface only in
/// logs and metrics.
pub async fn start_record(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RecordRequest>,
) -> Result<Json<RecordDescriptor>, ApiError> {
    let descriptor = request.normalize().map_err(ApiError::invalid_request)?;

    let task = RecordTask::new(
        descriptor.stream.clone(),
        descriptor.prefix.clone(),
        descriptor.cam_name.clone(),
        descriptor.length,
        descriptor.burst,
        state.record_config(),
        state.engine(),
    );

    state
        .record_pool()
        .execute(task)
        .map_err(ApiError::unable_to_perform)?;

    Ok(Json(descriptor))
}
