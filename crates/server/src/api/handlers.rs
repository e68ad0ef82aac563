use axum::extract::State;
use axum::http::StatusCode;
use std::sync::Arc;
use tracing::debug;

use crate::state::AppState;

/// GET /healthz and /ready.
///
/// Healthy iff every registered pool has live workers. A stage disabled by
/// configuration (0 workers) intentionally reports unhealthy.
pub async fn health(State(state): State<Arc<AppState>>) -> StatusCode {
    for (name, handle) in state.pools() {
        if !handle.running() {
            debug!(pool = %name, "pool not running");
            return StatusCode::SERVICE_UNAVAILABLE;
        }
    }
    StatusCode::OK
}
