use axum::{
    routing::{get, post},
    Router,
};
use std::path::Path;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::{handlers, record};
use crate::metrics::metrics_handler;
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>, recordings_dir: &Path) -> Router {
    Router::new()
        .route("/healthz", get(handlers::health))
        .route("/ready", get(handlers::health))
        .route("/metrics", get(metrics_handler))
        .route("/api/record", post(record::start_record))
        .nest_service("/recordings", ServeDir::new(recordings_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
