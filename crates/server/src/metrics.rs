//! Prometheus exposition endpoint.

use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use once_cell::sync::Lazy;
use prometheus::{Encoder, Registry, TextEncoder};
use tracing::error;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    for metric in burstrec_core::metrics::all_metrics() {
        if let Err(e) = registry.register(metric) {
            error!(error = %e, "unable to register metric");
        }
    }
    registry
});

/// GET /metrics
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        error!(error = %e, "unable to encode metrics");
        return (StatusCode::INTERNAL_SERVER_ERROR, String::new()).into_response();
    }
    ([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], buffer).into_response()
}
