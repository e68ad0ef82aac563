//! HTTP API: the record trigger, health probes, metrics and the read-only
//! recordings tree.

mod handlers;
mod record;
mod routes;

pub use record::{RecordDescriptor, RecordRequest};
pub use routes::create_router;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// JSON error body returned by every failing endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// User-level status message.
    pub status: String,
    /// Application-level error message, for debugging.
    pub error: String,
}

/// Error response for API handlers.
#[derive(Debug)]
pub struct ApiError {
    status_code: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    /// 400 for requests with wrong parameters.
    pub fn invalid_request(err: impl ToString) -> Self {
        Self {
            status_code: StatusCode::BAD_REQUEST,
            body: ErrorBody {
                status: "Invalid request.".to_string(),
                error: err.to_string(),
            },
        }
    }

    /// 500 for requests we are not able to perform.
    pub fn unable_to_perform(err: impl ToString) -> Self {
        Self {
            status_code: StatusCode::INTERNAL_SERVER_ERROR,
            body: ErrorBody {
                status: "Unable to perform request.".to_string(),
                error: err.to_string(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code, Json(self.body)).into_response()
    }
}
