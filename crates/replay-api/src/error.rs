//! Error types for the replay API layer.
//!
//! [`ApiError`] unifies all failure modes into a single enum that converts
//! into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation. The
//! mapping follows the service's error taxonomy: validation failures are
//! 400s, unknown games are 404s (for video requests), pool saturation is a
//! 429 with retry guidance, encoder failures are 502s, and a blown timeout
//! budget is a 504.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use replay_core::SampleError;
use replay_render::EncodeError;
use replay_store::StoreError;

use crate::pool::PoolError;

/// Errors that can occur in the replay API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The requested game has no events.
    #[error("not found: {0}")]
    NotFound(String),

    /// An invalid query parameter was provided.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// The render worker pool is saturated; the client should retry later.
    #[error("render capacity exhausted, retry later")]
    Busy,

    /// The external video encoder failed; the partial output was discarded.
    #[error("video encoding failed: {0}")]
    Encoding(#[from] EncodeError),

    /// The request exceeded its encoding timeout budget.
    #[error("video encoding timed out")]
    Timeout,

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        Self::Internal(format!("event log error: {e}"))
    }
}

impl From<SampleError> for ApiError {
    fn from(e: SampleError) -> Self {
        Self::InvalidQuery(e.to_string())
    }
}

impl From<PoolError> for ApiError {
    fn from(_: PoolError) -> Self {
        Self::Busy
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::InvalidQuery(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Busy => (StatusCode::TOO_MANY_REQUESTS, self.to_string()),
            Self::Encoding(e) => (StatusCode::BAD_GATEWAY, format!("encoding failed: {e}")),
            Self::Timeout => (StatusCode::GATEWAY_TIMEOUT, self.to_string()),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        if status == StatusCode::TOO_MANY_REQUESTS {
            // Retry guidance for saturated-pool rejections.
            return (status, [("retry-after", "1")], axum::Json(body)).into_response();
        }
        (status, axum::Json(body)).into_response()
    }
}
