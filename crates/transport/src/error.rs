use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use causal_memory_core::MemoryError;
use serde::Serialize;
use serde_json::json;

/// Request-boundary errors layered on top of `MemoryError`: the two kinds
/// that are properties of a request (rate limiting, auth) rather than of
/// the engine itself.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Memory(#[from] MemoryError),

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("missing or incorrect api key")]
    Unauthorized,
}

impl ApiError {
    fn kind(&self) -> (&'static str, StatusCode) {
        match self {
            ApiError::Memory(MemoryError::Validation(_)) => ("ValidationError", StatusCode::BAD_REQUEST),
            ApiError::Memory(MemoryError::ServiceUnavailable(_)) => {
                ("ServiceUnavailable", StatusCode::SERVICE_UNAVAILABLE)
            }
            ApiError::Memory(MemoryError::Storage(_)) => ("StorageError", StatusCode::SERVICE_UNAVAILABLE),
            ApiError::Memory(MemoryError::NotFound(_)) => ("NotFound", StatusCode::NOT_FOUND),
            ApiError::Memory(MemoryError::Internal(_)) => ("InternalError", StatusCode::INTERNAL_SERVER_ERROR),
            ApiError::RateLimited => ("RateLimited", StatusCode::TOO_MANY_REQUESTS),
            ApiError::Unauthorized => ("Unauthorized", StatusCode::UNAUTHORIZED),
        }
    }
}

#[derive(Serialize)]
struct ErrorEnvelope {
    error: ErrorBody,
    request_id: String,
    timestamp: String,
}

#[derive(Serialize)]
struct ErrorBody {
    #[serde(rename = "type")]
    kind: &'static str,
    message: String,
    code: String,
    details: serde_json::Value,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (kind, status) = self.kind();
        let envelope = ErrorEnvelope {
            error: ErrorBody {
                kind,
                message: self.to_string(),
                code: kind.to_ascii_lowercase(),
                details: json!({}),
            },
            request_id: crate::request_id::next(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };
        (status, Json(envelope)).into_response()
    }
}
