//! API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use odyssey_core::error::GenerationError;
use serde::Serialize;
use thiserror::Error;

/// Message returned whenever generation fails server-side. Backend error
/// text stays in the logs.
pub const GENERATION_FAILED_MESSAGE: &str = "Something went wrong when generating adventure";

/// Startup and runtime errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),

    /// The outbound HTTP client could not be built.
    #[error("http client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorBody {
    /// Pairs `status` with an error body.
    #[must_use]
    pub fn response(
        status: StatusCode,
        error: &'static str,
        message: impl Into<String>,
    ) -> Response {
        let body = Self {
            error,
            message: message.into(),
        };
        (status, Json(body)).into_response()
    }
}

/// HTTP-layer wrapper around `GenerationError` that implements `IntoResponse`.
#[derive(Debug)]
pub struct ApiError(pub GenerationError);

impl From<GenerationError> for ApiError {
    fn from(err: GenerationError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self.0 {
            GenerationError::InvalidRequest(_) => ErrorBody::response(
                StatusCode::BAD_REQUEST,
                "invalid_request",
                self.0.to_string(),
            ),
            GenerationError::Cancelled => ErrorBody::response(
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                "The server is shutting down.",
            ),
            GenerationError::GenerationFailed { .. }
            | GenerationError::Backend(_)
            | GenerationError::MalformedResponse(_) => ErrorBody::response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "generation_failed",
                GENERATION_FAILED_MESSAGE,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn render(err: GenerationError) -> (StatusCode, Value) {
        let response = ApiError(err).into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_invalid_request_maps_to_400() {
        let (status, json) = render(GenerationError::InvalidRequest(
            "players must be at least 1, got 0".into(),
        ))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "invalid_request");
        assert_eq!(
            json["message"],
            "invalid request: players must be at least 1, got 0"
        );
    }

    #[tokio::test]
    async fn test_generation_failed_maps_to_500_without_backend_detail() {
        let (status, json) = render(GenerationError::GenerationFailed {
            attempts: 3,
            last: Box::new(GenerationError::Backend("API key AIza-123 rejected".into())),
        })
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "generation_failed");
        assert_eq!(json["message"], GENERATION_FAILED_MESSAGE);
        assert!(!json.to_string().contains("AIza"));
    }

    #[tokio::test]
    async fn test_cancelled_maps_to_503() {
        let (status, json) = render(GenerationError::Cancelled).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["error"], "service_unavailable");
    }

    #[tokio::test]
    async fn test_stray_backend_error_is_hidden_behind_generic_500() {
        let err = GenerationError::MalformedResponse("bad json".into());

        let (status, json) = render(err).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["message"], GENERATION_FAILED_MESSAGE);
    }

    #[test]
    fn test_io_error_converts_to_server_error() {
        let err = AppError::from(std::io::Error::other("address in use"));

        assert!(matches!(err, AppError::Server(_)));
        assert_eq!(err.to_string(), "server error: address in use");
    }

    #[test]
    fn test_reqwest_error_converts_to_http_client_error() {
        let source = reqwest::Client::new().get("not a url").build().unwrap_err();

        let err = AppError::from(source);

        assert!(matches!(err, AppError::HttpClient(_)));
        assert!(err.to_string().starts_with("http client error: "));
    }
}
