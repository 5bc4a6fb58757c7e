//! JSON response shaping.
//!
//! # Responsibilities
//! - Render every response body as JSON with an explicit charset
//! - Map client and server errors to a small, fixed error vocabulary
//! - Stamp bodies with an RFC 3339 UTC timestamp (nanosecond precision)
//!
//! # Design Decisions
//! - Error bodies carry a code and a time, never internal detail
//! - Encoding failures degrade to a static 500 body instead of panicking

use std::time::Duration;

use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Current time as `2006-01-02T15:04:05.999999999Z`.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Whole milliseconds, saturating.
pub fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Serialize `payload` as the body of a `status` response.
pub fn json_response<T: Serialize>(status: StatusCode, payload: &T) -> Response {
    let content_type = [(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE))];
    match serde_json::to_vec(payload) {
        Ok(body) => (status, content_type, body).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode JSON response");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                content_type,
                r#"{"error":"internal_error"}"#,
            )
                .into_response()
        }
    }
}

/// Body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub time: String,
}

/// Errors a request can end in. Rendered as [`ErrorBody`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("method not allowed")]
    MethodNotAllowed,
    #[error("request body exceeds the configured limit")]
    PayloadTooLarge,
    #[error("request body could not be read")]
    BadRequest,
    #[error("request did not complete before its deadline")]
    RequestTimeout,
    #[error("no route matches the request path")]
    NotFound,
    #[error("internal error")]
    Internal,
}

impl ApiError {
    pub fn status(self) -> StatusCode {
        match self {
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::BadRequest => StatusCode::BAD_REQUEST,
            ApiError::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable code placed in the `error` field.
    pub fn code(self) -> &'static str {
        match self {
            ApiError::MethodNotAllowed => "method_not_allowed",
            ApiError::PayloadTooLarge => "payload_too_large",
            ApiError::BadRequest => "bad_request",
            ApiError::RequestTimeout => "request_timeout",
            ApiError::NotFound => "not_found",
            ApiError::Internal => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        json_response(
            self.status(),
            &ErrorBody {
                error: self.code(),
                time: timestamp(),
            },
        )
    }
}

/// Fallback for paths no route claims.
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use serde_json::Value;

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn error_renders_code_and_time() {
        let response = ApiError::MethodNotAllowed.into_response();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            response.headers()[CONTENT_TYPE],
            "application/json; charset=utf-8"
        );

        let body = body_json(response).await;
        assert_eq!(body["error"], "method_not_allowed");
        assert!(body["time"].is_string());
        assert_eq!(body.as_object().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn internal_error_leaks_nothing() {
        let body = body_json(ApiError::Internal.into_response()).await;
        assert_eq!(body["error"], "internal_error");
        assert_eq!(body.as_object().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn request_timeout_is_json_408() {
        let response = ApiError::RequestTimeout.into_response();
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(
            response.headers()[CONTENT_TYPE],
            "application/json; charset=utf-8"
        );
        let body = body_json(response).await;
        assert_eq!(body["error"], "request_timeout");
        assert!(body["time"].is_string());
    }

    #[test]
    fn timestamp_is_utc_with_nanoseconds() {
        let ts = timestamp();
        assert!(ts.ends_with('Z'));
        let fraction = ts.split('.').nth(1).unwrap().trim_end_matches('Z');
        assert_eq!(fraction.len(), 9);
        assert!(DateTime::parse_from_rfc3339(&ts).is_ok());
    }

    #[test]
    fn millis_truncates() {
        assert_eq!(millis(Duration::from_micros(1999)), 1);
        assert_eq!(millis(Duration::ZERO), 0);
    }
}
