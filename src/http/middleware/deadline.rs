//! Request deadlines.
//!
//! Applied by the server inside the pipeline, so an expired request still
//! gets a request ID, an access log line and a JSON body.

use std::error::Error as StdError;
use std::time::Duration;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tower_http::timeout::TimeoutError;

use crate::http::request::RequestId;
use crate::http::response::{millis, ApiError};

/// Answer `408 request_timeout` when the inner service takes longer than
/// `limit` to produce a response.
pub async fn enforce_deadline(
    State(limit): State<Duration>,
    request: Request,
    next: Next,
) -> Response {
    let request_id = request.extensions().get::<RequestId>().cloned();
    let method = request.method().clone();
    let path = request.uri().path().to_owned();

    match tokio::time::timeout(limit, next.run(request)).await {
        Ok(response) => response,
        Err(_) => {
            tracing::warn!(
                request_id = request_id.as_ref().map(RequestId::as_str).unwrap_or("-"),
                method = %method,
                path = %path,
                deadline_ms = millis(limit),
                "Request deadline exceeded"
            );
            ApiError::RequestTimeout.into_response()
        }
    }
}

/// True when `err`, or anything in its source chain, is an expired body-read
/// deadline.
pub fn body_read_timed_out(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if e.is::<TimeoutError>() {
            return true;
        }
        current = e.source();
    }
    false
}
