//! Panic recovery stage.
//!
//! Turns a panic anywhere below it into a `500 internal_error` JSON response
//! and logs the panic message with the request ID. The process keeps serving.
//! Nothing from the panic reaches the client.

use std::any::Any;

use axum::body::Body;
use axum::http::Response;
use axum::response::IntoResponse;
use tower_http::catch_panic::{CatchPanicLayer, ResponseForPanic};

use crate::http::middleware::request_id::CorrelatedPanic;
use crate::http::request::X_REQUEST_ID;
use crate::http::response::ApiError;

/// Builds the 500 response for a caught panic.
#[derive(Debug, Clone, Copy, Default)]
pub struct InternalErrorResponse;

impl ResponseForPanic for InternalErrorResponse {
    type ResponseBody = Body;

    fn response_for_panic(&mut self, err: Box<dyn Any + Send + 'static>) -> Response<Body> {
        let (request_id, payload) = match err.downcast::<CorrelatedPanic>() {
            Ok(tagged) => {
                let CorrelatedPanic {
                    request_id,
                    payload,
                } = *tagged;
                (Some(request_id), payload)
            }
            Err(untagged) => (None, untagged),
        };

        tracing::error!(
            request_id = request_id.as_ref().map(|id| id.as_str()).unwrap_or("-"),
            panic = panic_message(&*payload),
            "Panic recovered"
        );

        let mut response = ApiError::Internal.into_response();
        if let Some(value) = request_id.and_then(|id| id.to_header_value()) {
            response.headers_mut().insert(X_REQUEST_ID, value);
        }
        response
    }
}

pub fn layer() -> CatchPanicLayer<InternalErrorResponse> {
    CatchPanicLayer::custom(InternalErrorResponse)
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}
