//! Correlation ID stage.
//!
//! Assigns a fresh [`RequestId`] to every request, hands it to inner stages
//! through the request extensions (read by the `RequestId` extractor), and
//! copies it into the `X-Request-Id` response header.
//!
//! A panic from below is not turned into a response here. It is re-raised
//! wrapped in [`CorrelatedPanic`] so the recovery stage can log and answer it
//! with the same ID.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use futures_util::FutureExt;

use crate::http::request::{RequestId, X_REQUEST_ID};

/// Panic payload re-raised by this stage, tagged with the request it hit.
pub struct CorrelatedPanic {
    pub request_id: RequestId,
    pub payload: Box<dyn Any + Send + 'static>,
}

pub async fn assign_request_id(mut request: Request, next: Next) -> Response {
    let request_id = RequestId::generate();
    request.extensions_mut().insert(request_id.clone());

    let mut response = match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(response) => response,
        Err(payload) => panic::resume_unwind(Box::new(CorrelatedPanic {
            request_id,
            payload,
        })),
    };

    if let Some(value) = request_id.to_header_value() {
        response.headers_mut().insert(X_REQUEST_ID, value);
    }
    response
}
