//! Access logging.
//!
//! Emits one `http_request` record per request after the inner pipeline
//! returns, so the status is the one the client actually receives, including
//! 500s produced by panic recovery. The request ID is taken from the response
//! header set further down the pipeline.

use std::net::SocketAddr;
use std::time::Instant;

use axum::body::HttpBody;
use axum::extract::{ConnectInfo, Request};
use axum::http::header::USER_AGENT;
use axum::http::{HeaderMap, HeaderName};
use axum::middleware::Next;
use axum::response::Response;

use crate::http::request::X_REQUEST_ID;
use crate::observability::metrics;

const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

pub async fn log_access(request: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let user_agent = header_str(request.headers(), &USER_AGENT).to_owned();
    let forwarded_for = header_str(request.headers(), &X_FORWARDED_FOR).to_owned();
    let remote = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_default();

    let response = next.run(request).await;

    let status = response.status();
    let hint = response.body().size_hint();
    let bytes = hint.exact().unwrap_or(hint.lower());
    let elapsed = started.elapsed();

    tracing::info!(
        method = %method,
        path = %path,
        status = status.as_u16(),
        bytes,
        duration_ms = elapsed.as_millis() as u64,
        ua = %user_agent,
        remote = %remote,
        xff = %forwarded_for,
        request_id = header_str(response.headers(), &X_REQUEST_ID),
        "http_request"
    );
    metrics::record_request(method.as_str(), status.as_u16(), elapsed);

    response
}

fn header_str<'a>(headers: &'a HeaderMap, name: &HeaderName) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}
