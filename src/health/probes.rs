//! Liveness and readiness probe handlers.

use axum::extract::State;
use axum::http::{Method, StatusCode};
use axum::response::Response;
use serde::Serialize;

use crate::health::DelayedGate;
use crate::http::request::RequestId;
use crate::http::response::{json_response, millis, timestamp, ApiError};
use crate::http::server::AppState;

/// Body of both probe responses.
#[derive(Debug, Serialize)]
pub struct ProbeStatus<'a> {
    pub status: &'static str,
    pub service: &'a str,
    pub version: &'a str,
    pub time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_ms: Option<u64>,
}

/// `GET /healthz`
pub async fn healthz(
    State(state): State<AppState>,
    method: Method,
    request_id: RequestId,
) -> Result<Response, ApiError> {
    require_method(&method, Method::GET, &request_id)?;
    Ok(probe(&state, &state.health, "ok", "unhealthy"))
}

/// `GET /readyz`
pub async fn readyz(
    State(state): State<AppState>,
    method: Method,
    request_id: RequestId,
) -> Result<Response, ApiError> {
    require_method(&method, Method::GET, &request_id)?;
    Ok(probe(&state, &state.ready, "ready", "not-ready"))
}

fn probe(
    state: &AppState,
    gate: &DelayedGate,
    achieved: &'static str,
    pending: &'static str,
) -> Response {
    let identity = &state.identity;
    if gate.is_achieved() {
        return json_response(
            StatusCode::OK,
            &ProbeStatus {
                status: achieved,
                service: &identity.service,
                version: &identity.version,
                time: timestamp(),
                retry_after_ms: None,
            },
        );
    }

    json_response(
        StatusCode::SERVICE_UNAVAILABLE,
        &ProbeStatus {
            status: pending,
            service: &identity.service,
            version: &identity.version,
            time: timestamp(),
            retry_after_ms: Some(millis(gate.remaining_delay())),
        },
    )
}

/// Reject any method other than `expected` with 405.
///
/// HEAD is not treated as GET.
pub fn require_method(
    method: &Method,
    expected: Method,
    request_id: &RequestId,
) -> Result<(), ApiError> {
    if *method == expected {
        return Ok(());
    }
    tracing::debug!(
        request_id = %request_id,
        method = %method,
        expected = %expected,
        "Method not allowed"
    );
    Err(ApiError::MethodNotAllowed)
}
