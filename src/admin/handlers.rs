use axum::body::Body;
use axum::extract::State;
use axum::http::{Method, StatusCode};
use axum::response::Response;
use serde::Serialize;

use crate::health::probes::require_method;
use crate::health::DelayedGate;
use crate::http::middleware::body_limit::exceeded_limit;
use crate::http::middleware::deadline::body_read_timed_out;
use crate::http::request::RequestId;
use crate::http::response::{json_response, millis, timestamp, ApiError};
use crate::http::server::AppState;

/// Body of every admin reset response.
///
/// `health` and `ready` report the state right after the reset, which is
/// always pending.
#[derive(Debug, Serialize)]
pub struct ResetReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ready: Option<bool>,
    /// The gate's delay in humantime notation, with a space between units
    /// and no fractions: 90s is `"1m 30s"`, 1.5s is `"1s 500ms"`.
    pub delay: String,
    pub time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_in_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ready_in_ms: Option<u64>,
}

/// `POST /admin/reset`
pub async fn reset_all(
    State(state): State<AppState>,
    method: Method,
    request_id: RequestId,
    body: Body,
) -> Result<Response, ApiError> {
    accept(&method, &request_id, body).await?;

    state.health.reset();
    state.ready.reset();
    tracing::info!(request_id = %request_id, gates = "health,ready", "Admin reset");

    Ok(json_response(
        StatusCode::OK,
        &ResetReport {
            health: Some(false),
            ready: Some(false),
            delay: format_delay(&state.health),
            time: timestamp(),
            health_in_ms: Some(millis(state.health.remaining_delay())),
            ready_in_ms: Some(millis(state.ready.remaining_delay())),
        },
    ))
}

/// `POST /admin/health/reset`
pub async fn reset_health(
    State(state): State<AppState>,
    method: Method,
    request_id: RequestId,
    body: Body,
) -> Result<Response, ApiError> {
    accept(&method, &request_id, body).await?;

    state.health.reset();
    tracing::info!(request_id = %request_id, gates = "health", "Admin reset");

    Ok(json_response(
        StatusCode::OK,
        &ResetReport {
            health: Some(false),
            ready: None,
            delay: format_delay(&state.health),
            time: timestamp(),
            health_in_ms: Some(millis(state.health.remaining_delay())),
            ready_in_ms: None,
        },
    ))
}

/// `POST /admin/ready/reset`
pub async fn reset_ready(
    State(state): State<AppState>,
    method: Method,
    request_id: RequestId,
    body: Body,
) -> Result<Response, ApiError> {
    accept(&method, &request_id, body).await?;

    state.ready.reset();
    tracing::info!(request_id = %request_id, gates = "ready", "Admin reset");

    Ok(json_response(
        StatusCode::OK,
        &ResetReport {
            health: None,
            ready: Some(false),
            delay: format_delay(&state.ready),
            time: timestamp(),
            health_in_ms: None,
            ready_in_ms: Some(millis(state.ready.remaining_delay())),
        },
    ))
}

/// Check the method, then read the body to the end so a size-limit breach
/// is reported before any gate is touched.
async fn accept(method: &Method, request_id: &RequestId, body: Body) -> Result<(), ApiError> {
    require_method(method, Method::POST, request_id)?;

    match axum::body::to_bytes(body, usize::MAX).await {
        Ok(_) => Ok(()),
        Err(e) if exceeded_limit(&e) => {
            tracing::warn!(request_id = %request_id, "Admin request body over limit");
            Err(ApiError::PayloadTooLarge)
        }
        Err(e) if body_read_timed_out(&e) => {
            tracing::warn!(request_id = %request_id, "Admin request body read timed out");
            Err(ApiError::RequestTimeout)
        }
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Failed to read admin request body");
            Err(ApiError::BadRequest)
        }
    }
}

fn format_delay(gate: &DelayedGate) -> String {
    humantime::format_duration(gate.delay()).to_string()
}
