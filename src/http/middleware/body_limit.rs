//! Request body size limit.
//!
//! # Design Decisions
//! - The body is wrapped, not pre-read: exceeding the limit surfaces as a read
//!   error in whatever stage or handler consumes the body
//! - A limit of zero disables the stage
//! - Handlers map the read error to `413 payload_too_large` via
//!   [`exceeded_limit`]

use std::error::Error as StdError;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use http_body_util::{LengthLimitError, Limited};

/// Maximum request body size in bytes; zero means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BodyLimit(u64);

impl BodyLimit {
    pub fn new(max_bytes: u64) -> Self {
        Self(max_bytes)
    }

    pub fn unlimited() -> Self {
        Self(0)
    }

    /// The enforced maximum, or `None` when limiting is disabled.
    pub fn max_bytes(self) -> Option<usize> {
        match self.0 {
            0 => None,
            n => Some(usize::try_from(n).unwrap_or(usize::MAX)),
        }
    }
}

pub async fn limit_request_body(
    State(limit): State<BodyLimit>,
    request: Request,
    next: Next,
) -> Response {
    let Some(max) = limit.max_bytes() else {
        return next.run(request).await;
    };

    let (parts, body) = request.into_parts();
    let limited = Body::new(Limited::new(body, max));
    next.run(Request::from_parts(parts, limited)).await
}

/// True when `err`, or anything in its source chain, is a body-limit breach.
pub fn exceeded_limit(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if e.is::<LengthLimitError>() {
            return true;
        }
        current = e.source();
    }
    false
}
