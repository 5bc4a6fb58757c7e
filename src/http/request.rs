//! Request correlation identifiers.
//!
//! # Responsibilities
//! - Generate a unique, unguessable request ID per inbound request
//! - Expose it to handlers as an extractor
//! - Render it into the `X-Request-Id` response header
//!
//! # Design Decisions
//! - 18 bytes from the OS random source, base64url without padding (24 chars)
//! - The ID is passed explicitly: extractor parameter, response header, and
//!   the tagged panic payload, never looked up from an ambient context

use std::fmt;
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{HeaderName, HeaderValue};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;

use crate::http::response::ApiError;

/// Response header carrying the request ID.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Number of random bytes behind each ID.
const ENTROPY_BYTES: usize = 18;

/// Opaque per-request correlation identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(Arc<str>);

impl RequestId {
    /// Draw a fresh ID from the OS random source.
    pub fn generate() -> Self {
        let mut bytes = [0u8; ENTROPY_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(URL_SAFE_NO_PAD.encode(bytes).into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Header form of the ID. Base64url output is always a valid header value.
    pub fn to_header_value(&self) -> Option<HeaderValue> {
        HeaderValue::from_str(&self.0).ok()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Handlers take `RequestId` as a parameter; it is attached by the
/// correlation stage of the middleware pipeline.
impl<S> FromRequestParts<S> for RequestId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<RequestId>().cloned().ok_or_else(|| {
            tracing::error!("Request reached a handler without a request ID");
            ApiError::Internal
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ids_are_url_safe_and_fixed_length() {
        let id = RequestId::generate();
        assert_eq!(id.as_str().len(), 24);
        assert!(id
            .as_str()
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert!(id.to_header_value().is_some());
    }

    #[test]
    fn ids_do_not_repeat() {
        let ids: HashSet<_> = (0..10_000).map(|_| RequestId::generate()).collect();
        assert_eq!(ids.len(), 10_000);
    }

    #[tokio::test]
    async fn extractor_reads_the_attached_id() {
        let id = RequestId::generate();
        let (mut parts, _) = axum::http::Request::new(()).into_parts();
        parts.extensions.insert(id.clone());

        let extracted = RequestId::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(extracted, id);
    }

    #[tokio::test]
    async fn extractor_rejects_when_missing() {
        let (mut parts, _) = axum::http::Request::new(()).into_parts();
        let err = RequestId::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert_eq!(err, ApiError::Internal);
    }
}
