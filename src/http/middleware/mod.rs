//! Request middleware pipeline.
//!
//! # Order (outermost first)
//! ```text
//! access_log   → one structured record per request, sees the final status
//! recovery     → handler panic → 500 internal_error
//! request_id   → fresh X-Request-Id, attached for handlers
//! body_limit   → caps how much of the body inner stages can read
//!     → handler
//! ```
//!
//! # Design Decisions
//! - Recovery sits inside access logging so a recovered panic is logged as 500
//! - Body limiting is innermost so it bounds everything the handler reads
//! - Only `recovery` turns a fault into a response; no stage retries
//! - Request deadlines (`deadline`) sit below the pipeline and are applied by
//!   the server, so a timed-out request still passes through every stage

pub mod access_log;
pub mod body_limit;
pub mod deadline;
pub mod recovery;
pub mod request_id;

use axum::middleware::{from_fn, from_fn_with_state};
use axum::Router;
use tower::ServiceBuilder;

pub use body_limit::BodyLimit;

/// Wrap every route (and the fallback) of `router` in the pipeline.
///
/// Routes added after this call are not wrapped.
pub fn apply(router: Router, limit: BodyLimit) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(from_fn(access_log::log_access))
            .layer(recovery::layer())
            .layer(from_fn(request_id::assign_request_id))
            .layer(from_fn_with_state(limit, body_limit::limit_request_body)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::request::{RequestId, X_REQUEST_ID};
    use std::io;
    use std::sync::{Arc, Mutex};

    use axum::body::Body;
    use axum::http::header::USER_AGENT;
    use axum::http::{Request, StatusCode};
    use axum::routing::{get, post};
    use serde_json::Value;
    use tower::ServiceExt;

    async fn faulty() -> StatusCode {
        panic!("stub handler fault")
    }

    fn stub_router() -> Router {
        let router = Router::new()
            .route(
                "/echo-id",
                get(|id: RequestId| async move { id.as_str().to_owned() }),
            )
            .route("/panic", get(faulty))
            .route(
                "/read",
                post(|body: Body| async move {
                    match axum::body::to_bytes(body, usize::MAX).await {
                        Ok(bytes) => (StatusCode::OK, bytes.len().to_string()),
                        Err(e) if body_limit::exceeded_limit(&e) => {
                            (StatusCode::PAYLOAD_TOO_LARGE, String::new())
                        }
                        Err(_) => (StatusCode::BAD_REQUEST, String::new()),
                    }
                }),
            );
        apply(router, BodyLimit::new(8))
    }

    /// In-memory sink for JSON log lines.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn install(&self) -> tracing::subscriber::DefaultGuard {
            let sink = self.clone();
            let subscriber = tracing_subscriber::fmt()
                .json()
                .with_writer(move || sink.clone())
                .finish();
            tracing::subscriber::set_default(subscriber)
        }

        fn event(&self, message: &str) -> Value {
            let raw = self.0.lock().unwrap().clone();
            String::from_utf8(raw)
                .unwrap()
                .lines()
                .map(|line| serde_json::from_str::<Value>(line).unwrap())
                .find(|event| event["fields"]["message"] == message)
                .unwrap_or_else(|| panic!("no {message:?} event logged"))
        }
    }

    #[tokio::test]
    async fn access_record_describes_a_served_request() {
        let logs = Captured::default();
        let _guard = logs.install();

        let response = stub_router()
            .oneshot(
                Request::get("/echo-id")
                    .header(USER_AGENT, "kubelet/1.30")
                    .header("x-forwarded-for", "10.0.0.7")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let request_id = response.headers()[X_REQUEST_ID].to_str().unwrap().to_owned();

        let record = logs.event("http_request");
        assert_eq!(record["level"], "INFO");
        let fields = &record["fields"];
        assert_eq!(fields["method"], "GET");
        assert_eq!(fields["path"], "/echo-id");
        assert_eq!(fields["status"], 200);
        assert_eq!(fields["bytes"], 24);
        assert_eq!(fields["ua"], "kubelet/1.30");
        assert_eq!(fields["xff"], "10.0.0.7");
        assert_eq!(fields["request_id"], request_id.as_str());
        assert!(fields["duration_ms"].is_u64());
    }

    #[tokio::test]
    async fn recovered_panic_is_logged_as_500_with_its_request_id() {
        let logs = Captured::default();
        let _guard = logs.install();

        let response = stub_router()
            .oneshot(Request::get("/panic").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let request_id = response.headers()[X_REQUEST_ID].to_str().unwrap().to_owned();

        let access = logs.event("http_request");
        assert_eq!(access["fields"]["status"], 500);
        assert!(access["fields"]["bytes"].as_u64().unwrap() > 0);
        assert_eq!(access["fields"]["request_id"], request_id.as_str());

        let recovered = logs.event("Panic recovered");
        assert_eq!(recovered["level"], "ERROR");
        assert_eq!(recovered["fields"]["request_id"], request_id.as_str());
        assert_eq!(recovered["fields"]["panic"], "stub handler fault");
    }

    #[tokio::test]
    async fn handler_sees_the_id_sent_in_the_header() {
        let response = stub_router()
            .oneshot(Request::get("/echo-id").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let header = response.headers()[X_REQUEST_ID].to_str().unwrap().to_owned();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(header.as_bytes(), &body[..]);
    }

    #[tokio::test]
    async fn panic_keeps_its_request_id() {
        let response = stub_router()
            .oneshot(Request::get("/panic").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()[X_REQUEST_ID].len(), 24);
    }

    #[tokio::test]
    async fn body_limit_applies_under_the_full_pipeline() {
        let app = stub_router();

        let small = app
            .clone()
            .oneshot(Request::post("/read").body(Body::from("1234")).unwrap())
            .await
            .unwrap();
        assert_eq!(small.status(), StatusCode::OK);

        let large = app
            .oneshot(Request::post("/read").body(Body::from("123456789")).unwrap())
            .await
            .unwrap();
        assert_eq!(large.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(large.headers().contains_key(X_REQUEST_ID));
    }
}
