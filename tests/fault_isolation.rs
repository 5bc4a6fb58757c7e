//! A panicking handler is contained to its own request.

use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use probe_delay::http::middleware::{self, BodyLimit};
use serde_json::Value;

mod common;

async fn explode() -> StatusCode {
    panic!("handler fault for isolation test")
}

async fn fine() -> &'static str {
    "fine"
}

#[tokio::test]
async fn panic_becomes_500_and_the_server_keeps_serving() {
    let router = middleware::apply(
        Router::new()
            .route("/explode", get(explode))
            .route("/fine", get(fine)),
        BodyLimit::unlimited(),
    );
    let addr = common::serve_router(router).await;
    let client = reqwest::Client::builder().no_proxy().build().unwrap();

    let res = client
        .get(format!("http://{addr}/explode"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
    let request_id = res
        .headers()
        .get("x-request-id")
        .expect("500 carries the request id")
        .to_str()
        .unwrap()
        .to_owned();
    assert_eq!(request_id.len(), 24);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "internal_error");
    assert!(body["time"].is_string());

    for _ in 0..3 {
        let res = client
            .get(format!("http://{addr}/fine"))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), reqwest::StatusCode::OK);
        assert_ne!(res.headers()["x-request-id"], request_id.as_str());
        assert_eq!(res.text().await.unwrap(), "fine");
    }
}
