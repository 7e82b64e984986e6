mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use common::TestApp;

#[tokio::test]
async fn health_and_readiness() {
    let app = TestApp::new();
    let response = app.get("/health").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");

    let response = app.get("/ready").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["storage"], "ok");
}

#[tokio::test]
async fn version_and_info_report_package() {
    let app = TestApp::new();
    for path in ["/version", "/info"] {
        let response = app.get(path).await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["name"], "residence-api");
        assert_eq!(response.body["version"], env!("CARGO_PKG_VERSION"));
    }
}

#[tokio::test]
async fn oversized_bodies_are_refused() {
    let app = TestApp::with_body_limit(64);
    let body = format!("{{\"residentName\":\"{}\",\"residentAddress\":\"AA\"}}", "A".repeat(200));
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/residents")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CONTENT_LENGTH, body.len())
        .body(Body::from(body))
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(response.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(app.count("/api/residents").await, 0);
}

#[tokio::test]
async fn unknown_paths_are_not_found() {
    let app = TestApp::new();
    assert_eq!(app.get("/api/tenants").await.status, StatusCode::NOT_FOUND);
}
