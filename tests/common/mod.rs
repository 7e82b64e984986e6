//! In-process test client; the memory backend unless a store is given.
#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use residence_api::{router, AppState, Store};
use serde_json::Value;
use tower::ServiceExt;

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn id(&self) -> i64 {
        self.body["id"].as_i64().expect("response body has an id")
    }
}

pub struct TestApp {
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_body_limit(1024 * 1024)
    }

    pub fn with_body_limit(limit: usize) -> Self {
        TestApp {
            router: router(AppState::new(Store::memory()), limit),
        }
    }

    pub fn with_store(store: Store) -> Self {
        TestApp {
            router: router(AppState::new(store), 1024 * 1024),
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
        };
        TestResponse { status, headers, body }
    }

    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> TestResponse {
        self.request(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> TestResponse {
        self.request(Method::PUT, uri, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, body: Value) -> TestResponse {
        self.request(Method::PATCH, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> TestResponse {
        self.request(Method::DELETE, uri, None).await
    }

    /// Number of rows as reported by `X-Total-Count`.
    pub async fn count(&self, collection: &str) -> u64 {
        let response = self.get(collection).await;
        assert_eq!(response.status, StatusCode::OK);
        response.header("x-total-count").unwrap().parse().unwrap()
    }

    pub async fn create_resident(&self, name: &str, address: &str) -> i64 {
        let response = self
            .post(
                "/api/residents",
                serde_json::json!({ "residentName": name, "residentAddress": address }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.id()
    }

    pub async fn create_room(&self, title: &str, resident: Option<i64>) -> i64 {
        let mut body = serde_json::json!({
            "roomTitle": title,
            "roomDescription": "AAAAAAAAAA",
            "roomType": "AAAAAAAAAA"
        });
        if let Some(id) = resident {
            body["resident"] = serde_json::json!({ "id": id });
        }
        let response = self.post("/api/rooms", body).await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.id()
    }

    pub async fn create_facility(&self, name: &str, room: Option<i64>) -> i64 {
        let mut body = serde_json::json!({ "facilityName": name });
        if let Some(id) = room {
            body["room"] = serde_json::json!({ "id": id });
        }
        let response = self.post("/api/facilities", body).await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.id()
    }
}
