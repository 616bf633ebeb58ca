use axum::{
    body::{self, Body},
    http::{self, Request, StatusCode},
    Router,
};
use salesviz::{
    config::{AppConfig, DbConfig, Secret},
    server::Server,
    store::SalesStore,
};
use serde::Serialize;
use serde_json::Value;
use std::{net::SocketAddr, sync::Arc};
use tower::ServiceExt;

pub const TEST_DB_HOST: &str = "db.test";
pub const TEST_DB_NAME: &str = "vizpoc_test";
pub const TEST_DB_PASSWORD: &str = "do-not-leak";

/// Router wired to an arbitrary store, exercised in-process with `oneshot`.
#[derive(Clone)]
pub struct TestHarness {
    router: Router,
}

impl TestHarness {
    pub fn new(store: Arc<dyn SalesStore>) -> Self {
        Self::with_config(test_config(), store)
    }

    pub fn with_config(config: AppConfig, store: Arc<dyn SalesStore>) -> Self {
        let router = Server::with_store(config, store).router();
        Self { router }
    }

    pub async fn get(&self, path: &str) -> http::Response<Body> {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .expect("failed to build harness request");
        self.send(request).await
    }

    pub async fn post_json<T>(&self, path: &str, payload: &T) -> http::Response<Body>
    where
        T: Serialize,
    {
        let body = serde_json::to_vec(payload).expect("request payload should serialize");
        self.post_raw(path, body).await
    }

    pub async fn post_raw(&self, path: &str, body: Vec<u8>) -> http::Response<Body> {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .expect("failed to build harness request");
        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> http::Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router should handle harness request")
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        listen_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        db: DbConfig {
            host: Some(TEST_DB_HOST.to_string()),
            name: Some(TEST_DB_NAME.to_string()),
            password: Some(Secret::new(TEST_DB_PASSWORD)),
            ..DbConfig::default()
        },
        allowed_origins: None,
    }
}

pub async fn read_json(response: http::Response<Body>) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("response body should deserialize");
    let value =
        serde_json::from_slice::<Value>(&bytes).expect("response body should be valid JSON");
    (status, value)
}
