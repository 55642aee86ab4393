/// Common test utilities for integration tests
///
/// - In-process router over a fresh memory store
/// - Live server on an ephemeral port, for tests that go through reqwest
/// - Request/response helpers

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use questboard_api::app::{build_router, AppState};
use questboard_api::config::Config;
use questboard_shared::store::MemoryDocumentStore;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::Service as _;

/// Test context containing the router and its store
#[allow(dead_code)]
pub struct TestContext {
    pub store: Arc<MemoryDocumentStore>,
    pub app: axum::Router,
}

#[allow(dead_code)]
impl TestContext {
    pub fn new() -> Self {
        let store = Arc::new(MemoryDocumentStore::new());
        let state = AppState::new(store.clone(), Config::default());
        let app = build_router(state);

        TestContext { store, app }
    }

    /// Sends a request through the router
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        self.app.clone().call(builder.body(body).unwrap()).await.unwrap()
    }

    /// Starts a real server for this context and returns its base URL
    pub async fn spawn(&self) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr: SocketAddr = listener.local_addr().unwrap();
        let app = self.app.clone();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{}", addr)
    }
}

/// Reads a response body as JSON
#[allow(dead_code)]
pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Asserts the status, printing the body when it differs
#[allow(dead_code)]
pub async fn expect_status(response: Response<Body>, expected: StatusCode) -> Response<Body> {
    let status = response.status();
    if status != expected {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        panic!(
            "Expected {}, got {}: {}",
            expected,
            status,
            String::from_utf8_lossy(&body)
        );
    }
    response
}
