//! Test utilities for pulse-core
//!
//! A mock live data source speaking the same `GET /<table>` protocol as the
//! hosted store, for integration tests and local development.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::Value;
use tokio::sync::oneshot;

use crate::models::{Domain, RawRow};

#[derive(Clone, Default)]
struct MockState {
    tables: Arc<HashMap<String, Vec<Value>>>,
    failing: bool,
    required_key: Option<String>,
    hits: Arc<AtomicUsize>,
}

/// Mock hosted store for testing
pub struct MockLiveSource {
    addr: SocketAddr,
    hits: Arc<AtomicUsize>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

/// Which tables the mock serves and how it behaves
#[derive(Default)]
pub struct MockLiveSourceBuilder {
    tables: HashMap<String, Vec<Value>>,
    failing: bool,
    required_key: Option<String>,
}

impl MockLiveSourceBuilder {
    /// Serve `rows` for `domain`'s table
    pub fn with_rows(mut self, domain: Domain, rows: Vec<RawRow>) -> Self {
        self.tables.insert(
            domain.table().to_string(),
            rows.into_iter().map(Value::Object).collect(),
        );
        self
    }

    /// Answer every request with a 500
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    /// Reject requests without a matching `apikey` header
    pub fn with_api_key(mut self, key: &str) -> Self {
        self.required_key = Some(key.to_string());
        self
    }

    pub async fn start(self) -> MockLiveSource {
        let hits = Arc::new(AtomicUsize::new(0));
        let state = MockState {
            tables: Arc::new(self.tables),
            failing: self.failing,
            required_key: self.required_key,
            hits: hits.clone(),
        };

        let app = Router::new()
            .route("/:table", get(handle_table))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        MockLiveSource {
            addr,
            hits,
            shutdown_tx: Some(shutdown_tx),
        }
    }
}

impl MockLiveSource {
    pub fn builder() -> MockLiveSourceBuilder {
        MockLiveSourceBuilder::default()
    }

    /// Start a mock serving `rows` for a single domain
    pub async fn start(domain: Domain, rows: Vec<RawRow>) -> Self {
        Self::builder().with_rows(domain, rows).start().await
    }

    /// Start a mock that fails every request
    pub async fn start_failing() -> Self {
        Self::builder().failing().start().await
    }

    /// Base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Requests served so far
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockLiveSource {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn handle_table(
    State(state): State<MockState>,
    Path(table): Path<String>,
    headers: HeaderMap,
) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);

    if state.failing {
        return (StatusCode::INTERNAL_SERVER_ERROR, "upstream unavailable").into_response();
    }

    if let Some(key) = &state.required_key {
        let sent = headers.get("apikey").and_then(|v| v.to_str().ok());
        if sent != Some(key.as_str()) {
            return (StatusCode::UNAUTHORIZED, "invalid api key").into_response();
        }
    }

    match state.tables.get(&table) {
        Some(rows) => Json(Value::Array(rows.clone())).into_response(),
        None => (StatusCode::NOT_FOUND, format!("no table {}", table)).into_response(),
    }
}
