//! In-process stub of the rendering service
//!
//! Every route answers with a canned status and body. Request bodies are
//! recorded so tests can inspect exactly what the harness sent.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header::CONTENT_TYPE, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::sync::oneshot;

use onebot_image_e2e::config::TimeoutConfig;
use onebot_image_e2e::HarnessConfig;

pub const ROOT: &str = "/onebot-info-image";
pub const PNG_BYTES: [u8; 12] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0, 0, 0, 13];

#[derive(Debug, Clone)]
pub struct StubResponse {
    pub status: u16,
    pub body: String,
    pub content_type: &'static str,
    pub delay: Duration,
}

impl StubResponse {
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            body: body.to_string(),
            content_type: "application/json",
            delay: Duration::ZERO,
        }
    }

    pub fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            content_type: "text/plain",
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Successful render body carrying `image` as base64
pub fn render_ok(image: &[u8]) -> StubResponse {
    StubResponse::json(
        200,
        json!({
            "success": true,
            "data": {
                "imageBase64": STANDARD.encode(image),
                "imageType": "png",
                "timestamp": "2024-01-01T00:00:00Z"
            }
        }),
    )
}

pub fn health_ok() -> StubResponse {
    StubResponse::json(200, json!({ "status": "ok", "timestamp": "2024-01-01T00:00:00Z" }))
}

pub fn config_ok() -> StubResponse {
    StubResponse::json(
        200,
        json!({
            "imageStyles": ["思源宋体SourceHanSerifSC", "落霞孤鹜文楷LXGWWenKai"],
            "imageTypes": ["png", "jpeg", "webp"]
        }),
    )
}

/// A stub answering every endpoint successfully
pub fn healthy_routes() -> Vec<(&'static str, StubResponse)> {
    vec![
        ("/health", health_ok()),
        ("/config", config_ok()),
        ("/render-user-info", render_ok(&PNG_BYTES)),
        ("/render-admin-list", render_ok(&PNG_BYTES)),
    ]
}

#[derive(Clone)]
struct StubState {
    routes: Arc<HashMap<String, StubResponse>>,
    requests: Arc<Mutex<Vec<(String, Value)>>>,
}

pub struct StubHandle {
    pub base_url: String,
    requests: Arc<Mutex<Vec<(String, Value)>>>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl StubHandle {
    /// JSON bodies received so far, keyed by endpoint path without the root
    pub fn requests(&self) -> Vec<(String, Value)> {
        self.requests.lock().unwrap().clone()
    }

    /// Harness config pointing at this stub with short timeouts
    pub fn config(&self, output: &TempDir) -> HarnessConfig {
        HarnessConfig {
            base_url: self.base_url.clone(),
            root_router: ROOT.to_string(),
            output_dir: output.path().join("result"),
            timeouts: TimeoutConfig {
                connectivity_ms: 500,
                request_ms: 1_000,
                render_ms: 2_000,
            },
            ..Default::default()
        }
    }
}

impl Drop for StubHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// Serve `routes` (paths relative to [`ROOT`]) on an ephemeral port
pub async fn spawn(routes: Vec<(&'static str, StubResponse)>) -> StubHandle {
    let routes: HashMap<String, StubResponse> = routes
        .into_iter()
        .map(|(path, resp)| (format!("{}{}", ROOT, path), resp))
        .collect();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let state = StubState {
        routes: Arc::new(routes),
        requests: Arc::clone(&requests),
    };
    let app = Router::new().fallback(handle).with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            })
            .await;
    });

    StubHandle {
        base_url: format!("http://{}", addr),
        requests,
        shutdown: Some(shutdown_tx),
    }
}

async fn handle(State(state): State<StubState>, uri: Uri, body: Bytes) -> Response {
    let path = uri.path().to_string();
    if let Ok(value) = serde_json::from_slice::<Value>(&body) {
        let relative = path.trim_start_matches(ROOT).to_string();
        state.requests.lock().unwrap().push((relative, value));
    }

    match state.routes.get(&path) {
        Some(resp) => {
            if !resp.delay.is_zero() {
                tokio::time::sleep(resp.delay).await;
            }
            let status = StatusCode::from_u16(resp.status).unwrap();
            (status, [(CONTENT_TYPE, resp.content_type)], resp.body.clone()).into_response()
        }
        None => (StatusCode::NOT_FOUND, "not found").into_response(),
    }
}

/// An address nothing listens on
pub fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}
