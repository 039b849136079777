//! Shared test utilities for handler unit tests.
//!
//! Provides a [`TestHarness`] backed by a fresh RocksDB in a temp directory,
//! request builders that carry the session cookie, and a `send` helper that
//! returns status, headers and the JSON body.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt; // for oneshot()

use super::router::build_app;
use super::state::TodoServer;
use crate::config::ServerConfig;

/// A self-contained test environment with its own temp storage.
///
/// Holds `TempDir` so the directory isn't cleaned up until the harness drops.
pub struct TestHarness {
    pub server: Arc<TodoServer>,
    _temp_dir: TempDir,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let config = ServerConfig {
            storage_path: temp_dir.path().to_path_buf(),
            ..ServerConfig::default()
        };
        let server = TodoServer::new(config).expect("failed to create test TodoServer");

        Self {
            server: Arc::new(server),
            _temp_dir: temp_dir,
        }
    }

    /// Build the full application router with all layers
    pub fn router(&self) -> Router {
        build_app(self.server.clone())
    }
}

// ---------- Request builders ----------

fn builder(method: Method, uri: &str, session: Option<&str>) -> axum::http::request::Builder {
    let builder = Request::builder().method(method).uri(uri);
    match session {
        Some(cookie) => builder.header(header::COOKIE, cookie),
        None => builder,
    }
}

/// Build a GET request, optionally carrying a `Cookie` header value
pub fn get(uri: &str, session: Option<&str>) -> Request<Body> {
    builder(Method::GET, uri, session)
        .body(Body::empty())
        .unwrap()
}

/// Build a POST request with a JSON body
pub fn post_json(uri: &str, session: Option<&str>, body: &serde_json::Value) -> Request<Body> {
    builder(Method::POST, uri, session)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Build a POST request with a urlencoded form body
pub fn post_form(uri: &str, session: Option<&str>, form: &str) -> Request<Body> {
    builder(Method::POST, uri, session)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .unwrap()
}

// ---------- Response helpers ----------

/// Send a request through the router and return (status, headers, JSON body).
pub async fn send(
    app: Router,
    req: Request<Body>,
) -> (StatusCode, HeaderMap, serde_json::Value) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let headers = resp.headers().clone();
    let body_bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = if body_bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap_or_else(|_| {
            serde_json::Value::String(String::from_utf8_lossy(&body_bytes).to_string())
        })
    };
    (status, headers, json)
}

/// `name=value` part of a `Set-Cookie` header, ready to send back
pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}
