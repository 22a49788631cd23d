//! Shared helpers for the server integration tests.
//!
//! Builds the full router over an in-memory store so tests can drive it with
//! `tower::ServiceExt::oneshot` and inspect what actually got persisted.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::collections::HashMap;
use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use serde_json::Value;
use tower::ServiceExt;

use keyward_core::SecretCipher;
use keyward_server::build_router;
use keyward_server::config::ServerConfig;
use keyward_server::payments::MockPaymentStatus;
use keyward_server::state::AppState;
use keyward_storage::MemoryStore;

pub const ADMIN_TOKEN: &str = "test-admin-token-0123456789";
pub const KEY: &[u8] = b"01234567890123456789012345678901";
pub const OTHER_KEY: &[u8] = b"abcdefghijklmnopqrstuvwxyz012345";

/// A router plus direct handles on the store and cipher behind it.
pub struct Harness {
    pub app: Router,
    pub store: MemoryStore,
    pub cipher: Arc<SecretCipher>,
}

/// Response status, headers, and body parsed as JSON (or a JSON string for
/// non-JSON bodies, `Null` for empty ones).
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

pub fn harness() -> Harness {
    harness_with(&[])
}

pub fn harness_with(vars: &[(&str, &str)]) -> Harness {
    let mut env: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect();
    env.insert("ADMIN_TOKEN".to_owned(), ADMIN_TOKEN.to_owned());
    let config = ServerConfig::from_lookup(|var| env.get(var).cloned()).unwrap();

    let cipher = Arc::new(SecretCipher::from_key_bytes(KEY).unwrap());
    let store = MemoryStore::new();
    let state = AppState::new(
        Arc::clone(&cipher),
        Arc::new(store.clone()),
        Arc::new(MockPaymentStatus),
        &config,
    )
    .unwrap();

    Harness {
        app: build_router(Arc::new(state), &config.cors_origins),
        store,
        cipher,
    }
}

/// Send a request with the admin token.
pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
    send_as(app, method, uri, body, Some(&format!("Bearer {ADMIN_TOKEN}"))).await
}

/// Send a request with an arbitrary (or no) `Authorization` header.
pub async fn send_as(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    authorization: Option<&str>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = authorization {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };

    TestResponse {
        status,
        headers,
        body,
    }
}
