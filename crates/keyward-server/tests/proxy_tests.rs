//! Integration tests for the backend proxy routes.
//!
//! Each test starts a small Axum upstream on an ephemeral port that echoes
//! what it received, then drives the Keyward router against it.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod support;

use std::net::SocketAddr;

use axum::Router;
use axum::body::Bytes;
use axum::extract::{Path, RawQuery};
use axum::http::{HeaderMap, Method, StatusCode, header};
use axum::routing::{any, get};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use uuid::Uuid;

use keyward_storage::{CredentialRecord, CredentialStore};

use support::{Harness, harness, harness_with, send};

async fn echo(
    method: Method,
    Path(rest): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> axum::Json<Value> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
    };
    axum::Json(json!({
        "method": method.as_str(),
        "path": rest,
        "query": query,
        "authorization": header("authorization"),
        "project_id": header("x-project-id"),
        "content_type": header("content-type"),
        "body": String::from_utf8_lossy(&body),
    }))
}

async fn spawn_upstream() -> SocketAddr {
    let app = Router::new()
        .route("/echo/{*rest}", any(echo))
        .route("/teapot", get(|| async { (StatusCode::IM_A_TEAPOT, "short and stout") }));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn proxied_harness(project: Uuid, value: &str) -> Harness {
    let addr = spawn_upstream().await;
    let backend = format!("http://{addr}");
    let h = harness_with(&[("BACKEND_URL", backend.as_str())]);
    send(
        &h.app,
        Method::PUT,
        &format!("/v1/projects/{project}/credentials/openai"),
        Some(json!({ "value": value })),
    )
    .await;
    h
}

#[tokio::test]
async fn forwards_credential_and_request_details() {
    let project = Uuid::new_v4();
    let h = proxied_harness(project, "sk-live-abc123").await;

    let resp = send(
        &h.app,
        Method::POST,
        &format!("/v1/projects/{project}/proxy/openai/echo/v1/chat?model=small&n=2"),
        Some(json!({ "prompt": "hi" })),
    )
    .await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["method"], "POST");
    assert_eq!(resp.body["path"], "v1/chat");
    assert_eq!(resp.body["query"], "model=small&n=2");
    assert_eq!(resp.body["authorization"], "Bearer sk-live-abc123");
    assert_eq!(resp.body["project_id"], project.to_string());
    assert_eq!(resp.body["content_type"], "application/json");
    assert_eq!(resp.body["body"], r#"{"prompt":"hi"}"#);
}

#[tokio::test]
async fn caller_authorization_is_not_forwarded() {
    let project = Uuid::new_v4();
    let h = proxied_harness(project, "sk-upstream").await;

    let resp = send(
        &h.app,
        Method::GET,
        &format!("/v1/projects/{project}/proxy/openai/echo/me"),
        None,
    )
    .await;

    assert_eq!(resp.body["authorization"], "Bearer sk-upstream");
    assert!(!resp.body.to_string().contains(support::ADMIN_TOKEN));
}

#[tokio::test]
async fn upstream_status_is_relayed() {
    let project = Uuid::new_v4();
    let h = proxied_harness(project, "sk").await;

    let resp = send(
        &h.app,
        Method::GET,
        &format!("/v1/projects/{project}/proxy/openai/teapot"),
        None,
    )
    .await;

    assert_eq!(resp.status, StatusCode::IM_A_TEAPOT);
    assert_eq!(resp.body, "short and stout");
}

#[tokio::test]
async fn missing_credential_is_not_found() {
    let project = Uuid::new_v4();
    let h = proxied_harness(project, "sk").await;

    let resp = send(
        &h.app,
        Method::GET,
        &format!("/v1/projects/{project}/proxy/stripe/echo/x"),
        None,
    )
    .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn tampered_credential_is_never_sent() {
    let project = Uuid::new_v4();
    let h = proxied_harness(project, "sk").await;

    let record = h.store.get(project, "openai").await.unwrap().unwrap();
    let mut raw = STANDARD.decode(&record.sealed_value).unwrap();
    let last = raw.len() - 1;
    raw[last] ^= 0x80;
    h.store
        .put(CredentialRecord::new(project, "openai", STANDARD.encode(&raw)))
        .await
        .unwrap();

    let resp = send(
        &h.app,
        Method::GET,
        &format!("/v1/projects/{project}/proxy/openai/echo/x"),
        None,
    )
    .await;
    assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp.body["error"], "cannot_decrypt");
}

#[tokio::test]
async fn path_traversal_is_rejected() {
    let project = Uuid::new_v4();
    let h = proxied_harness(project, "sk").await;

    let resp = send(
        &h.app,
        Method::GET,
        &format!("/v1/projects/{project}/proxy/openai/echo/../../admin"),
        None,
    )
    .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unreachable_backend_is_bad_gateway() {
    // Bind then drop to get a port nothing is listening on.
    let addr = TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap()
        .local_addr()
        .unwrap();
    let backend = format!("http://{addr}");
    let h = harness_with(&[("BACKEND_URL", backend.as_str())]);
    let project = Uuid::new_v4();
    send(
        &h.app,
        Method::PUT,
        &format!("/v1/projects/{project}/credentials/openai"),
        Some(json!({ "value": "sk" })),
    )
    .await;

    let resp = send(
        &h.app,
        Method::GET,
        &format!("/v1/projects/{project}/proxy/openai/anything"),
        None,
    )
    .await;
    assert_eq!(resp.status, StatusCode::BAD_GATEWAY);
    assert_eq!(resp.body["error"], "bad_gateway");
}

#[tokio::test]
async fn proxy_without_backend_is_unavailable() {
    let h = harness();
    let project = Uuid::new_v4();

    let resp = send(
        &h.app,
        Method::GET,
        &format!("/v1/projects/{project}/proxy/openai/anything"),
        None,
    )
    .await;
    assert_eq!(resp.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(resp.headers[header::CACHE_CONTROL], "no-store");
}

#[tokio::test]
async fn encoded_escapes_from_base_path_are_rejected() {
    let addr = spawn_upstream().await;
    let backend = format!("http://{addr}/echo");
    let h = harness_with(&[("BACKEND_URL", backend.as_str())]);
    let project = Uuid::new_v4();
    send(
        &h.app,
        Method::PUT,
        &format!("/v1/projects/{project}/credentials/openai"),
        Some(json!({ "value": "sk" })),
    )
    .await;

    let inside = send(
        &h.app,
        Method::GET,
        &format!("/v1/projects/{project}/proxy/openai/a/b"),
        None,
    )
    .await;
    assert_eq!(inside.status, StatusCode::OK);
    assert_eq!(inside.body["path"], "a/b");

    for path in [
        "x/%252e%252e/%252e%252e/teapot",
        "x/..%5C..%5Cteapot",
        "%252E%252E/teapot",
    ] {
        let resp = send(
            &h.app,
            Method::GET,
            &format!("/v1/projects/{project}/proxy/openai/{path}"),
            None,
        )
        .await;
        assert_eq!(resp.status, StatusCode::BAD_REQUEST, "{path}");
    }
}
