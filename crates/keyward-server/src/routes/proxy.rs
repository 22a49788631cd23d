//! Backend proxy: `/v1/projects/{project_id}/proxy/{provider}/{*path}`.
//!
//! Opens the project's credential for `provider` and forwards the request to
//! `{BACKEND_URL}/{path}` with the credential as a Bearer token. The upstream
//! status, content type, and body are relayed back unchanged. The credential
//! lives only for the duration of the request.

use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::{Path, RawQuery, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, header};
use axum::response::Response;
use axum::routing::any;
use axum::{Extension, Router};
use reqwest::Url;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::AuthContext;
use crate::routes::credentials::{load_record, open_record, validate_provider};
use crate::state::AppState;

/// Header carrying the project id to the backend.
pub const PROJECT_ID_HEADER: HeaderName = HeaderName::from_static("x-project-id");

/// Request headers copied to the upstream request.
const FORWARDED_HEADERS: [HeaderName; 2] = [header::CONTENT_TYPE, header::ACCEPT];

/// Build the proxy router (nested under `/v1/projects`).
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/{project_id}/proxy/{provider}/{*path}", any(proxy))
}

/// Join `path` onto the backend base URL and attach the query string.
pub(crate) fn upstream_url(base: &Url, path: &str, query: Option<&str>) -> Result<Url, AppError> {
    if path.split('/').any(|segment| segment == "..") {
        return Err(AppError::BadRequest(
            "path traversal (..) is not allowed".to_owned(),
        ));
    }

    let joined = format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    let mut url = Url::parse(&joined)
        .map_err(|e| AppError::BadRequest(format!("invalid upstream path: {e}")))?;

    // URL normalization also resolves `..\` and `%2e%2e`, so check the result.
    if !stays_under(base, &url) {
        return Err(AppError::BadRequest(
            "path escapes the backend base URL".to_owned(),
        ));
    }

    url.set_query(query.filter(|q| !q.is_empty()));
    Ok(url)
}

/// Whether `url` has the origin of `base` and a path at or below its path.
fn stays_under(base: &Url, url: &Url) -> bool {
    if url.scheme() != base.scheme()
        || url.host_str() != base.host_str()
        || url.port_or_known_default() != base.port_or_known_default()
    {
        return false;
    }
    let prefix = base.path().trim_end_matches('/');
    let path = url.path();
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

async fn proxy(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path((project_id, provider, path)): Path<(Uuid, String, String)>,
    RawQuery(query): RawQuery,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    validate_provider(&provider)?;
    let base = state
        .backend_url
        .as_ref()
        .ok_or_else(|| AppError::Unavailable("no backend configured".to_owned()))?;
    let url = upstream_url(base, &path, query.as_deref())?;

    let record = load_record(&state, project_id, &provider).await?;
    let secret = open_record(&state, &record)?;

    let mut bearer = HeaderValue::from_str(&format!("Bearer {}", secret.as_str())).map_err(|_| {
        AppError::BadRequest(format!(
            "stored '{provider}' credential cannot be sent as a header value"
        ))
    })?;
    bearer.set_sensitive(true);
    drop(secret);

    let mut upstream = state
        .http
        .request(method.clone(), url)
        .header(header::AUTHORIZATION, bearer)
        .header(PROJECT_ID_HEADER, project_id.to_string());
    for name in FORWARDED_HEADERS {
        if let Some(value) = headers.get(&name) {
            upstream = upstream.header(name, value.clone());
        }
    }

    tracing::debug!(actor = %auth.actor, %project_id, %provider, %method, %path, "proxying request");

    let response = upstream.body(body).send().await.map_err(|e| {
        tracing::warn!(%project_id, %provider, error = %e.without_url(), "upstream request failed");
        AppError::BadGateway("backend request failed".to_owned())
    })?;

    let status = response.status();
    let content_type = response.headers().get(header::CONTENT_TYPE).cloned();
    let bytes = response
        .bytes()
        .await
        .map_err(|e| AppError::BadGateway(format!("failed to read backend response: {}", e.without_url())))?;

    tracing::info!(%project_id, %provider, status = status.as_u16(), "proxied request completed");

    let mut builder = Response::builder().status(status);
    if let Some(ct) = content_type {
        builder = builder.header(header::CONTENT_TYPE, ct);
    }
    builder
        .body(Body::from(bytes))
        .map_err(|e| AppError::Internal(format!("failed to build proxy response: {e}")))
}
