//! Authentication middleware for Keyward.
//!
//! Extracts `Authorization: Bearer <token>`, checks it against the bootstrap
//! admin token, and injects an [`AuthContext`] for downstream handlers.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;

use crate::error::AppError;
use crate::state::AppState;

/// Authentication context injected into request extensions.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Display identity for logs.
    pub actor: String,
}

/// Middleware that requires the admin bearer token.
///
/// # Errors
///
/// Returns [`AppError::Unauthorized`] if the header is missing, not a Bearer
/// token, or does not match.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("missing Authorization header".to_owned()))?;

    let token = header.strip_prefix("Bearer ").ok_or_else(|| {
        AppError::Unauthorized("Authorization header must use Bearer scheme".to_owned())
    })?;

    if !state.verify_admin_token(token.trim()) {
        tracing::warn!(path = %req.uri().path(), "rejected request with invalid token");
        return Err(AppError::Unauthorized("invalid token".to_owned()));
    }

    let ctx = AuthContext {
        actor: state.admin_email.clone(),
    };
    req.extensions_mut().insert(ctx);

    Ok(next.run(req).await)
}
