//! HTTP route handlers for Keyward.
//!
//! Each submodule exposes a `router()` returning `Router<Arc<AppState>>`.
//! [`build_router`] nests them, applies authentication to everything under
//! `/v1/projects`, and adds tracing, CORS, and security headers.

pub mod credentials;
pub mod payments;
pub mod proxy;
pub mod sys;

use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderValue, Method, header};
use axum::middleware as axum_mw;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::middleware::auth_middleware;
use crate::state::AppState;

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: Arc<AppState>, cors_origins: &[HeaderValue]) -> Router {
    let project_routes = Router::new()
        .merge(credentials::router())
        .merge(proxy::router())
        .merge(payments::router())
        .route_layer(axum_mw::from_fn_with_state(
            Arc::clone(&state),
            auth_middleware,
        ));

    let cors = CorsLayer::new()
        .allow_origin(cors_origins.to_vec())
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .nest("/v1/sys", sys::router())
        .nest("/v1/projects", project_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .with_state(state)
}
