//! Payment status route: `/v1/projects/{project_id}/payment-status`.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use uuid::Uuid;

use crate::payments::PaymentStatus;
use crate::state::AppState;

/// Build the payment status router (nested under `/v1/projects`).
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/{project_id}/payment-status", get(payment_status))
}

async fn payment_status(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
) -> Json<PaymentStatus> {
    Json(state.payments.status(project_id).await)
}
