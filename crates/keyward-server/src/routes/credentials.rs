//! Credential routes: `/v1/projects/{project_id}/credentials/*`.
//!
//! Values are sealed with the process cipher before they reach the store and
//! opened once per read. Listing returns metadata only. Plaintext is never
//! logged.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Extension, Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zeroize::Zeroizing;

use keyward_storage::CredentialRecord;

use crate::error::AppError;
use crate::middleware::AuthContext;
use crate::state::AppState;

/// Maximum provider name length.
const MAX_PROVIDER_LEN: usize = 64;

/// Maximum credential value size (64 KiB).
const MAX_VALUE_LEN: usize = 64 * 1024;

/// Build the credentials router (nested under `/v1/projects`).
///
/// Paths:
/// - `GET    /{project_id}/credentials`: list metadata
/// - `GET    /{project_id}/credentials/{provider}`: read (decrypted)
/// - `PUT    /{project_id}/credentials/{provider}`: create or replace
/// - `DELETE /{project_id}/credentials/{provider}`: delete
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/{project_id}/credentials", get(list_credentials))
        .route(
            "/{project_id}/credentials/{provider}",
            get(get_credential)
                .put(set_credential)
                .delete(delete_credential),
        )
}

// ── Request / response types ─────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SetCredentialRequest {
    pub value: String,
}

#[derive(Debug, Serialize)]
pub struct CredentialResponse {
    pub credential: CredentialRecord,
}

#[derive(Debug, Serialize)]
pub struct CredentialListResponse {
    pub credentials: Vec<CredentialRecord>,
}

#[derive(Serialize)]
pub struct CredentialValueResponse {
    pub provider: String,
    pub value: String,
    pub version: i32,
    pub updated_at: DateTime<Utc>,
}

// ── Helpers ──────────────────────────────────────────────────────────

/// Validate a provider name: 1–64 chars of `[a-z0-9_-]`.
pub(crate) fn validate_provider(provider: &str) -> Result<(), AppError> {
    if provider.is_empty() || provider.len() > MAX_PROVIDER_LEN {
        return Err(AppError::BadRequest(format!(
            "provider must be 1-{MAX_PROVIDER_LEN} characters"
        )));
    }
    if !provider
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_' || b == b'-')
    {
        return Err(AppError::BadRequest(
            "provider may only contain lowercase letters, digits, '_' and '-'".to_owned(),
        ));
    }
    Ok(())
}

/// Load a credential record or fail with 404.
pub(crate) async fn load_record(
    state: &AppState,
    project_id: Uuid,
    provider: &str,
) -> Result<CredentialRecord, AppError> {
    state
        .store
        .get(project_id, provider)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no '{provider}' credential for this project")))
}

/// Open a stored credential as UTF-8 text.
///
/// Decryption failures are logged with their kind and reported to the caller
/// as a single [`AppError::CannotDecrypt`].
pub(crate) fn open_record(
    state: &AppState,
    record: &CredentialRecord,
) -> Result<Zeroizing<String>, AppError> {
    let plaintext = state.cipher.open(&record.sealed_value).map_err(|e| {
        tracing::warn!(
            project_id = %record.project_id,
            provider = %record.provider,
            kind = e.kind(),
            "stored credential failed to open"
        );
        AppError::from(e)
    })?;

    let text = std::str::from_utf8(&plaintext).map_err(|_| {
        AppError::Internal(format!(
            "credential '{}/{}' is not valid UTF-8",
            record.project_id, record.provider
        ))
    })?;
    Ok(Zeroizing::new(text.to_owned()))
}

// ── Handlers ─────────────────────────────────────────────────────────

async fn list_credentials(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<CredentialListResponse>, AppError> {
    let credentials = state.store.list(project_id).await?;
    Ok(Json(CredentialListResponse { credentials }))
}

async fn get_credential(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path((project_id, provider)): Path<(Uuid, String)>,
) -> Result<Json<CredentialValueResponse>, AppError> {
    validate_provider(&provider)?;
    let record = load_record(&state, project_id, &provider).await?;
    let secret = open_record(&state, &record)?;

    tracing::info!(actor = %auth.actor, %project_id, %provider, "credential read");

    Ok(Json(CredentialValueResponse {
        provider: record.provider,
        value: secret.as_str().to_owned(),
        version: record.version,
        updated_at: record.updated_at,
    }))
}

async fn set_credential(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path((project_id, provider)): Path<(Uuid, String)>,
    Json(body): Json<SetCredentialRequest>,
) -> Result<Json<CredentialResponse>, AppError> {
    validate_provider(&provider)?;
    let value = Zeroizing::new(body.value);
    if value.as_str().is_empty() || value.as_str().len() > MAX_VALUE_LEN {
        return Err(AppError::BadRequest(format!(
            "credential value must be 1-{MAX_VALUE_LEN} bytes"
        )));
    }

    let sealed = state.cipher.seal(value.as_str().as_bytes())?;
    let record = CredentialRecord::new(project_id, provider, sealed.into_string());
    let stored = state.store.put(record).await?;

    tracing::info!(
        actor = %auth.actor,
        %project_id,
        provider = %stored.provider,
        version = stored.version,
        "credential written"
    );

    Ok(Json(CredentialResponse { credential: stored }))
}

async fn delete_credential(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path((project_id, provider)): Path<(Uuid, String)>,
) -> Result<StatusCode, AppError> {
    validate_provider(&provider)?;
    if !state.store.delete(project_id, &provider).await? {
        return Err(AppError::NotFound(format!(
            "no '{provider}' credential for this project"
        )));
    }

    tracing::info!(actor = %auth.actor, %project_id, %provider, "credential deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_provider_names() {
        for name in ["openai", "stripe-live", "github_app", "s3", "a"] {
            assert!(validate_provider(name).is_ok(), "{name}");
        }
    }

    #[test]
    fn invalid_provider_names() {
        let long = "x".repeat(MAX_PROVIDER_LEN + 1);
        for name in ["", "OpenAI", "has space", "../etc", "a/b", long.as_str()] {
            assert!(validate_provider(name).is_err(), "{name}");
        }
    }
}
