//! Credential storage for Keyward.
//!
//! This crate defines the [`CredentialStore`] trait: per-project records whose
//! value is an already-sealed ciphertext string. Stores never see plaintext
//! and never encrypt or decrypt; that is the job of `keyward-core`.
//!
//! Two implementations are provided:
//!
//! - [`PostgresStore`]: production, backed by `sqlx` (feature `postgres-backend`)
//! - [`MemoryStore`]: in-memory, for development and tests

mod error;
mod memory;
#[cfg(feature = "postgres-backend")]
mod postgres;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

pub use error::StorageError;
pub use memory::MemoryStore;
#[cfg(feature = "postgres-backend")]
pub use postgres::PostgresStore;

/// A stored credential. `sealed_value` is opaque ciphertext text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "postgres-backend", derive(sqlx::FromRow))]
pub struct CredentialRecord {
    pub project_id: Uuid,
    pub provider: String,
    #[serde(skip)]
    pub sealed_value: String,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CredentialRecord {
    /// A first-version record stamped with the current time.
    #[must_use]
    pub fn new(project_id: Uuid, provider: impl Into<String>, sealed_value: String) -> Self {
        let now = Utc::now();
        Self {
            project_id,
            provider: provider.into(),
            sealed_value,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Persistent home for sealed per-project credentials.
///
/// Records are keyed by `(project_id, provider)`. Implementations must be safe
/// to share across async tasks.
#[async_trait::async_trait]
pub trait CredentialStore: Send + Sync + 'static {
    /// Insert or replace a credential.
    ///
    /// On replace, `created_at` is kept, `version` is incremented, and
    /// `updated_at` is refreshed. Returns the record as stored.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Write`] if the backend fails.
    async fn put(&self, record: CredentialRecord) -> Result<CredentialRecord, StorageError>;

    /// Fetch one credential, or `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Read`] if the backend fails.
    async fn get(
        &self,
        project_id: Uuid,
        provider: &str,
    ) -> Result<Option<CredentialRecord>, StorageError>;

    /// All credentials of a project, ordered by provider.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::List`] if the backend fails.
    async fn list(&self, project_id: Uuid) -> Result<Vec<CredentialRecord>, StorageError>;

    /// Remove a credential. Returns whether one existed.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Delete`] if the backend fails.
    async fn delete(&self, project_id: Uuid, provider: &str) -> Result<bool, StorageError>;

    /// Short backend name for health output and logs.
    fn backend_name(&self) -> &'static str;
}
