//! PostgreSQL credential store.
//!
//! One row per `(project_id, provider)` in `project_credentials`. The
//! `sealed_value` column holds the base64 ciphertext text exactly as produced
//! by the cipher, so rows stay readable by any implementation using the same
//! key and format.
//!
//! Feature-gated behind `postgres-backend`.

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use crate::{CredentialRecord, CredentialStore, StorageError};

/// A [`CredentialStore`] backed by PostgreSQL.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl std::fmt::Debug for PostgresStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresStore")
            .field("pool", &"[PgPool]")
            .finish_non_exhaustive()
    }
}

impl PostgresStore {
    /// Connect and create the `project_credentials` table if needed.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Open`] if the connection or migration fails.
    /// The URL is never included in the error since it may carry a password.
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| StorageError::Open {
                reason: e.to_string(),
            })?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS project_credentials (\
                project_id   UUID        NOT NULL, \
                provider     TEXT        NOT NULL, \
                sealed_value TEXT        NOT NULL, \
                version      INTEGER     NOT NULL DEFAULT 1, \
                created_at   TIMESTAMPTZ NOT NULL, \
                updated_at   TIMESTAMPTZ NOT NULL, \
                PRIMARY KEY (project_id, provider)\
            )",
        )
        .execute(&pool)
        .await
        .map_err(|e| StorageError::Open {
            reason: format!("migration failed: {e}"),
        })?;

        tracing::info!("project_credentials table ready");
        Ok(Self { pool })
    }

}

#[async_trait::async_trait]
impl CredentialStore for PostgresStore {
    async fn put(&self, record: CredentialRecord) -> Result<CredentialRecord, StorageError> {
        sqlx::query_as::<_, CredentialRecord>(
            "INSERT INTO project_credentials \
                (project_id, provider, sealed_value, version, created_at, updated_at) \
             VALUES ($1, $2, $3, 1, $4, $5) \
             ON CONFLICT (project_id, provider) DO UPDATE SET \
                sealed_value = EXCLUDED.sealed_value, \
                version = project_credentials.version + 1, \
                updated_at = now() \
             RETURNING project_id, provider, sealed_value, version, created_at, updated_at",
        )
        .bind(record.project_id)
        .bind(&record.provider)
        .bind(&record.sealed_value)
        .bind(record.created_at)
        .bind(record.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StorageError::Write {
            project_id: record.project_id.to_string(),
            provider: record.provider.clone(),
            reason: e.to_string(),
        })
    }

    async fn get(
        &self,
        project_id: Uuid,
        provider: &str,
    ) -> Result<Option<CredentialRecord>, StorageError> {
        sqlx::query_as::<_, CredentialRecord>(
            "SELECT project_id, provider, sealed_value, version, created_at, updated_at \
             FROM project_credentials WHERE project_id = $1 AND provider = $2",
        )
        .bind(project_id)
        .bind(provider)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Read {
            project_id: project_id.to_string(),
            provider: provider.to_owned(),
            reason: e.to_string(),
        })
    }

    async fn list(&self, project_id: Uuid) -> Result<Vec<CredentialRecord>, StorageError> {
        sqlx::query_as::<_, CredentialRecord>(
            "SELECT project_id, provider, sealed_value, version, created_at, updated_at \
             FROM project_credentials WHERE project_id = $1 ORDER BY provider COLLATE \"C\"",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::List {
            project_id: project_id.to_string(),
            reason: e.to_string(),
        })
    }

    async fn delete(&self, project_id: Uuid, provider: &str) -> Result<bool, StorageError> {
        let result = sqlx::query(
            "DELETE FROM project_credentials WHERE project_id = $1 AND provider = $2",
        )
        .bind(project_id)
        .bind(provider)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Delete {
            project_id: project_id.to_string(),
            provider: provider.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(result.rows_affected() > 0)
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
