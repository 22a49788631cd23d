//! In-memory credential store.
//!
//! Records live in a `BTreeMap` behind a `RwLock` and vanish on exit. The map
//! is keyed by `(project_id, provider)`, so a project's records are a
//! contiguous, provider-sorted range.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{CredentialRecord, CredentialStore, StorageError};

type Key = (Uuid, String);

/// An in-memory [`CredentialStore`]. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Arc<RwLock<BTreeMap<Key, CredentialRecord>>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl CredentialStore for MemoryStore {
    async fn put(&self, mut record: CredentialRecord) -> Result<CredentialRecord, StorageError> {
        let mut data = self.data.write().await;
        let key = (record.project_id, record.provider.clone());
        if let Some(existing) = data.get(&key) {
            record.created_at = existing.created_at;
            record.version = existing.version.saturating_add(1);
            record.updated_at = Utc::now();
        }
        data.insert(key, record.clone());
        Ok(record)
    }

    async fn get(
        &self,
        project_id: Uuid,
        provider: &str,
    ) -> Result<Option<CredentialRecord>, StorageError> {
        let data = self.data.read().await;
        Ok(data.get(&(project_id, provider.to_owned())).cloned())
    }

    async fn list(&self, project_id: Uuid) -> Result<Vec<CredentialRecord>, StorageError> {
        let data = self.data.read().await;
        let records = data
            .range((project_id, String::new())..)
            .take_while(|((pid, _), _)| *pid == project_id)
            .map(|(_, record)| record.clone())
            .collect();
        Ok(records)
    }

    async fn delete(&self, project_id: Uuid, provider: &str) -> Result<bool, StorageError> {
        let mut data = self.data.write().await;
        Ok(data.remove(&(project_id, provider.to_owned())).is_some())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
