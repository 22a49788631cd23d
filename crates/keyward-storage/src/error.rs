//! Storage error types.
//!
//! Every variant names the operation and the record it touched so a failure
//! can be diagnosed from the log line alone.

/// Errors that can occur during credential storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Failed to connect to or migrate the backend.
    #[error("failed to open credential store: {reason}")]
    Open { reason: String },

    /// Failed to read a credential.
    #[error("failed to read credential '{project_id}/{provider}': {reason}")]
    Read {
        project_id: String,
        provider: String,
        reason: String,
    },

    /// Failed to write a credential.
    #[error("failed to write credential '{project_id}/{provider}': {reason}")]
    Write {
        project_id: String,
        provider: String,
        reason: String,
    },

    /// Failed to delete a credential.
    #[error("failed to delete credential '{project_id}/{provider}': {reason}")]
    Delete {
        project_id: String,
        provider: String,
        reason: String,
    },

    /// Failed to list a project's credentials.
    #[error("failed to list credentials for project '{project_id}': {reason}")]
    List { project_id: String, reason: String },
}
