//! Shared application state for Keyward server.
//!
//! A single [`AppState`] is constructed at startup and shared across all
//! Axum handlers via `Arc`. The cipher inside it is the one built from the
//! provisioned key; handlers never construct their own.

use std::sync::Arc;

use reqwest::Url;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use keyward_core::SecretCipher;
use keyward_storage::CredentialStore;

use crate::config::ServerConfig;
use crate::payments::PaymentStatusProvider;

/// Shared application state passed to all HTTP handlers.
pub struct AppState {
    /// Seals credentials on write and opens them on read.
    pub cipher: Arc<SecretCipher>,
    /// Sealed credential storage.
    pub store: Arc<dyn CredentialStore>,
    /// Payment status source.
    pub payments: Arc<dyn PaymentStatusProvider>,
    /// Client for proxied upstream requests.
    pub http: reqwest::Client,
    /// Upstream base URL (None disables the proxy routes).
    pub backend_url: Option<Url>,
    /// Identity attached to admin-authenticated requests.
    pub admin_email: String,
    admin_token_digest: [u8; 32],
}

impl AppState {
    /// Assemble the state from its collaborators and the server config.
    ///
    /// # Errors
    ///
    /// Returns an error if the upstream HTTP client cannot be built.
    pub fn new(
        cipher: Arc<SecretCipher>,
        store: Arc<dyn CredentialStore>,
        payments: Arc<dyn PaymentStatusProvider>,
        config: &ServerConfig,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.proxy_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            cipher,
            store,
            payments,
            http,
            backend_url: config.backend_url.clone(),
            admin_email: config.admin.email.clone(),
            admin_token_digest: Sha256::digest(config.admin.token.as_bytes()).into(),
        })
    }

    /// Constant-time check of a presented bearer token against the admin token.
    #[must_use]
    pub fn verify_admin_token(&self, presented: &str) -> bool {
        let digest: [u8; 32] = Sha256::digest(presented.as_bytes()).into();
        digest.ct_eq(&self.admin_token_digest).into()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("store", &self.store.backend_name())
            .field("backend_url", &self.backend_url)
            .finish_non_exhaustive()
    }
}
