//! Keyward server entry point.
//!
//! Loads configuration, provisions the encryption key (aborting startup if it
//! is missing or malformed), builds the single shared cipher and the
//! credential store, then serves the Axum router with graceful shutdown.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use keyward_core::{KeyProvisioner, SecretCipher};
use keyward_storage::{CredentialStore, MemoryStore};

use keyward_server::build_router;
use keyward_server::config::ServerConfig;
use keyward_server::payments::MockPaymentStatus;
use keyward_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env().context("invalid server configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .json()
        .init();

    info!(bind_addr = %config.bind_addr, "Keyward starting");

    // Fail fast: nothing runs without a valid key.
    let provisioner = KeyProvisioner::from_env();
    let key = provisioner
        .load_key()
        .with_context(|| format!("failed to load encryption key from {}", provisioner.var()))?;
    let cipher = Arc::new(SecretCipher::new(&key).context("failed to initialise secret cipher")?);
    drop(key);
    info!("secret cipher ready");

    let store = build_store(&config).await?;
    info!(storage = store.backend_name(), "credential store ready");

    let state = Arc::new(
        AppState::new(cipher, store, Arc::new(MockPaymentStatus), &config)
            .context("failed to build HTTP client")?,
    );
    if state.backend_url.is_none() {
        info!("BACKEND_URL not set, proxy routes will return 503");
    }

    let app = build_router(state, &config.cors_origins);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.bind_addr))?;

    info!(addr = %config.bind_addr, "Keyward server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Keyward server stopped");
    Ok(())
}

/// Open the credential store selected by `DATABASE_URL`.
async fn build_store(config: &ServerConfig) -> anyhow::Result<Arc<dyn CredentialStore>> {
    match &config.database_url {
        None => {
            info!("using in-memory credential store (data will not persist)");
            Ok(Arc::new(MemoryStore::new()))
        }
        #[cfg(feature = "postgres-backend")]
        Some(url) => {
            info!("using PostgreSQL credential store");
            let store = keyward_storage::PostgresStore::connect(url)
                .await
                .context("failed to connect to PostgreSQL")?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "postgres-backend"))]
        Some(_) => {
            anyhow::bail!("DATABASE_URL is set but feature 'postgres-backend' is not enabled");
        }
    }
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };

    #[cfg(unix)]
    let terminate = async {
        if let Ok(mut sig) =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        {
            sig.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("shutdown signal received, stopping server");
}
