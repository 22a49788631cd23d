//! Server configuration for Keyward.
//!
//! Loaded once from environment variables at startup. Unset variables take
//! defaults; a variable that is set but malformed is an error. The encryption
//! key is not read here: [`keyward_core::KeyProvisioner`] owns it.

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use axum::http::HeaderValue;
use reqwest::Url;

/// Minimum accepted length of the bootstrap admin token.
pub const MIN_ADMIN_TOKEN_LEN: usize = 16;

/// Errors from reading the server configuration.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is unset or empty.
    #[error("{var} must be set")]
    Missing { var: &'static str },

    /// A variable is set but cannot be used.
    #[error("invalid {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Bootstrap administrator account.
#[derive(Clone)]
pub struct AdminBootstrap {
    /// Identity recorded in logs for admin-authenticated requests.
    pub email: String,
    /// Bearer token accepted on `/v1/projects/*`.
    pub token: String,
}

impl fmt::Debug for AdminBootstrap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminBootstrap")
            .field("email", &self.email)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to.
    pub bind_addr: SocketAddr,
    /// PostgreSQL connection string. `None` selects the in-memory store.
    pub database_url: Option<String>,
    /// Origins allowed by CORS. Empty means no cross-origin access.
    pub cors_origins: Vec<HeaderValue>,
    /// Bootstrap administrator.
    pub admin: AdminBootstrap,
    /// Base URL of the backend service the proxy routes forward to.
    pub backend_url: Option<Url>,
    /// Log level filter (e.g., `info`, `debug`).
    pub log_level: String,
    /// Timeout for a single proxied upstream request.
    pub proxy_timeout: Duration,
}

impl ServerConfig {
    /// Load configuration from the process environment.
    ///
    /// Environment variables:
    /// - `KEYWARD_BIND_ADDR`: full bind address (overrides `PORT`)
    /// - `PORT`: port to bind on `0.0.0.0` (default: `127.0.0.1:8080`)
    /// - `DATABASE_URL`: PostgreSQL URL (optional; memory store otherwise)
    /// - `CORS_ORIGINS`: comma-separated allowed origins (optional)
    /// - `ADMIN_EMAIL`: bootstrap admin identity (default: `admin@localhost`)
    /// - `ADMIN_TOKEN`: bootstrap admin bearer token (required, 16+ chars)
    /// - `BACKEND_URL`: upstream base URL for proxy routes (optional)
    /// - `KEYWARD_LOG_LEVEL`: log filter (default: `info`)
    /// - `KEYWARD_PROXY_TIMEOUT_SECS`: upstream timeout (default: `30`)
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for the first missing or malformed variable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    ///
    /// # Errors
    ///
    /// Same as [`from_env`](Self::from_env).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let bind_addr = if let Some(addr) = get("KEYWARD_BIND_ADDR") {
            addr.trim().parse().map_err(|e| ConfigError::Invalid {
                var: "KEYWARD_BIND_ADDR",
                reason: format!("{e}"),
            })?
        } else if let Some(port) = get("PORT") {
            let port: u16 = port.trim().parse().map_err(|e| ConfigError::Invalid {
                var: "PORT",
                reason: format!("{e}"),
            })?;
            SocketAddr::from(([0, 0, 0, 0], port))
        } else {
            SocketAddr::from(([127, 0, 0, 1], 8080))
        };

        let database_url = get("DATABASE_URL");

        let cors_origins = get("CORS_ORIGINS")
            .map(|raw| parse_origins(&raw))
            .transpose()?
            .unwrap_or_default();

        let token = get("ADMIN_TOKEN").ok_or(ConfigError::Missing { var: "ADMIN_TOKEN" })?;
        if token.len() < MIN_ADMIN_TOKEN_LEN {
            return Err(ConfigError::Invalid {
                var: "ADMIN_TOKEN",
                reason: format!("must be at least {MIN_ADMIN_TOKEN_LEN} characters"),
            });
        }
        let admin = AdminBootstrap {
            email: get("ADMIN_EMAIL").unwrap_or_else(|| "admin@localhost".to_owned()),
            token,
        };

        let backend_url = get("BACKEND_URL")
            .map(|raw| parse_backend_url(raw.trim()))
            .transpose()?;

        let log_level = get("KEYWARD_LOG_LEVEL").unwrap_or_else(|| "info".to_owned());

        let proxy_timeout = match get("KEYWARD_PROXY_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|e| ConfigError::Invalid {
                    var: "KEYWARD_PROXY_TIMEOUT_SECS",
                    reason: format!("{e}"),
                })?;
                if secs == 0 {
                    return Err(ConfigError::Invalid {
                        var: "KEYWARD_PROXY_TIMEOUT_SECS",
                        reason: "must be greater than zero".to_owned(),
                    });
                }
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(30),
        };

        Ok(Self {
            bind_addr,
            database_url,
            cors_origins,
            admin,
            backend_url,
            log_level,
            proxy_timeout,
        })
    }
}

fn parse_origins(raw: &str) -> Result<Vec<HeaderValue>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(|origin| {
            HeaderValue::from_str(origin).map_err(|_| ConfigError::Invalid {
                var: "CORS_ORIGINS",
                reason: format!("'{origin}' is not a valid origin header value"),
            })
        })
        .collect()
}

fn parse_backend_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::Invalid {
        var: "BACKEND_URL",
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Invalid {
            var: "BACKEND_URL",
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }
    Ok(url)
}
