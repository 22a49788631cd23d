//! Keyward HTTP server.
//!
//! Wires the secret cipher, credential store, and HTTP routes into an Axum
//! application. Credentials are sealed on write, opened on read, and handed
//! to the backend service only through the proxy routes.

pub mod config;
pub mod error;
pub mod middleware;
pub mod payments;
pub mod routes;
pub mod state;

pub use routes::build_router;
