//! Core library for Keyward.
//!
//! Holds the two pieces every credential path depends on: the startup
//! [`KeyProvisioner`](key::KeyProvisioner), which refuses to hand out anything
//! but a 32-byte key, and the [`SecretCipher`](cipher::SecretCipher), which
//! seals credentials before they reach storage and opens them on the way back.
//! This crate knows nothing about HTTP or storage backends.

pub mod cipher;
pub mod error;
pub mod key;

pub use cipher::{SealedSecret, SecretCipher};
pub use error::{CipherError, KeyError};
pub use key::{KeyProvisioner, SymmetricKey};
