//! Startup key provisioning.
//!
//! The encryption key is read once from the process environment and
//! validated before any cipher exists. The raw bytes of the variable are the
//! key: there is no hex or base64 decoding step, so values encrypted by
//! existing deployments keep opening.

use std::ffi::OsString;
use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::KeyError;

/// Length of an AES-256 key in bytes.
pub const KEY_LEN: usize = 32;

/// Default environment variable holding the key.
pub const ENCRYPTION_KEY_VAR: &str = "ENCRYPTION_KEY";

/// A validated 256-bit key, zeroized on drop.
///
/// Only obtainable through [`KeyProvisioner`] or [`SymmetricKey::from_slice`],
/// so a value of this type always holds exactly [`KEY_LEN`] bytes.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey([u8; KEY_LEN]);

impl SymmetricKey {
    /// Validate raw key material.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::InvalidKeyLength`] unless `bytes` is exactly 32
    /// bytes long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, KeyError> {
        let arr: [u8; KEY_LEN] = bytes
            .try_into()
            .map_err(|_| KeyError::InvalidKeyLength {
                actual: bytes.len(),
            })?;
        Ok(Self(arr))
    }

    /// Borrow the raw key bytes.
    ///
    /// The caller must not log or persist these bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymmetricKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Loads the symmetric key from an environment variable.
#[derive(Debug, Clone)]
pub struct KeyProvisioner {
    var: String,
}

impl Default for KeyProvisioner {
    fn default() -> Self {
        Self::from_env()
    }
}

impl KeyProvisioner {
    /// Provisioner reading [`ENCRYPTION_KEY_VAR`].
    #[must_use]
    pub fn from_env() -> Self {
        Self::with_var(ENCRYPTION_KEY_VAR)
    }

    /// Provisioner reading a custom variable name.
    #[must_use]
    pub fn with_var(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    /// Name of the variable this provisioner reads.
    #[must_use]
    pub fn var(&self) -> &str {
        &self.var
    }

    /// Read and validate the key. Call once at startup and abort on error.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::MissingKey`] if the variable is unset or empty and
    /// [`KeyError::InvalidKeyLength`] if its value is not 32 bytes.
    pub fn load_key(&self) -> Result<SymmetricKey, KeyError> {
        let raw = std::env::var_os(&self.var).map(OsString::into_encoded_bytes);
        let key = self.validate(raw.as_deref());
        if let Err(ref e) = key {
            tracing::error!(var = %self.var, error = %e, "encryption key rejected");
        }
        key
    }

    /// Validate a raw value as if it had been read from the variable.
    ///
    /// # Errors
    ///
    /// Same as [`load_key`](Self::load_key).
    pub fn validate(&self, raw: Option<&[u8]>) -> Result<SymmetricKey, KeyError> {
        match raw {
            None | Some([]) => Err(KeyError::MissingKey {
                var: self.var.clone(),
            }),
            Some(bytes) => SymmetricKey::from_slice(bytes),
        }
    }
}
