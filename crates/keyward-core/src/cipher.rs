//! Authenticated encryption of stored credentials.
//!
//! [`SecretCipher`] binds one AES-256-GCM context to the process key and is
//! shared read-only by every request handler. It is the only place in the
//! workspace that creates or opens ciphertext.
//!
//! # Format
//!
//! A [`SealedSecret`] is `base64(nonce (12 bytes) || ciphertext || tag (16 bytes))`
//! using the standard padded alphabet. The nonce is drawn fresh from `OsRng`
//! for every seal; there is no associated data.

use std::fmt;

use aes_gcm::aead::rand_core::{CryptoRng, RngCore};
use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::CipherError;
use crate::key::{KEY_LEN, SymmetricKey};

/// Nonce length for AES-256-GCM (96 bits).
pub const NONCE_LEN: usize = 12;

/// Authentication tag length for AES-256-GCM (128 bits).
pub const TAG_LEN: usize = 16;

/// Base64 text holding `nonce || ciphertext || tag`.
///
/// Opaque to everything except [`SecretCipher::open`]. Safe to store in a
/// text column or JSON field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SealedSecret(String);

impl SealedSecret {
    /// Borrow the encoded text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Take the encoded text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for SealedSecret {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for SealedSecret {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SealedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// AES-256-GCM bound to a single key.
///
/// Immutable after construction and `Send + Sync`; wrap it in an `Arc` and
/// share it. `seal` and `open` keep no state between calls.
#[derive(Clone)]
pub struct SecretCipher {
    aead: Aes256Gcm,
}

impl fmt::Debug for SecretCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretCipher")
            .field("algorithm", &"AES-256-GCM")
            .finish_non_exhaustive()
    }
}

impl SecretCipher {
    /// Build the cipher from a provisioned key.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::InvalidKeyLength`] if the key is not 32 bytes.
    pub fn new(key: &SymmetricKey) -> Result<Self, CipherError> {
        Self::from_key_bytes(key.as_bytes())
    }

    /// Build the cipher from raw key bytes, re-checking the length.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::InvalidKeyLength`] unless `key` is exactly 32
    /// bytes long.
    pub fn from_key_bytes(key: &[u8]) -> Result<Self, CipherError> {
        if key.len() != KEY_LEN {
            return Err(CipherError::InvalidKeyLength { actual: key.len() });
        }
        let aead = Aes256Gcm::new_from_slice(key)
            .map_err(|_| CipherError::InvalidKeyLength { actual: key.len() })?;
        Ok(Self { aead })
    }

    /// Encrypt and authenticate `plaintext` under a fresh random nonce.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::RandomnessUnavailable`] if the OS RNG fails.
    pub fn seal(&self, plaintext: &[u8]) -> Result<SealedSecret, CipherError> {
        self.seal_with_rng(&mut OsRng, plaintext)
    }

    pub(crate) fn seal_with_rng<R>(
        &self,
        rng: &mut R,
        plaintext: &[u8],
    ) -> Result<SealedSecret, CipherError>
    where
        R: RngCore + CryptoRng,
    {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rng.try_fill_bytes(&mut nonce_bytes)
            .map_err(|e| CipherError::RandomnessUnavailable {
                reason: e.to_string(),
            })?;

        let ciphertext = self
            .aead
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
            .map_err(|_| CipherError::PlaintextTooLarge {
                len: plaintext.len(),
            })?;

        let mut combined = Vec::with_capacity(NONCE_LEN.saturating_add(ciphertext.len()));
        combined.extend_from_slice(&nonce_bytes);
        combined.extend_from_slice(&ciphertext);

        Ok(SealedSecret(STANDARD.encode(combined)))
    }

    /// Verify and decrypt a value produced by [`seal`](Self::seal).
    ///
    /// # Errors
    ///
    /// - [`CipherError::MalformedEncoding`] if `sealed` is not base64.
    /// - [`CipherError::TruncatedCiphertext`] if it decodes to fewer than 12 bytes.
    /// - [`CipherError::AuthenticationFailed`] if the tag does not verify,
    ///   whether from a different key or altered bytes.
    pub fn open(&self, sealed: impl AsRef<str>) -> Result<Zeroizing<Vec<u8>>, CipherError> {
        let combined = STANDARD
            .decode(sealed.as_ref())
            .map_err(|_| CipherError::MalformedEncoding)?;

        if combined.len() < NONCE_LEN {
            return Err(CipherError::TruncatedCiphertext {
                expected: NONCE_LEN,
                actual: combined.len(),
            });
        }

        let (nonce_bytes, ciphertext) = combined.split_at(NONCE_LEN);
        self.aead
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map(Zeroizing::new)
            .map_err(|_| CipherError::AuthenticationFailed)
    }
}
