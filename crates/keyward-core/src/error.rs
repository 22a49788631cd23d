//! Error types for `keyward-core`.
//!
//! Key errors are startup-fatal. Cipher errors fail a single `seal` or `open`
//! call. No variant ever carries key material or plaintext, only lengths and
//! operation descriptions.

/// Errors from loading the symmetric key at startup.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum KeyError {
    /// The key variable is absent or empty.
    #[error("encryption key is missing: set {var} to exactly 32 bytes")]
    MissingKey { var: String },

    /// The key is present but not 32 bytes long.
    #[error("encryption key must be exactly 32 bytes, got {actual}")]
    InvalidKeyLength { actual: usize },
}

/// Errors from constructing or using a [`SecretCipher`](crate::cipher::SecretCipher).
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CipherError {
    /// The key handed to the cipher is not 32 bytes long.
    #[error("cipher key must be exactly 32 bytes, got {actual}")]
    InvalidKeyLength { actual: usize },

    /// The OS random source could not produce a nonce.
    #[error("secure randomness unavailable: {reason}")]
    RandomnessUnavailable { reason: String },

    /// Plaintext exceeds the AES-GCM message length limit.
    #[error("plaintext of {len} bytes exceeds the AES-GCM message limit")]
    PlaintextTooLarge { len: usize },

    /// The sealed value is not valid base64.
    #[error("sealed value is not valid base64")]
    MalformedEncoding,

    /// The decoded value is too short to hold a nonce.
    #[error("sealed value too short: expected at least {expected} bytes, got {actual}")]
    TruncatedCiphertext { expected: usize, actual: usize },

    /// Tag verification failed (wrong key, corrupted, or tampered ciphertext).
    #[error("authentication failed")]
    AuthenticationFailed,
}

impl CipherError {
    /// Whether this error came from `open` rejecting its input.
    ///
    /// Callers outside the core report all of these as one "cannot decrypt"
    /// failure so the subtype never reaches a client.
    #[must_use]
    pub const fn is_open_failure(&self) -> bool {
        matches!(
            self,
            Self::MalformedEncoding | Self::TruncatedCiphertext { .. } | Self::AuthenticationFailed
        )
    }

    /// Short machine-readable kind, safe for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidKeyLength { .. } => "invalid_key_length",
            Self::RandomnessUnavailable { .. } => "randomness_unavailable",
            Self::PlaintextTooLarge { .. } => "plaintext_too_large",
            Self::MalformedEncoding => "malformed_encoding",
            Self::TruncatedCiphertext { .. } => "truncated_ciphertext",
            Self::AuthenticationFailed => "authentication_failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_failures_are_grouped() {
        assert!(CipherError::MalformedEncoding.is_open_failure());
        assert!(CipherError::AuthenticationFailed.is_open_failure());
        assert!(
            CipherError::TruncatedCiphertext {
                expected: 12,
                actual: 3
            }
            .is_open_failure()
        );
        assert!(
            !CipherError::RandomnessUnavailable {
                reason: "boom".to_owned()
            }
            .is_open_failure()
        );
        assert!(!CipherError::InvalidKeyLength { actual: 16 }.is_open_failure());
    }

    #[test]
    fn key_length_message_reports_actual_length() {
        let err = KeyError::InvalidKeyLength { actual: 24 };
        assert_eq!(
            err.to_string(),
            "encryption key must be exactly 32 bytes, got 24"
        );
    }

    #[test]
    fn missing_key_message_names_variable() {
        let err = KeyError::MissingKey {
            var: "ENCRYPTION_KEY".to_owned(),
        };
        assert!(err.to_string().contains("ENCRYPTION_KEY"));
    }
}
