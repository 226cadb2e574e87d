//! Provider error types.

use thiserror::Error;

use crate::provider::ContextKind;

/// Errors reported by a [`crate::CryptoProvider`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Key text could not be parsed, or the passphrase did not unlock it.
    #[error("invalid key: {reason}")]
    InvalidKey {
        /// Description of the key failure.
        reason: String,
    },

    /// Address text is not a valid hop address.
    #[error("invalid address: {reason}")]
    InvalidAddress {
        /// Description of the address failure.
        reason: String,
    },

    /// The context does not support the requested operation.
    #[error("wrong context capability: expected {expected}, got {actual}")]
    WrongCapability {
        /// Capability the operation needs.
        expected: ContextKind,
        /// Capability the context actually has.
        actual: ContextKind,
    },

    /// Encryption failed.
    #[error("encryption failed")]
    Encryption,

    /// Decryption failed (wrong key, truncated or tampered ciphertext).
    #[error("decryption failed (authentication tag mismatch or malformed input)")]
    Decryption,

    /// Signing failed.
    #[error("signing failed")]
    Signing,

    /// The OS entropy source failed.
    #[error("entropy source failed: {reason}")]
    Entropy {
        /// Description of the entropy failure.
        reason: String,
    },

    /// Key derivation failed.
    #[error("key derivation failed: {reason}")]
    KeyDerivation {
        /// Description of the derivation failure.
        reason: String,
    },
}

impl ProviderError {
    pub(crate) fn invalid_key(reason: impl Into<String>) -> Self {
        Self::InvalidKey { reason: reason.into() }
    }

    pub(crate) fn invalid_address(reason: impl Into<String>) -> Self {
        Self::InvalidAddress { reason: reason.into() }
    }
}
