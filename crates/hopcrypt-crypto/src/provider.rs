//! Provider abstraction.
//!
//! The registry and onion layers never touch key material directly. They ask
//! a [`CryptoProvider`] to build an opaque context from key text and then
//! hand that context back for every operation.
//!
//! # Invariants
//!
//! - A context has exactly one capability, fixed at creation
//! - Operations on a context of the wrong capability fail, never fall back
//! - Failures never yield partial output

use std::fmt;

use crate::{address::Address, error::ProviderError};

/// Capability of a cryptographic context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextKind {
    /// Encrypts to a public key.
    Encryption,
    /// Decrypts with a private key.
    Decryption,
    /// Signs with a private key.
    Signature,
    /// Verifies signatures against a public key.
    Verification,
}

impl ContextKind {
    /// All capabilities, in declaration order.
    pub const ALL: [Self; 4] = [Self::Encryption, Self::Decryption, Self::Signature, Self::Verification];

    /// Returns true if contexts of this kind are built from a private key.
    pub fn requires_private_key(self) -> bool {
        matches!(self, Self::Decryption | Self::Signature)
    }
}

impl fmt::Display for ContextKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Encryption => "encryption",
            Self::Decryption => "decryption",
            Self::Signature => "signature",
            Self::Verification => "verification",
        };
        f.write_str(name)
    }
}

/// Supplier of cryptographic contexts and the operations that use them.
///
/// Implementations must be shareable across threads: the registry holds one
/// provider and calls it from whichever thread issued the request.
pub trait CryptoProvider: Send + Sync + 'static {
    /// Opaque context type. Dropping it releases the key material.
    type Context: Send + Sync + 'static;

    /// Build an encryption context from public key text.
    fn create_encryption_context(&self, public_key: &str) -> Result<Self::Context, ProviderError>;

    /// Build a decryption context from private key text and its passphrase.
    fn create_decryption_context(
        &self,
        private_key: &str,
        passphrase: &str,
    ) -> Result<Self::Context, ProviderError>;

    /// Build a signature context from private key text and its passphrase.
    fn create_signature_context(
        &self,
        private_key: &str,
        passphrase: &str,
    ) -> Result<Self::Context, ProviderError>;

    /// Build a verification context from public key text.
    fn create_verification_context(&self, public_key: &str)
    -> Result<Self::Context, ProviderError>;

    /// Build a context of the given kind.
    ///
    /// `passphrase` is ignored for public-key kinds.
    fn create_context(
        &self,
        kind: ContextKind,
        key: &str,
        passphrase: &str,
    ) -> Result<Self::Context, ProviderError> {
        match kind {
            ContextKind::Encryption => self.create_encryption_context(key),
            ContextKind::Decryption => self.create_decryption_context(key, passphrase),
            ContextKind::Signature => self.create_signature_context(key, passphrase),
            ContextKind::Verification => self.create_verification_context(key),
        }
    }

    /// Encrypt `plaintext` with an encryption context.
    fn encrypt(&self, context: &Self::Context, plaintext: &[u8]) -> Result<Vec<u8>, ProviderError>;

    /// Decrypt `ciphertext` with a decryption context.
    fn decrypt(&self, context: &Self::Context, ciphertext: &[u8])
    -> Result<Vec<u8>, ProviderError>;

    /// Sign `data` with a signature context, returning the signed blob.
    fn sign(&self, context: &Self::Context, data: &[u8]) -> Result<Vec<u8>, ProviderError>;

    /// Verify a signed blob with a verification context.
    ///
    /// Returns false for bad signatures and for contexts of the wrong kind.
    fn verify(&self, context: &Self::Context, signed: &[u8]) -> bool;

    /// Size in bytes of the key material behind public key text.
    fn public_key_size(&self, public_key: &str) -> Result<usize, ProviderError>;

    /// Routing address of the identity behind public key text.
    fn address_of(&self, public_key: &str) -> Result<Address, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn private_key_kinds() {
        assert!(ContextKind::Decryption.requires_private_key());
        assert!(ContextKind::Signature.requires_private_key());
        assert!(!ContextKind::Encryption.requires_private_key());
        assert!(!ContextKind::Verification.requires_private_key());
    }

    #[test]
    fn kind_display() {
        let names: Vec<String> = ContextKind::ALL.iter().map(ToString::to_string).collect();
        assert_eq!(names, ["encryption", "decryption", "signature", "verification"]);
    }
}
