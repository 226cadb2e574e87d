//! Bundled provider: X25519 sealed boxes and Ed25519 signatures.

use std::fmt;

use ed25519_dalek::{SIGNATURE_LENGTH, Signature, Signer, SigningKey, VerifyingKey};
use x25519_dalek::{PublicKey, StaticSecret};

use crate::{
    address::Address,
    error::ProviderError,
    keys::{self, KeyPair, PUBLIC_KEY_SIZE, PublicKeyMaterial},
    provider::{ContextKind, CryptoProvider},
    sealed_box::{self, NONCE_SIZE},
};

/// Context built by [`StandardProvider`].
///
/// Secret-bearing variants zeroize their key material on drop.
pub enum StandardContext {
    /// Seals to a recipient's X25519 key.
    Encryption(PublicKey),
    /// Opens sealed boxes with an X25519 static secret.
    Decryption(StaticSecret),
    /// Signs with an Ed25519 key.
    Signature(SigningKey),
    /// Verifies Ed25519 signatures.
    Verification(VerifyingKey),
}

impl StandardContext {
    /// Capability of this context.
    pub fn kind(&self) -> ContextKind {
        match self {
            Self::Encryption(_) => ContextKind::Encryption,
            Self::Decryption(_) => ContextKind::Decryption,
            Self::Signature(_) => ContextKind::Signature,
            Self::Verification(_) => ContextKind::Verification,
        }
    }

    fn wrong(&self, expected: ContextKind) -> ProviderError {
        ProviderError::WrongCapability { expected, actual: self.kind() }
    }
}

impl fmt::Debug for StandardContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StandardContext").field("kind", &self.kind()).finish_non_exhaustive()
    }
}

/// Provider over [`KeyPair`] identities.
///
/// Signed blobs are `message || signature (64)`. Encryption output is a
/// [`sealed_box`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardProvider;

impl StandardProvider {
    /// Create the provider.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl CryptoProvider for StandardProvider {
    type Context = StandardContext;

    fn create_encryption_context(&self, public_key: &str) -> Result<Self::Context, ProviderError> {
        let material = PublicKeyMaterial::from_armored(public_key)?;
        Ok(StandardContext::Encryption(material.encryption_key()))
    }

    fn create_decryption_context(
        &self,
        private_key: &str,
        passphrase: &str,
    ) -> Result<Self::Context, ProviderError> {
        let pair = KeyPair::from_armored(private_key, passphrase)?;
        Ok(StandardContext::Decryption(pair.decryption_secret()?))
    }

    fn create_signature_context(
        &self,
        private_key: &str,
        passphrase: &str,
    ) -> Result<Self::Context, ProviderError> {
        let pair = KeyPair::from_armored(private_key, passphrase)?;
        Ok(StandardContext::Signature(pair.signing_key()?))
    }

    fn create_verification_context(
        &self,
        public_key: &str,
    ) -> Result<Self::Context, ProviderError> {
        let material = PublicKeyMaterial::from_armored(public_key)?;
        Ok(StandardContext::Verification(material.verifying_key()?))
    }

    fn encrypt(&self, context: &Self::Context, plaintext: &[u8]) -> Result<Vec<u8>, ProviderError> {
        let StandardContext::Encryption(recipient) = context else {
            return Err(context.wrong(ContextKind::Encryption));
        };

        let mut ephemeral = [0u8; 32];
        let mut nonce = [0u8; NONCE_SIZE];
        keys::fill_random(&mut ephemeral)?;
        keys::fill_random(&mut nonce)?;

        sealed_box::seal(recipient, plaintext, ephemeral, nonce)
    }

    fn decrypt(
        &self,
        context: &Self::Context,
        ciphertext: &[u8],
    ) -> Result<Vec<u8>, ProviderError> {
        let StandardContext::Decryption(secret) = context else {
            return Err(context.wrong(ContextKind::Decryption));
        };
        sealed_box::open(secret, ciphertext)
    }

    fn sign(&self, context: &Self::Context, data: &[u8]) -> Result<Vec<u8>, ProviderError> {
        let StandardContext::Signature(signing) = context else {
            return Err(context.wrong(ContextKind::Signature));
        };

        let signature = signing.try_sign(data).map_err(|_| ProviderError::Signing)?;
        let mut signed = Vec::with_capacity(data.len() + SIGNATURE_LENGTH);
        signed.extend_from_slice(data);
        signed.extend_from_slice(&signature.to_bytes());
        Ok(signed)
    }

    fn verify(&self, context: &Self::Context, signed: &[u8]) -> bool {
        let StandardContext::Verification(verifying) = context else {
            return false;
        };
        let Some(split) = signed.len().checked_sub(SIGNATURE_LENGTH) else {
            return false;
        };

        let (message, signature_bytes) = signed.split_at(split);
        let Ok(signature_bytes) = <[u8; SIGNATURE_LENGTH]>::try_from(signature_bytes) else {
            return false;
        };
        verifying.verify_strict(message, &Signature::from_bytes(&signature_bytes)).is_ok()
    }

    fn public_key_size(&self, public_key: &str) -> Result<usize, ProviderError> {
        PublicKeyMaterial::from_armored(public_key).map(|_| PUBLIC_KEY_SIZE)
    }

    fn address_of(&self, public_key: &str) -> Result<Address, ProviderError> {
        PublicKeyMaterial::from_armored(public_key).map(|material| material.address())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(seed: u8) -> KeyPair {
        KeyPair::from_seed([seed; 32]).unwrap()
    }

    #[test]
    fn encrypt_then_decrypt() {
        let provider = StandardProvider::new();
        let pair = identity(1);

        let enc = provider.create_encryption_context(&pair.public_key_armored()).unwrap();
        let dec = provider.create_decryption_context(&pair.private_key_armored(), "").unwrap();

        let ciphertext = provider.encrypt(&enc, b"relay me").unwrap();
        assert_eq!(provider.decrypt(&dec, &ciphertext).unwrap(), b"relay me");
    }

    #[test]
    fn sign_then_verify() {
        let provider = StandardProvider::new();
        let pair = identity(2);

        let sig = provider.create_signature_context(&pair.private_key_armored(), "").unwrap();
        let ver = provider.create_verification_context(&pair.public_key_armored()).unwrap();

        let signed = provider.sign(&sig, b"statement").unwrap();
        assert_eq!(&signed[..9], b"statement");
        assert!(provider.verify(&ver, &signed));

        let mut forged = signed.clone();
        forged[0] ^= 1;
        assert!(!provider.verify(&ver, &forged));
        assert!(!provider.verify(&ver, &signed[..SIGNATURE_LENGTH - 1]));
    }

    #[test]
    fn wrong_capability_is_rejected() {
        let provider = StandardProvider::new();
        let pair = identity(3);
        let enc = provider.create_encryption_context(&pair.public_key_armored()).unwrap();

        assert_eq!(
            provider.decrypt(&enc, b"x").unwrap_err(),
            ProviderError::WrongCapability {
                expected: ContextKind::Decryption,
                actual: ContextKind::Encryption
            }
        );
        assert!(provider.sign(&enc, b"x").is_err());
        assert!(!provider.verify(&enc, &[0u8; 80]));
    }

    #[test]
    fn garbage_key_text_fails_creation() {
        let provider = StandardProvider::new();
        for kind in ContextKind::ALL {
            assert!(provider.create_context(kind, "not a key", "").is_err(), "{kind}");
        }
    }

    #[test]
    fn key_size_and_address() {
        let provider = StandardProvider::new();
        let pair = identity(4);
        let text = pair.public_key_armored();

        assert_eq!(provider.public_key_size(&text).unwrap(), PUBLIC_KEY_SIZE);
        assert_eq!(provider.address_of(&text).unwrap(), pair.address());
        assert!(provider.public_key_size("garbage").is_err());
    }
}
