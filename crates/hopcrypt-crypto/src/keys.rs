//! Identity key material.
//!
//! An identity is a single 32-byte seed. HKDF-SHA256 expands it into an
//! X25519 static secret (for sealed boxes) and an Ed25519 signing key, so one
//! private key text backs both decryption and signature contexts and one
//! public key text backs both encryption and verification contexts.
//!
//! Public key material is `x25519_public (32) || ed25519_public (32)`.
//!
//! Passphrase-protected private keys use Argon2id to derive a wrapping key
//! and XChaCha20-Poly1305 to wrap the seed:
//!
//! ```text
//! [ version (1) | memory KiB (4) | iterations (4) | parallelism (4)
//!   | salt (16) | nonce (24) | wrapped seed + tag (48) ]
//! ```

use argon2::{Algorithm, Argon2, Params, Version};
use chacha20poly1305::{
    Key, XChaCha20Poly1305, XNonce,
    aead::{Aead, KeyInit, Payload},
};
use ed25519_dalek::{SigningKey, VerifyingKey};
use hkdf::Hkdf;
use sha2::Sha256;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroizing;

use crate::{
    address::Address,
    armor::{self, ENCRYPTED_PRIVATE_KEY_LABEL, PRIVATE_KEY_LABEL, PUBLIC_KEY_LABEL},
    error::ProviderError,
};

/// Size of an identity seed.
pub const SEED_SIZE: usize = 32;

/// Size of public key material.
pub const PUBLIC_KEY_SIZE: usize = 64;

/// HKDF salt for identity expansion (domain separation).
const IDENTITY_SALT: &[u8] = b"hopcrypt identity v1";

/// Associated data of wrapped private keys.
const KEY_WRAP_AAD: &[u8] = b"hopcrypt key wrap v1";

const WRAP_VERSION: u8 = 1;
const SALT_SIZE: usize = 16;
const WRAP_NONCE_SIZE: usize = 24;
const WRAP_HEADER_SIZE: usize = 1 + 4 + 4 + 4 + SALT_SIZE + WRAP_NONCE_SIZE;
const WRAPPED_SEED_SIZE: usize = SEED_SIZE + 16;

/// Upper bound on Argon2 memory accepted from a key blob (1 GiB).
const MAX_KDF_MEMORY_KIB: u32 = 1 << 20;

/// Upper bound on Argon2 passes accepted from a key blob.
const MAX_KDF_ITERATIONS: u32 = 16;

/// Upper bound on Argon2 lanes accepted from a key blob.
const MAX_KDF_PARALLELISM: u32 = 16;

/// Argon2id cost parameters for passphrase protection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    /// Memory cost in KiB.
    pub memory_kib: u32,
    /// Number of passes.
    pub iterations: u32,
    /// Degree of parallelism.
    pub parallelism: u32,
}

impl KdfParams {
    /// Minimal parameters. Only suitable for tests.
    pub const fn insecure_fast() -> Self {
        Self { memory_kib: 8, iterations: 1, parallelism: 1 }
    }

    // Name of the first cost parameter above its cap.
    fn excessive_cost(&self) -> Option<&'static str> {
        if self.memory_kib > MAX_KDF_MEMORY_KIB {
            Some("memory")
        } else if self.iterations > MAX_KDF_ITERATIONS {
            Some("iteration")
        } else if self.parallelism > MAX_KDF_PARALLELISM {
            Some("parallelism")
        } else {
            None
        }
    }

    fn argon2(&self) -> Result<Argon2<'static>, ProviderError> {
        let params = Params::new(self.memory_kib, self.iterations, self.parallelism, Some(32))
            .map_err(|e| ProviderError::KeyDerivation { reason: e.to_string() })?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self { memory_kib: 64 * 1024, iterations: 3, parallelism: 1 }
    }
}

/// Public half of an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKeyMaterial {
    encryption: [u8; 32],
    verification: [u8; 32],
}

impl PublicKeyMaterial {
    /// Parse raw public key material.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProviderError> {
        if bytes.len() != PUBLIC_KEY_SIZE {
            return Err(ProviderError::invalid_key(format!(
                "public key must be {PUBLIC_KEY_SIZE} bytes, got {}",
                bytes.len()
            )));
        }

        let mut encryption = [0u8; 32];
        let mut verification = [0u8; 32];
        encryption.copy_from_slice(&bytes[..32]);
        verification.copy_from_slice(&bytes[32..]);

        let material = Self { encryption, verification };
        // reject keys that can never verify anything
        material.verifying_key()?;
        Ok(material)
    }

    /// Parse armored public key text.
    pub fn from_armored(text: &str) -> Result<Self, ProviderError> {
        let bytes = armor::decode(PUBLIC_KEY_LABEL, text)?;
        Self::from_bytes(&bytes)
    }

    /// Raw public key material.
    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_SIZE] {
        let mut out = [0u8; PUBLIC_KEY_SIZE];
        out[..32].copy_from_slice(&self.encryption);
        out[32..].copy_from_slice(&self.verification);
        out
    }

    /// Armored public key text.
    pub fn to_armored(&self) -> String {
        armor::encode(PUBLIC_KEY_LABEL, &self.to_bytes())
    }

    /// Routing address of this identity.
    pub fn address(&self) -> Address {
        Address::derive(&self.to_bytes())
    }

    /// X25519 key that sealed boxes are addressed to.
    pub fn encryption_key(&self) -> PublicKey {
        PublicKey::from(self.encryption)
    }

    /// Ed25519 key that checks this identity's signatures.
    pub fn verifying_key(&self) -> Result<VerifyingKey, ProviderError> {
        VerifyingKey::from_bytes(&self.verification)
            .map_err(|e| ProviderError::invalid_key(e.to_string()))
    }
}

/// Full identity: secret seed plus derived public material.
pub struct KeyPair {
    seed: Zeroizing<[u8; SEED_SIZE]>,
    public: PublicKeyMaterial,
}

impl KeyPair {
    /// Generate a fresh identity from OS entropy.
    pub fn generate() -> Result<Self, ProviderError> {
        let mut seed = [0u8; SEED_SIZE];
        fill_random(&mut seed)?;
        Self::from_seed(seed)
    }

    /// Rebuild an identity from its seed.
    pub fn from_seed(seed: [u8; SEED_SIZE]) -> Result<Self, ProviderError> {
        let seed = Zeroizing::new(seed);
        let (secret, signing) = expand_seed(&seed)?;
        let public = PublicKeyMaterial {
            encryption: PublicKey::from(&secret).to_bytes(),
            verification: signing.verifying_key().to_bytes(),
        };
        Ok(Self { seed, public })
    }

    /// Parse armored private key text.
    ///
    /// Plain private keys ignore `passphrase`; protected ones require it.
    pub fn from_armored(text: &str, passphrase: &str) -> Result<Self, ProviderError> {
        match armor::label(text) {
            Some(PRIVATE_KEY_LABEL) => {
                let bytes = Zeroizing::new(armor::decode(PRIVATE_KEY_LABEL, text)?);
                let seed: [u8; SEED_SIZE] = bytes.as_slice().try_into().map_err(|_| {
                    ProviderError::invalid_key(format!("private key must be {SEED_SIZE} bytes"))
                })?;
                Self::from_seed(seed)
            },
            Some(ENCRYPTED_PRIVATE_KEY_LABEL) => {
                let blob = armor::decode(ENCRYPTED_PRIVATE_KEY_LABEL, text)?;
                Self::from_seed(unwrap_seed(&blob, passphrase)?)
            },
            Some(other) => Err(ProviderError::invalid_key(format!("not a private key: {other}"))),
            None => Err(ProviderError::invalid_key("missing armor header")),
        }
    }

    /// Public half of this identity.
    pub fn public(&self) -> &PublicKeyMaterial {
        &self.public
    }

    /// Routing address of this identity.
    pub fn address(&self) -> Address {
        self.public.address()
    }

    /// Armored public key text.
    pub fn public_key_armored(&self) -> String {
        self.public.to_armored()
    }

    /// Armored private key text without passphrase protection.
    pub fn private_key_armored(&self) -> String {
        armor::encode(PRIVATE_KEY_LABEL, self.seed.as_ref())
    }

    /// Armored private key text protected by `passphrase`.
    pub fn encrypted_private_key_armored(
        &self,
        passphrase: &str,
        params: &KdfParams,
    ) -> Result<String, ProviderError> {
        let mut salt = [0u8; SALT_SIZE];
        let mut nonce = [0u8; WRAP_NONCE_SIZE];
        fill_random(&mut salt)?;
        fill_random(&mut nonce)?;

        let blob = wrap_seed(&self.seed, passphrase, params, salt, nonce)?;
        Ok(armor::encode(ENCRYPTED_PRIVATE_KEY_LABEL, &blob))
    }

    pub(crate) fn decryption_secret(&self) -> Result<StaticSecret, ProviderError> {
        expand_seed(&self.seed).map(|(secret, _)| secret)
    }

    pub(crate) fn signing_key(&self) -> Result<SigningKey, ProviderError> {
        expand_seed(&self.seed).map(|(_, signing)| signing)
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair").field("address", &self.address()).finish_non_exhaustive()
    }
}

/// Fill `buffer` from the OS entropy source.
pub(crate) fn fill_random(buffer: &mut [u8]) -> Result<(), ProviderError> {
    getrandom::fill(buffer).map_err(|e| ProviderError::Entropy { reason: e.to_string() })
}

fn expand_seed(seed: &[u8; SEED_SIZE]) -> Result<(StaticSecret, SigningKey), ProviderError> {
    let hk = Hkdf::<Sha256>::new(Some(IDENTITY_SALT), seed);

    let mut x25519 = Zeroizing::new([0u8; 32]);
    let mut ed25519 = Zeroizing::new([0u8; 32]);
    hk.expand(b"x25519", x25519.as_mut())
        .map_err(|e| ProviderError::KeyDerivation { reason: e.to_string() })?;
    hk.expand(b"ed25519", ed25519.as_mut())
        .map_err(|e| ProviderError::KeyDerivation { reason: e.to_string() })?;

    Ok((StaticSecret::from(*x25519), SigningKey::from_bytes(&ed25519)))
}

fn wrap_seed(
    seed: &[u8; SEED_SIZE],
    passphrase: &str,
    params: &KdfParams,
    salt: [u8; SALT_SIZE],
    nonce: [u8; WRAP_NONCE_SIZE],
) -> Result<Vec<u8>, ProviderError> {
    if let Some(cost) = params.excessive_cost() {
        return Err(ProviderError::KeyDerivation {
            reason: format!("{cost} cost exceeds what keys may carry"),
        });
    }
    let key = wrapping_key(passphrase, params, &salt)?;
    let cipher = XChaCha20Poly1305::new(Key::from_slice(key.as_ref()));
    let wrapped = cipher
        .encrypt(XNonce::from_slice(&nonce), Payload { msg: seed, aad: KEY_WRAP_AAD })
        .map_err(|_| ProviderError::Encryption)?;

    let mut blob = Vec::with_capacity(WRAP_HEADER_SIZE + wrapped.len());
    blob.push(WRAP_VERSION);
    blob.extend_from_slice(&params.memory_kib.to_be_bytes());
    blob.extend_from_slice(&params.iterations.to_be_bytes());
    blob.extend_from_slice(&params.parallelism.to_be_bytes());
    blob.extend_from_slice(&salt);
    blob.extend_from_slice(&nonce);
    blob.extend_from_slice(&wrapped);
    Ok(blob)
}

fn unwrap_seed(blob: &[u8], passphrase: &str) -> Result<[u8; SEED_SIZE], ProviderError> {
    if blob.len() != WRAP_HEADER_SIZE + WRAPPED_SEED_SIZE {
        return Err(ProviderError::invalid_key("encrypted private key has wrong length"));
    }
    if blob[0] != WRAP_VERSION {
        return Err(ProviderError::invalid_key(format!(
            "unsupported key wrap version {}",
            blob[0]
        )));
    }

    let read_u32 = |at: usize| u32::from_be_bytes([blob[at], blob[at + 1], blob[at + 2], blob[at + 3]]);
    let params =
        KdfParams { memory_kib: read_u32(1), iterations: read_u32(5), parallelism: read_u32(9) };
    if let Some(cost) = params.excessive_cost() {
        return Err(ProviderError::invalid_key(format!("key derivation {cost} cost too large")));
    }

    let salt = &blob[13..13 + SALT_SIZE];
    let nonce = &blob[13 + SALT_SIZE..WRAP_HEADER_SIZE];
    let wrapped = &blob[WRAP_HEADER_SIZE..];

    let key = wrapping_key(passphrase, &params, salt)?;
    let cipher = XChaCha20Poly1305::new(Key::from_slice(key.as_ref()));
    let seed = Zeroizing::new(
        cipher
            .decrypt(XNonce::from_slice(nonce), Payload { msg: wrapped, aad: KEY_WRAP_AAD })
            .map_err(|_| ProviderError::invalid_key("wrong passphrase or corrupted private key"))?,
    );

    seed.as_slice()
        .try_into()
        .map_err(|_| ProviderError::invalid_key("unwrapped seed has wrong length"))
}

fn wrapping_key(
    passphrase: &str,
    params: &KdfParams,
    salt: &[u8],
) -> Result<Zeroizing<[u8; 32]>, ProviderError> {
    let mut key = Zeroizing::new([0u8; 32]);
    params
        .argon2()?
        .hash_password_into(passphrase.as_bytes(), salt, key.as_mut())
        .map_err(|e| ProviderError::KeyDerivation { reason: e.to_string() })?;
    Ok(key)
}
