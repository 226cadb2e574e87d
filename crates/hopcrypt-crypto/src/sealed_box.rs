//! Anonymous sealed boxes to an X25519 public key.
//!
//! Each box carries its own ephemeral public key, so the recipient needs
//! nothing but its static secret to open it.
//!
//! Wire format:
//!
//! ```text
//! [ ephemeral public key (32) | nonce (24) | ciphertext + tag (len + 16) ]
//! ```
//!
//! The box key is `HKDF-SHA256(ikm = DH(ephemeral, recipient),
//! salt = ephemeral_pub || recipient_pub, info = BOX_KEY_INFO)`. Both public
//! keys are also bound as associated data.
//!
//! # Invariants
//!
//! - Pure: all randomness is supplied by the caller
//! - A non-contributory Diffie-Hellman result (low-order point) is rejected
//! - Any modified byte makes [`open`] fail

use chacha20poly1305::{
    Key, XChaCha20Poly1305, XNonce,
    aead::{Aead, KeyInit, Payload},
};
use hkdf::Hkdf;
use sha2::Sha256;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroizing;

use crate::error::ProviderError;

/// Size of the ephemeral public key prefix.
pub const EPHEMERAL_KEY_SIZE: usize = 32;

/// Size of the XChaCha20 nonce.
pub const NONCE_SIZE: usize = 24;

/// Size of the Poly1305 tag.
pub const TAG_SIZE: usize = 16;

/// Bytes a sealed box adds on top of its plaintext.
pub const SEALED_OVERHEAD: usize = EPHEMERAL_KEY_SIZE + NONCE_SIZE + TAG_SIZE;

/// HKDF info label (domain separation).
const BOX_KEY_INFO: &[u8] = b"hopcrypt sealed box v1";

/// Seal `plaintext` to `recipient`.
///
/// `ephemeral_secret` and `nonce` must be fresh random bytes for every call.
pub fn seal(
    recipient: &PublicKey,
    plaintext: &[u8],
    ephemeral_secret: [u8; 32],
    nonce: [u8; NONCE_SIZE],
) -> Result<Vec<u8>, ProviderError> {
    let ephemeral = StaticSecret::from(ephemeral_secret);
    let ephemeral_public = PublicKey::from(&ephemeral);

    let shared = ephemeral.diffie_hellman(recipient);
    if !shared.was_contributory() {
        return Err(ProviderError::Encryption);
    }

    let key = derive_box_key(shared.as_bytes(), &ephemeral_public, recipient)?;
    let aad = associated_data(&ephemeral_public, recipient);

    let cipher = XChaCha20Poly1305::new(Key::from_slice(key.as_ref()));
    let ciphertext = cipher
        .encrypt(XNonce::from_slice(&nonce), Payload { msg: plaintext, aad: &aad })
        .map_err(|_| ProviderError::Encryption)?;

    let mut out = Vec::with_capacity(EPHEMERAL_KEY_SIZE + NONCE_SIZE + ciphertext.len());
    out.extend_from_slice(ephemeral_public.as_bytes());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Open a sealed box with the recipient's static secret.
pub fn open(secret: &StaticSecret, sealed: &[u8]) -> Result<Vec<u8>, ProviderError> {
    if sealed.len() < SEALED_OVERHEAD {
        return Err(ProviderError::Decryption);
    }

    let (ephemeral_bytes, rest) = sealed.split_at(EPHEMERAL_KEY_SIZE);
    let (nonce, ciphertext) = rest.split_at(NONCE_SIZE);

    let mut ephemeral = [0u8; EPHEMERAL_KEY_SIZE];
    ephemeral.copy_from_slice(ephemeral_bytes);
    let ephemeral_public = PublicKey::from(ephemeral);
    let recipient = PublicKey::from(secret);

    let shared = secret.diffie_hellman(&ephemeral_public);
    if !shared.was_contributory() {
        return Err(ProviderError::Decryption);
    }

    let key = derive_box_key(shared.as_bytes(), &ephemeral_public, &recipient)?;
    let aad = associated_data(&ephemeral_public, &recipient);

    let cipher = XChaCha20Poly1305::new(Key::from_slice(key.as_ref()));
    cipher
        .decrypt(XNonce::from_slice(nonce), Payload { msg: ciphertext, aad: &aad })
        .map_err(|_| ProviderError::Decryption)
}

fn derive_box_key(
    shared: &[u8; 32],
    ephemeral: &PublicKey,
    recipient: &PublicKey,
) -> Result<Zeroizing<[u8; 32]>, ProviderError> {
    let salt = associated_data(ephemeral, recipient);
    let hk = Hkdf::<Sha256>::new(Some(&salt), shared);

    let mut key = Zeroizing::new([0u8; 32]);
    hk.expand(BOX_KEY_INFO, key.as_mut())
        .map_err(|e| ProviderError::KeyDerivation { reason: e.to_string() })?;
    Ok(key)
}

fn associated_data(ephemeral: &PublicKey, recipient: &PublicKey) -> [u8; 64] {
    let mut aad = [0u8; 64];
    aad[..32].copy_from_slice(ephemeral.as_bytes());
    aad[32..].copy_from_slice(recipient.as_bytes());
    aad
}
