//! Process-wide entry points
//!
//! Plain-value functions over a single [`CryptoService`] backed by the
//! [`StandardProvider`], for callers that cannot hold Rust types across the
//! boundary. Handles cross as `i64`:
//!
//! - Creators return a handle, or `-1` when no context was created
//! - `free_context` and the `init_*` functions return `bool`
//! - Data operations return owned buffers or a [`CoreError`]
//! - `verify` and `verify_from` return the verdict or a [`CoreError`], so a
//!   handle that is not live is distinct from a bad signature
//!
//! Inputs are borrowed for the duration of the call and never retained.

use std::sync::LazyLock;

use hopcrypt_crypto::{ContextKind, StandardProvider};

use crate::{error::CoreError, handle::Handle, service::CryptoService};

static SERVICE: LazyLock<CryptoService<StandardProvider>> =
    LazyLock::new(|| CryptoService::new(StandardProvider::new()));

/// The process-wide service.
pub fn service() -> &'static CryptoService<StandardProvider> {
    &SERVICE
}

fn issue(result: Result<Handle, CoreError>) -> i64 {
    result.unwrap_or(Handle::NONE).as_raw()
}

/// Build a context of `kind`. Returns `-1` on failure.
pub fn create_context(kind: ContextKind, key: &str, passphrase: &str) -> i64 {
    issue(SERVICE.create_context(kind, key, passphrase))
}

/// Build an encryption context. Returns `-1` on failure.
pub fn create_encryption_context(public_key: &str) -> i64 {
    issue(SERVICE.create_encryption_context(public_key))
}

/// Build a decryption context. Returns `-1` on failure.
pub fn create_decryption_context(private_key: &str, passphrase: &str) -> i64 {
    issue(SERVICE.create_decryption_context(private_key, passphrase))
}

/// Build a signature context. Returns `-1` on failure.
pub fn create_signature_context(private_key: &str, passphrase: &str) -> i64 {
    issue(SERVICE.create_signature_context(private_key, passphrase))
}

/// Build a verification context. Returns `-1` on failure.
pub fn create_verification_context(public_key: &str) -> i64 {
    issue(SERVICE.create_verification_context(public_key))
}

/// Release a context. False if the handle was not live.
pub fn free_context(handle: i64) -> bool {
    SERVICE.free_context(Handle::from_raw(handle))
}

/// Encrypt with an encryption context.
pub fn encrypt(handle: i64, plaintext: &[u8]) -> Result<Vec<u8>, CoreError> {
    SERVICE.encrypt(Handle::from_raw(handle), plaintext)
}

/// Decrypt with a decryption context.
pub fn decrypt(handle: i64, ciphertext: &[u8]) -> Result<Vec<u8>, CoreError> {
    SERVICE.decrypt(Handle::from_raw(handle), ciphertext)
}

/// Sign with a signature context.
pub fn sign(handle: i64, data: &[u8]) -> Result<Vec<u8>, CoreError> {
    SERVICE.sign(Handle::from_raw(handle), data)
}

/// Verify with a verification context. `Ok(false)` for a bad signature.
pub fn verify(handle: i64, signed: &[u8]) -> Result<bool, CoreError> {
    SERVICE.verify(Handle::from_raw(handle), signed)
}

/// Encrypt once to `public_key` without keeping a context.
pub fn encrypt_for(public_key: &str, plaintext: &[u8]) -> Result<Vec<u8>, CoreError> {
    SERVICE.encrypt_for(public_key, plaintext)
}

/// Sign once with `private_key` without keeping a context.
pub fn sign_with(
    private_key: &str,
    passphrase: &str,
    data: &[u8],
) -> Result<Vec<u8>, CoreError> {
    SERVICE.sign_with(private_key, passphrase, data)
}

/// Verify once against `public_key` without keeping a context.
pub fn verify_from(public_key: &str, signed: &[u8]) -> Result<bool, CoreError> {
    SERVICE.verify_from(public_key, signed)
}

/// Seal an onion for parallel key and hex address lists, outermost first.
pub fn seal_onion(
    plaintext: &[u8],
    keys: &[&str],
    addresses: &[&str],
) -> Result<Vec<u8>, CoreError> {
    SERVICE.seal_onion(plaintext, keys, addresses)
}

/// Peel one layer with a decryption context.
///
/// Returns `next_address(32) || remaining onion`, or the all-zero address
/// followed by the plaintext at the final hop.
pub fn unseal_onion(handle: i64, onion: &[u8]) -> Result<Vec<u8>, CoreError> {
    SERVICE.unseal_onion(Handle::from_raw(handle), onion).map(|peeled| peeled.into_bytes())
}

/// Key material size behind public key text, or `-1` if it does not parse.
pub fn public_key_size(public_key: &str) -> i64 {
    SERVICE
        .public_key_size(public_key)
        .ok()
        .and_then(|size| i64::try_from(size).ok())
        .unwrap_or(-1)
}

/// Hex routing address of the identity behind public key text.
pub fn address_of(public_key: &str) -> Result<String, CoreError> {
    SERVICE.address_of(public_key).map(|address| address.to_hex())
}

/// Install the resident decryption identity.
///
/// True if an identity is resident after the call, whether or not this call
/// built it.
pub fn init_decryption(private_key: &str, passphrase: &str) -> bool {
    SERVICE.init_decryption(private_key, passphrase).is_ok()
}

/// Install the resident signature identity. Same contract as
/// [`init_decryption`].
pub fn init_signature(private_key: &str, passphrase: &str) -> bool {
    SERVICE.init_signature(private_key, passphrase).is_ok()
}

/// Drop the resident decryption identity.
pub fn reset_decryption() -> bool {
    SERVICE.reset_decryption()
}

/// Drop the resident signature identity.
pub fn reset_signature() -> bool {
    SERVICE.reset_signature()
}

/// Decrypt with the resident decryption identity.
pub fn decrypt_resident(ciphertext: &[u8]) -> Result<Vec<u8>, CoreError> {
    SERVICE.decrypt_resident(ciphertext)
}

/// Sign with the resident signature identity.
pub fn sign_resident(data: &[u8]) -> Result<Vec<u8>, CoreError> {
    SERVICE.sign_resident(data)
}

/// Peel one layer with the resident decryption identity. Output layout as in
/// [`unseal_onion`].
pub fn unseal_resident(onion: &[u8]) -> Result<Vec<u8>, CoreError> {
    SERVICE.unseal_resident(onion).map(|peeled| peeled.into_bytes())
}
