//! hopcrypt Cryptographic Primitives
//!
//! This crate provides the cryptographic primitive provider that the hopcrypt
//! context registry and onion protocol delegate to.
//!
//! # Design
//!
//! The [`CryptoProvider`] trait is the only seam the rest of the workspace
//! sees. It builds opaque contexts from key text and runs encrypt, decrypt,
//! sign and verify against them. [`StandardProvider`] is the bundled
//! implementation:
//!
//! ```text
//! 32-byte identity seed
//!        │
//!        ▼
//! HKDF-SHA256 ──► X25519 static secret   (encrypt / decrypt)
//!             └─► Ed25519 signing key    (sign / verify)
//! ```
//!
//! The sealing functions in [`sealed_box`] are pure: random bytes for the
//! ephemeral key and nonce are passed in by the caller. Only the provider
//! itself touches the OS entropy source, which keeps the primitives
//! deterministic under test.
//!
//! # Security Properties
//!
//! - Confidentiality: every encryption uses a fresh ephemeral X25519 key
//! - Integrity: XChaCha20-Poly1305 rejects any modified byte
//! - Key hygiene: secret material is zeroized on drop
//! - Passphrase protection: Argon2id wraps private keys at rest

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod address;
mod armor;
pub mod error;
pub mod keys;
pub mod provider;
pub mod sealed_box;
pub mod standard;

pub use address::{ADDRESS_SIZE, Address};
pub use error::ProviderError;
pub use keys::{KdfParams, KeyPair, PUBLIC_KEY_SIZE, PublicKeyMaterial, SEED_SIZE};
pub use provider::{ContextKind, CryptoProvider};
pub use sealed_box::SEALED_OVERHEAD;
pub use standard::{StandardContext, StandardProvider};
