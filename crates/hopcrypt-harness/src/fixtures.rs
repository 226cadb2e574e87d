//! Deterministic identity pool.
//!
//! Key generation and passphrase wrapping are done once per process. The last
//! identity is passphrase-protected so private-key paths through Argon2id are
//! exercised as well.

use std::sync::LazyLock;

use hopcrypt_crypto::{Address, KdfParams, KeyPair, SEED_SIZE};

/// Number of identities in the pool.
pub const POOL_SIZE: usize = 4;

/// Passphrase protecting the last identity.
pub const FIXTURE_PASSPHRASE: &str = "fixture passphrase";

/// Key text no provider accepts.
pub const GARBAGE_KEY: &str = "-----BEGIN HOPCRYPT PUBLIC KEY-----\n!!\n-----END HOPCRYPT PUBLIC KEY-----\n";

/// One identity with its key texts.
pub struct Fixture {
    /// Routing address.
    pub address: Address,
    /// Armored public key.
    pub public_key: String,
    /// Armored private key, protected for the last pool entry.
    pub private_key: String,
    /// Passphrase for `private_key`; empty when unprotected.
    pub passphrase: &'static str,
}

static POOL: LazyLock<Vec<Fixture>> = LazyLock::new(|| (0..POOL_SIZE).map(build).collect());

/// The identity at `index`, wrapping around the pool.
pub fn identity(index: u8) -> &'static Fixture {
    &POOL[usize::from(index) % POOL_SIZE]
}

/// Pool position `index` maps to.
pub fn pool_index(index: u8) -> u8 {
    index % POOL_SIZE as u8
}

#[allow(clippy::expect_used)]
fn build(index: usize) -> Fixture {
    let mut seed = [0u8; SEED_SIZE];
    seed[0] = 0xF0;
    seed[1] = index as u8;
    let pair = KeyPair::from_seed(seed).expect("fixture seed expands");

    let protected = index == POOL_SIZE - 1;
    let (private_key, passphrase) = if protected {
        let text = pair
            .encrypted_private_key_armored(FIXTURE_PASSPHRASE, &KdfParams::insecure_fast())
            .expect("fixture key wraps");
        (text, FIXTURE_PASSPHRASE)
    } else {
        (pair.private_key_armored(), "")
    };

    Fixture { address: pair.address(), public_key: pair.public_key_armored(), private_key, passphrase }
}
