//! Hop addresses.
//!
//! An address is 32 bytes, written as 64 lowercase hex characters. Addresses
//! are derived from public key material with SHA-256, so a relay can check
//! that a key and an address belong together. The all-zero address is
//! reserved as the terminal marker inside onion layers.

use std::{fmt, str::FromStr};

use sha2::{Digest, Sha256};

use crate::error::ProviderError;

/// Size of an address in bytes.
pub const ADDRESS_SIZE: usize = 32;

/// Routing address of one hop.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; ADDRESS_SIZE]);

impl Address {
    /// Marker carried by the innermost layer: "no next hop".
    pub const TERMINAL: Self = Self([0u8; ADDRESS_SIZE]);

    /// Wrap raw address bytes.
    pub const fn from_bytes(bytes: [u8; ADDRESS_SIZE]) -> Self {
        Self(bytes)
    }

    /// Derive the address of the given public key material.
    pub fn derive(public_key_material: &[u8]) -> Self {
        Self(Sha256::digest(public_key_material).into())
    }

    /// Raw address bytes.
    pub const fn as_bytes(&self) -> &[u8; ADDRESS_SIZE] {
        &self.0
    }

    /// Returns true if this is the terminal marker.
    pub fn is_terminal(&self) -> bool {
        *self == Self::TERMINAL
    }

    /// Lowercase hex form.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse the 64-character lowercase hex form.
    pub fn from_hex(text: &str) -> Result<Self, ProviderError> {
        if text.len() != ADDRESS_SIZE * 2 {
            return Err(ProviderError::invalid_address(format!(
                "expected {} hex characters, got {}",
                ADDRESS_SIZE * 2,
                text.len()
            )));
        }
        if !text.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)) {
            return Err(ProviderError::invalid_address("address must be lowercase hex"));
        }

        let mut bytes = [0u8; ADDRESS_SIZE];
        hex::decode_to_slice(text, &mut bytes)
            .map_err(|e| ProviderError::invalid_address(e.to_string()))?;
        Ok(Self(bytes))
    }
}

impl FromStr for Address {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", &self.to_hex()[..16])
    }
}
