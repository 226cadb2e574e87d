//! Onion sealing and peeling
//!
//! An onion is built innermost-first and peeled outermost-first. Every layer
//! is one frame:
//!
//! ```text
//! ┌────────────┬──────────────────────────────────────────────┐
//! │ len: u16 BE│ Encrypt(hop_i, next_address[32] || inner)     │
//! └────────────┴──────────────────────────────────────────────┘
//! ```
//!
//! `inner` is the next frame, or the plaintext for the last hop. The last
//! hop's `next_address` is [`Address::TERMINAL`], which tells the peeling node
//! it is the final recipient.
//!
//! # Invariants
//!
//! - `len` equals exactly the number of ciphertext bytes that follow
//! - No hop address is the terminal marker
//! - A failed seal or unseal yields no bytes

use hopcrypt_crypto::{ADDRESS_SIZE, Address, ContextKind, CryptoProvider};
use tracing::trace;

use crate::error::CoreError;

/// Bytes of the big-endian length prefix on each frame.
pub const LENGTH_PREFIX_SIZE: usize = 2;

/// Largest ciphertext a single frame can carry.
pub const MAX_LAYER_SIZE: usize = u16::MAX as usize;

/// One relay on the route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hop<'a> {
    /// Public key text the hop's layer is encrypted to.
    pub public_key: &'a str,
    /// Address the previous hop forwards to.
    pub address: Address,
}

/// Pair up parallel key and address lists, outermost hop first.
///
/// Fails before touching any key when the lists are empty or differ in
/// length, or when an address is malformed or the terminal marker.
pub fn hops_from_parts<'a, K, A>(keys: &'a [K], addresses: &[A]) -> Result<Vec<Hop<'a>>, CoreError>
where
    K: AsRef<str>,
    A: AsRef<str>,
{
    if keys.len() != addresses.len() {
        return Err(CoreError::HopCountMismatch { keys: keys.len(), addresses: addresses.len() });
    }
    if keys.is_empty() {
        return Err(CoreError::EmptyHopList);
    }

    keys.iter()
        .zip(addresses)
        .map(|(key, address)| {
            let address = Address::from_hex(address.as_ref())
                .map_err(|e| CoreError::InvalidAddress { reason: e.to_string() })?;
            if address.is_terminal() {
                return Err(terminal_hop());
            }
            Ok(Hop { public_key: key.as_ref(), address })
        })
        .collect()
}

/// Result of removing one layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Peeled {
    /// Forward `onion` to `next_address`.
    Forward {
        /// Hop that receives the remaining onion.
        next_address: Address,
        /// Remaining framed layers.
        onion: Vec<u8>,
    },
    /// This node is the final recipient.
    Delivered {
        /// The sealed plaintext.
        plaintext: Vec<u8>,
    },
}

impl Peeled {
    /// Flatten to `address(32) || payload`, using the terminal marker for a
    /// delivered plaintext.
    pub fn into_bytes(self) -> Vec<u8> {
        let (address, payload) = match self {
            Self::Forward { next_address, onion } => (next_address, onion),
            Self::Delivered { plaintext } => (Address::TERMINAL, plaintext),
        };
        let mut bytes = Vec::with_capacity(ADDRESS_SIZE + payload.len());
        bytes.extend_from_slice(address.as_bytes());
        bytes.extend_from_slice(&payload);
        bytes
    }

    /// Parse the flattened `address || payload` form.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CoreError> {
        let (address, payload) = split_address(bytes)?;
        Ok(Self::classify(address, payload.to_vec()))
    }

    /// Address the payload goes to next, or `None` when delivered.
    pub fn next_address(&self) -> Option<Address> {
        match self {
            Self::Forward { next_address, .. } => Some(*next_address),
            Self::Delivered { .. } => None,
        }
    }

    fn classify(address: Address, payload: Vec<u8>) -> Self {
        if address.is_terminal() {
            Self::Delivered { plaintext: payload }
        } else {
            Self::Forward { next_address: address, onion: payload }
        }
    }
}

/// Seal `plaintext` for `hops`, outermost hop first.
///
/// Each hop's key is loaded into a temporary encryption context that is
/// dropped as soon as its layer is built. `max_onion_size` bounds every frame,
/// prefix included.
pub fn seal<P>(
    provider: &P,
    plaintext: &[u8],
    hops: &[Hop<'_>],
    max_onion_size: usize,
) -> Result<Vec<u8>, CoreError>
where
    P: CryptoProvider,
{
    if hops.is_empty() {
        return Err(CoreError::EmptyHopList);
    }
    if hops.iter().any(|hop| hop.address.is_terminal()) {
        return Err(terminal_hop());
    }

    let limit = max_onion_size.min(MAX_LAYER_SIZE + LENGTH_PREFIX_SIZE);
    let next_addresses =
        hops.iter().skip(1).map(|hop| hop.address).chain(std::iter::once(Address::TERMINAL));

    let mut layers: Vec<(&Hop<'_>, Address)> = hops.iter().zip(next_addresses).collect();
    layers.reverse();

    let mut inner = plaintext.to_vec();
    for (depth, (hop, next_address)) in layers.into_iter().enumerate() {
        let mut body = Vec::with_capacity(ADDRESS_SIZE + inner.len());
        body.extend_from_slice(next_address.as_bytes());
        body.extend_from_slice(&inner);

        let context = provider
            .create_encryption_context(hop.public_key)
            .map_err(|source| CoreError::ContextCreation { kind: ContextKind::Encryption, source })?;
        let ciphertext = provider.encrypt(&context, &body).map_err(CoreError::primitive("encrypt"))?;

        inner = frame(&ciphertext, limit)?;
        trace!(depth, size = inner.len(), "onion layer sealed");
    }

    Ok(inner)
}

/// Remove the outer layer of `onion` with a decryption context.
pub fn unseal<P>(provider: &P, context: &P::Context, onion: &[u8]) -> Result<Peeled, CoreError>
where
    P: CryptoProvider,
{
    let ciphertext = unframe(onion)?;
    let body = provider.decrypt(context, ciphertext).map_err(CoreError::primitive("decrypt"))?;

    let (address, payload) = split_address(&body)?;
    let peeled = Peeled::classify(address, payload.to_vec());

    if let Peeled::Forward { onion: remaining, .. } = &peeled {
        unframe(remaining)?;
    }
    trace!(delivered = peeled.next_address().is_none(), "onion layer peeled");
    Ok(peeled)
}

fn terminal_hop() -> CoreError {
    CoreError::InvalidAddress { reason: "terminal marker cannot be a hop address".into() }
}

fn frame(ciphertext: &[u8], limit: usize) -> Result<Vec<u8>, CoreError> {
    let size = ciphertext.len() + LENGTH_PREFIX_SIZE;
    let len = u16::try_from(ciphertext.len())
        .ok()
        .filter(|_| size <= limit)
        .ok_or(CoreError::OnionTooLarge { size, limit })?;

    let mut framed = Vec::with_capacity(size);
    framed.extend_from_slice(&len.to_be_bytes());
    framed.extend_from_slice(ciphertext);
    Ok(framed)
}

fn unframe(onion: &[u8]) -> Result<&[u8], CoreError> {
    let Some((prefix, ciphertext)) = onion.split_first_chunk::<LENGTH_PREFIX_SIZE>() else {
        return Err(CoreError::malformed(format!(
            "{} bytes is shorter than the length prefix",
            onion.len()
        )));
    };

    let declared = usize::from(u16::from_be_bytes(*prefix));
    if declared != ciphertext.len() {
        return Err(CoreError::malformed(format!(
            "length prefix says {declared} bytes, {} follow",
            ciphertext.len()
        )));
    }
    Ok(ciphertext)
}

fn split_address(body: &[u8]) -> Result<(Address, &[u8]), CoreError> {
    let Some((address, payload)) = body.split_first_chunk::<ADDRESS_SIZE>() else {
        return Err(CoreError::malformed(format!(
            "layer body of {} bytes has no next address",
            body.len()
        )));
    };
    Ok((Address::from_bytes(*address), payload))
}
