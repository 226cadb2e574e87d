//! Fuzz target for onion layer peeling
//!
//! Peeling is the one path that parses bytes an attacker controls end to end.
//!
//! # Strategy
//!
//! - Raw bytes: Arbitrary input handed straight to `unseal`
//! - Tampered onions: A genuine onion sealed over fixture hops with one byte
//!   flipped
//! - Flattened form: The same bytes parsed by `Peeled::from_bytes`
//!
//! # Invariants
//!
//! - NEVER panic on malformed input
//! - A tampered onion NEVER peels
//! - An untouched onion peels to exactly the sealed route
//! - `from_bytes` and `into_bytes` agree on every input they accept

#![no_main]

use arbitrary::Arbitrary;
use hopcrypt_core::{
    onion::{self, Hop, LENGTH_PREFIX_SIZE, MAX_LAYER_SIZE},
    CryptoProvider, Peeled,
};
use hopcrypt_crypto::StandardProvider;
use hopcrypt_harness::fixtures;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Clone, Arbitrary)]
enum FuzzInput {
    Raw(Vec<u8>),
    Tampered {
        route: [u8; 3],
        len: u8,
        plaintext: Vec<u8>,
        position: u16,
        mask: u8,
    },
}

fuzz_target!(|input: FuzzInput| {
    let provider = StandardProvider::new();

    match input {
        FuzzInput::Raw(bytes) => {
            let first = fixtures::identity(0);
            let Ok(context) = provider.create_decryption_context(&first.private_key, first.passphrase)
            else {
                return;
            };
            let _ = onion::unseal(&provider, &context, &bytes);

            if let Ok(peeled) = Peeled::from_bytes(&bytes) {
                assert_eq!(peeled.into_bytes(), bytes, "flattened form must round trip");
            }
        },

        FuzzInput::Tampered { route, len, plaintext, position, mask } => {
            let route = &route[..usize::from(len % 3) + 1];
            let identities: Vec<_> = route.iter().map(|id| fixtures::identity(*id)).collect();
            let hops: Vec<Hop<'_>> = identities
                .iter()
                .map(|fixture| Hop { public_key: &fixture.public_key, address: fixture.address })
                .collect();

            let Ok(mut sealed) =
                onion::seal(&provider, &plaintext, &hops, MAX_LAYER_SIZE + LENGTH_PREFIX_SIZE)
            else {
                return;
            };
            let first = identities[0];
            let Ok(context) = provider.create_decryption_context(&first.private_key, first.passphrase)
            else {
                return;
            };

            let index = usize::from(position) % sealed.len();
            sealed[index] ^= mask;
            let peeled = onion::unseal(&provider, &context, &sealed);

            if mask != 0 {
                assert!(peeled.is_err(), "tampered byte {index} still peeled");
                return;
            }
            match peeled {
                Ok(Peeled::Delivered { plaintext: delivered }) => {
                    assert_eq!(route.len(), 1);
                    assert_eq!(delivered, plaintext);
                },
                Ok(Peeled::Forward { next_address, .. }) => {
                    assert!(route.len() > 1);
                    assert_eq!(next_address, identities[1].address);
                },
                Err(e) => panic!("untouched onion failed to peel: {e}"),
            }
        },
    }
});
