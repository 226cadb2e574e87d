//! Registry behaviour through the service facade

use std::{collections::HashSet, sync::Mutex, thread};

use hopcrypt_core::{ContextKind, CoreError, CryptoService, Handle, ServiceConfig};
use hopcrypt_crypto::{CryptoProvider, KeyPair, StandardProvider};
use proptest::prelude::*;

fn service() -> CryptoService<StandardProvider> {
    CryptoService::new(StandardProvider::new())
}

fn identity() -> KeyPair {
    KeyPair::generate().expect("entropy available")
}

#[test]
fn handles_are_unique_and_start_at_zero() {
    let service = service();
    let public_key = identity().public_key_armored();

    let handles: Vec<Handle> =
        (0..32).map(|_| service.create_encryption_context(&public_key).unwrap()).collect();

    let unique: HashSet<Handle> = handles.iter().copied().collect();
    assert_eq!(unique.len(), handles.len());
    assert_eq!(handles[0], Handle::from_raw(0));
    assert!(handles.iter().all(|handle| !handle.is_none()));
}

#[test]
fn free_exactly_once() {
    let service = service();
    let handle = service.create_encryption_context(&identity().public_key_armored()).unwrap();

    assert!(service.free_context(handle));
    assert!(!service.free_context(handle));
    assert!(service.registry().is_empty());
}

#[test]
fn freeing_unknown_handle_leaves_live_contexts_usable() {
    let service = service();
    let pair = identity();
    let live = service.create_encryption_context(&pair.public_key_armored()).unwrap();

    assert!(!service.free_context(Handle::from_raw(9_999)));
    assert!(!service.free_context(Handle::NONE));

    assert!(service.encrypt(live, b"still here").is_ok());
    assert_eq!(service.registry().len(), 1);
}

#[test]
fn every_operation_on_freed_handle_is_invalid() {
    let service = service();
    let pair = identity();
    let handle = service.create_decryption_context(&pair.private_key_armored(), "").unwrap();
    service.free_context(handle);

    let invalid = Err(CoreError::InvalidHandle { handle });
    assert_eq!(service.encrypt(handle, b"x"), invalid);
    assert_eq!(service.decrypt(handle, b"x"), invalid);
    assert_eq!(service.sign(handle, b"x"), invalid);
    assert_eq!(service.verify(handle, b"x"), Err(CoreError::InvalidHandle { handle }));
    assert_eq!(service.unseal_onion(handle, b"x"), Err(CoreError::InvalidHandle { handle }));
}

#[test]
fn wrong_capability_is_primitive_failure() {
    let service = service();
    let pair = identity();
    let handle = service.create_encryption_context(&pair.public_key_armored()).unwrap();

    let err = service.decrypt(handle, b"ciphertext").unwrap_err();
    assert!(matches!(err, CoreError::Primitive { operation: "decrypt", .. }));
    assert_eq!(service.verify(handle, b"signed"), Ok(false));
}

#[test]
fn failed_create_does_not_advance_counter() {
    let service = service();

    let err = service.create_encryption_context("not a key").unwrap_err();
    assert!(matches!(
        err,
        CoreError::ContextCreation { kind: ContextKind::Encryption, .. }
    ));
    assert!(!err.is_fatal());

    let handle = service.create_encryption_context(&identity().public_key_armored()).unwrap();
    assert_eq!(handle, Handle::from_raw(0));
}

#[test]
fn exhausted_handle_space_is_fatal() {
    let config = ServiceConfig::default().with_handle_limit(2);
    let service = CryptoService::with_config(StandardProvider::new(), config);
    let public_key = identity().public_key_armored();

    let first = service.create_encryption_context(&public_key).unwrap();
    service.create_encryption_context(&public_key).unwrap();
    service.free_context(first);

    let err = service.create_encryption_context(&public_key).unwrap_err();
    assert_eq!(err, CoreError::HandlesExhausted { limit: 2 });
    assert!(err.is_fatal());
}

#[test]
fn concurrent_create_and_free_never_duplicates_handles() {
    let service = service();
    let public_key = identity().public_key_armored();
    let issued = Mutex::new(Vec::new());

    thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                for round in 0..50 {
                    let handle = service.create_encryption_context(&public_key).unwrap();
                    issued.lock().unwrap().push(handle);
                    if round % 2 == 0 {
                        assert!(service.free_context(handle));
                    }
                }
            });
        }
    });

    let issued = issued.into_inner().unwrap();
    let unique: HashSet<Handle> = issued.iter().copied().collect();
    assert_eq!(unique.len(), 8 * 50);

    // Every odd round left its context live; nothing else is dangling.
    assert_eq!(service.registry().len(), 8 * 25);
    for handle in service.registry().handles() {
        assert!(service.encrypt(handle, b"live").is_ok());
    }
}

#[test]
fn lookup_keeps_context_alive_across_free() {
    let service = service();
    let pair = identity();
    let handle = service.create_encryption_context(&pair.public_key_armored()).unwrap();

    let context = service.registry().lookup(handle).unwrap();
    assert!(service.free_context(handle));

    let ciphertext = service.provider().encrypt(&context, b"late");
    assert!(ciphertext.is_ok());
}

#[test]
fn transient_helpers_leave_registry_empty() {
    let service = service();
    let pair = identity();

    let signed = service.sign_with(&pair.private_key_armored(), "", b"transient").unwrap();
    assert!(service.registry().is_empty());
    assert_eq!(service.verify_from(&pair.public_key_armored(), &signed), Ok(true));
    let ciphertext = service.encrypt_for(&pair.public_key_armored(), b"transient").unwrap();
    assert!(service.registry().is_empty());

    let err = service.sign_with("garbage", "", b"transient").unwrap_err();
    assert!(matches!(err, CoreError::ContextCreation { kind: ContextKind::Signature, .. }));
    assert!(service.registry().is_empty());

    // Each successful helper call used one handle number.
    let next = service.create_decryption_context(&pair.private_key_armored(), "").unwrap();
    assert_eq!(next, Handle::from_raw(3));
    assert_eq!(service.decrypt(next, &ciphertext).unwrap(), b"transient");
}

proptest! {
    #[test]
    fn free_pattern_matches_issued_set(frees in prop::collection::vec(0i64..24, 0..48)) {
        let service = service();
        let public_key = KeyPair::from_seed([3u8; 32]).unwrap().public_key_armored();

        for _ in 0..16 {
            service.create_encryption_context(&public_key).unwrap();
        }

        let mut live: HashSet<i64> = (0..16).collect();
        for raw in frees {
            let expected = live.remove(&raw);
            prop_assert_eq!(service.free_context(Handle::from_raw(raw)), expected);
        }
        prop_assert_eq!(service.registry().len(), live.len());
    }
}
