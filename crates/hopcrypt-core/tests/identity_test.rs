//! Resident identity lifecycle

use std::{
    sync::atomic::{AtomicUsize, Ordering},
    thread,
};

use hopcrypt_core::{CoreError, CryptoService, Established, Peeled, ResidentIdentities, Role};
use hopcrypt_crypto::{KdfParams, KeyPair, StandardProvider};

fn service() -> CryptoService<StandardProvider> {
    CryptoService::new(StandardProvider::new())
}

#[test]
fn init_is_idempotent() {
    let service = service();
    let first = KeyPair::from_seed([1; 32]).unwrap();
    let second = KeyPair::from_seed([2; 32]).unwrap();

    assert_eq!(service.init_decryption(&first.private_key_armored(), ""), Ok(Established::Created));
    assert_eq!(
        service.init_decryption(&second.private_key_armored(), ""),
        Ok(Established::AlreadyPresent)
    );

    // The first identity stays resident.
    let ciphertext = service.encrypt_for(&first.public_key_armored(), b"to first").unwrap();
    assert_eq!(service.decrypt_resident(&ciphertext).unwrap(), b"to first");

    let ciphertext = service.encrypt_for(&second.public_key_armored(), b"to second").unwrap();
    assert!(service.decrypt_resident(&ciphertext).is_err());
}

#[test]
fn failed_init_leaves_slot_empty() {
    let service = service();
    let pair = KeyPair::generate().unwrap();
    let protected = pair.encrypted_private_key_armored("hunter2", &KdfParams::insecure_fast()).unwrap();

    assert!(service.init_signature(&protected, "wrong").is_err());
    assert!(!service.is_initialized(Role::Signature));

    assert_eq!(service.init_signature(&protected, "hunter2"), Ok(Established::Created));
    assert!(service.is_initialized(Role::Signature));
}

#[test]
fn resident_operations_require_init() {
    let service = service();

    let not_decrypt = Err(CoreError::NotInitialized { role: Role::Decryption });
    assert_eq!(service.decrypt_resident(b"x"), not_decrypt);
    assert_eq!(
        service.sign_resident(b"x"),
        Err(CoreError::NotInitialized { role: Role::Signature })
    );
    assert_eq!(
        service.unseal_resident(b"x"),
        Err(CoreError::NotInitialized { role: Role::Decryption })
    );
}

#[test]
fn resident_sign_verifies_transiently() {
    let service = service();
    let pair = KeyPair::generate().unwrap();
    service.init_signature(&pair.private_key_armored(), "").unwrap();

    let signed = service.sign_resident(b"announcement").unwrap();
    assert_eq!(service.verify_from(&pair.public_key_armored(), &signed), Ok(true));

    let other = KeyPair::generate().unwrap();
    assert_eq!(service.verify_from(&other.public_key_armored(), &signed), Ok(false));
    assert!(service.registry().is_empty());
}

#[test]
fn resident_unseal_peels_own_layer() {
    let service = service();
    let relay = KeyPair::from_seed([5; 32]).unwrap();
    let exit = KeyPair::from_seed([6; 32]).unwrap();
    service.init_decryption(&relay.private_key_armored(), "").unwrap();

    let keys = [relay.public_key_armored(), exit.public_key_armored()];
    let addresses = [relay.address().to_hex(), exit.address().to_hex()];
    let onion = service.seal_onion(b"inner", &keys, &addresses).unwrap();

    let peeled = service.unseal_resident(&onion).unwrap();
    assert_eq!(peeled.next_address(), Some(exit.address()));
    assert!(matches!(peeled, Peeled::Forward { .. }));
}

#[test]
fn reset_allows_rotation() {
    let service = service();
    let old = KeyPair::from_seed([7; 32]).unwrap();
    let new = KeyPair::from_seed([8; 32]).unwrap();

    assert!(!service.reset_decryption());
    service.init_decryption(&old.private_key_armored(), "").unwrap();
    assert!(service.reset_decryption());
    assert!(!service.is_initialized(Role::Decryption));

    assert_eq!(service.init_decryption(&new.private_key_armored(), ""), Ok(Established::Created));
    let ciphertext = service.encrypt_for(&new.public_key_armored(), b"rotated").unwrap();
    assert_eq!(service.decrypt_resident(&ciphertext).unwrap(), b"rotated");

    assert!(!service.reset_signature());
}

#[test]
fn concurrent_first_callers_build_one_context() {
    let identities: ResidentIdentities<usize> = ResidentIdentities::new();
    let built = AtomicUsize::new(0);

    let outcomes: Vec<Established> = thread::scope(|scope| {
        let workers: Vec<_> = (0..16)
            .map(|i| {
                let identities = &identities;
                let built = &built;
                scope.spawn(move || {
                    identities
                        .establish(Role::Decryption, || {
                            built.fetch_add(1, Ordering::SeqCst);
                            Ok(i)
                        })
                        .unwrap()
                })
            })
            .collect();
        workers.into_iter().map(|worker| worker.join().unwrap()).collect()
    });

    assert_eq!(built.load(Ordering::SeqCst), 1);
    assert_eq!(outcomes.iter().filter(|o| **o == Established::Created).count(), 1);
}
