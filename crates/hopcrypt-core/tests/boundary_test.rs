//! Process-wide entry points
//!
//! The boundary shares one service across every test in this binary, so no
//! test assumes particular handle values or an empty registry.

use hopcrypt_core::{Address, CoreError, boundary};
use hopcrypt_crypto::{ADDRESS_SIZE, KeyPair, PUBLIC_KEY_SIZE};

#[test]
fn failed_creation_returns_sentinel() {
    assert_eq!(boundary::create_encryption_context("garbage"), -1);
    assert_eq!(boundary::create_verification_context(""), -1);
    assert_eq!(boundary::create_decryption_context("garbage", ""), -1);
    assert_eq!(boundary::create_signature_context("garbage", "pw"), -1);
}

#[test]
fn handle_round_trip() {
    let pair = KeyPair::generate().unwrap();
    let enc = boundary::create_encryption_context(&pair.public_key_armored());
    let dec = boundary::create_decryption_context(&pair.private_key_armored(), "");
    assert!(enc >= 0 && dec >= 0);
    assert_ne!(enc, dec);

    let ciphertext = boundary::encrypt(enc, b"boundary").unwrap();
    assert_eq!(boundary::decrypt(dec, &ciphertext).unwrap(), b"boundary");

    assert!(boundary::free_context(enc));
    assert!(!boundary::free_context(enc));
    assert!(boundary::free_context(dec));
    assert!(matches!(boundary::encrypt(enc, b"x"), Err(CoreError::InvalidHandle { .. })));
    assert!(!boundary::free_context(-1));
}

#[test]
fn verify_separates_bad_signature_from_dead_handle() {
    let pair = KeyPair::generate().unwrap();
    let sig = boundary::create_signature_context(&pair.private_key_armored(), "");
    let ver = boundary::create_verification_context(&pair.public_key_armored());

    let signed = boundary::sign(sig, b"message").unwrap();
    let mut forged = signed.clone();
    forged[0] ^= 1;
    assert_eq!(boundary::verify(ver, &signed), Ok(true));
    assert_eq!(boundary::verify(ver, &forged), Ok(false));
    assert_eq!(boundary::verify_from(&pair.public_key_armored(), &signed), Ok(true));

    boundary::free_context(ver);
    assert!(matches!(boundary::verify(ver, &signed), Err(CoreError::InvalidHandle { .. })));
    assert!(matches!(
        boundary::verify(9_999_999, &signed),
        Err(CoreError::InvalidHandle { .. })
    ));
    assert!(matches!(
        boundary::verify_from("garbage", &signed),
        Err(CoreError::ContextCreation { .. })
    ));
    boundary::free_context(sig);
}

#[test]
fn transient_sign_verifies_against_public_key() {
    let pair = KeyPair::generate().unwrap();

    let signed = boundary::sign_with(&pair.private_key_armored(), "", b"one shot").unwrap();
    assert_eq!(boundary::verify_from(&pair.public_key_armored(), &signed), Ok(true));
    assert!(matches!(
        boundary::sign_with(&pair.public_key_armored(), "", b"one shot"),
        Err(CoreError::ContextCreation { .. })
    ));
}

#[test]
fn key_utilities() {
    let pair = KeyPair::generate().unwrap();
    let public_key = pair.public_key_armored();

    assert_eq!(boundary::public_key_size(&public_key), PUBLIC_KEY_SIZE as i64);
    assert_eq!(boundary::public_key_size("garbage"), -1);
    assert_eq!(boundary::address_of(&public_key).unwrap(), pair.address().to_hex());
}

#[test]
fn onion_bytes_carry_address_prefix() {
    let relay = KeyPair::generate().unwrap();
    let exit = KeyPair::generate().unwrap();
    let keys = [relay.public_key_armored(), exit.public_key_armored()];
    let key_refs: Vec<&str> = keys.iter().map(String::as_str).collect();
    let addresses = [relay.address().to_hex(), exit.address().to_hex()];
    let address_refs: Vec<&str> = addresses.iter().map(String::as_str).collect();

    let onion = boundary::seal_onion(b"exit payload", &key_refs, &address_refs).unwrap();

    let relay_handle = boundary::create_decryption_context(&relay.private_key_armored(), "");
    let forwarded = boundary::unseal_onion(relay_handle, &onion).unwrap();
    assert_eq!(&forwarded[..ADDRESS_SIZE], exit.address().as_bytes());

    let exit_handle = boundary::create_decryption_context(&exit.private_key_armored(), "");
    let delivered = boundary::unseal_onion(exit_handle, &forwarded[ADDRESS_SIZE..]).unwrap();
    assert_eq!(&delivered[..ADDRESS_SIZE], Address::TERMINAL.as_bytes());
    assert_eq!(&delivered[ADDRESS_SIZE..], b"exit payload");

    boundary::free_context(relay_handle);
    boundary::free_context(exit_handle);

    assert!(matches!(
        boundary::seal_onion(b"x", &key_refs, &address_refs[..1]),
        Err(CoreError::HopCountMismatch { keys: 2, addresses: 1 })
    ));
}

// Resident slots are process-wide, so their whole lifecycle runs in one test.
#[test]
fn resident_lifecycle() {
    let first = KeyPair::generate().unwrap();
    let second = KeyPair::generate().unwrap();

    assert!(boundary::init_decryption(&first.private_key_armored(), ""));
    assert!(boundary::init_decryption(&second.private_key_armored(), ""));
    assert!(boundary::init_signature(&first.private_key_armored(), ""));

    let ciphertext = boundary::encrypt_for(&first.public_key_armored(), b"resident").unwrap();
    assert_eq!(boundary::decrypt_resident(&ciphertext).unwrap(), b"resident");

    let signed = boundary::sign_resident(b"resident").unwrap();
    assert_eq!(boundary::verify_from(&first.public_key_armored(), &signed), Ok(true));

    let keys = [first.public_key_armored()];
    let key_refs: Vec<&str> = keys.iter().map(String::as_str).collect();
    let address = first.address().to_hex();
    let onion = boundary::seal_onion(b"last hop", &key_refs, &[address.as_str()]).unwrap();
    let delivered = boundary::unseal_resident(&onion).unwrap();
    assert_eq!(&delivered[ADDRESS_SIZE..], b"last hop");

    assert!(boundary::reset_decryption());
    assert!(boundary::reset_signature());
    assert!(matches!(
        boundary::decrypt_resident(&ciphertext),
        Err(CoreError::NotInitialized { .. })
    ));

    assert!(!boundary::init_decryption("garbage", ""));
    assert!(boundary::init_decryption(&second.private_key_armored(), ""));
    assert!(boundary::decrypt_resident(&ciphertext).is_err());
    assert!(boundary::reset_decryption());
}
