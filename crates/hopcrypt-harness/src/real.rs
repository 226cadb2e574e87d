//! Real system wrapper that mirrors [`ModelWorld`](crate::ModelWorld)'s
//! interface.

use hopcrypt_core::{CoreError, CryptoService, Established, Handle, Peeled, Role, ServiceConfig};
use hopcrypt_crypto::StandardProvider;

use crate::{
    fixtures::{self, Fixture, GARBAGE_KEY},
    model::{
        IdentityId, ModelHandle, ModelKind, ObservableState, Operation, OperationError,
        OperationResult, SmallMessage, route_len,
    },
};

/// Applies [`Operation`]s to a real [`CryptoService`].
pub struct RealWorld {
    service: CryptoService<StandardProvider>,
}

impl RealWorld {
    /// Service with default limits.
    pub fn new() -> Self {
        Self::with_config(ServiceConfig::default())
    }

    /// Service with explicit limits.
    pub fn with_config(config: ServiceConfig) -> Self {
        Self { service: CryptoService::with_config(StandardProvider::new(), config) }
    }

    /// The wrapped service.
    pub fn service(&self) -> &CryptoService<StandardProvider> {
        &self.service
    }

    /// Apply an operation and return the result.
    pub fn apply(&self, op: &Operation) -> OperationResult {
        match op {
            Operation::Create { kind, identity, valid_key } => {
                let (key, passphrase) = key_text(*kind, fixtures::identity(*identity), *valid_key);
                match self.service.create_context(kind.kind(), key, passphrase) {
                    Ok(handle) => OperationResult::Created(handle.as_raw()),
                    Err(e) => failure(&e),
                }
            },
            Operation::Free { handle } => {
                OperationResult::Freed(self.service.free_context(raw(*handle)))
            },
            Operation::EncryptThenDecrypt { encrypt, decrypt, message } => {
                self.encrypt_then_decrypt(*encrypt, *decrypt, *message)
            },
            Operation::SignThenVerify { sign, verify, message } => {
                let signed = match self.service.sign(raw(*sign), &message.to_bytes()) {
                    Ok(signed) => signed,
                    Err(e) => return failure(&e),
                };
                match self.service.verify(raw(*verify), &signed) {
                    Ok(valid) => OperationResult::Verified(valid),
                    Err(e) => failure(&e),
                }
            },
            Operation::SealThenPeel { route, len, peel, message } => {
                self.seal_then_peel(&route[..route_len(*len)], *peel, *message)
            },
            Operation::Init { decryption, identity, valid_key } => {
                let fixture = fixtures::identity(*identity);
                let (key, passphrase) = if *valid_key {
                    (fixture.private_key.as_str(), fixture.passphrase)
                } else {
                    (GARBAGE_KEY, "")
                };
                let result = if *decryption {
                    self.service.init_decryption(key, passphrase)
                } else {
                    self.service.init_signature(key, passphrase)
                };
                match result {
                    Ok(established) => {
                        OperationResult::Established(established == Established::Created)
                    },
                    Err(e) => failure(&e),
                }
            },
            Operation::Reset { decryption } => OperationResult::Reset(if *decryption {
                self.service.reset_decryption()
            } else {
                self.service.reset_signature()
            }),
            Operation::ResidentDecrypt { recipient, message } => {
                let plaintext = message.to_bytes();
                let recipient = fixtures::identity(*recipient);
                let decrypted = self
                    .service
                    .encrypt_for(&recipient.public_key, &plaintext)
                    .and_then(|ciphertext| self.service.decrypt_resident(&ciphertext));
                match decrypted {
                    Ok(decrypted) if decrypted == plaintext => OperationResult::Ok,
                    Ok(_) => OperationResult::Mismatch,
                    Err(e) => failure(&e),
                }
            },
            Operation::ResidentSign { signer, message } => {
                let signer = fixtures::identity(*signer);
                let verified = self
                    .service
                    .sign_resident(&message.to_bytes())
                    .and_then(|signed| self.service.verify_from(&signer.public_key, &signed));
                match verified {
                    Ok(valid) => OperationResult::Verified(valid),
                    Err(e) => failure(&e),
                }
            },
        }
    }

    /// Extract observable state for comparison.
    pub fn observable_state(&self) -> ObservableState {
        ObservableState {
            live_handles: self
                .service
                .registry()
                .handles()
                .into_iter()
                .map(Handle::as_raw)
                .collect(),
            resident_decryption: self.service.is_initialized(Role::Decryption),
            resident_signature: self.service.is_initialized(Role::Signature),
        }
    }

    fn encrypt_then_decrypt(
        &self,
        encrypt: ModelHandle,
        decrypt: ModelHandle,
        message: SmallMessage,
    ) -> OperationResult {
        let plaintext = message.to_bytes();
        let decrypted = self
            .service
            .encrypt(raw(encrypt), &plaintext)
            .and_then(|ciphertext| self.service.decrypt(raw(decrypt), &ciphertext));
        match decrypted {
            Ok(decrypted) if decrypted == plaintext => OperationResult::Ok,
            Ok(_) => OperationResult::Mismatch,
            Err(e) => failure(&e),
        }
    }

    fn seal_then_peel(
        &self,
        route: &[IdentityId],
        peel: ModelHandle,
        message: SmallMessage,
    ) -> OperationResult {
        let hops: Vec<&Fixture> = route.iter().map(|id| fixtures::identity(*id)).collect();
        let keys: Vec<&str> = hops.iter().map(|hop| hop.public_key.as_str()).collect();
        let addresses: Vec<String> = hops.iter().map(|hop| hop.address.to_hex()).collect();
        let plaintext = message.to_bytes();

        let peeled = self
            .service
            .seal_onion(&plaintext, &keys, &addresses)
            .and_then(|onion| self.service.unseal_onion(raw(peel), &onion));

        match peeled {
            Ok(Peeled::Delivered { plaintext: delivered }) if delivered == plaintext => {
                OperationResult::Peeled { delivered: true }
            },
            Ok(Peeled::Forward { next_address, .. })
                if hops.get(1).is_some_and(|next| next.address == next_address) =>
            {
                OperationResult::Peeled { delivered: false }
            },
            Ok(_) => OperationResult::Mismatch,
            Err(e) => failure(&e),
        }
    }
}

impl Default for RealWorld {
    fn default() -> Self {
        Self::new()
    }
}

fn raw(handle: ModelHandle) -> Handle {
    Handle::from_raw(i64::from(handle))
}

fn key_text(kind: ModelKind, fixture: &Fixture, valid_key: bool) -> (&str, &str) {
    if !valid_key {
        return (GARBAGE_KEY, "");
    }
    if kind.kind().requires_private_key() {
        (fixture.private_key.as_str(), fixture.passphrase)
    } else {
        (fixture.public_key.as_str(), "")
    }
}

fn failure(err: &CoreError) -> OperationResult {
    let class = match err {
        CoreError::InvalidHandle { .. } => OperationError::InvalidHandle,
        CoreError::ContextCreation { .. } => OperationError::ContextCreation,
        CoreError::NotInitialized { .. } => OperationError::NotInitialized,
        CoreError::Primitive { .. } => OperationError::Primitive,
        CoreError::HandlesExhausted { .. } => OperationError::HandlesExhausted,
        _ => OperationError::Other,
    };
    OperationResult::Error(class)
}
