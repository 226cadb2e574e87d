//! Model world.
//!
//! Tracks only what decides outcomes: which raw handles are live, the
//! capability and identity behind each, and which identity occupies each
//! resident slot. No cryptography happens here.

use std::collections::BTreeMap;

use super::operation::{
    IdentityId, ModelHandle, ModelKind, Operation, OperationError, OperationResult, route_len,
};
use crate::fixtures::pool_index;

/// Observable state for oracle comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservableState {
    /// Live raw handles in ascending order.
    pub live_handles: Vec<i64>,
    /// Decryption slot is occupied.
    pub resident_decryption: bool,
    /// Signature slot is occupied.
    pub resident_signature: bool,
}

#[derive(Debug, Clone, Copy)]
struct ModelContext {
    kind: ModelKind,
    identity: IdentityId,
}

/// Model world - the reference implementation.
#[derive(Debug, Clone)]
pub struct ModelWorld {
    handle_limit: i64,
    next: i64,
    live: BTreeMap<i64, ModelContext>,
    resident_decryption: Option<IdentityId>,
    resident_signature: Option<IdentityId>,
}

impl ModelWorld {
    /// Create an empty world with an unbounded handle space.
    pub fn new() -> Self {
        Self::with_handle_limit(i64::MAX)
    }

    /// Create an empty world issuing at most `handle_limit` handles.
    pub fn with_handle_limit(handle_limit: i64) -> Self {
        Self {
            handle_limit,
            next: 0,
            live: BTreeMap::new(),
            resident_decryption: None,
            resident_signature: None,
        }
    }

    /// Apply an operation and return the result.
    pub fn apply(&mut self, op: &Operation) -> OperationResult {
        match op {
            Operation::Create { kind, identity, valid_key } => {
                self.apply_create(*kind, *identity, *valid_key)
            },
            Operation::Free { handle } => {
                OperationResult::Freed(self.live.remove(&i64::from(*handle)).is_some())
            },
            Operation::EncryptThenDecrypt { encrypt, decrypt, .. } => {
                self.apply_encrypt_then_decrypt(*encrypt, *decrypt)
            },
            Operation::SignThenVerify { sign, verify, .. } => {
                self.apply_sign_then_verify(*sign, *verify)
            },
            Operation::SealThenPeel { route, len, peel, .. } => {
                self.apply_seal_then_peel(&route[..route_len(*len)], *peel)
            },
            Operation::Init { decryption, identity, valid_key } => {
                let slot = if *decryption {
                    &mut self.resident_decryption
                } else {
                    &mut self.resident_signature
                };
                match (slot.is_some(), *valid_key) {
                    (true, _) => OperationResult::Established(false),
                    (false, true) => {
                        *slot = Some(pool_index(*identity));
                        OperationResult::Established(true)
                    },
                    (false, false) => OperationResult::Error(OperationError::ContextCreation),
                }
            },
            Operation::Reset { decryption } => {
                let slot = if *decryption {
                    &mut self.resident_decryption
                } else {
                    &mut self.resident_signature
                };
                OperationResult::Reset(slot.take().is_some())
            },
            Operation::ResidentDecrypt { recipient, .. } => {
                // Encryption goes through a transient registry context first.
                if let Err(e) = self.issue_transient() {
                    return OperationResult::Error(e);
                }
                match self.resident_decryption {
                    None => OperationResult::Error(OperationError::NotInitialized),
                    Some(resident) if resident == pool_index(*recipient) => OperationResult::Ok,
                    Some(_) => OperationResult::Error(OperationError::Primitive),
                }
            },
            Operation::ResidentSign { signer, .. } => {
                let Some(resident) = self.resident_signature else {
                    return OperationResult::Error(OperationError::NotInitialized);
                };
                match self.issue_transient() {
                    Ok(()) => OperationResult::Verified(resident == pool_index(*signer)),
                    Err(e) => OperationResult::Error(e),
                }
            },
        }
    }

    /// Extract observable state for comparison.
    pub fn observable_state(&self) -> ObservableState {
        ObservableState {
            live_handles: self.live.keys().copied().collect(),
            resident_decryption: self.resident_decryption.is_some(),
            resident_signature: self.resident_signature.is_some(),
        }
    }

    /// Number of live handles.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Next raw handle a successful create would receive.
    pub fn next_handle(&self) -> i64 {
        self.next
    }

    fn apply_create(
        &mut self,
        kind: ModelKind,
        identity: IdentityId,
        valid_key: bool,
    ) -> OperationResult {
        if !valid_key {
            return OperationResult::Error(OperationError::ContextCreation);
        }
        if self.next >= self.handle_limit {
            return OperationResult::Error(OperationError::HandlesExhausted);
        }

        let handle = self.next;
        self.next += 1;
        self.live.insert(handle, ModelContext { kind, identity: pool_index(identity) });
        OperationResult::Created(handle)
    }

    // A transient context takes a handle number even though it is freed at once.
    fn issue_transient(&mut self) -> Result<(), OperationError> {
        if self.next >= self.handle_limit {
            return Err(OperationError::HandlesExhausted);
        }
        self.next += 1;
        Ok(())
    }

    fn lookup(
        &self,
        handle: ModelHandle,
        kind: ModelKind,
    ) -> Result<IdentityId, OperationError> {
        let context = self.live.get(&i64::from(handle)).ok_or(OperationError::InvalidHandle)?;
        if context.kind == kind { Ok(context.identity) } else { Err(OperationError::Primitive) }
    }

    fn apply_encrypt_then_decrypt(
        &self,
        encrypt: ModelHandle,
        decrypt: ModelHandle,
    ) -> OperationResult {
        let outcome = self.lookup(encrypt, ModelKind::Encryption).and_then(|recipient| {
            let holder = self.lookup(decrypt, ModelKind::Decryption)?;
            if holder == recipient { Ok(()) } else { Err(OperationError::Primitive) }
        });
        match outcome {
            Ok(()) => OperationResult::Ok,
            Err(e) => OperationResult::Error(e),
        }
    }

    fn apply_sign_then_verify(&self, sign: ModelHandle, verify: ModelHandle) -> OperationResult {
        let signer = match self.lookup(sign, ModelKind::Signature) {
            Ok(signer) => signer,
            Err(e) => return OperationResult::Error(e),
        };
        match self.live.get(&i64::from(verify)) {
            None => OperationResult::Error(OperationError::InvalidHandle),
            Some(context) => OperationResult::Verified(
                context.kind == ModelKind::Verification && context.identity == signer,
            ),
        }
    }

    fn apply_seal_then_peel(&self, route: &[IdentityId], peel: ModelHandle) -> OperationResult {
        match self.lookup(peel, ModelKind::Decryption) {
            Err(e) => OperationResult::Error(e),
            Ok(holder) if route.first().map(|first| pool_index(*first)) == Some(holder) => {
                OperationResult::Peeled { delivered: route.len() == 1 }
            },
            Ok(_) => OperationResult::Error(OperationError::Primitive),
        }
    }
}

impl Default for ModelWorld {
    fn default() -> Self {
        Self::new()
    }
}
