//! Resident identities
//!
//! One decryption and one signature context held for the life of the process.
//! Each lives in a capacity-1 [`SlotTable`] with the keep-existing policy, so
//! initialization is idempotent and the check-then-create step is atomic
//! under the slot lock.

use std::{fmt, sync::Arc};

use hopcrypt_crypto::{ContextKind, ProviderError};
use tracing::debug;

use crate::{
    error::CoreError,
    slots::{Admission, SlotPolicy, SlotTable},
};

/// Which resident slot an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Peels onions and decrypts payloads addressed to this node.
    Decryption,
    /// Signs on behalf of this node.
    Signature,
}

impl Role {
    /// Context kind held in this role's slot.
    pub fn kind(self) -> ContextKind {
        match self {
            Self::Decryption => ContextKind::Decryption,
            Self::Signature => ContextKind::Signature,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.kind(), f)
    }
}

/// Result of an initialization request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Established {
    /// This call built the resident context.
    Created,
    /// A context was already resident; nothing was built.
    AlreadyPresent,
}

/// The resident decryption and signature slots.
pub struct ResidentIdentities<C> {
    decryption: SlotTable<C>,
    signature: SlotTable<C>,
}

impl<C> ResidentIdentities<C> {
    /// Create with both slots empty.
    pub fn new() -> Self {
        Self {
            decryption: SlotTable::new(SlotPolicy::resident(), i64::MAX),
            signature: SlotTable::new(SlotPolicy::resident(), i64::MAX),
        }
    }

    /// Fill the slot for `role` with the context built by `make`, unless it is
    /// already occupied.
    ///
    /// `make` runs at most once per concurrent burst of first callers and not
    /// at all when the slot is occupied.
    pub fn establish<F>(&self, role: Role, make: F) -> Result<Established, CoreError>
    where
        F: FnOnce() -> Result<C, ProviderError>,
    {
        let admission = self.slot(role).admit_with(|| {
            make().map_err(|source| CoreError::ContextCreation { kind: role.kind(), source })
        })?;

        match admission {
            Admission::Inserted(_) => {
                debug!(%role, "resident identity established");
                Ok(Established::Created)
            },
            Admission::Existing(_) => Ok(Established::AlreadyPresent),
        }
    }

    /// The resident context for `role`.
    pub fn get(&self, role: Role) -> Result<Arc<C>, CoreError> {
        self.slot(role)
            .first()
            .map(|(_, context)| context)
            .ok_or(CoreError::NotInitialized { role })
    }

    /// Drop the resident context for `role`.
    ///
    /// Returns false if the slot was already empty.
    pub fn reset(&self, role: Role) -> bool {
        let cleared = self.slot(role).clear() > 0;
        if cleared {
            debug!(%role, "resident identity reset");
        }
        cleared
    }

    /// Returns true if `role` holds a context.
    pub fn is_established(&self, role: Role) -> bool {
        !self.slot(role).is_empty()
    }

    fn slot(&self, role: Role) -> &SlotTable<C> {
        match role {
            Role::Decryption => &self.decryption,
            Role::Signature => &self.signature,
        }
    }
}

impl<C> Default for ResidentIdentities<C> {
    fn default() -> Self {
        Self::new()
    }
}
