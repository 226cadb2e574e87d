//! Context registry
//!
//! Maps handles to live cryptographic contexts. Callers hold only handles;
//! the registry owns the contexts and destroys each exactly once.
//!
//! # Design
//!
//! ```text
//! create ──► provider builds context ──► slot table assigns handle
//!                 (no lock held)              (under lock)
//!
//! lookup ──► Arc<C> clone      free ──► entry removed, context dropped
//!                                       once the last Arc goes away
//! ```
//!
//! Contexts are built with no lock held. A failed build never reaches the
//! table, so the handle counter only moves on success.

use std::sync::Arc;

use hopcrypt_crypto::{ContextKind, CryptoProvider, ProviderError};
use tracing::debug;

use crate::{
    error::CoreError,
    handle::Handle,
    slots::{SlotPolicy, SlotTable},
};

/// Multi-handle registry of contexts of type `C`.
pub struct ContextRegistry<C> {
    slots: SlotTable<C>,
}

impl<C> ContextRegistry<C> {
    /// Create an empty registry issuing at most `handle_limit` handles.
    pub fn new(handle_limit: i64) -> Self {
        Self { slots: SlotTable::new(SlotPolicy::unbounded(), handle_limit) }
    }

    /// Ask `provider` for a context of `kind` and register it.
    ///
    /// `passphrase` only matters for private-key-backed kinds.
    pub fn create<P>(
        &self,
        provider: &P,
        kind: ContextKind,
        key: &str,
        passphrase: &str,
    ) -> Result<Handle, CoreError>
    where
        P: CryptoProvider<Context = C>,
    {
        self.create_with(kind, || provider.create_context(kind, key, passphrase))
    }

    /// Register the context produced by `make`.
    ///
    /// A provider failure is reported as [`CoreError::ContextCreation`] and
    /// leaves the registry untouched.
    pub fn create_with<F>(&self, kind: ContextKind, make: F) -> Result<Handle, CoreError>
    where
        F: FnOnce() -> Result<C, ProviderError>,
    {
        let context = make().map_err(|source| CoreError::ContextCreation { kind, source })?;
        let handle = self.adopt(context)?;
        debug!(%handle, %kind, "context registered");
        Ok(handle)
    }

    /// Register an existing context.
    pub fn adopt(&self, context: C) -> Result<Handle, CoreError> {
        self.slots.insert(context).map(|admission| admission.handle())
    }

    /// Shared reference to the context under `handle`.
    pub fn lookup(&self, handle: Handle) -> Result<Arc<C>, CoreError> {
        self.slots.get(handle).ok_or(CoreError::InvalidHandle { handle })
    }

    /// Remove and release the context under `handle`.
    ///
    /// Returns false, touching nothing, if the handle is not live.
    pub fn free(&self, handle: Handle) -> bool {
        let freed = self.slots.remove(handle).is_some();
        if freed {
            debug!(%handle, "context freed");
        }
        freed
    }

    /// Returns true if `handle` refers to a live context.
    pub fn contains(&self, handle: Handle) -> bool {
        self.slots.contains(handle)
    }

    /// Number of live contexts.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if no context is live.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Live handles in ascending order.
    pub fn handles(&self) -> Vec<Handle> {
        self.slots.handles()
    }
}

impl<C> Default for ContextRegistry<C> {
    fn default() -> Self {
        Self::new(i64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failing() -> Result<&'static str, ProviderError> {
        Err(ProviderError::InvalidKey { reason: "bad".into() })
    }

    #[test]
    fn create_with_failure_registers_nothing() {
        let registry = ContextRegistry::default();

        let err = registry.create_with(ContextKind::Decryption, failing).unwrap_err();
        assert!(matches!(
            err,
            CoreError::ContextCreation { kind: ContextKind::Decryption, .. }
        ));
        assert!(registry.is_empty());

        let handle = registry.create_with(ContextKind::Encryption, || Ok("ctx")).unwrap();
        assert_eq!(handle, Handle::from_raw(0));
    }

    #[test]
    fn free_is_exactly_once() {
        let registry = ContextRegistry::default();
        let handle = registry.adopt("ctx").unwrap();

        assert!(registry.free(handle));
        assert!(!registry.free(handle));
        assert_eq!(registry.lookup(handle), Err(CoreError::InvalidHandle { handle }));
    }

    #[test]
    fn sentinel_is_never_live() {
        let registry = ContextRegistry::default();
        registry.adopt("ctx").unwrap();

        assert!(!registry.contains(Handle::NONE));
        assert!(!registry.free(Handle::NONE));
        assert_eq!(registry.len(), 1);
    }
}
