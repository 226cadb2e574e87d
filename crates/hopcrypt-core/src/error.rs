//! Core error types.

use hopcrypt_crypto::{ContextKind, ProviderError};
use thiserror::Error;

use crate::{handle::Handle, identity::Role};

/// Errors from registry, lifecycle and onion operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Handle was never issued or has been freed.
    #[error("invalid handle: {handle}")]
    InvalidHandle {
        /// The handle that was not found.
        handle: Handle,
    },

    /// Provider refused to build a context.
    #[error("failed to create {kind} context: {source}")]
    ContextCreation {
        /// Kind of context requested.
        kind: ContextKind,
        /// Underlying provider failure.
        source: ProviderError,
    },

    /// Resident identity slot is empty.
    #[error("{role} identity is not initialized")]
    NotInitialized {
        /// Role of the empty slot.
        role: Role,
    },

    /// Slot table is at capacity and rejects new entries.
    #[error("slot table is full (capacity {capacity})")]
    CapacityReached {
        /// Configured capacity.
        capacity: usize,
    },

    /// Primitive operation failed.
    #[error("{operation} failed: {source}")]
    Primitive {
        /// Name of the failed operation.
        operation: &'static str,
        /// Underlying provider failure.
        source: ProviderError,
    },

    /// Onion sealing needs at least one hop.
    #[error("hop list is empty")]
    EmptyHopList,

    /// Key and address lists differ in length.
    #[error("hop list mismatch: {keys} keys, {addresses} addresses")]
    HopCountMismatch {
        /// Number of keys supplied.
        keys: usize,
        /// Number of addresses supplied.
        addresses: usize,
    },

    /// Address is malformed or reserved.
    #[error("invalid address: {reason}")]
    InvalidAddress {
        /// Description of the address failure.
        reason: String,
    },

    /// Onion or one of its layers exceeds the size limit.
    #[error("onion too large: {size} bytes exceeds limit of {limit}")]
    OnionTooLarge {
        /// Size that was reached.
        size: usize,
        /// Applicable limit.
        limit: usize,
    },

    /// Onion framing is broken.
    #[error("malformed onion: {reason}")]
    MalformedOnion {
        /// Description of the framing failure.
        reason: String,
    },

    /// Handle counter reached its limit.
    #[error("handle space exhausted at {limit}")]
    HandlesExhausted {
        /// Configured handle limit.
        limit: i64,
    },
}

impl CoreError {
    /// Returns true if this error is fatal (unrecoverable).
    ///
    /// Fatal errors indicate misconfiguration or sustained misuse. Everything
    /// else is a failure value the caller may act on.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::HandlesExhausted { .. } => true,

            Self::InvalidHandle { .. }
            | Self::ContextCreation { .. }
            | Self::NotInitialized { .. }
            | Self::CapacityReached { .. }
            | Self::Primitive { .. }
            | Self::EmptyHopList
            | Self::HopCountMismatch { .. }
            | Self::InvalidAddress { .. }
            | Self::OnionTooLarge { .. }
            | Self::MalformedOnion { .. } => false,
        }
    }

    /// Returns true if the caller addressed a missing context.
    pub fn is_invalid_handle(&self) -> bool {
        matches!(self, Self::InvalidHandle { .. })
    }

    pub(crate) fn primitive(operation: &'static str) -> impl FnOnce(ProviderError) -> Self {
        move |source| Self::Primitive { operation, source }
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedOnion { reason: reason.into() }
    }
}
