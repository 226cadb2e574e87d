//! Operations for model-based testing.
//!
//! Operations cover every registry, resident and onion entry point. They are
//! generated by proptest or decoded from fuzzer bytes and applied to both the
//! model and the real service.

use arbitrary::Arbitrary;
use hopcrypt_crypto::ContextKind;

/// Identity pool index (wraps around the fixture pool).
pub type IdentityId = u8;

/// Raw handle value. Small so sequences hit live, freed and unissued handles.
pub type ModelHandle = u8;

/// Context capability, mirrored so it can be generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Arbitrary)]
pub enum ModelKind {
    /// Encryption context.
    Encryption,
    /// Decryption context.
    Decryption,
    /// Signature context.
    Signature,
    /// Verification context.
    Verification,
}

impl ModelKind {
    /// Real capability.
    pub fn kind(self) -> ContextKind {
        match self {
            Self::Encryption => ContextKind::Encryption,
            Self::Decryption => ContextKind::Decryption,
            Self::Signature => ContextKind::Signature,
            Self::Verification => ContextKind::Verification,
        }
    }
}

/// Operations that can be applied to the system.
#[derive(Debug, Clone, Arbitrary)]
pub enum Operation {
    /// Create a context from an identity's key, or from garbage key text.
    Create {
        /// Capability requested.
        kind: ModelKind,
        /// Identity whose key is used.
        identity: IdentityId,
        /// False feeds unparseable key text.
        valid_key: bool,
    },

    /// Free a handle.
    Free {
        /// Handle to free.
        handle: ModelHandle,
    },

    /// Encrypt with one handle and decrypt the result with another.
    EncryptThenDecrypt {
        /// Encryption handle.
        encrypt: ModelHandle,
        /// Decryption handle.
        decrypt: ModelHandle,
        /// Plaintext.
        message: SmallMessage,
    },

    /// Sign with one handle and verify the result with another.
    SignThenVerify {
        /// Signature handle.
        sign: ModelHandle,
        /// Verification handle.
        verify: ModelHandle,
        /// Message.
        message: SmallMessage,
    },

    /// Seal for a route and peel the outer layer with a handle.
    SealThenPeel {
        /// Route identities, outermost first; only `len` are used.
        route: [IdentityId; 3],
        /// Route length hint (maps to 1..=3).
        len: u8,
        /// Decryption handle.
        peel: ModelHandle,
        /// Plaintext.
        message: SmallMessage,
    },

    /// Install a resident identity.
    Init {
        /// Decryption slot when true, signature slot otherwise.
        decryption: bool,
        /// Identity to install.
        identity: IdentityId,
        /// False feeds unparseable key text.
        valid_key: bool,
    },

    /// Drop a resident identity.
    Reset {
        /// Decryption slot when true, signature slot otherwise.
        decryption: bool,
    },

    /// Encrypt to an identity and decrypt with the resident identity.
    ResidentDecrypt {
        /// Recipient identity.
        recipient: IdentityId,
        /// Plaintext.
        message: SmallMessage,
    },

    /// Sign with the resident identity and verify against an identity.
    ResidentSign {
        /// Identity the signature is checked against.
        signer: IdentityId,
        /// Message.
        message: SmallMessage,
    },
}

/// Small message content for testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Arbitrary)]
pub struct SmallMessage {
    /// Message seed.
    pub seed: u8,
    /// Length hint (0-3 maps to empty/small/medium/large).
    pub size_class: u8,
}

impl SmallMessage {
    /// Expand to actual message bytes.
    pub fn to_bytes(self) -> Vec<u8> {
        let len: u8 = match self.size_class % 4 {
            0 => 0,
            1 => 8,
            2 => 64,
            _ => 255,
        };
        (0..len).map(|i| self.seed.wrapping_add(i)).collect()
    }
}

/// Route length an `len` hint maps to.
pub fn route_len(len: u8) -> usize {
    usize::from(len % 3) + 1
}

/// Result of applying an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationResult {
    /// Operation succeeded with nothing further to report.
    Ok,
    /// Context created under this raw handle.
    Created(i64),
    /// Whether the handle was live and has been freed.
    Freed(bool),
    /// Verification outcome.
    Verified(bool),
    /// Outer layer removed; true when it was the last.
    Peeled {
        /// The peeling hop was the final recipient.
        delivered: bool,
    },
    /// Resident init outcome; true when this call installed the identity.
    Established(bool),
    /// Whether a resident identity was dropped.
    Reset(bool),
    /// Output did not match the input (never produced by the model).
    Mismatch,
    /// Operation failed.
    Error(OperationError),
}

/// Failure classes compared between model and real system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationError {
    /// Handle not live.
    InvalidHandle,
    /// Key text rejected.
    ContextCreation,
    /// Resident slot empty.
    NotInitialized,
    /// Provider operation failed (wrong capability or wrong key).
    Primitive,
    /// Handle space exhausted.
    HandlesExhausted,
    /// Anything else.
    Other,
}

impl OperationResult {
    /// Check if operation succeeded.
    pub fn is_ok(&self) -> bool {
        !matches!(self, Self::Error(_) | Self::Mismatch)
    }
}
