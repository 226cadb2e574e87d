//! Reference model for model-based testing.
//!
//! The model captures the observable contract of the registry and resident
//! slots without any cryptography. It serves as the oracle against which the
//! real service is verified.
//!
//! # Design Principles
//!
//! - Simplicity: The model should be obviously correct
//! - Contract not implementation: Captures WHAT, not HOW
//! - Deterministic: Same inputs produce same outputs

pub mod operation;
mod world;

pub use operation::{
    IdentityId, ModelHandle, ModelKind, Operation, OperationError, OperationResult, SmallMessage,
    route_len,
};
pub use world::{ModelWorld, ObservableState};
