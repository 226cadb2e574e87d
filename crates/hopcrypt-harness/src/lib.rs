//! Model-based testing harness for hopcrypt.
//!
//! # Model-Based Testing
//!
//! The `model` module provides a reference implementation of the registry and
//! resident identity contract. Operations are applied to both the model and a
//! [`RealWorld`] wrapping a real service, and their results and observable
//! states are compared. The `fixtures` module supplies the identities both
//! sides refer to by index.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod model;
mod real;

pub use model::{
    IdentityId, ModelHandle, ModelKind, ModelWorld, ObservableState, Operation, OperationError,
    OperationResult, SmallMessage,
};
pub use real::RealWorld;
