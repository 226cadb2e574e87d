//! Fuzz target for the context registry and resident identities
//!
//! Drives the reference model and a real service with the same operation
//! sequence and requires them to agree.
//!
//! # Strategy
//!
//! - Operation sequences: Creates, frees, and use-after-free over a small
//!   handle space
//! - Capability mixups: Contexts used for an operation they were not built for
//! - Resident churn: Init, reset, and use of both resident slots
//! - Small limits: Handle spaces small enough to exhaust
//!
//! # Invariants
//!
//! - Model and real results are identical for every operation
//! - Observable state (live handles, resident slots) matches after each step
//! - Handles are never reissued
//! - NEVER panic

#![no_main]

use std::collections::HashSet;

use arbitrary::Arbitrary;
use hopcrypt_core::ServiceConfig;
use hopcrypt_harness::{ModelWorld, Operation, OperationResult, RealWorld};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Clone, Arbitrary)]
struct FuzzInput {
    /// Small limits make exhaustion reachable; `None` leaves it unbounded.
    handle_limit: Option<u8>,
    operations: Vec<Operation>,
}

fuzz_target!(|input: FuzzInput| {
    let (mut model, real) = match input.handle_limit {
        Some(limit) => {
            let limit = i64::from(limit % 16);
            (
                ModelWorld::with_handle_limit(limit),
                RealWorld::with_config(ServiceConfig::default().with_handle_limit(limit)),
            )
        },
        None => (ModelWorld::new(), RealWorld::new()),
    };
    let mut issued = HashSet::new();

    for (i, op) in input.operations.iter().take(64).enumerate() {
        let model_result = model.apply(op);
        let real_result = real.apply(op);

        assert_eq!(model_result, real_result, "divergence at operation {i}: {op:?}");
        assert_eq!(model.observable_state(), real.observable_state());

        if let OperationResult::Created(handle) = real_result {
            assert!(issued.insert(handle), "handle {handle} issued twice");
        }
    }
});
