//! Handle-keyed slot table
//!
//! The single storage primitive behind both the multi-handle registry and the
//! resident identity slots. A table maps handles to shared values under one
//! mutex and differs between uses only by its [`SlotPolicy`].
//!
//! # Invariants
//!
//! - Handles are assigned from 0 upwards and never reused
//! - The counter advances only when a value is actually admitted
//! - Every key in the table refers to a live value
//! - Removal and release happen together under the table lock
//!
//! Values are held as `Arc<T>`. A looked-up value stays alive for its
//! borrower even if the entry is removed concurrently.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use tracing::error;

use crate::{error::CoreError, handle::Handle};

/// Behaviour when a bounded table is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhenFull {
    /// Fail the admission with [`CoreError::CapacityReached`].
    Reject,
    /// Keep the existing entries and report one of them.
    KeepExisting,
}

/// Capacity and overflow behaviour of a [`SlotTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotPolicy {
    /// Maximum number of live entries, `None` for unbounded.
    pub capacity: Option<usize>,
    /// What admission does when `capacity` is reached.
    pub when_full: WhenFull,
}

impl SlotPolicy {
    /// Unbounded table, one handle per admitted value.
    pub const fn unbounded() -> Self {
        Self { capacity: None, when_full: WhenFull::Reject }
    }

    /// Single slot that keeps its first occupant.
    pub const fn resident() -> Self {
        Self { capacity: Some(1), when_full: WhenFull::KeepExisting }
    }

    fn is_full(&self, len: usize) -> bool {
        self.capacity.is_some_and(|capacity| len >= capacity)
    }
}

/// Outcome of a successful admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// A new value was stored under this handle.
    Inserted(Handle),
    /// The table was full and kept its existing entry under this handle.
    Existing(Handle),
}

impl Admission {
    /// Handle of the entry that is now live.
    pub fn handle(self) -> Handle {
        match self {
            Self::Inserted(handle) | Self::Existing(handle) => handle,
        }
    }
}

struct SlotState<T> {
    next: i64,
    entries: HashMap<i64, Arc<T>>,
}

/// Thread-safe handle table.
pub struct SlotTable<T> {
    policy: SlotPolicy,
    handle_limit: i64,
    state: Mutex<SlotState<T>>,
}

impl<T> SlotTable<T> {
    /// Create an empty table.
    ///
    /// Admission fails with [`CoreError::HandlesExhausted`] once `handle_limit`
    /// handles have been issued.
    pub fn new(policy: SlotPolicy, handle_limit: i64) -> Self {
        Self {
            policy,
            handle_limit,
            state: Mutex::new(SlotState { next: 0, entries: HashMap::new() }),
        }
    }

    /// Store an already constructed value.
    pub fn insert(&self, value: T) -> Result<Admission, CoreError> {
        self.admit_with(|| Ok(value))
    }

    /// Admit a value built by `make` while the table lock is held.
    ///
    /// When the table is full under [`WhenFull::KeepExisting`], `make` is not
    /// called. A failing `make` leaves the table and its counter untouched.
    pub fn admit_with<F>(&self, make: F) -> Result<Admission, CoreError>
    where
        F: FnOnce() -> Result<T, CoreError>,
    {
        let mut state = self.lock();

        if self.policy.is_full(state.entries.len()) {
            match self.policy.when_full {
                WhenFull::Reject => {
                    let capacity = self.policy.capacity.unwrap_or(state.entries.len());
                    return Err(CoreError::CapacityReached { capacity });
                },
                WhenFull::KeepExisting => {
                    if let Some(&raw) = state.entries.keys().min() {
                        return Ok(Admission::Existing(Handle::from_raw(raw)));
                    }
                },
            }
        }

        if state.next >= self.handle_limit {
            error!(limit = self.handle_limit, "handle space exhausted");
            return Err(CoreError::HandlesExhausted { limit: self.handle_limit });
        }

        let value = make()?;
        let raw = state.next;
        state.next += 1;
        state.entries.insert(raw, Arc::new(value));
        Ok(Admission::Inserted(Handle::from_raw(raw)))
    }

    /// Shared reference to the value under `handle`.
    pub fn get(&self, handle: Handle) -> Option<Arc<T>> {
        self.lock().entries.get(&handle.as_raw()).cloned()
    }

    /// Live entry with the lowest handle.
    pub fn first(&self) -> Option<(Handle, Arc<T>)> {
        let state = self.lock();
        state
            .entries
            .iter()
            .min_by_key(|(raw, _)| **raw)
            .map(|(raw, value)| (Handle::from_raw(*raw), Arc::clone(value)))
    }

    /// Remove the entry under `handle`, returning its value if it was live.
    pub fn remove(&self, handle: Handle) -> Option<Arc<T>> {
        self.lock().entries.remove(&handle.as_raw())
    }

    /// Remove every entry, returning how many were live.
    pub fn clear(&self) -> usize {
        let mut state = self.lock();
        let removed = state.entries.len();
        state.entries.clear();
        removed
    }

    /// Returns true if `handle` refers to a live entry.
    pub fn contains(&self, handle: Handle) -> bool {
        self.lock().entries.contains_key(&handle.as_raw())
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Returns true if no entry is live.
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Live handles in ascending order.
    pub fn handles(&self) -> Vec<Handle> {
        let mut handles: Vec<Handle> =
            self.lock().entries.keys().map(|raw| Handle::from_raw(*raw)).collect();
        handles.sort_unstable();
        handles
    }

    // A panic while the lock is held cannot leave the map half-updated: every
    // mutation is a single insert or remove.
    fn lock(&self) -> MutexGuard<'_, SlotState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_start_at_zero_and_increase() {
        let table = SlotTable::new(SlotPolicy::unbounded(), i64::MAX);

        let handles: Vec<Handle> =
            (0..4).map(|i| table.insert(i).unwrap().handle()).collect();

        assert_eq!(handles, (0..4).map(Handle::from_raw).collect::<Vec<_>>());
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn removed_handles_are_not_reused() {
        let table = SlotTable::new(SlotPolicy::unbounded(), i64::MAX);
        let first = table.insert("a").unwrap().handle();

        assert!(table.remove(first).is_some());
        assert!(table.remove(first).is_none());

        let second = table.insert("b").unwrap().handle();
        assert_ne!(first, second);
        assert!(table.get(first).is_none());
    }

    #[test]
    fn failed_construction_does_not_advance_counter() {
        let table: SlotTable<u8> = SlotTable::new(SlotPolicy::unbounded(), i64::MAX);

        let result = table.admit_with(|| Err(CoreError::EmptyHopList));
        assert_eq!(result, Err(CoreError::EmptyHopList));

        assert_eq!(table.insert(1).unwrap(), Admission::Inserted(Handle::from_raw(0)));
    }

    #[test]
    fn resident_policy_keeps_first_occupant() {
        let table = SlotTable::new(SlotPolicy::resident(), i64::MAX);

        let first = table.insert("first").unwrap();
        let mut called = false;
        let second = table
            .admit_with(|| {
                called = true;
                Ok("second")
            })
            .unwrap();

        assert_eq!(first, Admission::Inserted(Handle::from_raw(0)));
        assert_eq!(second, Admission::Existing(Handle::from_raw(0)));
        assert!(!called);
        assert_eq!(*table.get(Handle::from_raw(0)).unwrap(), "first");
    }

    #[test]
    fn bounded_reject_policy_fails_when_full() {
        let policy = SlotPolicy { capacity: Some(2), when_full: WhenFull::Reject };
        let table = SlotTable::new(policy, i64::MAX);

        table.insert(1).unwrap();
        table.insert(2).unwrap();
        assert_eq!(table.insert(3), Err(CoreError::CapacityReached { capacity: 2 }));
    }

    #[test]
    fn exhaustion_is_reported_not_wrapped() {
        let table = SlotTable::new(SlotPolicy::unbounded(), 2);

        table.insert(()).unwrap();
        table.insert(()).unwrap();
        let err = table.insert(()).unwrap_err();

        assert_eq!(err, CoreError::HandlesExhausted { limit: 2 });
        assert!(err.is_fatal());
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn removed_value_outlives_entry_for_borrower() {
        let table = SlotTable::new(SlotPolicy::unbounded(), i64::MAX);
        let handle = table.insert(String::from("in flight")).unwrap().handle();

        let borrowed = table.get(handle).unwrap();
        assert!(table.remove(handle).is_some());

        assert_eq!(borrowed.as_str(), "in flight");
        assert!(!table.contains(handle));
    }

    #[test]
    fn clear_reports_live_entries() {
        let table = SlotTable::new(SlotPolicy::unbounded(), i64::MAX);
        table.insert(1).unwrap();
        table.insert(2).unwrap();

        assert_eq!(table.clear(), 2);
        assert!(table.is_empty());
        assert_eq!(table.clear(), 0);
    }
}
