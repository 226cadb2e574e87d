//! Opaque context handles.

use std::fmt;

/// Capability token referencing a live context.
///
/// Handles carry no information about the context behind them. They are
/// assigned from 0 upwards and never reused; [`Handle::NONE`] (`-1`) means
/// "no context".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(i64);

impl Handle {
    /// Sentinel returned when no context was created.
    pub const NONE: Self = Self(-1);

    /// Wrap a raw handle value received from a caller.
    pub const fn from_raw(raw: i64) -> Self {
        Self(raw)
    }

    /// Raw handle value.
    pub const fn as_raw(self) -> i64 {
        self.0
    }

    /// Returns true for the "no context" sentinel.
    pub const fn is_none(self) -> bool {
        self.0 == Self::NONE.0
    }
}

impl From<Handle> for i64 {
    fn from(handle: Handle) -> Self {
        handle.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
