//! Service configuration.

use crate::onion::{LENGTH_PREFIX_SIZE, MAX_LAYER_SIZE};

/// Limits applied by a [`CryptoService`](crate::CryptoService).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Number of handles the registry may ever issue.
    pub handle_limit: i64,
    /// Largest framed onion, prefix included, that seal will produce.
    pub max_onion_size: usize,
}

impl ServiceConfig {
    /// Set the handle limit.
    #[must_use]
    pub fn with_handle_limit(mut self, handle_limit: i64) -> Self {
        self.handle_limit = handle_limit;
        self
    }

    /// Set the maximum onion size.
    ///
    /// Values above what the length prefix can frame are clamped.
    #[must_use]
    pub fn with_max_onion_size(mut self, max_onion_size: usize) -> Self {
        self.max_onion_size = max_onion_size.min(MAX_LAYER_SIZE + LENGTH_PREFIX_SIZE);
        self
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self { handle_limit: i64::MAX, max_onion_size: MAX_LAYER_SIZE + LENGTH_PREFIX_SIZE }
    }
}
