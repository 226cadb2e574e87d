//! CLI error types.

use std::{io, path::PathBuf};

use hopcrypt_core::CoreError;
use hopcrypt_crypto::ProviderError;
use thiserror::Error;

/// Errors surfaced by `hopcrypt` commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Reading or writing a file failed.
    #[error("{}: {source}", .path.display())]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying I/O failure.
        source: io::Error,
    },

    /// File contents were not valid base64.
    #[error("{}: not valid base64: {source}", .path.display())]
    Encoding {
        /// File involved.
        path: PathBuf,
        /// Decoder failure.
        source: base64::DecodeError,
    },

    /// A `--hop` argument could not be parsed.
    #[error("invalid hop '{spec}': {reason}")]
    InvalidHop {
        /// The argument as given.
        spec: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Signature check failed.
    #[error("signature is not valid")]
    InvalidSignature,

    /// Key generation or key text handling failed.
    #[error(transparent)]
    Key(#[from] ProviderError),

    /// Registry or onion operation failed.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl CliError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}
