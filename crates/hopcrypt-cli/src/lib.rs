//! hopcrypt command-line front end.
//!
//! File-based access to identities, onions and the transient encrypt, decrypt,
//! sign and verify operations of [`hopcrypt_core::CryptoService`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod commands;
mod error;

pub use commands::{Command, HopSpec, run};
pub use error::CliError;
