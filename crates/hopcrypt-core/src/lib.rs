//! hopcrypt Core
//!
//! Handle-based context registry, resident identities and the onion sealing
//! protocol, layered over a [`CryptoProvider`].
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │ boundary: i64 handles, -1 sentinel, bool results  │
//! └───────────────────────┬──────────────────────────┘
//!                         │
//! ┌───────────────────────▼──────────────────────────┐
//! │ CryptoService<P>                                 │
//! │  ├─ ContextRegistry   handle → Arc<Context>      │
//! │  ├─ ResidentIdentities decrypt slot, sign slot   │
//! │  └─ onion::seal / onion::unseal                  │
//! └───────────────────────┬──────────────────────────┘
//!                         │
//! ┌───────────────────────▼──────────────────────────┐
//! │ CryptoProvider (hopcrypt-crypto)                 │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! Registry and resident slots share one storage primitive, [`SlotTable`],
//! and differ only in their [`SlotPolicy`].
//!
//! # Invariants
//!
//! - Live handles are unique; a handle is never reissued
//! - Each context is destroyed exactly once
//! - Operations on a freed or never-issued handle fail with
//!   [`CoreError::InvalidHandle`]
//! - A resident slot, once filled, is replaced only after an explicit reset

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod boundary;
pub mod config;
pub mod error;
pub mod handle;
pub mod identity;
pub mod onion;
pub mod registry;
pub mod service;
pub mod slots;

pub use config::ServiceConfig;
pub use error::CoreError;
pub use handle::Handle;
pub use hopcrypt_crypto::{Address, ContextKind, CryptoProvider};
pub use identity::{Established, ResidentIdentities, Role};
pub use onion::{Hop, Peeled};
pub use registry::ContextRegistry;
pub use service::CryptoService;
pub use slots::{Admission, SlotPolicy, SlotTable, WhenFull};
