//! # idconsole-ports
//!
//! Port traits for the idconsole hexagonal architecture.
//!
//! This crate defines the interfaces between the application layer and the
//! adapters. It depends only on `domain` and `shared`.

use std::future::Future;
use std::pin::Pin;

/// Boxed future used by port traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Returns the ports crate version.
#[must_use]
pub const fn ports_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub mod clock;
pub mod deployment;
pub mod logger;
pub mod session;
pub mod storage;

pub use clock::*;
pub use deployment::*;
pub use logger::*;
pub use session::*;
pub use storage::*;

// Re-export domain types used in port signatures, so adapter crates can
// implement ports without directly depending on `idconsole-domain`.
pub use idconsole_domain::{ProfileEndpoints, ProfilesMap};
