//! # idconsole-infra
//!
//! Infrastructure wiring and runtime composition.
//! This crate depends on `app`, `adapters`, `config`, and `shared`.

/// Paginated API reads through the client registry and query cache.
pub mod api;
/// Boot ordering helpers.
pub mod boot;
/// Composition root.
pub mod console;
/// Infra error aliases.
pub mod errors;
/// Logger selection.
pub mod logging;

pub use api::fetch_page;
pub use boot::{BootReport, boot, boot_with_build_profiles, run_async};
pub use console::{Console, SESSION_DIR, build_console};
pub use errors::{InfraError, InfraResult};
pub use logging::{LogFormat, build_logger, port_log_level};

// Re-export redaction utilities for CLI boundary sanitization
pub use idconsole_shared::{is_secret_key, redact_url_credentials};

/// Returns the infra crate version.
#[must_use]
pub const fn infra_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
