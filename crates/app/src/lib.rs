//! # idconsole-app
//!
//! Application use cases for connection profiles: the deployment config
//! loader, the layered profile merge, and the profile store.
//! This crate depends on `ports`, `domain`, and `shared`.

pub mod merge;
pub mod profile_store;
pub mod runtime_config;

pub use merge::{Layer, MergedProfiles, RejectedEntry, merge_profile_layers};
pub use profile_store::{
    DeleteOutcome, ImportSummary, ProfileSources, ProfileStore, ProfileStoreDeps, ProfileUpdate,
    ProfileView,
};
pub use runtime_config::{
    CachedRuntimeConfig, FLAT_CONFIG_SLUG, RuntimeConfig, RuntimeConfigDeps, RuntimeConfigLoader,
    parse_runtime_config,
};

/// Returns the app crate version.
#[must_use]
pub const fn app_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
