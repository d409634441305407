//! # idconsole-domain
//!
//! Domain model for the identity-console connection engine:
//!
//! - **Slugs** - `ProfileSlug`, `slugify`, `display_name`
//! - **Profiles** - `ProfileData`, `Profile`, `ProfilesMap`, `ProfileSource`
//! - **Documents** - `ProfilesDocument` import/export format
//! - **Pagination** - `Link` / `X-Total-Count` header parsing
//!
//! ## Dependency Rules
//!
//! - Depends only on `shared` crate
//! - No infrastructure or adapter dependencies
//! - Pure domain logic with no I/O

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub use idconsole_shared::shared_crate_version;

pub mod document;
pub mod pagination;
pub mod profile;
pub mod slug;

pub use document::{DocumentError, PROFILES_DOCUMENT_VERSION, ProfilesDocument};
pub use pagination::{
    PaginationHeaders, PaginationMeta, parse_link_header, parse_pagination_headers,
};
pub use profile::{
    DEFAULT_ADMIN_BASE_URL, DEFAULT_PUBLIC_BASE_URL, Profile, ProfileData, ProfileEndpoints,
    ProfileSource, ProfilesMap,
};
pub use slug::{
    FALLBACK_PROFILE_SLUG, MAX_SLUG_LEN, ProfileSlug, SlugError, display_name, is_valid_slug,
    slugify,
};

/// Returns the domain crate version.
#[must_use]
pub const fn domain_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
