//! Profile slugs: DNS-label shaped identifiers derived from display names.

use idconsole_shared::{ErrorCode, ErrorEnvelope};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum slug length (a single DNS label).
pub const MAX_SLUG_LEN: usize = 63;
/// Slug of the profile synthesized when every layer is empty.
pub const FALLBACK_PROFILE_SLUG: &str = "local";

/// Validation failures for profile slugs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SlugError {
    /// Input was empty.
    #[error("profile slug must be non-empty")]
    Empty,
    /// Input exceeds a DNS label.
    #[error("profile slug must be at most 63 characters")]
    TooLong {
        /// Length of the rejected input.
        length: usize,
    },
    /// Input contains characters outside `[a-z0-9-]` or starts/ends with `-`.
    #[error("profile slug must match /^[a-z0-9]([a-z0-9-]{{0,61}}[a-z0-9])?$/")]
    Malformed {
        /// Rejected input.
        input: String,
    },
}

impl From<SlugError> for ErrorEnvelope {
    fn from(error: SlugError) -> Self {
        let envelope = Self::expected(ErrorCode::new("profile", "invalid_slug"), error.to_string());
        match error {
            SlugError::Empty => envelope,
            SlugError::TooLong { length } => envelope.with_metadata("length", length.to_string()),
            SlugError::Malformed { input } => envelope.with_metadata("slug", input),
        }
    }
}

/// Validated profile identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProfileSlug(Box<str>);

impl ProfileSlug {
    /// Parse a slug, rejecting anything that is not a DNS label.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, SlugError> {
        let raw = input.as_ref();
        if raw.is_empty() {
            return Err(SlugError::Empty);
        }
        if raw.len() > MAX_SLUG_LEN {
            return Err(SlugError::TooLong { length: raw.len() });
        }
        if !is_valid_slug(raw) {
            return Err(SlugError::Malformed {
                input: raw.to_owned(),
            });
        }
        Ok(Self(raw.into()))
    }

    /// Derive a slug from a display name and validate it.
    pub fn from_name(name: &str) -> Result<Self, SlugError> {
        Self::parse(slugify(name))
    }

    /// Slug of the fallback profile.
    #[must_use]
    pub fn fallback() -> Self {
        Self(FALLBACK_PROFILE_SLUG.into())
    }

    /// Access the underlying string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Title-cased label derived from the slug.
    #[must_use]
    pub fn display_name(&self) -> String {
        display_name(self.as_str())
    }
}

impl AsRef<str> for ProfileSlug {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ProfileSlug {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<String> for ProfileSlug {
    type Error = SlugError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<ProfileSlug> for String {
    fn from(value: ProfileSlug) -> Self {
        value.0.into()
    }
}

/// Returns true when `candidate` matches `^[a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?$`.
pub fn is_valid_slug(candidate: &str) -> bool {
    let bytes = candidate.as_bytes();
    let (Some(first), Some(last)) = (bytes.first(), bytes.last()) else {
        return false;
    };
    let edge = |byte: &u8| byte.is_ascii_lowercase() || byte.is_ascii_digit();

    bytes.len() <= MAX_SLUG_LEN
        && edge(first)
        && edge(last)
        && bytes.iter().all(|byte| edge(byte) || *byte == b'-')
}

/// Derive a slug candidate from a display name.
///
/// Lowercases, collapses every run of characters outside `[a-z0-9]` into one
/// hyphen, strips edge hyphens, then truncates to 63 characters. The result
/// is not guaranteed valid: truncation may leave a trailing hyphen and an
/// all-symbol name yields an empty string.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for ch in name.to_lowercase().chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch);
        } else {
            pending_hyphen = true;
        }
    }

    slug.chars().take(MAX_SLUG_LEN).collect()
}

/// Title-case each hyphen-separated segment and join with spaces.
pub fn display_name(slug: &str) -> String {
    slug.split('-')
        .map(|part| {
            let mut chars = part.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}
