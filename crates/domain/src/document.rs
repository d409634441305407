//! Versioned import/export document for user-managed profiles.

use crate::profile::ProfilesMap;
use crate::slug::is_valid_slug;
use idconsole_shared::{ErrorCode, ErrorEnvelope};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The only document version this build reads and writes.
pub const PROFILES_DOCUMENT_VERSION: u64 = 1;

/// Validation failures for import documents.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    /// Not JSON, or not a JSON object.
    #[error("profiles document is not a JSON object: {message}")]
    Malformed {
        /// Parser detail.
        message: String,
    },
    /// `version` missing or different from 1.
    #[error("unsupported profiles document version: {found}")]
    UnsupportedVersion {
        /// Raw version value found in the document.
        found: String,
    },
    /// `profiles` key missing.
    #[error("profiles document has no `profiles` object")]
    MissingProfiles,
    /// A profile entry failed to deserialize.
    #[error("invalid profile entry: {message}")]
    InvalidEntry {
        /// Parser detail.
        message: String,
    },
    /// A key is not a valid slug.
    #[error("invalid profile slug in document: {slug}")]
    InvalidSlug {
        /// Offending key.
        slug: String,
    },
}

impl DocumentError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::UnsupportedVersion { .. } => ErrorCode::new("profile", "unsupported_version"),
            Self::InvalidSlug { .. } => ErrorCode::new("profile", "invalid_slug"),
            Self::Malformed { .. } | Self::MissingProfiles | Self::InvalidEntry { .. } => {
                ErrorCode::new("profile", "invalid_document")
            },
        }
    }
}

impl From<DocumentError> for ErrorEnvelope {
    fn from(error: DocumentError) -> Self {
        let envelope = Self::expected(error.error_code(), error.to_string());
        match error {
            DocumentError::UnsupportedVersion { found } => envelope.with_metadata("version", found),
            DocumentError::InvalidSlug { slug } => envelope.with_metadata("slug", slug),
            DocumentError::Malformed { .. }
            | DocumentError::MissingProfiles
            | DocumentError::InvalidEntry { .. } => envelope,
        }
    }
}

/// `{ "version": 1, "profiles": { ... } }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfilesDocument {
    /// Always 1.
    pub version: u64,
    /// Profile entries in export order.
    pub profiles: ProfilesMap,
}

impl ProfilesDocument {
    /// Wrap profiles in a current-version document.
    pub const fn new(profiles: ProfilesMap) -> Self {
        Self {
            version: PROFILES_DOCUMENT_VERSION,
            profiles,
        }
    }

    /// Parse and validate an import document.
    pub fn parse(raw: &str) -> Result<Self, DocumentError> {
        let value: Value = serde_json::from_str(raw).map_err(|error| DocumentError::Malformed {
            message: error.to_string(),
        })?;
        let Value::Object(object) = value else {
            return Err(DocumentError::Malformed {
                message: "expected an object".to_owned(),
            });
        };

        match object.get("version") {
            Some(Value::Number(number)) if number.as_u64() == Some(PROFILES_DOCUMENT_VERSION) => {},
            Some(other) => {
                return Err(DocumentError::UnsupportedVersion {
                    found: other.to_string(),
                });
            },
            None => {
                return Err(DocumentError::UnsupportedVersion {
                    found: "missing".to_owned(),
                });
            },
        }

        if !object.contains_key("profiles") {
            return Err(DocumentError::MissingProfiles);
        }
        // Re-read from the raw text: `Value` objects are key-sorted.
        let ProfilesSection { profiles } =
            serde_json::from_str(raw).map_err(|error| DocumentError::InvalidEntry {
                message: error.to_string(),
            })?;

        if let Some(slug) = profiles.keys().find(|slug| !is_valid_slug(slug)) {
            return Err(DocumentError::InvalidSlug {
                slug: slug.to_owned(),
            });
        }

        Ok(Self::new(profiles))
    }
}

#[derive(Deserialize)]
struct ProfilesSection {
    profiles: ProfilesMap,
}
