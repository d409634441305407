//! Connection profiles and the ordered profile map they travel in.

use crate::slug::ProfileSlug;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Admin API base URL used when a profile omits one.
pub const DEFAULT_ADMIN_BASE_URL: &str = "http://localhost:4434";
/// Public API base URL used when a profile omits one.
pub const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:4433";

/// Wire and persisted shape of a profile entry.
///
/// Documents written by older console releases used `kratos*` prefixed keys;
/// those are accepted on input and never emitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileData {
    /// Admin API base URL.
    #[serde(
        rename = "adminBaseURL",
        alias = "kratosAdminBaseURL",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub admin_base_url: Option<String>,
    /// Public API base URL.
    #[serde(
        rename = "publicBaseURL",
        alias = "kratosPublicBaseURL",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub public_base_url: Option<String>,
    /// Explicit display label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ProfileData {
    /// Build profile data from two endpoint URLs.
    pub fn with_endpoints(admin: impl Into<String>, public: impl Into<String>) -> Self {
        Self {
            admin_base_url: Some(admin.into()),
            public_base_url: Some(public.into()),
            name: None,
        }
    }
}

/// Resolved endpoint pair of a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileEndpoints {
    /// Admin API base URL.
    #[serde(rename = "adminBaseURL")]
    pub admin_base_url: String,
    /// Public API base URL.
    #[serde(rename = "publicBaseURL")]
    pub public_base_url: String,
}

impl Default for ProfileEndpoints {
    fn default() -> Self {
        Self {
            admin_base_url: DEFAULT_ADMIN_BASE_URL.to_owned(),
            public_base_url: DEFAULT_PUBLIC_BASE_URL.to_owned(),
        }
    }
}

/// Which layer a profile's effective values come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileSource {
    /// Deployment-time document, not overridden locally.
    Config,
    /// User-managed (or build-time) profile.
    Local,
}

impl fmt::Display for ProfileSource {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config => formatter.write_str("config"),
            Self::Local => formatter.write_str("local"),
        }
    }
}

/// Normalized runtime profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Identifier.
    pub slug: ProfileSlug,
    /// Explicit label, if one was given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Effective endpoints.
    #[serde(flatten)]
    pub endpoints: ProfileEndpoints,
}

impl Profile {
    /// Normalize wire data, defaulting missing or empty endpoints.
    pub fn from_data(slug: ProfileSlug, data: &ProfileData) -> Self {
        let defaults = ProfileEndpoints::default();
        let pick = |value: Option<&String>, fallback: String| {
            value
                .map(|value| value.trim())
                .filter(|value| !value.is_empty())
                .map_or(fallback, str::to_owned)
        };
        let label = data
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_owned);

        Self {
            slug,
            label,
            endpoints: ProfileEndpoints {
                admin_base_url: pick(data.admin_base_url.as_ref(), defaults.admin_base_url),
                public_base_url: pick(data.public_base_url.as_ref(), defaults.public_base_url),
            },
        }
    }

    /// The profile used when no layer provides any entry.
    pub fn fallback() -> Self {
        Self {
            slug: ProfileSlug::fallback(),
            label: None,
            endpoints: ProfileEndpoints::default(),
        }
    }

    /// Human-readable name: the explicit label or one derived from the slug.
    #[must_use]
    pub fn name(&self) -> String {
        self.label
            .clone()
            .unwrap_or_else(|| self.slug.display_name())
    }

    /// Convert back to the persisted shape.
    #[must_use]
    pub fn to_data(&self) -> ProfileData {
        ProfileData {
            admin_base_url: Some(self.endpoints.admin_base_url.clone()),
            public_base_url: Some(self.endpoints.public_base_url.clone()),
            name: self.label.clone(),
        }
    }
}

/// Insertion-ordered `slug -> ProfileData` map.
///
/// Keys are raw strings because deployment documents may carry keys that
/// are not valid slugs; consumers validate at merge time. JSON object order
/// is preserved on deserialize. Re-inserting a key keeps its position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfilesMap {
    entries: Vec<(String, ProfileData)>,
}

impl ProfilesMap {
    /// Create an empty map.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Insert or replace an entry; returns the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: ProfileData) -> Option<ProfileData> {
        let key = key.into();
        if let Some(slot) = self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            return Some(std::mem::replace(&mut slot.1, value));
        }
        self.entries.push((key, value));
        None
    }

    /// Look up an entry.
    pub fn get(&self, key: &str) -> Option<&ProfileData> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    /// Returns true when the key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Remove an entry, preserving the order of the rest.
    pub fn remove(&mut self, key: &str) -> Option<ProfileData> {
        let index = self.entries.iter().position(|(existing, _)| existing == key)?;
        Some(self.entries.remove(index).1)
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ProfileData)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Iterate keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, ProfileData)> for ProfilesMap {
    fn from_iter<I: IntoIterator<Item = (K, ProfileData)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl Serialize for ProfilesMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ProfilesMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = ProfilesMap;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("an object of profile entries")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut map = ProfilesMap::new();
                while let Some((key, value)) = access.next_entry::<String, ProfileData>()? {
                    map.insert(key, value);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(OrderedVisitor)
    }
}
