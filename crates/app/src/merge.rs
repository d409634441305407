//! Layered merge of deployment, build-time, and user-managed profiles.

use idconsole_domain::{Profile, ProfileSlug, ProfilesMap};
use std::collections::BTreeSet;

/// One key that could not become a profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedEntry {
    /// Layer the key came from.
    pub layer: Layer,
    /// Raw key.
    pub key: String,
}

/// Source layer, in ascending precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Layer {
    /// Deployment-time document.
    Config,
    /// Profiles baked in at build time.
    BuildTime,
    /// User-managed profiles from durable storage.
    Local,
}

impl Layer {
    /// Lowercase label used in log fields.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Config => "config",
            Self::BuildTime => "buildTime",
            Self::Local => "local",
        }
    }
}

/// Result of [`merge_profile_layers`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedProfiles {
    /// Effective profiles in first-seen order. Never empty.
    pub profiles: Vec<Profile>,
    /// Valid slugs present in the deployment layer.
    pub config_slugs: BTreeSet<ProfileSlug>,
    /// Valid slugs present in the local layer.
    pub local_slugs: BTreeSet<ProfileSlug>,
    /// Keys skipped because they are not valid slugs.
    pub rejected: Vec<RejectedEntry>,
}

/// Merge `config < build_time < local`.
///
/// A higher layer replaces the whole entry of a lower one while the slug
/// keeps the position where it was first seen. An empty result holds the
/// fallback profile.
pub fn merge_profile_layers(
    config: &ProfilesMap,
    build_time: &ProfilesMap,
    local: &ProfilesMap,
) -> MergedProfiles {
    let mut merged = MergedProfiles {
        profiles: Vec::new(),
        config_slugs: BTreeSet::new(),
        local_slugs: BTreeSet::new(),
        rejected: Vec::new(),
    };

    for (layer, map) in [
        (Layer::Config, config),
        (Layer::BuildTime, build_time),
        (Layer::Local, local),
    ] {
        for (key, data) in map.iter() {
            let Ok(slug) = ProfileSlug::parse(key) else {
                merged.rejected.push(RejectedEntry {
                    layer,
                    key: key.to_owned(),
                });
                continue;
            };
            match layer {
                Layer::Config => {
                    merged.config_slugs.insert(slug.clone());
                },
                Layer::Local => {
                    merged.local_slugs.insert(slug.clone());
                },
                Layer::BuildTime => {},
            }

            let profile = Profile::from_data(slug, data);
            match merged
                .profiles
                .iter_mut()
                .find(|existing| existing.slug == profile.slug)
            {
                Some(existing) => *existing = profile,
                None => merged.profiles.push(profile),
            }
        }
    }

    if merged.profiles.is_empty() {
        merged.profiles.push(Profile::fallback());
    }

    merged
}
