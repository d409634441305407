//! Profile store: the active connection profile and the user-managed set.
//!
//! Profiles and the active slug live behind one mutex so readers never see
//! an active slug that names a missing profile. Storage writes happen before
//! the new state is committed; client resets and query invalidation run
//! after the lock is released.

use crate::merge::merge_profile_layers;
use idconsole_domain::{
    DEFAULT_ADMIN_BASE_URL, DEFAULT_PUBLIC_BASE_URL, Profile, ProfileData, ProfileEndpoints,
    ProfileSlug, ProfileSource, ProfilesDocument, ProfilesMap,
};
use idconsole_ports::{
    ACTIVE_PROFILE_KEY, ClientRegistryPort, KeyValueStorePort, LogFields, LoggerPort,
    PROFILES_KEY, QueryCachePort,
};
use idconsole_shared::{ErrorClass, ErrorCode, ErrorEnvelope, Result};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Non-local layers fed into [`ProfileStore::initialize`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileSources {
    /// Deployment-time profiles.
    pub config: ProfilesMap,
    /// Profiles baked in at build time.
    pub build_time: ProfilesMap,
}

/// Partial update; `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    /// New admin API base URL.
    pub admin_base_url: Option<String>,
    /// New public API base URL.
    pub public_base_url: Option<String>,
    /// New display label; an empty string clears it.
    pub name: Option<String>,
}

/// Outcome of [`ProfileStore::delete_profile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DeleteOutcome {
    /// No profile with that slug.
    NotFound,
    /// Deployment-sourced profiles cannot be deleted.
    Protected,
    /// Removed.
    Deleted,
}

/// Outcome of [`ProfileStore::import_profiles`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    /// Number of profiles added.
    pub imported: usize,
    /// Slugs skipped because they already existed.
    pub skipped: Vec<String>,
}

/// A profile with its provenance, for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileView {
    /// The profile.
    #[serde(flatten)]
    pub profile: Profile,
    /// Display name.
    pub name: String,
    /// Effective source layer.
    pub source: ProfileSource,
    /// True for the active profile.
    pub active: bool,
}

/// Dependencies required by the store.
#[derive(Clone)]
pub struct ProfileStoreDeps {
    /// Durable store for user-managed profiles and the active slug.
    pub storage: Arc<dyn KeyValueStorePort>,
    /// API clients bound to the active endpoints.
    pub clients: Arc<dyn ClientRegistryPort>,
    /// Server query cache.
    pub queries: Arc<dyn QueryCachePort>,
    /// Optional logger.
    pub logger: Option<Arc<dyn LoggerPort>>,
}

#[derive(Debug, Clone)]
struct StoreState {
    profiles: Vec<Profile>,
    active: ProfileSlug,
    config_slugs: BTreeSet<ProfileSlug>,
    local_slugs: BTreeSet<ProfileSlug>,
}

impl StoreState {
    fn fallback() -> Self {
        Self {
            profiles: vec![Profile::fallback()],
            active: ProfileSlug::fallback(),
            config_slugs: BTreeSet::new(),
            local_slugs: BTreeSet::new(),
        }
    }

    fn find(&self, slug: &str) -> Option<&Profile> {
        self.profiles
            .iter()
            .find(|profile| profile.slug.as_str() == slug)
    }

    fn source_of(&self, slug: &ProfileSlug) -> ProfileSource {
        if self.local_slugs.contains(slug) || !self.config_slugs.contains(slug) {
            ProfileSource::Local
        } else {
            ProfileSource::Config
        }
    }

    fn local_map(&self) -> ProfilesMap {
        self.profiles
            .iter()
            .filter(|profile| self.source_of(&profile.slug) == ProfileSource::Local)
            .map(|profile| (profile.slug.as_str(), profile.to_data()))
            .collect()
    }

    fn first_slug(&self) -> ProfileSlug {
        self.profiles
            .first()
            .map_or_else(ProfileSlug::fallback, |profile| profile.slug.clone())
    }

    fn view(&self, profile: &Profile) -> ProfileView {
        ProfileView {
            name: profile.name(),
            source: self.source_of(&profile.slug),
            active: profile.slug == self.active,
            profile: profile.clone(),
        }
    }
}

/// Holds the merged profile set and the active selection.
pub struct ProfileStore {
    deps: ProfileStoreDeps,
    state: Mutex<StoreState>,
}

impl ProfileStore {
    /// Create a store holding only the fallback profile until initialized.
    #[must_use]
    pub fn new(deps: ProfileStoreDeps) -> Self {
        Self {
            deps,
            state: Mutex::new(StoreState::fallback()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Rebuild all state from storage and the given layers.
    ///
    /// The resolved active slug is written back even when unchanged. State is
    /// replaced before that write, so a storage failure is returned but the
    /// store remains usable.
    pub fn initialize(&self, sources: &ProfileSources) -> Result<()> {
        let local = self.load_local_profiles();
        let merged = merge_profile_layers(&sources.config, &sources.build_time, &local);
        for rejected in &merged.rejected {
            self.log_warn(
                "console.profiles.rejected",
                "Ignoring profile with an invalid slug",
                Some(fields([
                    ("layer", Value::from(rejected.layer.as_str())),
                    ("slug", Value::from(rejected.key.as_str())),
                ])),
            );
        }

        let persisted_active = self.read_storage(ACTIVE_PROFILE_KEY);
        let mut state = StoreState {
            profiles: merged.profiles,
            active: ProfileSlug::fallback(),
            config_slugs: merged.config_slugs,
            local_slugs: merged.local_slugs,
        };
        state.active = persisted_active
            .as_deref()
            .and_then(|slug| state.find(slug))
            .map_or_else(|| state.first_slug(), |profile| profile.slug.clone());
        let active = state.active.clone();
        let count = state.profiles.len();

        *self.lock() = state;
        self.log_info(
            "console.profiles.initialized",
            "Profiles initialized",
            Some(fields([
                ("profiles", Value::from(count)),
                ("active", Value::from(active.as_str())),
            ])),
        );
        self.write_storage(ACTIVE_PROFILE_KEY, active.as_str())
    }

    /// Make `slug` active. Returns `false` for unknown slugs.
    pub fn switch_profile(&self, slug: &str) -> Result<bool> {
        {
            let mut state = self.lock();
            let Some(profile) = state.find(slug) else {
                return Ok(false);
            };
            let target = profile.slug.clone();
            self.write_storage(ACTIVE_PROFILE_KEY, target.as_str())?;
            state.active = target;
        }

        self.log_info(
            "console.profiles.switch",
            "Switched active profile",
            Some(fields([("slug", Value::from(slug))])),
        );
        self.fire_side_effects();
        Ok(true)
    }

    /// Create a user-managed profile from a display name.
    ///
    /// The active profile is unchanged.
    pub fn create_profile(&self, name: &str, data: ProfileData) -> Result<ProfileSlug> {
        let slug = ProfileSlug::from_name(name)?;
        {
            let mut state = self.lock();
            if state.find(slug.as_str()).is_some() {
                return Err(ErrorEnvelope::expected(
                    ErrorCode::new("profile", "already_exists"),
                    format!("profile \"{slug}\" already exists"),
                )
                .with_metadata("slug", slug.as_str()));
            }

            let mut next = state.clone();
            next.profiles.push(Profile::from_data(slug.clone(), &data));
            next.local_slugs.insert(slug.clone());
            self.persist_local(&next)?;
            *state = next;
        }

        self.log_info(
            "console.profiles.create",
            "Created profile",
            Some(fields([("slug", Value::from(slug.as_str()))])),
        );
        Ok(slug)
    }

    /// Apply a partial update. Returns `false` for unknown slugs.
    ///
    /// Deployment profiles that were not promoted keep the edit in memory
    /// only.
    pub fn update_profile(&self, slug: &str, update: ProfileUpdate) -> Result<bool> {
        let was_active = {
            let mut state = self.lock();
            let Some(existing) = state.find(slug) else {
                return Ok(false);
            };
            let target = existing.slug.clone();
            let current = existing.to_data();
            let data = ProfileData {
                admin_base_url: update.admin_base_url.or(current.admin_base_url),
                public_base_url: update.public_base_url.or(current.public_base_url),
                name: update.name.or(current.name),
            };

            let mut next = state.clone();
            if let Some(profile) = next
                .profiles
                .iter_mut()
                .find(|profile| profile.slug == target)
            {
                *profile = Profile::from_data(target.clone(), &data);
            }
            self.persist_local(&next)?;
            *state = next;
            state.active == target
        };

        self.log_info(
            "console.profiles.update",
            "Updated profile",
            Some(fields([
                ("slug", Value::from(slug)),
                ("active", Value::from(was_active)),
            ])),
        );
        if was_active {
            self.fire_side_effects();
        }
        Ok(true)
    }

    /// Delete a user-managed profile.
    ///
    /// Deleting the active profile activates the first remaining one; when
    /// none remains the fallback profile is synthesized first.
    pub fn delete_profile(&self, slug: &str) -> Result<DeleteOutcome> {
        let switched_to = {
            let mut state = self.lock();
            let Some(existing) = state.find(slug) else {
                return Ok(DeleteOutcome::NotFound);
            };
            let target = existing.slug.clone();
            if state.config_slugs.contains(&target) {
                return Ok(DeleteOutcome::Protected);
            }

            let mut next = state.clone();
            next.profiles.retain(|profile| profile.slug != target);
            next.local_slugs.remove(&target);
            if next.profiles.is_empty() {
                next.profiles.push(Profile::fallback());
            }
            self.persist_local(&next)?;

            let switched_to = if next.active == target {
                let first = next.first_slug();
                if let Err(error) = self.write_storage(ACTIVE_PROFILE_KEY, first.as_str()) {
                    // Put the previous profiles blob back so disk matches memory.
                    let _ = self.persist_local(&state);
                    return Err(error);
                }
                next.active = first.clone();
                Some(first)
            } else {
                None
            };
            *state = next;
            switched_to
        };

        self.log_info(
            "console.profiles.delete",
            "Deleted profile",
            Some(fields([("slug", Value::from(slug))])),
        );
        if let Some(active) = switched_to {
            self.log_info(
                "console.profiles.switch",
                "Switched active profile",
                Some(fields([("slug", Value::from(active.as_str()))])),
            );
            self.fire_side_effects();
        }
        Ok(DeleteOutcome::Deleted)
    }

    /// Turn a deployment profile into a persisted local override.
    ///
    /// The profile stays delete-protected. Returns `false` for unknown slugs.
    pub fn promote_profile(&self, slug: &str) -> Result<bool> {
        {
            let mut state = self.lock();
            let Some(existing) = state.find(slug) else {
                return Ok(false);
            };
            let target = existing.slug.clone();
            let mut next = state.clone();
            next.local_slugs.insert(target);
            self.persist_local(&next)?;
            *state = next;
        }

        self.log_info(
            "console.profiles.promote",
            "Promoted profile to a local override",
            Some(fields([("slug", Value::from(slug))])),
        );
        Ok(true)
    }

    /// Export local profiles as a version 1 document.
    pub fn export_profiles(&self) -> ProfilesDocument {
        ProfilesDocument::new(self.lock().local_map())
    }

    /// Import a version 1 document; existing slugs are skipped.
    pub fn import_profiles(&self, json: &str) -> Result<ImportSummary> {
        let document = ProfilesDocument::parse(json)?;
        let summary = {
            let mut state = self.lock();
            let mut next = state.clone();
            let mut summary = ImportSummary::default();

            for (key, data) in document.profiles.iter() {
                let slug = ProfileSlug::parse(key)?;
                if next.find(slug.as_str()).is_some() {
                    summary.skipped.push(key.to_owned());
                    continue;
                }
                next.profiles.push(Profile::from_data(slug.clone(), data));
                next.local_slugs.insert(slug);
                summary.imported += 1;
            }

            if summary.imported > 0 {
                self.persist_local(&next)?;
                *state = next;
            }
            summary
        };

        self.log_info(
            "console.profiles.import",
            "Imported profiles",
            Some(fields([
                ("imported", Value::from(summary.imported)),
                ("skipped", Value::from(summary.skipped.clone())),
            ])),
        );
        Ok(summary)
    }

    /// Active slug.
    pub fn active_slug(&self) -> ProfileSlug {
        self.lock().active.clone()
    }

    /// Active profile.
    pub fn active_profile(&self) -> Option<Profile> {
        let state = self.lock();
        state.find(state.active.as_str()).cloned()
    }

    /// Active endpoints, defaulting anything missing.
    pub fn active_endpoints(&self) -> ProfileEndpoints {
        self.active_profile()
            .map(|profile| profile.endpoints)
            .unwrap_or_default()
    }

    /// Admin API base URL of the active profile.
    pub fn admin_base_url(&self) -> String {
        self.active_profile()
            .map(|profile| profile.endpoints.admin_base_url)
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_ADMIN_BASE_URL.to_owned())
    }

    /// Public API base URL of the active profile.
    pub fn public_base_url(&self) -> String {
        self.active_profile()
            .map(|profile| profile.endpoints.public_base_url)
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_PUBLIC_BASE_URL.to_owned())
    }

    /// True when an admin URL is available.
    pub fn is_configured(&self) -> bool {
        !self.admin_base_url().is_empty()
    }

    /// Every profile in iteration order.
    pub fn all_profiles(&self) -> Vec<Profile> {
        self.lock().profiles.clone()
    }

    /// Profiles whose effective source is local.
    pub fn local_profiles(&self) -> Vec<Profile> {
        self.profiles_from(ProfileSource::Local)
    }

    /// Profiles whose effective source is the deployment document.
    pub fn config_profiles(&self) -> Vec<Profile> {
        self.profiles_from(ProfileSource::Config)
    }

    /// Profile by slug.
    pub fn profile(&self, slug: &str) -> Option<Profile> {
        self.lock().find(slug).cloned()
    }

    /// Effective source of a profile, `None` when unknown.
    pub fn profile_source(&self, slug: &str) -> Option<ProfileSource> {
        let state = self.lock();
        state
            .find(slug)
            .map(|profile| state.source_of(&profile.slug))
    }

    /// Every profile with its source and active flag.
    pub fn profile_views(&self) -> Vec<ProfileView> {
        let state = self.lock();
        state
            .profiles
            .iter()
            .map(|profile| state.view(profile))
            .collect()
    }

    fn profiles_from(&self, source: ProfileSource) -> Vec<Profile> {
        let state = self.lock();
        state
            .profiles
            .iter()
            .filter(|profile| state.source_of(&profile.slug) == source)
            .cloned()
            .collect()
    }

    fn fire_side_effects(&self) {
        self.deps.clients.reset();
        if let Err(error) = self.deps.queries.invalidate_all() {
            self.log_debug(
                "console.profiles.invalidateFailed",
                "Query cache invalidation failed",
                Some(fields([("error", Value::from(error.to_string()))])),
            );
        }
    }

    fn load_local_profiles(&self) -> ProfilesMap {
        let Some(raw) = self.read_storage(PROFILES_KEY) else {
            return ProfilesMap::new();
        };
        serde_json::from_str(&raw).unwrap_or_else(|error| {
            self.log_warn(
                "console.profiles.localLoadFailed",
                "Stored profiles are malformed; ignoring them",
                Some(fields([("error", Value::from(error.to_string()))])),
            );
            ProfilesMap::new()
        })
    }

    fn read_storage(&self, key: &str) -> Option<String> {
        match self.deps.storage.get(key) {
            Ok(value) => value,
            Err(error) => {
                self.log_warn(
                    "console.profiles.storageReadFailed",
                    "Could not read profile storage",
                    Some(fields([
                        ("key", Value::from(key)),
                        ("error", Value::from(error.to_string())),
                    ])),
                );
                None
            },
        }
    }

    fn persist_local(&self, state: &StoreState) -> Result<()> {
        let raw = serde_json::to_string(&state.local_map()).map_err(|error| {
            ErrorEnvelope::unexpected(
                ErrorCode::internal(),
                format!("failed to serialize profiles: {error}"),
                ErrorClass::NonRetriable,
            )
        })?;
        self.write_storage(PROFILES_KEY, &raw)
    }

    fn write_storage(&self, key: &str, value: &str) -> Result<()> {
        self.deps.storage.set(key, value).inspect_err(|error| {
            self.log_error(
                "console.profiles.storageWriteFailed",
                "Could not write profile storage",
                Some(fields([
                    ("key", Value::from(key)),
                    ("error", Value::from(error.to_string())),
                ])),
            );
        })
    }

    fn log_debug(&self, event: &str, message: &str, fields: Option<LogFields>) {
        if let Some(logger) = self.deps.logger.as_ref() {
            logger.debug(event, message, fields);
        }
    }

    fn log_info(&self, event: &str, message: &str, fields: Option<LogFields>) {
        if let Some(logger) = self.deps.logger.as_ref() {
            logger.info(event, message, fields);
        }
    }

    fn log_warn(&self, event: &str, message: &str, fields: Option<LogFields>) {
        if let Some(logger) = self.deps.logger.as_ref() {
            logger.warn(event, message, fields);
        }
    }

    fn log_error(&self, event: &str, message: &str, fields: Option<LogFields>) {
        if let Some(logger) = self.deps.logger.as_ref() {
            logger.error(event, message, fields);
        }
    }
}

fn fields<const N: usize>(entries: [(&str, Value); N]) -> LogFields {
    entries
        .into_iter()
        .map(|(key, value)| (key.into(), value))
        .collect()
}
