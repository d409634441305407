// Profile store behavior with in-memory fakes.
#![allow(missing_docs)]

use idconsole_adapters::{InMemoryKeyValueStore, JsonLogger, MemoryLogSink};
use idconsole_app::{
    DeleteOutcome, ImportSummary, ProfileSources, ProfileStore, ProfileStoreDeps, ProfileUpdate,
};
use idconsole_domain::{
    DEFAULT_ADMIN_BASE_URL, DEFAULT_PUBLIC_BASE_URL, ProfileData, ProfileSource, ProfilesMap,
    slugify,
};
use idconsole_ports::{
    ACTIVE_PROFILE_KEY, ClientRegistryPort, KeyValueStorePort, LogLevel, PROFILES_KEY,
    QueryCachePort,
};
use idconsole_shared::{ErrorClass, ErrorCode, ErrorEnvelope, Result};
use std::sync::{Arc, Mutex};

type Journal = Arc<Mutex<Vec<&'static str>>>;

struct RecordingClients(Journal);

impl ClientRegistryPort for RecordingClients {
    fn reset(&self) {
        if let Ok(mut journal) = self.0.lock() {
            journal.push("reset");
        }
    }
}

struct RecordingQueries {
    journal: Journal,
    fail: bool,
}

impl QueryCachePort for RecordingQueries {
    fn invalidate_all(&self) -> Result<()> {
        if let Ok(mut journal) = self.journal.lock() {
            journal.push("invalidate");
        }
        if self.fail {
            return Err(ErrorEnvelope::unexpected(
                ErrorCode::internal(),
                "cache unavailable",
                ErrorClass::NonRetriable,
            ));
        }
        Ok(())
    }
}

/// Storage whose writes fail once armed.
struct FlakyStorage {
    inner: InMemoryKeyValueStore,
    fail_writes: Mutex<bool>,
    fail_key: Mutex<Option<&'static str>>,
}

impl FlakyStorage {
    fn arm(&self) {
        if let Ok(mut fail) = self.fail_writes.lock() {
            *fail = true;
        }
    }

    fn arm_key(&self, key: &'static str) {
        if let Ok(mut fail) = self.fail_key.lock() {
            *fail = Some(key);
        }
    }

    fn fails(&self, key: &str) -> bool {
        self.fail_writes.lock().map(|fail| *fail).unwrap_or(false)
            || self
                .fail_key
                .lock()
                .map(|fail| *fail == Some(key))
                .unwrap_or(false)
    }
}

impl KeyValueStorePort for FlakyStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        if self.fails(key) {
            return Err(ErrorEnvelope::unexpected(
                ErrorCode::io(),
                "disk full",
                ErrorClass::NonRetriable,
            ));
        }
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.inner.remove(key)
    }
}

struct Harness {
    store: ProfileStore,
    storage: Arc<FlakyStorage>,
    journal: Journal,
    logs: Arc<MemoryLogSink>,
}

fn harness_with(entries: &[(&str, &str)], fail_invalidation: bool) -> Harness {
    let storage = Arc::new(FlakyStorage {
        inner: InMemoryKeyValueStore::with_entries(entries.iter().copied()),
        fail_writes: Mutex::new(false),
        fail_key: Mutex::new(None),
    });
    let journal: Journal = Arc::new(Mutex::new(Vec::new()));
    let logs = Arc::new(MemoryLogSink::default());
    let store = ProfileStore::new(ProfileStoreDeps {
        storage: storage.clone(),
        clients: Arc::new(RecordingClients(journal.clone())),
        queries: Arc::new(RecordingQueries {
            journal: journal.clone(),
            fail: fail_invalidation,
        }),
        logger: Some(Arc::new(
            JsonLogger::new(logs.clone()).with_min_level(LogLevel::Debug),
        )),
    });
    Harness {
        store,
        storage,
        journal,
        logs,
    }
}

fn harness() -> Harness {
    harness_with(&[], false)
}

fn map(entries: &[(&str, &str)]) -> ProfilesMap {
    entries
        .iter()
        .map(|(slug, admin)| (*slug, ProfileData::with_endpoints(*admin, "http://public")))
        .collect()
}

fn sources(config: &[(&str, &str)], build_time: &[(&str, &str)]) -> ProfileSources {
    ProfileSources {
        config: map(config),
        build_time: map(build_time),
    }
}

fn journal(h: &Harness) -> Vec<&'static str> {
    h.journal.lock().map(|journal| journal.clone()).unwrap_or_default()
}

fn slugs(h: &Harness) -> Vec<String> {
    h.store
        .all_profiles()
        .into_iter()
        .map(|profile| profile.slug.to_string())
        .collect()
}

#[test]
fn empty_sources_yield_the_fallback_profile() -> Result<()> {
    let h = harness();
    h.store.initialize(&ProfileSources::default())?;

    assert_eq!(slugs(&h), vec!["local"]);
    assert_eq!(h.store.active_slug().as_str(), "local");
    assert_eq!(h.store.admin_base_url(), DEFAULT_ADMIN_BASE_URL);
    assert_eq!(h.store.public_base_url(), DEFAULT_PUBLIC_BASE_URL);
    assert!(h.store.is_configured());
    assert_eq!(h.storage.get(ACTIVE_PROFILE_KEY)?.as_deref(), Some("local"));
    Ok(())
}

#[test]
fn local_overrides_config_and_reports_local_source() -> Result<()> {
    let h = harness_with(
        &[(PROFILES_KEY, r#"{"prod":{"adminBaseURL":"http://mine"}}"#)],
        false,
    );
    h.store
        .initialize(&sources(&[("prod", "http://cfg"), ("stage", "http://stage")], &[]))?;

    assert_eq!(slugs(&h), vec!["prod", "stage"]);
    assert_eq!(
        h.store.profile("prod").map(|p| p.endpoints.admin_base_url),
        Some("http://mine".to_owned())
    );
    assert_eq!(h.store.profile_source("prod"), Some(ProfileSource::Local));
    assert_eq!(h.store.profile_source("stage"), Some(ProfileSource::Config));
    assert_eq!(h.store.profile_source("nope"), None);
    assert_eq!(h.store.config_profiles().len(), 1);
    assert_eq!(h.store.local_profiles().len(), 1);
    Ok(())
}

#[test]
fn invalid_persisted_active_slug_falls_back_to_first() -> Result<()> {
    let h = harness_with(&[(ACTIVE_PROFILE_KEY, "gone")], false);
    h.store
        .initialize(&sources(&[("b", "http://b")], &[("a", "http://a")]))?;

    assert_eq!(h.store.active_slug().as_str(), "b");
    assert_eq!(h.storage.get(ACTIVE_PROFILE_KEY)?.as_deref(), Some("b"));
    Ok(())
}

#[test]
fn persisted_active_slug_is_restored() -> Result<()> {
    let h = harness_with(&[(ACTIVE_PROFILE_KEY, "a")], false);
    h.store
        .initialize(&sources(&[("b", "http://b")], &[("a", "http://a")]))?;
    assert_eq!(h.store.active_slug().as_str(), "a");
    assert_eq!(h.store.admin_base_url(), "http://a");
    Ok(())
}

#[test]
fn malformed_local_storage_is_ignored() -> Result<()> {
    let h = harness_with(&[(PROFILES_KEY, "[1,2")], false);
    h.store.initialize(&sources(&[("prod", "http://p")], &[]))?;

    assert_eq!(slugs(&h), vec!["prod"]);
    assert!(
        h.logs
            .take()
            .iter()
            .any(|line| line.contains("console.profiles.localLoadFailed"))
    );
    Ok(())
}

#[test]
fn initialize_is_idempotent() -> Result<()> {
    let h = harness();
    let layers = sources(&[("prod", "http://p")], &[("dev", "http://d")]);
    h.store.initialize(&layers)?;
    h.store.create_profile("Mine", ProfileData::default())?;
    h.store.initialize(&layers)?;
    h.store.initialize(&layers)?;

    assert_eq!(slugs(&h), vec!["prod", "dev", "mine"]);
    Ok(())
}

#[test]
fn switch_fires_reset_then_invalidate_once() -> Result<()> {
    let h = harness();
    h.store
        .initialize(&sources(&[("a", "http://a"), ("b", "http://b")], &[]))?;

    assert!(h.store.switch_profile("b")?);
    assert_eq!(journal(&h), vec!["reset", "invalidate"]);
    assert_eq!(h.storage.get(ACTIVE_PROFILE_KEY)?.as_deref(), Some("b"));
    assert_eq!(h.store.active_endpoints().admin_base_url, "http://b");
    Ok(())
}

#[test]
fn switch_to_unknown_slug_is_a_silent_no_op() -> Result<()> {
    let h = harness();
    h.store.initialize(&sources(&[("a", "http://a")], &[]))?;

    assert!(!h.store.switch_profile("zzz")?);
    assert!(journal(&h).is_empty());
    assert_eq!(h.store.active_slug().as_str(), "a");
    Ok(())
}

#[test]
fn invalidation_failures_are_swallowed() -> Result<()> {
    let h = harness_with(&[], true);
    h.store
        .initialize(&sources(&[("a", "http://a"), ("b", "http://b")], &[]))?;

    assert!(h.store.switch_profile("b")?);
    assert_eq!(journal(&h), vec!["reset", "invalidate"]);
    assert_eq!(h.store.active_slug().as_str(), "b");
    Ok(())
}

#[test]
fn create_slugifies_persists_and_keeps_active() -> Result<()> {
    let h = harness();
    h.store.initialize(&sources(&[("prod", "http://p")], &[]))?;

    let slug = h.store.create_profile(
        "  Staging EU ",
        ProfileData::with_endpoints("http://s-admin", "http://s-public"),
    )?;
    assert_eq!(slug.as_str(), "staging-eu");
    assert_eq!(slug.as_str(), slugify("  Staging EU "));
    assert_eq!(h.store.active_slug().as_str(), "prod");
    assert_eq!(
        h.store.profile("staging-eu").map(|profile| profile.name()),
        Some("Staging Eu".to_owned())
    );

    let stored = h.storage.get(PROFILES_KEY)?.unwrap_or_default();
    assert!(stored.contains("staging-eu"));
    assert!(!stored.contains("\"name\""));
    assert!(!stored.contains("\"prod\""));
    assert!(journal(&h).is_empty());
    Ok(())
}

#[test]
fn create_keeps_only_an_explicit_label() -> Result<()> {
    let h = harness();
    h.store.initialize(&sources(&[], &[]))?;

    let derived = h.store.create_profile("staging eu", ProfileData::default())?;
    assert_eq!(
        h.store.profile(derived.as_str()).map(|profile| profile.name()),
        Some("Staging Eu".to_owned())
    );

    let labelled = h.store.create_profile(
        "qa",
        ProfileData {
            name: Some("  QA cluster ".to_owned()),
            ..ProfileData::default()
        },
    )?;
    assert_eq!(
        h.store.profile(labelled.as_str()).map(|profile| profile.name()),
        Some("QA cluster".to_owned())
    );

    let exported = h.store.export_profiles();
    assert_eq!(
        exported.profiles.get("staging-eu").and_then(|data| data.name.clone()),
        None
    );
    assert_eq!(
        exported.profiles.get("qa").and_then(|data| data.name.clone()),
        Some("QA cluster".to_owned())
    );
    Ok(())
}

#[test]
fn create_rejects_invalid_and_duplicate_names() -> Result<()> {
    let h = harness();
    h.store.initialize(&sources(&[("prod", "http://p")], &[]))?;

    let invalid = h.store.create_profile("!!!", ProfileData::default()).err();
    assert_eq!(
        invalid.map(|error| error.code.to_string()),
        Some("profile:invalid_slug".to_owned())
    );

    let duplicate = h.store.create_profile("Prod", ProfileData::default()).err();
    assert_eq!(
        duplicate.map(|error| error.code.to_string()),
        Some("profile:already_exists".to_owned())
    );
    assert_eq!(h.store.all_profiles().len(), 1);
    Ok(())
}

#[test]
fn create_then_delete_restores_the_count() -> Result<()> {
    let h = harness();
    h.store.initialize(&sources(&[("prod", "http://p")], &[]))?;
    let before = h.store.all_profiles().len();

    let slug = h.store.create_profile("Scratch", ProfileData::default())?;
    assert_eq!(h.store.delete_profile(slug.as_str())?, DeleteOutcome::Deleted);
    assert_eq!(h.store.all_profiles().len(), before);
    assert!(journal(&h).is_empty());
    Ok(())
}

#[test]
fn failed_active_write_on_delete_keeps_disk_and_memory_in_step() -> Result<()> {
    let h = harness();
    h.store.initialize(&sources(&[], &[]))?;
    h.store.create_profile("Dev", ProfileData::default())?;
    h.store.create_profile("Qa", ProfileData::default())?;
    assert!(h.store.switch_profile("dev")?);
    let before = h.storage.get(PROFILES_KEY)?;
    let journal_before = journal(&h).len();

    h.storage.arm_key(ACTIVE_PROFILE_KEY);
    let error = h.store.delete_profile("dev").err();
    assert_eq!(error.map(|error| error.code.to_string()), Some("core:io".to_owned()));

    assert_eq!(h.storage.get(PROFILES_KEY)?, before);
    assert!(h.store.profile("dev").is_some());
    assert_eq!(h.store.active_slug().as_str(), "dev");
    assert_eq!(journal(&h).len(), journal_before);
    Ok(())
}

#[test]
fn config_profiles_cannot_be_deleted() -> Result<()> {
    let h = harness();
    h.store.initialize(&sources(&[("prod", "http://p")], &[]))?;

    assert_eq!(h.store.delete_profile("prod")?, DeleteOutcome::Protected);
    assert_eq!(h.store.delete_profile("nope")?, DeleteOutcome::NotFound);
    assert_eq!(h.store.all_profiles().len(), 1);
    Ok(())
}

#[test]
fn deleting_the_active_profile_switches_to_the_first() -> Result<()> {
    let h = harness();
    h.store.initialize(&sources(&[("prod", "http://p")], &[]))?;
    h.store.create_profile("Dev", ProfileData::default())?;
    h.store.switch_profile("dev")?;
    h.journal.lock().map(|mut journal| journal.clear()).unwrap_or(());

    assert_eq!(h.store.delete_profile("dev")?, DeleteOutcome::Deleted);
    assert_eq!(h.store.active_slug().as_str(), "prod");
    assert_eq!(h.storage.get(ACTIVE_PROFILE_KEY)?.as_deref(), Some("prod"));
    assert_eq!(journal(&h), vec!["reset", "invalidate"]);
    Ok(())
}

#[test]
fn deleting_the_last_profile_synthesizes_the_fallback() -> Result<()> {
    let h = harness_with(&[(PROFILES_KEY, r#"{"only":{}}"#)], false);
    h.store.initialize(&ProfileSources::default())?;

    assert_eq!(h.store.delete_profile("only")?, DeleteOutcome::Deleted);
    assert_eq!(slugs(&h), vec!["local"]);
    assert_eq!(h.store.active_slug().as_str(), "local");
    Ok(())
}

#[test]
fn update_merges_fields_and_fires_only_when_active() -> Result<()> {
    let h = harness();
    h.store.initialize(&sources(&[("prod", "http://p")], &[]))?;
    h.store.create_profile(
        "Dev",
        ProfileData::with_endpoints("http://dev-admin", "http://dev-public"),
    )?;

    assert!(h.store.update_profile(
        "dev",
        ProfileUpdate {
            admin_base_url: Some("http://dev-admin-2".to_owned()),
            ..ProfileUpdate::default()
        },
    )?);
    let Some(dev) = h.store.profile("dev") else {
        return Err(ErrorEnvelope::expected(ErrorCode::not_found(), "dev missing"));
    };
    assert_eq!(dev.endpoints.admin_base_url, "http://dev-admin-2");
    assert_eq!(dev.endpoints.public_base_url, "http://dev-public");
    assert!(journal(&h).is_empty());

    assert!(h.store.update_profile(
        "prod",
        ProfileUpdate {
            public_base_url: Some("http://p-public".to_owned()),
            ..ProfileUpdate::default()
        },
    )?);
    assert_eq!(journal(&h), vec!["reset", "invalidate"]);
    assert!(!h.store.update_profile("nope", ProfileUpdate::default())?);
    Ok(())
}

#[test]
fn promoted_config_profiles_persist_edits_and_stay_protected() -> Result<()> {
    let h = harness();
    let layers = sources(&[("prod", "http://p")], &[]);
    h.store.initialize(&layers)?;

    assert!(h.store.promote_profile("prod")?);
    h.store.update_profile(
        "prod",
        ProfileUpdate {
            admin_base_url: Some("http://override".to_owned()),
            ..ProfileUpdate::default()
        },
    )?;
    assert_eq!(h.store.profile_source("prod"), Some(ProfileSource::Local));
    assert_eq!(h.store.delete_profile("prod")?, DeleteOutcome::Protected);

    h.store.initialize(&layers)?;
    assert_eq!(h.store.admin_base_url(), "http://override");
    assert!(!h.store.promote_profile("nope")?);
    Ok(())
}

#[test]
fn export_then_import_round_trips_local_profiles() -> Result<()> {
    let first = harness();
    first.store.initialize(&sources(&[("prod", "http://p")], &[]))?;
    first.store.create_profile("One", ProfileData::default())?;
    first.store.create_profile("Two", ProfileData::default())?;

    let document = first.store.export_profiles();
    assert_eq!(document.version, 1);
    assert_eq!(
        document.profiles.keys().collect::<Vec<_>>(),
        vec!["one", "two"]
    );
    let json = serde_json::to_string(&document).map_err(|error| {
        ErrorEnvelope::unexpected(ErrorCode::internal(), error.to_string(), ErrorClass::NonRetriable)
    })?;

    let fresh = harness();
    fresh.store.initialize(&ProfileSources::default())?;
    assert_eq!(
        fresh.store.import_profiles(&json)?,
        ImportSummary {
            imported: 2,
            skipped: Vec::new()
        }
    );
    assert_eq!(
        fresh.store.import_profiles(&json)?,
        ImportSummary {
            imported: 0,
            skipped: vec!["one".to_owned(), "two".to_owned()]
        }
    );
    Ok(())
}

#[test]
fn import_rejects_bad_documents_without_changes() -> Result<()> {
    let h = harness();
    h.store.initialize(&ProfileSources::default())?;

    for (raw, code) in [
        ("{", "profile:invalid_document"),
        (r#"{"version":2,"profiles":{}}"#, "profile:unsupported_version"),
        (r#"{"version":1}"#, "profile:invalid_document"),
        (r#"{"version":1,"profiles":{"Bad Slug":{}}}"#, "profile:invalid_slug"),
    ] {
        let error = h.store.import_profiles(raw).err();
        assert_eq!(error.map(|error| error.code.to_string()), Some(code.to_owned()));
    }
    assert_eq!(slugs(&h), vec!["local"]);
    Ok(())
}

#[test]
fn failed_writes_leave_state_unchanged() -> Result<()> {
    let h = harness();
    h.store
        .initialize(&sources(&[("a", "http://a"), ("b", "http://b")], &[]))?;
    h.storage.arm();

    let error = h.store.create_profile("New", ProfileData::default()).err();
    assert_eq!(error.map(|error| error.code), Some(ErrorCode::io()));
    assert!(h.store.profile("new").is_none());

    assert!(h.store.switch_profile("b").is_err());
    assert_eq!(h.store.active_slug().as_str(), "a");
    assert!(journal(&h).is_empty());
    Ok(())
}
