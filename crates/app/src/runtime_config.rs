//! Deployment config loader with a session-scoped TTL cache.
//!
//! The loader never fails: every problem degrades to an empty profiles map
//! so the console stays usable on built-in defaults.

use idconsole_domain::{ProfileData, ProfilesMap};
use idconsole_ports::{
    ClockPort, DeploymentConfigPort, KeyValueStorePort, LogFields, LoggerPort, RUNTIME_CONFIG_KEY,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Arc, Mutex, PoisonError};

/// Parsed deployment document.
pub type RuntimeConfig = ProfilesMap;

/// Slug given to a flat single-profile document.
pub const FLAT_CONFIG_SLUG: &str = "default";

const ENDPOINT_KEYS: [&str; 4] = [
    "adminBaseURL",
    "publicBaseURL",
    "kratosAdminBaseURL",
    "kratosPublicBaseURL",
];

/// Session cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedRuntimeConfig {
    /// Normalized profiles map.
    pub payload: RuntimeConfig,
    /// Epoch milliseconds at which the entry was written.
    pub timestamp: u64,
}

/// Dependencies required by the loader.
#[derive(Clone)]
pub struct RuntimeConfigDeps {
    /// Deployment document source.
    pub source: Arc<dyn DeploymentConfigPort>,
    /// Session-scoped store holding the cache entry.
    pub session: Arc<dyn KeyValueStorePort>,
    /// Wall clock.
    pub clock: Arc<dyn ClockPort>,
    /// Optional logger.
    pub logger: Option<Arc<dyn LoggerPort>>,
}

/// Loads the deployment document once per TTL window.
pub struct RuntimeConfigLoader {
    deps: RuntimeConfigDeps,
    ttl_ms: u64,
    current: Mutex<Option<RuntimeConfig>>,
}

impl RuntimeConfigLoader {
    /// Create a loader. A TTL of zero disables cache reads.
    #[must_use]
    pub const fn new(deps: RuntimeConfigDeps, ttl_ms: u64) -> Self {
        Self {
            deps,
            ttl_ms,
            current: Mutex::new(None),
        }
    }

    /// Last loaded value, without I/O.
    pub fn get(&self) -> Option<RuntimeConfig> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Load from the session cache or the deployment source.
    pub async fn load(&self) -> RuntimeConfig {
        if let Some(cached) = self.read_cache() {
            self.debug("console.runtimeConfig.cacheHit", "Using cached runtime config", None);
            return self.store(cached);
        }

        let response = match self.deps.source.fetch().await {
            Ok(response) => response,
            Err(error) => {
                self.warn(
                    "console.runtimeConfig.fetchFailed",
                    "Could not load deployment config",
                    Some(fields([("error", Value::from(error.to_string()))])),
                );
                return self.store(RuntimeConfig::new());
            },
        };

        if response.status == 404 {
            self.debug(
                "console.runtimeConfig.missing",
                "No deployment config provided",
                None,
            );
            return self.store(RuntimeConfig::new());
        }
        if !response.is_success() {
            self.warn(
                "console.runtimeConfig.fetchFailed",
                "Failed to load deployment config",
                Some(fields([("status", Value::from(response.status))])),
            );
            return self.store(RuntimeConfig::new());
        }

        let config = match parse_runtime_config(&response.body) {
            Ok(config) => config,
            Err(message) => {
                self.warn(
                    "console.runtimeConfig.invalid",
                    "Deployment config is not a valid profiles document",
                    Some(fields([("error", Value::from(message))])),
                );
                return self.store(RuntimeConfig::new());
            },
        };

        self.write_cache(&config);
        self.debug(
            "console.runtimeConfig.loaded",
            "Loaded runtime config",
            Some(fields([
                ("profiles", Value::from(config.len())),
                (
                    "slugs",
                    Value::from(config.keys().map(str::to_owned).collect::<Vec<_>>()),
                ),
            ])),
        );
        self.store(config)
    }

    fn store(&self, config: RuntimeConfig) -> RuntimeConfig {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = Some(config.clone());
        config
    }

    fn read_cache(&self) -> Option<RuntimeConfig> {
        let raw = match self.deps.session.get(RUNTIME_CONFIG_KEY) {
            Ok(raw) => raw?,
            Err(error) => {
                self.debug(
                    "console.runtimeConfig.cacheReadFailed",
                    "Session cache read failed",
                    Some(fields([("error", Value::from(error.to_string()))])),
                );
                return None;
            },
        };

        let fresh = serde_json::from_str::<CachedRuntimeConfig>(&raw)
            .ok()
            .filter(|entry| self.deps.clock.now_ms().saturating_sub(entry.timestamp) < self.ttl_ms);
        if fresh.is_none() {
            self.evict_cache();
        }
        fresh.map(|entry| entry.payload)
    }

    fn evict_cache(&self) {
        if let Err(error) = self.deps.session.remove(RUNTIME_CONFIG_KEY) {
            self.debug(
                "console.runtimeConfig.cacheEvictFailed",
                "Session cache eviction failed",
                Some(fields([("error", Value::from(error.to_string()))])),
            );
        }
    }

    fn write_cache(&self, config: &RuntimeConfig) {
        let entry = CachedRuntimeConfig {
            payload: config.clone(),
            timestamp: self.deps.clock.now_ms(),
        };
        let result = serde_json::to_string(&entry)
            .map_err(|error| error.to_string())
            .and_then(|raw| {
                self.deps
                    .session
                    .set(RUNTIME_CONFIG_KEY, &raw)
                    .map_err(|error| error.to_string())
            });
        if let Err(error) = result {
            self.warn(
                "console.runtimeConfig.cacheWriteFailed",
                "Could not cache runtime config",
                Some(fields([("error", Value::from(error))])),
            );
        }
    }

    fn debug(&self, event: &str, message: &str, fields: Option<LogFields>) {
        if let Some(logger) = self.deps.logger.as_ref() {
            logger.debug(event, message, fields);
        }
    }

    fn warn(&self, event: &str, message: &str, fields: Option<LogFields>) {
        if let Some(logger) = self.deps.logger.as_ref() {
            logger.warn(event, message, fields);
        }
    }
}

/// Parse a deployment document into a profiles map.
///
/// Accepts either `{ slug: ProfileData, ... }` or a flat single-profile
/// object, which is filed under [`FLAT_CONFIG_SLUG`].
pub fn parse_runtime_config(body: &str) -> Result<RuntimeConfig, String> {
    let value: Value = serde_json::from_str(body).map_err(|error| error.to_string())?;
    let Value::Object(object) = &value else {
        return Err("expected a JSON object".to_owned());
    };

    let flat = ENDPOINT_KEYS
        .iter()
        .any(|key| object.get(*key).is_some_and(Value::is_string));
    // `Value` objects are key-sorted; typed shapes are read from the raw
    // text so the map keeps document order.
    if flat {
        let data: ProfileData = serde_json::from_str(body).map_err(|error| error.to_string())?;
        return Ok([(FLAT_CONFIG_SLUG, data)].into_iter().collect());
    }

    serde_json::from_str(body).map_err(|error| error.to_string())
}

fn fields<const N: usize>(entries: [(&str, Value); N]) -> LogFields {
    entries
        .into_iter()
        .map(|(key, value)| (key.into(), value))
        .collect()
}
