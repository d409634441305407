//! Composition root: adapters wired into the loader and the profile store.

use crate::InfraResult;
use idconsole_adapters::{
    FileKeyValueStore, HttpClientRegistry, HttpDeploymentConfig, HttpDeploymentConfigSettings,
    InMemoryQueryCache, SystemClock,
};
use idconsole_app::{ProfileStore, ProfileStoreDeps, RuntimeConfigDeps, RuntimeConfigLoader};
use idconsole_config::ValidatedConsoleConfig;
use idconsole_ports::LoggerPort;
use std::path::PathBuf;
use std::sync::Arc;

/// Subdirectory of the storage dir holding session-scoped entries.
pub const SESSION_DIR: &str = "session";

/// Wired console services.
pub struct Console {
    config: ValidatedConsoleConfig,
    storage_dir: PathBuf,
    loader: RuntimeConfigLoader,
    store: ProfileStore,
    clients: Arc<HttpClientRegistry>,
    queries: Arc<InMemoryQueryCache>,
    logger: Arc<dyn LoggerPort>,
}

impl Console {
    /// Effective console settings.
    pub const fn config(&self) -> &ValidatedConsoleConfig {
        &self.config
    }

    /// Durable storage directory.
    pub fn storage_dir(&self) -> &std::path::Path {
        &self.storage_dir
    }

    /// Deployment config loader.
    pub const fn loader(&self) -> &RuntimeConfigLoader {
        &self.loader
    }

    /// Profile store.
    pub const fn store(&self) -> &ProfileStore {
        &self.store
    }

    /// API client registry.
    pub fn clients(&self) -> &HttpClientRegistry {
        &self.clients
    }

    /// Query result cache.
    pub fn queries(&self) -> &InMemoryQueryCache {
        &self.queries
    }

    /// Logger shared by every service.
    pub fn logger(&self) -> &Arc<dyn LoggerPort> {
        &self.logger
    }
}

/// Wire adapters from validated settings.
///
/// Durable entries live in the storage dir, session entries in its
/// [`SESSION_DIR`] subdirectory.
pub fn build_console(
    config: ValidatedConsoleConfig,
    logger: Arc<dyn LoggerPort>,
) -> InfraResult<Console> {
    let storage_dir = config.storage.resolved_dir();
    let source = HttpDeploymentConfig::new(HttpDeploymentConfigSettings {
        document_url: config.document_url().clone(),
        timeout_ms: config.deployment.timeout_ms,
    })?;
    let clients = Arc::new(HttpClientRegistry::new(config.deployment.timeout_ms));
    let queries = Arc::new(InMemoryQueryCache::new());

    let loader = RuntimeConfigLoader::new(
        RuntimeConfigDeps {
            source: Arc::new(source),
            session: Arc::new(FileKeyValueStore::new(storage_dir.join(SESSION_DIR))),
            clock: Arc::new(SystemClock),
            logger: Some(Arc::clone(&logger)),
        },
        config.deployment.cache_ttl_ms,
    );
    let store = ProfileStore::new(ProfileStoreDeps {
        storage: Arc::new(FileKeyValueStore::new(&storage_dir)),
        clients: clients.clone(),
        queries: queries.clone(),
        logger: Some(Arc::clone(&logger)),
    });

    Ok(Console {
        config,
        storage_dir,
        loader,
        store,
        clients,
        queries,
        logger,
    })
}
