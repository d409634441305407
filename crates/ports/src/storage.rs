//! Key/value storage boundary contract.
//!
//! Two stores exist at runtime: a durable one for user-managed profiles and
//! the active selection, and a session-scoped one for the deployment config
//! cache.

use idconsole_shared::Result;

/// Durable key holding the JSON object of user-managed profiles.
pub const PROFILES_KEY: &str = "profiles";
/// Durable key holding the active profile slug.
pub const ACTIVE_PROFILE_KEY: &str = "active-profile";
/// Session key holding the cached deployment config entry.
pub const RUNTIME_CONFIG_KEY: &str = "runtime-config";

/// Synchronous string key/value store.
pub trait KeyValueStorePort: Send + Sync {
    /// Read a value; `Ok(None)` when absent.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a value. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}
