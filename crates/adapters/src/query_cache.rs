//! In-memory query result cache.

use idconsole_ports::QueryCachePort;
use idconsole_shared::Result;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, Value>,
    generation: u64,
}

/// Keyed cache of decoded query results.
///
/// Every `invalidate_all` bumps the generation; results fetched under an
/// older generation are refused so a request racing a profile switch
/// cannot repopulate the cache with the previous endpoints' data.
#[derive(Debug, Default)]
pub struct InMemoryQueryCache {
    state: Mutex<CacheState>,
}

impl InMemoryQueryCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current generation; capture it before issuing a request.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// Cached value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.lock().entries.get(key).cloned()
    }

    /// Store `value` if no invalidation happened since `generation`.
    pub fn insert(&self, key: impl Into<String>, value: Value, generation: u64) -> bool {
        let mut state = self.lock();
        if state.generation != generation {
            return false;
        }
        state.entries.insert(key.into(), value);
        true
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Returns true when nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl QueryCachePort for InMemoryQueryCache {
    fn invalidate_all(&self) -> Result<()> {
        let mut state = self.lock();
        state.entries.clear();
        state.generation = state.generation.wrapping_add(1);
        Ok(())
    }
}
