//! Side-effect targets notified when the active endpoints change.

use idconsole_shared::Result;
use std::fmt;

/// Which identity API a client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ApiKind {
    /// Admin API.
    Admin,
    /// Public API.
    Public,
}

impl fmt::Display for ApiKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => formatter.write_str("admin"),
            Self::Public => formatter.write_str("public"),
        }
    }
}

/// Holder of API clients bound to the active endpoints.
pub trait ClientRegistryPort: Send + Sync {
    /// Drop every cached client so the next request rebinds.
    fn reset(&self);
}

/// Cache of server query results.
pub trait QueryCachePort: Send + Sync {
    /// Invalidate every cached query. Callers treat failures as best-effort.
    fn invalidate_all(&self) -> Result<()>;
}
