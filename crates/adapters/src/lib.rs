//! # idconsole-adapters
//!
//! Adapter implementations for ports (deployment config over HTTP, key/value
//! stores, clock, API client registry, query cache, logging).
//! This crate depends on `ports`, `domain`, and `shared`.

pub mod client_registry;
pub mod clock;
pub mod headers;
pub mod http_config;
pub mod log_sink;
pub mod logger;
pub mod query_cache;
pub mod storage;
pub mod tracing_logger;

pub use client_registry::{ApiClient, ApiPage, HttpClientRegistry, PageQuery};
pub use clock::SystemClock;
pub use headers::{HeaderMapView, pagination_from_headers};
pub use http_config::{HttpDeploymentConfig, HttpDeploymentConfigSettings};
pub use log_sink::{LogSink, MemoryLogSink, StderrLogSink};
pub use logger::JsonLogger;
pub use query_cache::InMemoryQueryCache;
pub use storage::{FileKeyValueStore, InMemoryKeyValueStore};
pub use tracing_logger::TracingLogger;

/// Returns the adapters crate version.
#[must_use]
pub const fn adapters_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
