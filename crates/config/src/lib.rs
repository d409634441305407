//! # idconsole-config
//!
//! Console settings schema, env parsing, and file loading, plus the
//! build-time profile layer. This crate depends on `domain` and `shared` only.

/// Build-time profile layer.
pub mod build_profiles;
/// Environment variable parsing and merging.
pub mod env;
/// Config loading helpers (file + env).
pub mod load;
/// Configuration schema types and helpers.
pub mod schema;

pub use build_profiles::{
    BUILD_PROFILES_VAR, BuildTimeProfiles, build_time_profiles, parse_build_time_profiles,
};
pub use env::{
    ConsoleEnv, ENV_CONFIG_CACHE_TTL_MS, ENV_CONFIG_PATH, ENV_CONFIG_TIMEOUT_MS, ENV_LOG_LEVEL,
    ENV_ORIGIN, ENV_STORAGE_DIR, EnvParseError, apply_env_overrides,
};
pub use load::{
    load_console_config_from_path, load_console_config_from_sources, load_console_config_std_env,
    to_pretty_json, to_pretty_toml,
};
pub use schema::{
    CURRENT_CONFIG_VERSION, ConfigLogLevel, ConfigSchemaError, ConsoleConfig,
    DEFAULT_CACHE_TTL_MS, DEFAULT_CONFIG_PATH, DEFAULT_ORIGIN, DEFAULT_TIMEOUT_MS,
    DeploymentSettings, LoggingSettings, StorageSettings, ValidatedConsoleConfig,
    parse_console_config_json, parse_console_config_toml,
};

/// Returns the config crate version.
#[must_use]
pub const fn config_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
