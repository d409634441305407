//! Environment variable parsing and env-to-config merging.
//!
//! Parsing is strict: a variable that is present but empty or malformed
//! fails instead of being ignored.

use crate::schema::{ConfigLogLevel, ConsoleConfig, ValidatedConsoleConfig};
use idconsole_shared::{ErrorCode, ErrorEnvelope, redact_url_credentials};
use std::collections::BTreeMap;
use std::fmt;
use url::Url;

/// Env var: console origin.
pub const ENV_ORIGIN: &str = "IDCONSOLE_ORIGIN";
/// Env var: deployment document path.
pub const ENV_CONFIG_PATH: &str = "IDCONSOLE_CONFIG_PATH";
/// Env var: deployment fetch timeout in milliseconds.
pub const ENV_CONFIG_TIMEOUT_MS: &str = "IDCONSOLE_CONFIG_TIMEOUT_MS";
/// Env var: deployment cache lifetime in milliseconds.
pub const ENV_CONFIG_CACHE_TTL_MS: &str = "IDCONSOLE_CONFIG_CACHE_TTL_MS";
/// Env var: durable storage directory.
pub const ENV_STORAGE_DIR: &str = "IDCONSOLE_STORAGE_DIR";
/// Env var: log level.
pub const ENV_LOG_LEVEL: &str = "IDCONSOLE_LOG_LEVEL";

const ALL_VARS: [&str; 6] = [
    ENV_ORIGIN,
    ENV_CONFIG_PATH,
    ENV_CONFIG_TIMEOUT_MS,
    ENV_CONFIG_CACHE_TTL_MS,
    ENV_STORAGE_DIR,
    ENV_LOG_LEVEL,
];

/// Typed env-derived overrides for `ConsoleConfig`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsoleEnv {
    /// Override for `deployment.origin`.
    pub origin: Option<Box<str>>,
    /// Override for `deployment.path`.
    pub config_path: Option<Box<str>>,
    /// Override for `deployment.timeoutMs`.
    pub timeout_ms: Option<u64>,
    /// Override for `deployment.cacheTtlMs`.
    pub cache_ttl_ms: Option<u64>,
    /// Override for `storage.dir`.
    pub storage_dir: Option<Box<str>>,
    /// Override for `logging.level`.
    pub log_level: Option<ConfigLogLevel>,
}

impl ConsoleEnv {
    /// Parse env overrides from a key/value map (useful for tests and fixtures).
    pub fn from_map(map: &BTreeMap<String, String>) -> Result<Self, EnvParseError> {
        Ok(Self {
            origin: parse_optional_url(map, ENV_ORIGIN)?,
            config_path: parse_optional_trimmed(map, ENV_CONFIG_PATH)?,
            timeout_ms: parse_optional_u64(map, ENV_CONFIG_TIMEOUT_MS)?,
            cache_ttl_ms: parse_optional_u64(map, ENV_CONFIG_CACHE_TTL_MS)?,
            storage_dir: parse_optional_trimmed(map, ENV_STORAGE_DIR)?,
            log_level: parse_optional_log_level(map, ENV_LOG_LEVEL)?,
        })
    }

    /// Parse env overrides from the current process environment.
    pub fn from_std_env() -> Result<Self, EnvParseError> {
        let map = ALL_VARS
            .iter()
            .filter_map(|name| {
                std::env::var(name)
                    .ok()
                    .map(|value| ((*name).to_owned(), value))
            })
            .collect();
        Self::from_map(&map)
    }
}

/// Apply env overrides to a base config (env wins over file/default values).
pub fn apply_env_overrides(
    base: ConsoleConfig,
    env: &ConsoleEnv,
) -> Result<ValidatedConsoleConfig, ErrorEnvelope> {
    let mut config = base;
    if let Some(origin) = &env.origin {
        config.deployment.origin = origin.to_string();
    }
    if let Some(path) = &env.config_path {
        config.deployment.path = path.to_string();
    }
    if let Some(timeout_ms) = env.timeout_ms {
        config.deployment.timeout_ms = timeout_ms;
    }
    if let Some(cache_ttl_ms) = env.cache_ttl_ms {
        config.deployment.cache_ttl_ms = cache_ttl_ms;
    }
    if let Some(dir) = &env.storage_dir {
        config.storage.dir = Some(dir.to_string());
    }
    if let Some(level) = env.log_level {
        config.logging.level = level;
    }

    config.validate_and_normalize().map_err(Into::into)
}

/// Env parsing failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvParseError {
    /// An env var was present but empty after trimming.
    EmptyValue {
        /// Env var name.
        var: &'static str,
    },
    /// Integer env var had an invalid value.
    InvalidInt {
        /// Env var name.
        var: &'static str,
        /// Raw input value.
        value: String,
    },
    /// URL env var had an invalid value.
    InvalidUrl {
        /// Env var name.
        var: &'static str,
        /// Raw input value.
        value: String,
    },
    /// Enum env var had an invalid value.
    InvalidEnum {
        /// Env var name.
        var: &'static str,
        /// Raw input value.
        value: String,
    },
}

impl EnvParseError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::EmptyValue { .. } => ErrorCode::new("config", "empty_env_var"),
            Self::InvalidInt { .. } => ErrorCode::new("config", "invalid_env_int"),
            Self::InvalidUrl { .. } => ErrorCode::new("config", "invalid_env_url"),
            Self::InvalidEnum { .. } => ErrorCode::new("config", "invalid_env_enum"),
        }
    }
}

impl fmt::Display for EnvParseError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyValue { var } => write!(formatter, "{var} must be non-empty"),
            Self::InvalidInt { var, .. } => write!(formatter, "{var} must be an integer"),
            Self::InvalidUrl { var, .. } => write!(formatter, "{var} must be an http(s) URL"),
            Self::InvalidEnum { var, .. } => write!(formatter, "{var} has an unsupported value"),
        }
    }
}

impl std::error::Error for EnvParseError {}

impl From<EnvParseError> for ErrorEnvelope {
    fn from(error: EnvParseError) -> Self {
        let envelope = Self::expected(error.error_code(), error.to_string());
        match error {
            EnvParseError::EmptyValue { var } => envelope.with_metadata("env_var", var),
            EnvParseError::InvalidInt { var, value }
            | EnvParseError::InvalidUrl { var, value }
            | EnvParseError::InvalidEnum { var, value } => envelope
                .with_metadata("env_var", var)
                .with_metadata("value", redact_url_credentials(&value)),
        }
    }
}

fn parse_optional_trimmed(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<Box<str>>, EnvParseError> {
    let Some(raw) = map.get(var) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EnvParseError::EmptyValue { var });
    }
    Ok(Some(trimmed.into()))
}

fn parse_optional_u64(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<u64>, EnvParseError> {
    let Some(trimmed) = parse_optional_trimmed(map, var)? else {
        return Ok(None);
    };
    trimmed
        .parse::<u64>()
        .map(Some)
        .map_err(|_| EnvParseError::InvalidInt {
            var,
            value: trimmed.to_string(),
        })
}

fn parse_optional_url(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<Box<str>>, EnvParseError> {
    let Some(trimmed) = parse_optional_trimmed(map, var)? else {
        return Ok(None);
    };
    let invalid = || EnvParseError::InvalidUrl {
        var,
        value: trimmed.to_string(),
    };
    let parsed = Url::parse(&trimmed).map_err(|_| invalid())?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid());
    }
    Ok(Some(trimmed))
}

fn parse_optional_log_level(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<ConfigLogLevel>, EnvParseError> {
    let Some(trimmed) = parse_optional_trimmed(map, var)? else {
        return Ok(None);
    };
    ConfigLogLevel::parse(&trimmed)
        .map(Some)
        .ok_or_else(|| EnvParseError::InvalidEnum {
            var,
            value: trimmed.to_string(),
        })
}
