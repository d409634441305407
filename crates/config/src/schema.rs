//! Console configuration schema, defaults, and validation.

use idconsole_shared::{ErrorCode, ErrorEnvelope};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use url::Url;

/// Current config schema version.
pub const CURRENT_CONFIG_VERSION: u32 = 1;

/// Default console origin the deployment document is fetched from.
pub const DEFAULT_ORIGIN: &str = "http://localhost:3000";
/// Default path of the deployment document.
pub const DEFAULT_CONFIG_PATH: &str = "/config.json";
/// Default network timeout for the deployment fetch.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
/// Default lifetime of the session-cached deployment document (5 minutes).
pub const DEFAULT_CACHE_TTL_MS: u64 = 300_000;

const MIN_TIMEOUT_MS: u64 = 1_000;
const MAX_TIMEOUT_MS: u64 = 120_000;
const MAX_CACHE_TTL_MS: u64 = 86_400_000;

/// Top-level console settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct ConsoleConfig {
    /// Schema version.
    pub version: u32,
    /// Where the deployment document lives and how it is cached.
    pub deployment: DeploymentSettings,
    /// Durable storage location.
    pub storage: StorageSettings,
    /// Log verbosity.
    pub logging: LoggingSettings,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            version: CURRENT_CONFIG_VERSION,
            deployment: DeploymentSettings::default(),
            storage: StorageSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

/// Deployment document settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct DeploymentSettings {
    /// Console origin (`http`/`https`).
    pub origin: String,
    /// Document path, relative to the origin.
    pub path: String,
    /// Network timeout in milliseconds.
    pub timeout_ms: u64,
    /// Session cache lifetime in milliseconds; `0` disables cache hits.
    pub cache_ttl_ms: u64,
}

impl Default for DeploymentSettings {
    fn default() -> Self {
        Self {
            origin: DEFAULT_ORIGIN.to_owned(),
            path: DEFAULT_CONFIG_PATH.to_owned(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            cache_ttl_ms: DEFAULT_CACHE_TTL_MS,
        }
    }
}

impl DeploymentSettings {
    /// Absolute URL of the deployment document.
    pub fn document_url(&self) -> Result<Url, ConfigSchemaError> {
        let origin = Url::parse(&self.origin).map_err(|_| ConfigSchemaError::InvalidOrigin {
            value: self.origin.clone(),
        })?;
        origin
            .join(&self.path)
            .map_err(|_| ConfigSchemaError::InvalidPath {
                value: self.path.clone(),
            })
    }
}

/// Durable storage settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct StorageSettings {
    /// Directory holding persisted profiles; platform data dir when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

impl StorageSettings {
    /// Effective storage directory.
    #[must_use]
    pub fn resolved_dir(&self) -> PathBuf {
        self.dir.as_ref().map_or_else(
            || {
                dirs::data_dir()
                    .unwrap_or_else(std::env::temp_dir)
                    .join("idconsole")
            },
            PathBuf::from,
        )
    }
}

/// Configured log level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigLogLevel {
    /// Debug.
    Debug,
    /// Info.
    Info,
    /// Warn.
    #[default]
    Warn,
    /// Error.
    Error,
}

impl ConfigLogLevel {
    /// Lowercase label, usable as an `EnvFilter` directive.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Parse a label, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" => Some(Self::Warn),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct LoggingSettings {
    /// Minimum level emitted.
    pub level: ConfigLogLevel,
}

/// Validated config wrapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedConsoleConfig {
    raw: ConsoleConfig,
    document_url: Url,
}

impl ValidatedConsoleConfig {
    /// Absolute URL of the deployment document.
    #[must_use]
    pub const fn document_url(&self) -> &Url {
        &self.document_url
    }

    /// Consume the wrapper and return the raw config.
    #[must_use]
    pub fn into_inner(self) -> ConsoleConfig {
        self.raw
    }
}

impl std::ops::Deref for ValidatedConsoleConfig {
    type Target = ConsoleConfig;

    fn deref(&self) -> &Self::Target {
        &self.raw
    }
}

impl ConsoleConfig {
    /// Validate bounds and normalize string fields.
    pub fn validate_and_normalize(mut self) -> Result<ValidatedConsoleConfig, ConfigSchemaError> {
        if self.version != CURRENT_CONFIG_VERSION {
            return Err(ConfigSchemaError::UnsupportedVersion {
                found: self.version,
                supported: CURRENT_CONFIG_VERSION,
            });
        }

        let deployment = &mut self.deployment;
        deployment.origin = deployment.origin.trim().trim_end_matches('/').to_owned();
        deployment.path = deployment.path.trim().to_owned();

        let origin = Url::parse(&deployment.origin).map_err(|_| ConfigSchemaError::InvalidOrigin {
            value: deployment.origin.clone(),
        })?;
        if !matches!(origin.scheme(), "http" | "https") {
            return Err(ConfigSchemaError::InvalidOrigin {
                value: deployment.origin.clone(),
            });
        }
        if !deployment.path.starts_with('/') {
            return Err(ConfigSchemaError::InvalidPath {
                value: deployment.path.clone(),
            });
        }
        check_range(
            "timeoutMs",
            deployment.timeout_ms,
            MIN_TIMEOUT_MS,
            MAX_TIMEOUT_MS,
        )?;
        check_range("cacheTtlMs", deployment.cache_ttl_ms, 0, MAX_CACHE_TTL_MS)?;

        self.storage.dir = self
            .storage
            .dir
            .take()
            .map(|dir| dir.trim().to_owned())
            .filter(|dir| !dir.is_empty());

        let document_url = deployment.document_url()?;
        Ok(ValidatedConsoleConfig {
            raw: self,
            document_url,
        })
    }
}

const fn check_range(
    field: &'static str,
    value: u64,
    min: u64,
    max: u64,
) -> Result<(), ConfigSchemaError> {
    if value < min || value > max {
        return Err(ConfigSchemaError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

/// Parse and validate a JSON config document.
pub fn parse_console_config_json(input: &str) -> Result<ValidatedConsoleConfig, ErrorEnvelope> {
    let config: ConsoleConfig = serde_json::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_json"),
            format!("invalid config JSON: {error}"),
        )
    })?;
    config.validate_and_normalize().map_err(Into::into)
}

/// Parse and validate a TOML config document.
pub fn parse_console_config_toml(input: &str) -> Result<ValidatedConsoleConfig, ErrorEnvelope> {
    let config: ConsoleConfig = toml::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_toml"),
            format!("invalid config TOML: {error}"),
        )
    })?;
    config.validate_and_normalize().map_err(Into::into)
}

/// Schema validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSchemaError {
    /// The config version is not supported by this binary.
    UnsupportedVersion {
        /// Version found in the config.
        found: u32,
        /// Version supported by this crate.
        supported: u32,
    },
    /// Origin is not an absolute `http`/`https` URL.
    InvalidOrigin {
        /// Value provided.
        value: String,
    },
    /// Document path does not start with `/` or cannot be joined.
    InvalidPath {
        /// Value provided.
        value: String,
    },
    /// A numeric field is out of bounds.
    OutOfRange {
        /// Field name in the config file.
        field: &'static str,
        /// Value provided.
        value: u64,
        /// Minimum allowed value.
        min: u64,
        /// Maximum allowed value.
        max: u64,
    },
}

impl ConfigSchemaError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::UnsupportedVersion { .. } => ErrorCode::new("config", "unsupported_version"),
            Self::InvalidOrigin { .. } => ErrorCode::new("config", "invalid_origin"),
            Self::InvalidPath { .. } => ErrorCode::new("config", "invalid_path"),
            Self::OutOfRange { .. } => ErrorCode::new("config", "value_out_of_range"),
        }
    }
}

impl fmt::Display for ConfigSchemaError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedVersion { found, supported } => write!(
                formatter,
                "unsupported config version {found} (supported: {supported})"
            ),
            Self::InvalidOrigin { .. } => {
                formatter.write_str("deployment.origin must be an absolute http(s) URL")
            },
            Self::InvalidPath { .. } => formatter.write_str("deployment.path must start with '/'"),
            Self::OutOfRange {
                field, min, max, ..
            } => write!(
                formatter,
                "deployment.{field} must be between {min} and {max}"
            ),
        }
    }
}

impl std::error::Error for ConfigSchemaError {}

impl From<ConfigSchemaError> for ErrorEnvelope {
    fn from(error: ConfigSchemaError) -> Self {
        let envelope = Self::expected(error.error_code(), error.to_string());
        match error {
            ConfigSchemaError::UnsupportedVersion { found, supported } => envelope
                .with_metadata("found", found.to_string())
                .with_metadata("supported", supported.to_string()),
            ConfigSchemaError::InvalidOrigin { value } | ConfigSchemaError::InvalidPath { value } => {
                envelope.with_metadata("value", idconsole_shared::redact_url_credentials(&value))
            },
            ConfigSchemaError::OutOfRange {
                field,
                value,
                min,
                max,
            } => envelope
                .with_metadata("field", field)
                .with_metadata("value", value.to_string())
                .with_metadata("min", min.to_string())
                .with_metadata("max", max.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() -> Result<(), ConfigSchemaError> {
        let validated = ConsoleConfig::default().validate_and_normalize()?;
        assert_eq!(
            validated.document_url().as_str(),
            "http://localhost:3000/config.json"
        );
        assert_eq!(validated.deployment.cache_ttl_ms, DEFAULT_CACHE_TTL_MS);
        Ok(())
    }

    #[test]
    fn origin_trailing_slash_is_normalized() -> Result<(), ConfigSchemaError> {
        let mut config = ConsoleConfig::default();
        config.deployment.origin = " https://console.example/ ".to_owned();
        let validated = config.validate_and_normalize()?;
        assert_eq!(validated.deployment.origin, "https://console.example");
        assert_eq!(
            validated.document_url().as_str(),
            "https://console.example/config.json"
        );
        Ok(())
    }

    #[test]
    fn rejects_non_http_origin_and_relative_path() {
        let mut config = ConsoleConfig::default();
        config.deployment.origin = "ftp://console".to_owned();
        assert!(matches!(
            config.validate_and_normalize(),
            Err(ConfigSchemaError::InvalidOrigin { .. })
        ));

        let mut config = ConsoleConfig::default();
        config.deployment.path = "config.json".to_owned();
        assert!(matches!(
            config.validate_and_normalize(),
            Err(ConfigSchemaError::InvalidPath { .. })
        ));
    }

    #[test]
    fn timeout_bounds_are_enforced() {
        let mut config = ConsoleConfig::default();
        config.deployment.timeout_ms = 10;
        let error = config.validate_and_normalize().err();
        assert!(matches!(
            error,
            Some(ConfigSchemaError::OutOfRange {
                field: "timeoutMs",
                ..
            })
        ));
    }

    #[test]
    fn blank_storage_dir_is_cleared() -> Result<(), ConfigSchemaError> {
        let mut config = ConsoleConfig::default();
        config.storage.dir = Some("   ".to_owned());
        let validated = config.validate_and_normalize()?;
        assert_eq!(validated.storage.dir, None);
        assert!(validated.storage.resolved_dir().ends_with("idconsole"));
        Ok(())
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let error = parse_console_config_json(r#"{"version":1,"deployment":{"host":"x"}}"#).err();
        assert_eq!(
            error.map(|error| error.code.to_string()),
            Some("config:invalid_json".to_owned())
        );
    }

    #[test]
    fn toml_documents_parse() -> Result<(), ErrorEnvelope> {
        let validated = parse_console_config_toml(
            "version = 1\n[deployment]\norigin = \"https://console.example\"\ncacheTtlMs = 0\n[logging]\nlevel = \"debug\"\n",
        )?;
        assert_eq!(validated.deployment.cache_ttl_ms, 0);
        assert_eq!(validated.logging.level, ConfigLogLevel::Debug);
        Ok(())
    }
}
