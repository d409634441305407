//! Config loading helpers (file + env).
//!
//! The loader is responsible for deterministic merge order and surfacing
//! user-facing errors as typed `ErrorEnvelope`s.

use crate::env::{ConsoleEnv, apply_env_overrides};
use crate::schema::{ConsoleConfig, ValidatedConsoleConfig};
use idconsole_shared::{ErrorClass, ErrorCode, ErrorEnvelope};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Json,
    Toml,
}

/// Load the console config from in-memory sources.
///
/// Precedence (highest wins):
/// - env overrides (`ConsoleEnv`)
/// - config JSON (file content)
/// - defaults (`ConsoleConfig::default()`)
pub fn load_console_config_from_sources(
    config_json: Option<&str>,
    env: &ConsoleEnv,
) -> Result<ValidatedConsoleConfig, ErrorEnvelope> {
    let config = match config_json {
        None => ConsoleConfig::default(),
        Some(input) => parse_config_unvalidated(input, ConfigFormat::Json)?,
    };

    // env is applied last and also validates/normalizes the resulting config.
    apply_env_overrides(config, env)
}

/// Load the console config from an optional file path.
pub fn load_console_config_from_path(
    config_path: Option<&Path>,
    env: &ConsoleEnv,
) -> Result<ValidatedConsoleConfig, ErrorEnvelope> {
    let config = match config_path {
        None => ConsoleConfig::default(),
        Some(path) => {
            let format = detect_config_format(path)?;
            let config_text = read_config_file(path)?;
            parse_config_unvalidated(&config_text, format)?
        },
    };

    apply_env_overrides(config, env)
}

/// Load the console config from std env and an optional file path.
pub fn load_console_config_std_env(
    config_path: Option<&Path>,
) -> Result<ValidatedConsoleConfig, ErrorEnvelope> {
    let env = ConsoleEnv::from_std_env().map_err(ErrorEnvelope::from)?;
    load_console_config_from_path(config_path, &env)
}

/// Serialize the config as deterministic pretty JSON (with trailing newline).
pub fn to_pretty_json(config: &ConsoleConfig) -> Result<String, ErrorEnvelope> {
    let mut output = serde_json::to_string_pretty(config).map_err(|error| {
        ErrorEnvelope::unexpected(
            ErrorCode::internal(),
            format!("failed to serialize config: {error}"),
            ErrorClass::NonRetriable,
        )
    })?;
    output.push('\n');
    Ok(output)
}

/// Serialize the config as deterministic pretty TOML (with trailing newline).
pub fn to_pretty_toml(config: &ConsoleConfig) -> Result<String, ErrorEnvelope> {
    let mut output = toml::to_string_pretty(config).map_err(|error| {
        ErrorEnvelope::unexpected(
            ErrorCode::new("config", "serialize_toml"),
            format!("failed to serialize config TOML: {error}"),
            ErrorClass::NonRetriable,
        )
    })?;
    output.push('\n');
    Ok(output)
}

fn parse_config_unvalidated(
    input: &str,
    format: ConfigFormat,
) -> Result<ConsoleConfig, ErrorEnvelope> {
    match format {
        ConfigFormat::Json => serde_json::from_str(input).map_err(|error| {
            ErrorEnvelope::expected(
                ErrorCode::new("config", "invalid_json"),
                format!("invalid config JSON: {error}"),
            )
            .with_metadata("source", "config")
        }),
        ConfigFormat::Toml => toml::from_str(input).map_err(|error| {
            ErrorEnvelope::expected(
                ErrorCode::new("config", "invalid_toml"),
                format!("invalid config TOML: {error}"),
            )
            .with_metadata("source", "config")
        }),
    }
}

fn read_config_file(path: &Path) -> Result<String, ErrorEnvelope> {
    std::fs::read_to_string(path).map_err(|error| {
        let code = match error.kind() {
            std::io::ErrorKind::NotFound => ErrorCode::new("config", "config_file_not_found"),
            std::io::ErrorKind::PermissionDenied => {
                ErrorCode::new("config", "config_file_permission_denied")
            },
            _ => ErrorCode::new("config", "config_file_io"),
        };

        ErrorEnvelope::expected(code, format!("failed to read config file: {error}"))
            .with_metadata("path", path.to_string_lossy().to_string())
    })
}

fn detect_config_format(path: &Path) -> Result<ConfigFormat, ErrorEnvelope> {
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        None | Some("json") => Ok(ConfigFormat::Json),
        Some("toml") => Ok(ConfigFormat::Toml),
        Some(other) => Err(ErrorEnvelope::expected(
            ErrorCode::new("config", "unsupported_format"),
            "unsupported config format; use .json or .toml",
        )
        .with_metadata("extension", other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_load_without_sources() -> Result<(), ErrorEnvelope> {
        let config = load_console_config_from_sources(None, &ConsoleEnv::default())?;
        assert_eq!(config.deployment.path, "/config.json");
        Ok(())
    }

    #[test]
    fn yaml_extension_is_rejected() {
        let error =
            load_console_config_from_path(Some(Path::new("console.yaml")), &ConsoleEnv::default())
                .err();
        assert_eq!(
            error.map(|error| error.code.to_string()),
            Some("config:unsupported_format".to_owned())
        );
    }

    #[test]
    fn pretty_json_ends_with_newline() -> Result<(), ErrorEnvelope> {
        let output = to_pretty_json(&ConsoleConfig::default())?;
        assert!(output.ends_with("}\n"));
        assert!(output.contains("\"cacheTtlMs\": 300000"));
        Ok(())
    }
}
