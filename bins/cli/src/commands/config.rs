//! Config show command handler.

use crate::error::CliError;
use crate::format::OutputMode;
use crate::{CliOutput, format_error_output, ok_output};
use idconsole_config::{load_console_config_std_env, to_pretty_json, to_pretty_toml};
use std::path::Path;

/// Print the effective console config (defaults < file < env).
pub fn run_config_show(
    mode: OutputMode,
    config_path: Option<&Path>,
    toml: bool,
) -> Result<CliOutput, CliError> {
    let config = match load_console_config_std_env(config_path) {
        Ok(config) => config,
        Err(error) => return Ok(format_error_output(mode, &error)),
    };
    let rendered = if toml {
        to_pretty_toml(&config)
    } else {
        to_pretty_json(&config)
    };
    match rendered {
        Ok(stdout) => Ok(ok_output(stdout)),
        Err(error) => Ok(format_error_output(mode, &error)),
    }
}
