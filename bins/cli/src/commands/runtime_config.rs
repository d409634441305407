//! Runtime config command handler.

use crate::error::CliError;
use crate::format::OutputMode;
use crate::{CliOutput, json_output, ok_output};
use idconsole_infra::Console;

/// Print the deployment profiles map loaded at boot.
pub fn run_runtime_config(mode: OutputMode, console: &Console) -> Result<CliOutput, CliError> {
    let config = console.loader().get().unwrap_or_default();
    if mode.is_json() {
        return json_output(&serde_json::json!({
            "status": "ok",
            "documentUrl": console.config().document_url().as_str(),
            "profiles": config,
        }));
    }

    let mut out = format!("source: {}\n", console.config().document_url());
    if config.is_empty() {
        out.push_str("profiles: none\n");
    }
    for (slug, data) in config.iter() {
        out.push_str(slug);
        out.push('\t');
        out.push_str(data.admin_base_url.as_deref().unwrap_or("-"));
        out.push('\t');
        out.push_str(data.public_base_url.as_deref().unwrap_or("-"));
        out.push('\n');
    }
    Ok(ok_output(out))
}
