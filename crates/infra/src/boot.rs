//! Boot sequence: deployment config first, then the profile store.

use crate::InfraResult;
use crate::console::Console;
use idconsole_app::ProfileSources;
use idconsole_config::{BuildTimeProfiles, build_time_profiles};
use idconsole_ports::LogFields;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;

/// What boot found in each layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BootReport {
    /// Entries in the deployment document.
    pub config_profiles: usize,
    /// Entries in the build-time layer.
    pub build_time_profiles: usize,
    /// Active slug after initialization.
    pub active: String,
}

/// Boot with the build-time layer compiled into this binary.
pub async fn boot(console: &Console) -> InfraResult<BootReport> {
    boot_with_build_profiles(console, build_time_profiles()).await
}

/// Load the deployment config, then initialize the store.
///
/// The loader never fails; only profile storage writes can.
pub async fn boot_with_build_profiles(
    console: &Console,
    build_time: BuildTimeProfiles,
) -> InfraResult<BootReport> {
    if let Some(problem) = build_time.problem.as_deref() {
        let fields: LogFields = [("error".into(), Value::from(problem))].into_iter().collect();
        console.logger().warn(
            "console.profiles.buildTimeInvalid",
            "Ignoring invalid build-time profiles",
            Some(fields),
        );
    }

    let config = console.loader().load().await;
    let sources = ProfileSources {
        config,
        build_time: build_time.profiles,
    };
    console.store().initialize(&sources)?;

    Ok(BootReport {
        config_profiles: sources.config.len(),
        build_time_profiles: sources.build_time.len(),
        active: console.store().active_slug().to_string(),
    })
}

/// Run `op` to completion on a current-thread runtime.
pub fn run_async<F, T>(op: F) -> InfraResult<T>
where
    F: Future<Output = InfraResult<T>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(crate::InfraError::from)?;
    runtime.block_on(op)
}
