//! Profile management commands.

use crate::error::CliError;
use crate::format::OutputMode;
use crate::{CliOutput, format_error_output, json_output, ok_output};
use clap::Subcommand;
use idconsole_app::{DeleteOutcome, ProfileStore, ProfileUpdate, ProfileView};
use idconsole_domain::ProfileData;
use idconsole_infra::Console;
use idconsole_shared::{ErrorCode, ErrorEnvelope};
use std::io::Read;
use std::path::PathBuf;

/// `profiles` subcommands.
#[derive(Debug, Subcommand)]
pub enum ProfilesCommand {
    /// List every profile with its source.
    List,
    /// Show one profile (the active one by default).
    Show {
        /// Profile slug.
        slug: Option<String>,
    },
    /// Make a profile active.
    Switch {
        /// Profile slug.
        slug: String,
    },
    /// Create a user-managed profile from a display name.
    Create {
        /// Display name; the slug is derived from it.
        name: String,
        /// Admin API base URL.
        #[arg(long = "admin-url")]
        admin_url: Option<String>,
        /// Public API base URL.
        #[arg(long = "public-url")]
        public_url: Option<String>,
    },
    /// Change a profile's endpoints or label.
    Update {
        /// Profile slug.
        slug: String,
        /// New admin API base URL.
        #[arg(long = "admin-url")]
        admin_url: Option<String>,
        /// New public API base URL.
        #[arg(long = "public-url")]
        public_url: Option<String>,
        /// New display label; an empty value clears it.
        #[arg(long)]
        name: Option<String>,
    },
    /// Delete a user-managed profile.
    Delete {
        /// Profile slug.
        slug: String,
    },
    /// Copy a deployment profile into the user-managed set.
    Promote {
        /// Profile slug.
        slug: String,
    },
    /// Print user-managed profiles as an import document.
    Export,
    /// Add profiles from an import document.
    Import {
        /// Document path; stdin when omitted.
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

/// Dispatch a `profiles` subcommand against a booted console.
pub fn run_profiles(
    mode: OutputMode,
    console: &Console,
    command: &ProfilesCommand,
) -> Result<CliOutput, CliError> {
    let store = console.store();
    match command {
        ProfilesCommand::List => list(mode, store),
        ProfilesCommand::Show { slug } => show(mode, store, slug.as_deref()),
        ProfilesCommand::Switch { slug } => match store.switch_profile(slug) {
            Ok(true) => changed(mode, "switch", &store.active_slug().to_string()),
            Ok(false) => Ok(format_error_output(mode, &not_found(slug))),
            Err(error) => Ok(format_error_output(mode, &error)),
        },
        ProfilesCommand::Create {
            name,
            admin_url,
            public_url,
        } => {
            let data = ProfileData {
                admin_base_url: admin_url.clone(),
                public_base_url: public_url.clone(),
                name: None,
            };
            match store.create_profile(name, data) {
                Ok(slug) => changed(mode, "create", slug.as_str()),
                Err(error) => Ok(format_error_output(mode, &error)),
            }
        },
        ProfilesCommand::Update {
            slug,
            admin_url,
            public_url,
            name,
        } => {
            let update = ProfileUpdate {
                admin_base_url: admin_url.clone(),
                public_base_url: public_url.clone(),
                name: name.clone(),
            };
            match store.update_profile(slug, update) {
                Ok(true) => changed(mode, "update", slug),
                Ok(false) => Ok(format_error_output(mode, &not_found(slug))),
                Err(error) => Ok(format_error_output(mode, &error)),
            }
        },
        ProfilesCommand::Delete { slug } => match store.delete_profile(slug) {
            Ok(DeleteOutcome::Deleted) => changed(mode, "delete", slug),
            Ok(DeleteOutcome::NotFound) => Ok(format_error_output(mode, &not_found(slug))),
            Ok(DeleteOutcome::Protected) => Ok(format_error_output(mode, &protected(slug))),
            Err(error) => Ok(format_error_output(mode, &error)),
        },
        ProfilesCommand::Promote { slug } => match store.promote_profile(slug) {
            Ok(true) => changed(mode, "promote", slug),
            Ok(false) => Ok(format_error_output(mode, &not_found(slug))),
            Err(error) => Ok(format_error_output(mode, &error)),
        },
        ProfilesCommand::Export => json_output(&store.export_profiles()),
        ProfilesCommand::Import { file } => {
            let raw = read_document(file.as_ref())?;
            match store.import_profiles(&raw) {
                Ok(summary) if mode.is_json() => json_output(&serde_json::json!({
                    "status": "ok",
                    "imported": summary.imported,
                    "skipped": summary.skipped,
                })),
                Ok(summary) => {
                    let mut out = format!("imported: {}\n", summary.imported);
                    if !summary.skipped.is_empty() {
                        out.push_str("skipped: ");
                        out.push_str(&summary.skipped.join(", "));
                        out.push('\n');
                    }
                    Ok(ok_output(out))
                },
                Err(error) => Ok(format_error_output(mode, &error)),
            }
        },
    }
}

fn list(mode: OutputMode, store: &ProfileStore) -> Result<CliOutput, CliError> {
    let views = store.profile_views();
    if mode.is_json() {
        return json_output(&serde_json::json!({
            "status": "ok",
            "active": store.active_slug(),
            "profiles": views,
        }));
    }
    Ok(ok_output(views.iter().map(format_view_line).collect()))
}

fn show(mode: OutputMode, store: &ProfileStore, slug: Option<&str>) -> Result<CliOutput, CliError> {
    let active = store.active_slug();
    let slug = slug.unwrap_or_else(|| active.as_str());
    let Some(view) = store
        .profile_views()
        .into_iter()
        .find(|view| view.profile.slug.as_str() == slug)
    else {
        return Ok(format_error_output(mode, &not_found(slug)));
    };

    if mode.is_json() {
        return json_output(&serde_json::json!({
            "status": "ok",
            "profile": view,
        }));
    }

    let endpoints = &view.profile.endpoints;
    Ok(ok_output(format!(
        "slug: {}\nname: {}\nsource: {}\nactive: {}\nadminBaseURL: {}\npublicBaseURL: {}\n",
        view.profile.slug,
        view.name,
        view.source,
        view.active,
        endpoints.admin_base_url,
        endpoints.public_base_url,
    )))
}

fn format_view_line(view: &ProfileView) -> String {
    let marker = if view.active { '*' } else { ' ' };
    format!(
        "{marker} {}\t{}\t{}\t{}\t{}\n",
        view.profile.slug,
        view.name,
        view.source,
        view.profile.endpoints.admin_base_url,
        view.profile.endpoints.public_base_url,
    )
}

fn changed(mode: OutputMode, action: &str, slug: &str) -> Result<CliOutput, CliError> {
    if mode.is_json() {
        return json_output(&serde_json::json!({
            "status": "ok",
            "action": action,
            "slug": slug,
        }));
    }
    Ok(ok_output(format!("{action}: {slug}\n")))
}

fn read_document(file: Option<&PathBuf>) -> Result<String, CliError> {
    if let Some(path) = file {
        return Ok(std::fs::read_to_string(path)?);
    }
    let mut raw = String::new();
    std::io::stdin().read_to_string(&mut raw)?;
    if raw.trim().is_empty() {
        return Err(CliError::InvalidInput(
            "import document is empty; pass --file or pipe JSON on stdin".to_owned(),
        ));
    }
    Ok(raw)
}

fn not_found(slug: &str) -> ErrorEnvelope {
    ErrorEnvelope::expected(
        ErrorCode::new("profile", "not_found"),
        format!("no profile named {slug}"),
    )
    .with_metadata("slug", slug)
}

fn protected(slug: &str) -> ErrorEnvelope {
    ErrorEnvelope::expected(
        ErrorCode::new("profile", "protected"),
        format!("profile {slug} comes from the deployment config and cannot be deleted"),
    )
    .with_metadata("slug", slug)
}
