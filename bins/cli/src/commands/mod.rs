//! CLI command handlers.

pub mod config;
pub mod pagination;
pub mod profiles;
pub mod runtime_config;

pub use config::run_config_show;
pub use pagination::run_pagination_parse;
pub use profiles::{ProfilesCommand, run_profiles};
pub use runtime_config::run_runtime_config;
