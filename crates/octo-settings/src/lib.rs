//! Configuration for OctoThink.
//! `config.yml` carries bot behavior (provider, allow-list, enabled commands,
//! pull request limits) and `GITHUB_BOT_CONFIG` carries the GitHub App secrets.
//! Both are validated once at startup and shared read-only afterwards.

mod app_secrets;
mod bot_settings;

pub use app_secrets::AppSecrets;
pub use bot_settings::{
    BotSettings, DestructiveOperations, IssueCloseOperations, PullRequestSettings,
    DEFAULT_EXCLUDED_EXTENSIONS,
};

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
/// Enumerates supported `SettingsError` values.
pub enum SettingsError {
    #[error("failed to load config: {path} not found")]
    NotFound { path: PathBuf },
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to load config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("failed to load config: {0}")]
    Invalid(String),
    #[error("github app secret is not provided")]
    MissingSecret,
    #[error("invalid github app secret format: {0}")]
    InvalidSecret(String),
}
