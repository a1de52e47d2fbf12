use std::path::PathBuf;

use clap::{Parser, ValueEnum};

fn parse_positive_u64(value: &str) -> Result<u64, String> {
    let parsed = value
        .parse::<u64>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
/// Enumerates supported `CliBackendAuthMode` values.
pub enum CliBackendAuthMode {
    /// Google ID token from the metadata server.
    Metadata,
    None,
}

#[derive(Debug, Parser)]
#[command(
    name = "octothink",
    about = "GitHub App that answers slash commands with LLM-backed actions",
    version
)]
/// Public struct `Cli` holding every startup option.
pub struct Cli {
    #[arg(
        long,
        env = "OCTO_BIND",
        default_value = "0.0.0.0:8080",
        help = "Address the webhook server listens on"
    )]
    pub bind: String,

    #[arg(
        long,
        env = "OCTO_CONFIG",
        default_value = "config.yml",
        help = "Path to the bot configuration file"
    )]
    pub config: PathBuf,

    #[arg(
        long = "backend-url",
        env = "BACKEND_URL",
        help = "Base URL of the completion backend"
    )]
    pub backend_url: String,

    #[arg(
        long = "backend-auth",
        env = "OCTO_BACKEND_AUTH",
        value_enum,
        default_value = "metadata",
        help = "How requests to the completion backend are authenticated"
    )]
    pub backend_auth: CliBackendAuthMode,

    #[arg(
        long = "github-bot-config",
        env = "GITHUB_BOT_CONFIG",
        hide_env_values = true,
        help = "GitHub App secrets as JSON: {APP_ID, WEBHOOK_SECRET, PRIVATE_KEY}"
    )]
    pub github_bot_config: Option<String>,

    #[arg(
        long = "github-token",
        env = "OCTO_GITHUB_TOKEN",
        hide_env_values = true,
        help = "Static GitHub token used instead of installation tokens (development only)"
    )]
    pub github_token: Option<String>,

    #[arg(
        long = "github-api-base",
        env = "OCTO_GITHUB_API_BASE",
        default_value = "https://api.github.com",
        help = "GitHub REST base URL; GraphQL is served from <base>/graphql"
    )]
    pub github_api_base: String,

    #[arg(
        long = "gcp-project",
        env = "GCLOUD_PROJECT",
        help = "GCP project hosting the issue index; issue search and indexing are disabled without it"
    )]
    pub gcp_project: Option<String>,

    #[arg(
        long = "request-timeout-ms",
        env = "OCTO_REQUEST_TIMEOUT_MS",
        default_value_t = 60_000,
        value_parser = parse_positive_u64,
        help = "Timeout for each outbound HTTP request"
    )]
    pub request_timeout_ms: u64,

    #[arg(
        long = "delivery-timeout-seconds",
        env = "OCTO_DELIVERY_TIMEOUT_SECONDS",
        default_value_t = 120,
        value_parser = parse_positive_u64,
        help = "Upper bound for handling one webhook delivery"
    )]
    pub delivery_timeout_seconds: u64,

    #[arg(
        long = "check-config",
        default_value_t = false,
        help = "Validate configuration and secrets, then exit"
    )]
    pub check_config: bool,
}
