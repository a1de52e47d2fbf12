use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use octo_ai::{
    BackendAuth, BackendClient, BackendConfig, FirestoreIssueIndex, FirestoreIssueIndexConfig,
    IssueIndex, MetadataTokenSource, DEFAULT_METADATA_BASE,
};
use octo_commands::{builtin_registry, BotServices};
use octo_github::github_app_auth::{GithubAppCredentials, InstallationTokenProvider};
use octo_runtime::{DeliveryRouter, GithubAuth, WebhookServerConfig};
use octo_settings::{AppSecrets, BotSettings};

use crate::cli_args::{Cli, CliBackendAuthMode};

/// Everything the server needs, built and validated once at startup.
pub(crate) struct Bootstrap {
    pub(crate) router: DeliveryRouter,
    pub(crate) server: WebhookServerConfig,
}

pub(crate) fn bootstrap(cli: &Cli) -> Result<Bootstrap> {
    let settings = BotSettings::load(&cli.config)?;
    let registry = builtin_registry(&settings.enabled_commands)
        .context("invalid enabledCommands in configuration")?;
    tracing::info!(
        commands = ?registry.commands().iter().map(|command| command.name.as_str()).collect::<Vec<_>>(),
        "command registry ready"
    );

    let metadata = MetadataTokenSource::new(DEFAULT_METADATA_BASE, cli.request_timeout_ms)?;
    let backend = BackendClient::new(BackendConfig {
        base_url: cli.backend_url.clone(),
        request_timeout_ms: cli.request_timeout_ms,
        auth: match cli.backend_auth {
            CliBackendAuthMode::Metadata => BackendAuth::Metadata(metadata.clone()),
            CliBackendAuthMode::None => BackendAuth::None,
        },
    })?;
    let issue_index = issue_index(cli, metadata)?;
    let (auth, webhook_secret) = github_auth(cli)?;

    let services = BotServices {
        backend: Arc::new(backend),
        issue_index,
        settings: Arc::new(settings),
        registry: Arc::new(registry),
    };
    Ok(Bootstrap {
        router: DeliveryRouter::new(
            services,
            auth,
            cli.github_api_base.clone(),
            cli.request_timeout_ms,
        ),
        server: WebhookServerConfig {
            bind: cli.bind.clone(),
            webhook_secret,
            delivery_timeout: Duration::from_secs(cli.delivery_timeout_seconds),
        },
    })
}

fn issue_index(
    cli: &Cli,
    metadata: MetadataTokenSource,
) -> Result<Option<Arc<dyn IssueIndex>>> {
    let Some(project) = cli
        .gcp_project
        .as_deref()
        .map(str::trim)
        .filter(|project| !project.is_empty())
    else {
        tracing::info!("no gcp project configured; issue index disabled");
        return Ok(None);
    };
    let mut config = FirestoreIssueIndexConfig::new(project);
    config.request_timeout_ms = cli.request_timeout_ms;
    Ok(Some(Arc::new(FirestoreIssueIndex::new(config, metadata)?)))
}

/// A static token wins over App credentials; the webhook secret still comes
/// from the App secrets when they are present.
fn github_auth(cli: &Cli) -> Result<(GithubAuth, Option<String>)> {
    let raw_secrets = cli
        .github_bot_config
        .as_deref()
        .filter(|raw| !raw.trim().is_empty());
    if let Some(token) = cli
        .github_token
        .as_deref()
        .map(str::trim)
        .filter(|token| !token.is_empty())
    {
        let webhook_secret = match raw_secrets {
            Some(raw) => Some(AppSecrets::parse(Some(raw))?.webhook_secret),
            None => {
                tracing::warn!("running with a static github token and no webhook secret");
                None
            }
        };
        return Ok((GithubAuth::StaticToken(token.to_string()), webhook_secret));
    }

    let secrets = AppSecrets::parse(raw_secrets)?;
    let credentials = GithubAppCredentials::from_pem(&secrets.app_id, &secrets.private_key)?;
    let provider = InstallationTokenProvider::new(
        &cli.github_api_base,
        Arc::new(credentials),
        cli.request_timeout_ms,
    )?;
    Ok((
        GithubAuth::App(Arc::new(provider)),
        Some(secrets.webhook_secret),
    ))
}
