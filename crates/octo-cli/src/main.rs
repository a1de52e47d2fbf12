mod bootstrap;
mod cli_args;

use anyhow::Result;
use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::bootstrap::bootstrap;
use crate::cli_args::Cli;

fn init_tracing() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let ready = bootstrap(&cli)?;
    if cli.check_config {
        tracing::info!(config = %cli.config.display(), "configuration is valid");
        return Ok(());
    }
    octo_runtime::run_webhook_server(ready.server, ready.router).await
}
