mod api;
mod cli;
mod poller;
mod router;
mod startup;
mod state;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use waitwatch_core::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    waitwatch_core::config::load_dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_level(true)
        .init();

    let cli = cli::Cli::parse();
    let config = Config::from_env();
    config.validate()?;

    cli::dispatch(cli, config).await
}
