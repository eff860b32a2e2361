//! CLI argument parsing and subcommand dispatch.

use clap::{Parser, Subcommand};

use waitwatch_compute::SnapshotFilter;
use waitwatch_core::Config;

use crate::api::WaitTimeEntry;
use crate::poller::{self, CycleOutcome};
use crate::startup;

/// Ride wait-time tracker: polls queue-times.com, serves snapshots and live events.
#[derive(Parser, Debug)]
#[command(name = "waitwatch-server", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Start the HTTP server and the background poller (default).
    Serve,
    /// Run a single ingestion cycle and print the resulting snapshot as JSON.
    PollOnce {
        /// Only print this park's rides.
        #[arg(long)]
        park_id: Option<String>,
    },
}

pub async fn dispatch(cli: Cli, config: Config) -> anyhow::Result<()> {
    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => startup::serve(config).await,
        Command::PollOnce { park_id } => poll_once(config, park_id).await,
    }
}

async fn poll_once(config: Config, park_id: Option<String>) -> anyhow::Result<()> {
    let (state, source) = startup::build(config)?;

    let outcome = poller::poll_once(source.as_ref(), &state.registry, state.config.poller.cycle_timeout()).await;
    state.poller.record(&outcome);
    if let CycleOutcome::Failed { reason } = outcome {
        anyhow::bail!("ingestion cycle failed: {reason}");
    }
    state.save_snapshot().await;

    let rows: Vec<WaitTimeEntry> = state
        .registry
        .snapshot(park_id.as_deref(), &SnapshotFilter::default())
        .into_iter()
        .map(WaitTimeEntry::from)
        .collect();
    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["waitwatch-server"]).unwrap();
        assert_eq!(cli.command, None);
    }

    #[test]
    fn poll_once_takes_park_id() {
        let cli = Cli::try_parse_from(["waitwatch-server", "poll-once", "--park-id", "6"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Command::PollOnce {
                park_id: Some("6".to_string())
            })
        );
    }
}
