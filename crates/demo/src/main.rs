//! `strand` walkthrough binary.

mod cli;
mod walkthrough;

use clap::Parser;
use cli::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();
	setup_tracing(cli.verbose);

	match cli.command {
		Command::Receive { count } => walkthrough::receive(count).await,
		Command::Setup { count } => walkthrough::setup(count).await,
		Command::Supervise {
			count,
			strategy,
			max_restarts,
		} => walkthrough::supervise(count, strategy.into(), max_restarts).await,
	}
}

fn setup_tracing(verbose: bool) {
	use tracing_subscriber::EnvFilter;

	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
		if verbose {
			EnvFilter::new("strand_actor=debug,strand=debug,info")
		} else {
			EnvFilter::new("info")
		}
	});
	tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}
