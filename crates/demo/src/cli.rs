use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "strand")]
#[command(about = "Walkthroughs of the strand actor runtime")]
#[command(version)]
/// Command-line arguments.
pub struct Cli {
	/// Verbose logging (actor lifecycle events)
	#[arg(short, long, global = true)]
	pub verbose: bool,

	/// Walkthrough to run.
	#[command(subcommand)]
	pub command: Command,
}

/// Available walkthroughs.
#[derive(Subcommand, Debug)]
pub enum Command {
	/// Flat receive actor printing every message
	Receive {
		/// Number of messages to send
		#[arg(short = 'n', long, default_value_t = 5)]
		count: u32,
	},
	/// Setup actor owning a child worker scope
	Setup {
		/// Number of messages to forward to the worker
		#[arg(short = 'n', long, default_value_t = 5)]
		count: u32,
	},
	/// Supervised actor where every third message fails
	Supervise {
		/// Number of messages to send
		#[arg(short = 'n', long, default_value_t = 100)]
		count: u32,

		/// What the supervisor does with a failure
		#[arg(long, value_enum, default_value_t = Strategy::Ignore)]
		strategy: Strategy,

		/// Fail the actor once it restarted this many times
		#[arg(long, value_name = "N")]
		max_restarts: Option<usize>,
	},
}

/// Supervisor answer selectable from the command line.
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
	/// Keep the current handler
	Ignore,
	/// Restart from the behavior factory
	Restart,
	/// Stop the actor
	Stop,
}

impl From<Strategy> for strand_actor::SuperviseStrategy {
	fn from(strategy: Strategy) -> Self {
		match strategy {
			Strategy::Ignore => Self::Ignore,
			Strategy::Restart => Self::Restart,
			Strategy::Stop => Self::Stop,
		}
	}
}
