//! Command-line interface definitions.

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ledger-cli")]
#[command(about = "Ledger peer client with transaction confirmation", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
	/// Path to configuration file
	#[arg(short, long, value_name = "FILE", env = "LEDGER_CONFIG")]
	pub config: Option<PathBuf>,

	/// Log level override (trace, debug, info, warn, error)
	#[arg(short, long, env = "LEDGER_LOG_LEVEL")]
	pub log_level: Option<String>,

	/// Emit logs as JSON lines
	#[arg(long)]
	pub json_logs: bool,

	#[command(subcommand)]
	pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
	/// Print the current chain height
	Height,

	/// Print the block at an index
	Block {
		index: u64,
	},

	/// Deploy chaincode from a source path
	Deploy {
		/// Chaincode source path
		#[arg(long)]
		path: String,

		#[command(flatten)]
		call: CallArgs,
	},

	/// Run a read-only chaincode query
	Query {
		#[command(flatten)]
		call: CallArgs,
	},

	/// Invoke chaincode and wait until the transaction is committed
	Invoke {
		#[command(flatten)]
		call: CallArgs,

		/// Print the receipt as soon as the peer accepts the invocation
		#[arg(long)]
		no_confirm: bool,
	},

	/// Register the configured identity with the peer
	Login,

	/// Remove the configured identity's enrollment
	Logout,

	/// Validate the configuration and print it
	Validate,
}

/// Chaincode function and arguments.
#[derive(ClapArgs, Debug, Clone, Default, PartialEq)]
pub struct CallArgs {
	/// Function to call; the peer's default for the method when omitted
	#[arg(short, long)]
	pub function: Option<String>,

	/// Positional string arguments
	pub args: Vec<String>,
}
