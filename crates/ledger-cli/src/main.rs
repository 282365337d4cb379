use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use ledger_config::{ClientConfig, ConfigLoader};
use ledger_confirm::{ConfirmationConfig, ConfirmationError, ConfirmationTracker};
use ledger_peer::PeerClient;
use ledger_types::{ChaincodeId, InvocationParams};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;

use cli::{Args, CallArgs, Command};

#[tokio::main]
async fn main() -> Result<()> {
	let args = Args::parse();

	// The global subscriber needs the loaded configuration; until then log
	// through a scoped one built from the command line.
	let config = {
		let filter = env_filter(args.log_level.as_deref().unwrap_or("info"))?;
		let _guard = tracing::subscriber::set_default(load_phase_subscriber(filter, std::io::stderr));

		let mut loader = ConfigLoader::new();
		if let Some(path) = &args.config {
			loader = loader.with_file(path);
		}
		loader.load().await.context("Failed to load configuration")?
	};

	let log_level = args
		.log_level
		.clone()
		.unwrap_or_else(|| config.logging.level.clone());
	setup_tracing(&log_level, args.json_logs || config.logging.json)?;

	run(&args, &config).await
}

async fn run(args: &Args, config: &ClientConfig) -> Result<()> {
	let client = || build_client(config);

	let output = match &args.command {
		Command::Validate => return validate_config(args, config),
		Command::Height => {
			let info = client()?
				.chain_info()
				.await
				.context("Failed to query chain height")?;
			json!({ "height": info.height })
		}
		Command::Block { index } => {
			let block = client()?
				.block_at(*index)
				.await
				.with_context(|| format!("Failed to fetch block {}", index))?;
			serde_json::to_value(block)?
		}
		Command::Deploy { path, call } => {
			info!(path = %path, "Deploying chaincode");
			let response = client()?
				.with_chaincode_id(ChaincodeId::Path(path.clone()))
				.deploy(invocation(call))
				.await
				.context("Deploy failed")?;
			serde_json::to_value(response)?
		}
		Command::Query { call } => {
			let response = client()?
				.query(invocation(call))
				.await
				.context("Query failed")?;
			serde_json::to_value(response)?
		}
		Command::Invoke { call, no_confirm } => {
			invoke(client()?, invocation(call), *no_confirm, config).await?
		}
		Command::Login => {
			let enrollment = config
				.identity
				.as_ref()
				.and_then(|identity| identity.enrollment())
				.ok_or_else(|| anyhow!("Login needs identity.enroll_id and identity.enroll_secret"))?;
			client()?
				.login(&enrollment)
				.await
				.context("Login failed")?
		}
		Command::Logout => {
			let identity = config
				.identity
				.as_ref()
				.ok_or_else(|| anyhow!("Logout needs identity.enroll_id"))?;
			client()?
				.logout(&identity.enroll_id)
				.await
				.context("Logout failed")?
		}
	};

	print_json(&output)
}

async fn invoke(
	client: PeerClient,
	params: InvocationParams,
	no_confirm: bool,
	config: &ClientConfig,
) -> Result<Value> {
	if no_confirm {
		let receipt = client.invoke(&params).await.context("Invoke failed")?;
		return Ok(json!({ "txid": receipt.txid, "payload": receipt.payload }));
	}

	let client = Arc::new(client);
	let tracker = ConfirmationTracker::new(
		client.clone(),
		client,
		ConfirmationConfig::from(&config.confirmation),
	);

	match tracker.confirm(params).await {
		Ok(confirmation) => Ok(json!({
			"txid": confirmation.receipt.txid,
			"block": confirmation.block_index,
			"confirmedAt": confirmation.confirmed_at.to_rfc3339(),
			"payload": confirmation.receipt.payload,
		})),
		Err(error @ ConfirmationError::Timeout { .. }) => {
			warn!(error = %error, "Transaction was accepted but not confirmed");
			print_json(&json!({
				"txid": error.txid(),
				"confirmed": false,
			}))?;
			bail!(error)
		}
		Err(error) => Err(anyhow::Error::new(error).context("Invoke failed")),
	}
}

fn build_client(config: &ClientConfig) -> Result<PeerClient> {
	let mut client = PeerClient::new(&config.peer.endpoint())
		.context("Failed to create peer client")?
		.with_secure_context(config.identity.as_ref().map(|i| i.enroll_id.clone()));

	if let Some(chaincode_id) = config.chaincode.as_ref().and_then(|c| c.chaincode_id()) {
		client = client.with_chaincode_id(chaincode_id);
	}

	Ok(client)
}

fn invocation(call: &CallArgs) -> InvocationParams {
	InvocationParams::new(call.function.clone().unwrap_or_default(), call.args.clone())
}

fn validate_config(args: &Args, config: &ClientConfig) -> Result<()> {
	match &args.config {
		Some(path) => info!("Configuration file {:?} is valid", path),
		None => info!("No configuration file given, defaults are valid"),
	}
	info!("Peer: {}", config.peer.endpoint().base_url());
	info!(
		"Confirmation: step {}ms, timeout {}ms",
		config.confirmation.delay_step_ms, config.confirmation.delay_timeout_ms
	);

	print_json(&serde_json::to_value(config)?)
}

fn print_json(value: &Value) -> Result<()> {
	println!("{}", serde_json::to_string_pretty(value)?);
	Ok(())
}

/// RUST_LOG wins over the configured level.
fn env_filter(log_level: &str) -> Result<EnvFilter> {
	EnvFilter::try_from_default_env()
		.or_else(|_| EnvFilter::try_new(log_level))
		.context("Invalid log level")
}

fn load_phase_subscriber<W>(filter: EnvFilter, writer: W) -> impl Subscriber + Send + Sync
where
	W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(writer)
		.finish()
}

fn setup_tracing(log_level: &str, json: bool) -> Result<()> {
	let registry = tracing_subscriber::registry().with(env_filter(log_level)?);

	if json {
		registry
			.with(
				tracing_subscriber::fmt::layer()
					.json()
					.with_writer(std::io::stderr),
			)
			.try_init()?;
	} else {
		registry
			.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
			.try_init()?;
	}

	Ok(())
}
