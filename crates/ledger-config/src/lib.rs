//! Configuration loading for the ledger client.
//!
//! Configuration is read from a TOML, JSON or YAML file (picked by extension),
//! `${VAR}` references are substituted from the environment, prefixed
//! environment variables override individual settings, and the result is
//! validated before it is handed out.

pub mod types;

pub use types::*;

use regex::Regex;
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("File not found: {0}")]
	FileNotFound(String),

	#[error("Parse error: {0}")]
	ParseError(String),

	#[error("Validation error: {0}")]
	ValidationError(String),

	#[error("Environment variable not found: {0}")]
	EnvVarNotFound(String),

	#[error("IO error: {0}")]
	IoError(#[from] std::io::Error),
}

/// Serialization format of a configuration source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
	Toml,
	Json,
	Yaml,
}

impl ConfigFormat {
	pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
		match path.extension().and_then(|s| s.to_str()) {
			Some("toml") => Ok(ConfigFormat::Toml),
			Some("json") => Ok(ConfigFormat::Json),
			Some("yaml") | Some("yml") => Ok(ConfigFormat::Yaml),
			_ => Err(ConfigError::ParseError(format!(
				"Unsupported config format: {:?}",
				path
			))),
		}
	}
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Configuration loader with environment variable substitution
pub struct ConfigLoader {
	file_path: Option<PathBuf>,
	env_prefix: String,
}

impl Default for ConfigLoader {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigLoader {
	pub fn new() -> Self {
		Self {
			file_path: None,
			env_prefix: "LEDGER_".to_string(),
		}
	}

	pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
		self.file_path = Some(path.as_ref().to_path_buf());
		self
	}

	pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.env_prefix = prefix.into();
		self
	}

	/// Loads the configured file, or the defaults when no file was given.
	pub async fn load(&self) -> Result<ClientConfig, ConfigError> {
		let mut config = match &self.file_path {
			Some(path) => self.load_from_file(path).await?,
			None => {
				debug!("No configuration file given, using defaults");
				ClientConfig::default()
			}
		};

		self.apply_env_overrides(&mut config)?;
		validate_config(&config)?;

		Ok(config)
	}

	/// Loads configuration from an in-memory document.
	pub fn load_str(&self, contents: &str, format: ConfigFormat) -> Result<ClientConfig, ConfigError> {
		let mut config = self.parse(contents, format)?;
		self.apply_env_overrides(&mut config)?;
		validate_config(&config)?;
		Ok(config)
	}

	async fn load_from_file(&self, path: &Path) -> Result<ClientConfig, ConfigError> {
		info!("Loading configuration from {:?}", path);
		let format = ConfigFormat::from_path(path)?;

		let content = match tokio::fs::read_to_string(path).await {
			Ok(content) => content,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
				return Err(ConfigError::FileNotFound(path.display().to_string()));
			}
			Err(e) => return Err(e.into()),
		};

		self.parse(&content, format)
	}

	fn parse(&self, contents: &str, format: ConfigFormat) -> Result<ClientConfig, ConfigError> {
		let substituted = self.substitute_env_vars(contents)?;

		match format {
			ConfigFormat::Toml => {
				toml::from_str(&substituted).map_err(|e| ConfigError::ParseError(e.to_string()))
			}
			ConfigFormat::Json => serde_json::from_str(&substituted)
				.map_err(|e| ConfigError::ParseError(e.to_string())),
			ConfigFormat::Yaml => serde_yaml::from_str(&substituted)
				.map_err(|e| ConfigError::ParseError(e.to_string())),
		}
	}

	fn substitute_env_vars(&self, content: &str) -> Result<String, ConfigError> {
		let mut result = content.to_string();

		// Find and replace ${VAR_NAME} patterns
		let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ConfigError::ParseError(e.to_string()))?;

		for cap in re.captures_iter(content) {
			let full_match = &cap[0];
			let var_name = &cap[1];

			let env_value = env::var(var_name)
				.map_err(|_| ConfigError::EnvVarNotFound(var_name.to_string()))?;

			result = result.replace(full_match, &env_value);
		}

		Ok(result)
	}

	fn env(&self, name: &str) -> Option<String> {
		env::var(format!("{}{}", self.env_prefix, name)).ok()
	}

	fn apply_env_overrides(&self, config: &mut ClientConfig) -> Result<(), ConfigError> {
		if let Some(host) = self.env("PEER_HOST") {
			debug!("Overriding peer host from environment");
			config.peer.host = host;
		}

		if let Some(port) = self.env("PEER_PORT") {
			config.peer.port = port
				.parse()
				.map_err(|e| ConfigError::ValidationError(format!("Invalid peer port: {}", e)))?;
		}

		if let Some(scheme) = self.env("PEER_SCHEME") {
			config.peer.scheme = scheme;
		}

		if let Some(level) = self.env("LOG_LEVEL") {
			config.logging.level = level;
		}

		if let Some(step) = self.env("DELAY_STEP_MS") {
			config.confirmation.delay_step_ms = step
				.parse()
				.map_err(|e| ConfigError::ValidationError(format!("Invalid delay step: {}", e)))?;
		}

		if let Some(timeout) = self.env("DELAY_TIMEOUT_MS") {
			config.confirmation.delay_timeout_ms = timeout.parse().map_err(|e| {
				ConfigError::ValidationError(format!("Invalid delay timeout: {}", e))
			})?;
		}

		if let Some(enroll_id) = self.env("ENROLL_ID") {
			debug!("Overriding enrollment id from environment");
			let secret = config
				.identity
				.take()
				.and_then(|identity| identity.enroll_secret);
			config.identity = Some(IdentitySettings {
				enroll_id,
				enroll_secret: secret,
			});
		}

		if let Some(secret) = self.env("ENROLL_SECRET") {
			match config.identity.as_mut() {
				Some(identity) => identity.enroll_secret = Some(secret),
				None => {
					return Err(ConfigError::ValidationError(
						"Enrollment secret given without an enrollment id".to_string(),
					))
				}
			}
		}

		Ok(())
	}
}

/// Checks a configuration for values the client cannot work with.
pub fn validate_config(config: &ClientConfig) -> Result<(), ConfigError> {
	if config.peer.host.trim().is_empty() {
		return Err(ConfigError::ValidationError(
			"Peer host must not be empty".to_string(),
		));
	}

	if config.peer.port == 0 {
		return Err(ConfigError::ValidationError(
			"Peer port must not be 0".to_string(),
		));
	}

	if config.peer.scheme != "http" && config.peer.scheme != "https" {
		return Err(ConfigError::ValidationError(format!(
			"Peer scheme must be http or https, got '{}'",
			config.peer.scheme
		)));
	}

	if config.peer.request_timeout_secs == 0 {
		return Err(ConfigError::ValidationError(
			"Request timeout must be at least one second".to_string(),
		));
	}

	if config.confirmation.delay_step_ms == 0 {
		return Err(ConfigError::ValidationError(
			"Confirmation delay step must be positive".to_string(),
		));
	}

	if let Some(chaincode) = &config.chaincode {
		if chaincode.chaincode_id().is_none() {
			return Err(ConfigError::ValidationError(
				"Chaincode must set exactly one of 'path' or 'name'".to_string(),
			));
		}
	}

	if let Some(identity) = &config.identity {
		if identity.enroll_id.trim().is_empty() {
			return Err(ConfigError::ValidationError(
				"Enrollment id must not be empty".to_string(),
			));
		}
	}

	if !LOG_LEVELS.contains(&config.logging.level.to_lowercase().as_str()) {
		return Err(ConfigError::ValidationError(format!(
			"Unknown log level '{}'",
			config.logging.level
		)));
	}

	Ok(())
}
