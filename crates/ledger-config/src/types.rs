//! Configuration types for the ledger client.

use ledger_confirm::ConfirmationConfig;
use ledger_peer::PeerEndpoint;
use ledger_types::{ChaincodeId, Enrollment};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Complete client configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
	/// Peer REST endpoint
	pub peer: PeerSettings,
	/// Confirmation polling policy
	pub confirmation: ConfirmationSettings,
	/// User requests are made on behalf of
	pub identity: Option<IdentitySettings>,
	/// Target chaincode
	pub chaincode: Option<ChaincodeSettings>,
	/// Log output
	pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PeerSettings {
	/// `http` or `https`
	pub scheme: String,
	pub host: String,
	pub port: u16,
	/// Timeout for a single HTTP request, in seconds
	pub request_timeout_secs: u64,
}

impl Default for PeerSettings {
	fn default() -> Self {
		Self {
			scheme: "http".to_string(),
			host: "127.0.0.1".to_string(),
			port: 7050,
			request_timeout_secs: 30,
		}
	}
}

impl PeerSettings {
	pub fn endpoint(&self) -> PeerEndpoint {
		PeerEndpoint::new(self.host.clone(), self.port)
			.with_scheme(self.scheme.clone())
			.with_request_timeout(Duration::from_secs(self.request_timeout_secs))
	}
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ConfirmationSettings {
	/// Wait between height polls, in milliseconds
	pub delay_step_ms: u64,
	/// Total idle wait budget, in milliseconds
	pub delay_timeout_ms: u64,
}

impl Default for ConfirmationSettings {
	fn default() -> Self {
		Self {
			delay_step_ms: 500,
			delay_timeout_ms: 2000,
		}
	}
}

impl From<&ConfirmationSettings> for ConfirmationConfig {
	fn from(settings: &ConfirmationSettings) -> Self {
		ConfirmationConfig::new(
			Duration::from_millis(settings.delay_step_ms),
			Duration::from_millis(settings.delay_timeout_ms),
		)
	}
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct IdentitySettings {
	/// Enrolled user id, also used as the secure context of requests
	pub enroll_id: String,
	/// Only needed to log in. Never serialized.
	#[serde(default, skip_serializing)]
	pub enroll_secret: Option<String>,
}

impl IdentitySettings {
	pub fn enrollment(&self) -> Option<Enrollment> {
		self.enroll_secret.as_ref().map(|secret| Enrollment {
			enroll_id: self.enroll_id.clone(),
			enroll_secret: secret.clone(),
		})
	}
}

/// Exactly one of `path` (to deploy) or `name` (already deployed) is set.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ChaincodeSettings {
	#[serde(default)]
	pub path: Option<String>,
	#[serde(default)]
	pub name: Option<String>,
}

impl ChaincodeSettings {
	pub fn chaincode_id(&self) -> Option<ChaincodeId> {
		match (&self.path, &self.name) {
			(Some(path), None) => Some(ChaincodeId::Path(path.clone())),
			(None, Some(name)) => Some(ChaincodeId::Name(name.clone())),
			_ => None,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
	/// trace, debug, info, warn or error
	pub level: String,
	/// Emit JSON lines instead of human readable output
	pub json: bool,
}

impl Default for LoggingSettings {
	fn default() -> Self {
		Self {
			level: "info".to_string(),
			json: false,
		}
	}
}
