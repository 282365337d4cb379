//! HTTP client for a ledger peer's REST interface.
//!
//! Covers the chain summary and block endpoints, the JSON-RPC chaincode
//! endpoint (deploy, query, invoke) and the registrar. The client implements
//! [`LedgerQuery`](ledger_types::LedgerQuery) and
//! [`TransactionSubmitter`](ledger_types::TransactionSubmitter), so it can be
//! handed directly to a confirmation tracker.

pub mod client;

pub use client::PeerClient;

use std::time::Duration;

/// Timeout applied to every HTTP request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Where a peer's REST interface is reachable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerEndpoint {
	pub scheme: String,
	pub host: String,
	pub port: u16,
	pub request_timeout: Duration,
}

impl PeerEndpoint {
	pub fn new(host: impl Into<String>, port: u16) -> Self {
		Self {
			scheme: "http".to_string(),
			host: host.into(),
			port,
			request_timeout: DEFAULT_REQUEST_TIMEOUT,
		}
	}

	pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
		self.scheme = scheme.into();
		self
	}

	pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
		self.request_timeout = timeout;
		self
	}

	pub fn base_url(&self) -> String {
		format!("{}://{}:{}", self.scheme, self.host, self.port)
	}
}
