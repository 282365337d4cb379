//! Error types for peer interactions.

use thiserror::Error;

pub type PeerResult<T> = std::result::Result<T, PeerError>;

/// Errors reported by a peer or by the transport used to reach it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PeerError {
	#[error("Transport error: {0}")]
	Transport(String),

	#[error("Unexpected response: {status} {body}")]
	UnexpectedResponse { status: u16, body: String },

	#[error("RPC error {code}: {message}")]
	Rpc { code: i64, message: String },

	#[error("Decode error: {0}")]
	Decode(String),

	#[error("Missing field in peer response: {0}")]
	MissingField(&'static str),

	#[error("Invalid configuration: {0}")]
	InvalidConfiguration(String),
}
