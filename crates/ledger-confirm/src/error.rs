//! Error types for confirmation requests.

use ledger_types::{PeerError, TxId};
use std::fmt;
use thiserror::Error;

/// Why a healthy peer did not show the transaction in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutReason {
	/// The chain did not grow before the wait budget ran out.
	HeightStalled,
	/// No block in the search window contained the transaction.
	WindowExhausted,
	/// The peer reported a height below the one read before submission, which
	/// leaves an empty window.
	HeightRegressed,
}

impl fmt::Display for TimeoutReason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			TimeoutReason::HeightStalled => write!(f, "chain height did not grow"),
			TimeoutReason::WindowExhausted => write!(f, "not found in search window"),
			TimeoutReason::HeightRegressed => write!(f, "chain height regressed"),
		}
	}
}

/// Terminal failure of a confirmation request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationError {
	/// The peer refused the submission. No polling took place.
	#[error("Submission rejected: {0}")]
	SubmissionRejected(#[source] PeerError),

	/// A height or block query failed. The search was abandoned.
	#[error("Ledger query failed: {0}")]
	QueryFailed(#[source] PeerError),

	/// The transaction was not observed as committed within the limits.
	#[error("Transaction {txid} not confirmed within timeout: {reason}")]
	Timeout { txid: TxId, reason: TimeoutReason },
}

impl ConfirmationError {
	pub fn is_timeout(&self) -> bool {
		matches!(self, ConfirmationError::Timeout { .. })
	}

	/// Transaction id, when the failure happened after a successful submission
	/// and is a timeout.
	pub fn txid(&self) -> Option<&TxId> {
		match self {
			ConfirmationError::Timeout { txid, .. } => Some(txid),
			_ => None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_timeout_display() {
		let err = ConfirmationError::Timeout {
			txid: TxId::from("f00d"),
			reason: TimeoutReason::WindowExhausted,
		};
		assert!(err.is_timeout());
		assert_eq!(err.txid(), Some(&TxId::from("f00d")));
		assert_eq!(
			err.to_string(),
			"Transaction f00d not confirmed within timeout: not found in search window"
		);
	}

	#[test]
	fn test_query_failure_is_not_timeout() {
		let err = ConfirmationError::QueryFailed(PeerError::Transport("connection refused".into()));
		assert!(!err.is_timeout());
		assert!(err.txid().is_none());
	}
}
