//! Transaction confirmation for ledger peers.
//!
//! A peer acknowledging a submission does not mean the transaction will be
//! committed. This crate submits an invocation and then polls the peer's
//! ledger until the assigned transaction id shows up in a block, or until the
//! wait budget runs out, resolving every request to exactly one outcome.
//!
//! The search works on a fixed window of blocks. The chain height read just
//! before submission is the inclusive lower bound. The tracker then waits,
//! polling the height in fixed steps, until the chain grows past that bound;
//! the newest block at that point is the upper bound. Blocks are scanned from
//! the upper bound down to the lower bound and the scan stops at the first
//! block containing the transaction.

pub mod error;
pub mod request;
pub mod tracker;

pub use error::{ConfirmationError, TimeoutReason};
pub use request::{ConfirmationRequest, ConfirmationState};
pub use tracker::{Confirmation, ConfirmationTracker};

use std::time::Duration;

/// Default wait between height polls.
pub const DEFAULT_DELAY_STEP: Duration = Duration::from_millis(500);

/// Default total wait budget for the chain to grow.
pub const DEFAULT_DELAY_TIMEOUT: Duration = Duration::from_millis(2000);

/// Polling policy for confirmation requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationConfig {
	/// Wait between two height polls while the chain has not grown.
	pub delay_step: Duration,
	/// Total time allowed for idle waits before giving up.
	///
	/// Only the idle waits consume this budget. The block scan is bounded by
	/// the size of the search window instead.
	pub delay_timeout: Duration,
}

impl Default for ConfirmationConfig {
	fn default() -> Self {
		Self {
			delay_step: DEFAULT_DELAY_STEP,
			delay_timeout: DEFAULT_DELAY_TIMEOUT,
		}
	}
}

impl ConfirmationConfig {
	pub fn new(delay_step: Duration, delay_timeout: Duration) -> Self {
		Self {
			delay_step,
			delay_timeout,
		}
	}

	pub fn with_delay_step(mut self, delay_step: Duration) -> Self {
		self.delay_step = delay_step;
		self
	}

	pub fn with_delay_timeout(mut self, delay_timeout: Duration) -> Self {
		self.delay_timeout = delay_timeout;
		self
	}
}
