//! Per-request confirmation state.
//!
//! A [`ConfirmationRequest`] holds everything one confirmation needs: the
//! receipt of the accepted submission, the window bounds and the remaining
//! wait budget. It never performs I/O itself. The tracker feeds it height and
//! block observations and it answers with the next [`NextAction`], which keeps
//! the termination rules testable without a runtime.

use crate::{ConfirmationConfig, TimeoutReason};
use ledger_types::{Block, BlockIndex, ChainHeight, SubmissionReceipt, TxId};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationState {
	/// Waiting for the chain to grow past the height read before submission.
	AwaitingGrowth,
	/// Scanning blocks downwards; `cursor` is the next block to fetch.
	Scanning { cursor: BlockIndex },
	/// An outcome has been produced.
	Done,
}

/// What the driver has to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextAction {
	PollHeight,
	Sleep(Duration),
	FetchBlock(BlockIndex),
	Confirmed(BlockIndex),
	TimedOut(TimeoutReason),
}

#[derive(Debug, Clone)]
pub struct ConfirmationRequest {
	receipt: SubmissionReceipt,
	height_at_submission: ChainHeight,
	height_at_search: Option<BlockIndex>,
	delay_step: Duration,
	remaining: Duration,
	state: ConfirmationState,
	height_queries: u32,
	block_queries: u32,
}

impl ConfirmationRequest {
	/// Starts a request for an accepted submission.
	///
	/// `height_at_submission` must be read before the submission was sent; it
	/// is the first block index the transaction can land in.
	pub fn new(
		receipt: SubmissionReceipt,
		height_at_submission: ChainHeight,
		config: &ConfirmationConfig,
	) -> Self {
		Self {
			receipt,
			height_at_submission,
			height_at_search: None,
			delay_step: config.delay_step,
			remaining: config.delay_timeout,
			state: ConfirmationState::AwaitingGrowth,
			height_queries: 0,
			block_queries: 0,
		}
	}

	pub fn txid(&self) -> &TxId {
		&self.receipt.txid
	}

	pub fn receipt(&self) -> &SubmissionReceipt {
		&self.receipt
	}

	pub fn into_receipt(self) -> SubmissionReceipt {
		self.receipt
	}

	pub fn state(&self) -> ConfirmationState {
		self.state
	}

	pub fn height_at_submission(&self) -> ChainHeight {
		self.height_at_submission
	}

	/// Upper bound of the search window, once the chain has grown.
	pub fn height_at_search(&self) -> Option<BlockIndex> {
		self.height_at_search
	}

	pub fn remaining(&self) -> Duration {
		self.remaining
	}

	pub fn height_queries(&self) -> u32 {
		self.height_queries
	}

	pub fn block_queries(&self) -> u32 {
		self.block_queries
	}

	pub fn is_done(&self) -> bool {
		self.state == ConfirmationState::Done
	}

	/// Records a chain height observed while awaiting growth.
	pub(crate) fn on_height(&mut self, height: ChainHeight) -> NextAction {
		debug_assert_eq!(self.state, ConfirmationState::AwaitingGrowth);
		self.height_queries += 1;

		if height == self.height_at_submission {
			// A zero step would never drain the budget.
			if self.remaining.is_zero() || self.delay_step.is_zero() {
				return self.finish(NextAction::TimedOut(TimeoutReason::HeightStalled));
			}
			self.remaining = self.remaining.saturating_sub(self.delay_step);
			return NextAction::Sleep(self.delay_step);
		}

		self.begin_scan(height.checked_sub(1))
	}

	fn begin_scan(&mut self, upper: Option<BlockIndex>) -> NextAction {
		match upper {
			Some(upper) if upper >= self.height_at_submission => {
				self.height_at_search = Some(upper);
				self.state = ConfirmationState::Scanning { cursor: upper };
				NextAction::FetchBlock(upper)
			}
			_ => self.finish(NextAction::TimedOut(TimeoutReason::HeightRegressed)),
		}
	}

	/// Records the block fetched at the current cursor.
	pub(crate) fn on_block(&mut self, block: &Block) -> NextAction {
		self.block_queries += 1;
		// Outside a scan there is no window the block could belong to.
		let ConfirmationState::Scanning { cursor } = self.state else {
			return self.finish(NextAction::TimedOut(TimeoutReason::WindowExhausted));
		};

		if block.contains(&self.receipt.txid) {
			return self.finish(NextAction::Confirmed(cursor));
		}

		if cursor <= self.height_at_submission {
			return self.finish(NextAction::TimedOut(TimeoutReason::WindowExhausted));
		}

		let next = cursor - 1;
		self.state = ConfirmationState::Scanning { cursor: next };
		NextAction::FetchBlock(next)
	}

	/// Marks the request as finished after a failed query.
	pub(crate) fn abort(&mut self) {
		self.state = ConfirmationState::Done;
	}

	fn finish(&mut self, action: NextAction) -> NextAction {
		self.state = ConfirmationState::Done;
		action
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use ledger_types::TransactionRecord;
	use serde_json::json;

	fn request(height_at_submission: ChainHeight, step_ms: u64, timeout_ms: u64) -> ConfirmationRequest {
		let receipt = SubmissionReceipt {
			txid: TxId::from("tx-1"),
			payload: json!({ "result": { "status": "OK", "message": "tx-1" } }),
		};
		let config = ConfirmationConfig::new(
			Duration::from_millis(step_ms),
			Duration::from_millis(timeout_ms),
		);
		ConfirmationRequest::new(receipt, height_at_submission, &config)
	}

	fn block_with(index: BlockIndex, txids: &[&str]) -> Block {
		Block::new(
			index,
			txids.iter().map(|id| TransactionRecord::new(*id)).collect(),
		)
	}

	#[test]
	fn test_idle_wait_consumes_budget() {
		let mut req = request(10, 500, 1200);

		assert_eq!(req.on_height(10), NextAction::Sleep(Duration::from_millis(500)));
		assert_eq!(req.remaining(), Duration::from_millis(700));
		assert_eq!(req.on_height(10), NextAction::Sleep(Duration::from_millis(500)));
		assert_eq!(req.remaining(), Duration::from_millis(200));
		// A partial step still buys one more full wait.
		assert_eq!(req.on_height(10), NextAction::Sleep(Duration::from_millis(500)));
		assert!(req.remaining().is_zero());
		assert_eq!(
			req.on_height(10),
			NextAction::TimedOut(TimeoutReason::HeightStalled)
		);
		assert!(req.is_done());
		assert_eq!(req.height_queries(), 4);
	}

	#[test]
	fn test_growth_sets_window() {
		let mut req = request(10, 500, 2000);

		assert_eq!(req.on_height(13), NextAction::FetchBlock(12));
		assert_eq!(req.height_at_search(), Some(12));
		assert_eq!(req.state(), ConfirmationState::Scanning { cursor: 12 });
	}

	#[test]
	fn test_scan_walks_down_to_lower_bound() {
		let mut req = request(10, 500, 2000);
		req.on_height(12);

		assert_eq!(req.on_block(&block_with(11, &["other"])), NextAction::FetchBlock(10));
		assert_eq!(
			req.on_block(&block_with(10, &[])),
			NextAction::TimedOut(TimeoutReason::WindowExhausted)
		);
		assert_eq!(req.block_queries(), 2);
		assert!(req.is_done());
	}

	#[test]
	fn test_scan_stops_at_first_match() {
		let mut req = request(10, 500, 2000);
		req.on_height(15);

		assert_eq!(req.on_block(&block_with(14, &["a", "tx-1"])), NextAction::Confirmed(14));
		assert_eq!(req.block_queries(), 1);
	}

	#[test]
	fn test_regression_is_empty_window() {
		let mut req = request(10, 500, 2000);

		assert_eq!(
			req.on_height(9),
			NextAction::TimedOut(TimeoutReason::HeightRegressed)
		);
		assert_eq!(req.height_at_search(), None);
		assert_eq!(req.block_queries(), 0);
	}

	#[test]
	fn test_block_outside_scan_is_terminal() {
		let mut req = request(10, 500, 2000);
		assert_eq!(
			req.on_block(&block_with(10, &["tx-1"])),
			NextAction::TimedOut(TimeoutReason::WindowExhausted)
		);
		assert!(req.is_done());

		let mut req = request(10, 500, 2000);
		req.on_height(9);
		assert_eq!(
			req.on_block(&block_with(9, &["tx-1"])),
			NextAction::TimedOut(TimeoutReason::WindowExhausted)
		);
		assert_eq!(req.height_at_search(), None);
	}

	#[test]
	fn test_zero_step_does_not_spin() {
		let mut req = request(3, 0, 2000);
		assert_eq!(
			req.on_height(3),
			NextAction::TimedOut(TimeoutReason::HeightStalled)
		);
	}

	#[test]
	fn test_genesis_window() {
		let mut req = request(0, 500, 0);
		assert_eq!(
			req.on_height(0),
			NextAction::TimedOut(TimeoutReason::HeightStalled)
		);

		let mut req = request(0, 500, 0);
		assert_eq!(req.on_height(1), NextAction::FetchBlock(0));
		assert_eq!(req.on_block(&block_with(0, &["tx-1"])), NextAction::Confirmed(0));
	}
}
