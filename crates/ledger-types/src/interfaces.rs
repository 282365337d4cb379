//! Interfaces consumed by the confirmation tracker.
//!
//! Both are implemented by the HTTP peer client, and by in-memory doubles in
//! tests. Implementations may be called concurrently from independent
//! confirmation requests.

use crate::{errors::PeerResult, Block, BlockIndex, ChainHeight, InvocationParams, SubmissionReceipt};
use async_trait::async_trait;

/// Read access to the committed chain.
#[async_trait]
pub trait LedgerQuery: Send + Sync {
	/// Current number of committed blocks.
	async fn chain_height(&self) -> PeerResult<ChainHeight>;

	/// Fetch the block at `index`.
	async fn block(&self, index: BlockIndex) -> PeerResult<Block>;
}

/// Submission of chaincode invocations.
#[async_trait]
pub trait TransactionSubmitter: Send + Sync {
	/// Submit an invocation. Success only means the peer accepted it, not
	/// that it was committed.
	async fn submit(&self, params: &InvocationParams) -> PeerResult<SubmissionReceipt>;
}
