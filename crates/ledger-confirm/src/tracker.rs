//! Confirmation tracker.
//!
//! Drives one [`ConfirmationRequest`] per call against the submission and
//! ledger interfaces. Calls for a single request are strictly sequential;
//! separate requests share nothing but the interfaces and may run
//! concurrently.

use crate::request::NextAction;
use crate::{ConfirmationConfig, ConfirmationError, ConfirmationRequest};
use chrono::{DateTime, Utc};
use ledger_types::{BlockIndex, InvocationParams, LedgerQuery, SubmissionReceipt, TransactionSubmitter};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, field, info, info_span, warn, Instrument, Span};
use uuid::Uuid;

/// Successful outcome of a confirmation request.
#[derive(Debug, Clone, PartialEq)]
pub struct Confirmation {
	/// The receipt returned by the submission, unchanged.
	pub receipt: SubmissionReceipt,
	/// Index of the block the transaction was found in.
	pub block_index: BlockIndex,
	/// When the tracker observed the transaction in the ledger.
	pub confirmed_at: DateTime<Utc>,
}

/// Submits transactions and confirms that they were committed.
#[derive(Clone)]
pub struct ConfirmationTracker {
	submitter: Arc<dyn TransactionSubmitter>,
	ledger: Arc<dyn LedgerQuery>,
	config: ConfirmationConfig,
}

impl ConfirmationTracker {
	pub fn new(
		submitter: Arc<dyn TransactionSubmitter>,
		ledger: Arc<dyn LedgerQuery>,
		config: ConfirmationConfig,
	) -> Self {
		Self {
			submitter,
			ledger,
			config,
		}
	}

	pub fn config(&self) -> &ConfirmationConfig {
		&self.config
	}

	/// Submits `params` and waits until the transaction is found in the
	/// ledger or the request fails.
	///
	/// The chain height is read before submitting, so a transaction committed
	/// in the very next block is still inside the search window.
	pub async fn confirm(&self, params: InvocationParams) -> Result<Confirmation, ConfirmationError> {
		let span = info_span!(
			"confirm",
			request_id = %Uuid::new_v4(),
			function = %params.function,
			txid = field::Empty,
		);

		async move {
			let height_at_submission = self
				.ledger
				.chain_height()
				.await
				.map_err(ConfirmationError::QueryFailed)?;

			let receipt = match self.submitter.submit(&params).await {
				Ok(receipt) => receipt,
				Err(e) => {
					warn!(error = %e, "Submission rejected");
					return Err(ConfirmationError::SubmissionRejected(e));
				}
			};

			Span::current().record("txid", receipt.txid.as_str());
			debug!(height_at_submission, "Submission accepted, awaiting chain growth");

			let request = ConfirmationRequest::new(receipt, height_at_submission, &self.config);
			self.drive(request).await
		}
		.instrument(span)
		.await
	}

	/// Callback flavour of [`confirm`](Self::confirm).
	///
	/// The request runs on its own tokio task; exactly one of the two
	/// callbacks is invoked, once. Must be called from within a tokio runtime.
	pub fn confirm_transaction<F, E>(
		&self,
		params: InvocationParams,
		on_confirmed: F,
		on_failed: E,
	) -> JoinHandle<()>
	where
		F: FnOnce(SubmissionReceipt) + Send + 'static,
		E: FnOnce(ConfirmationError) + Send + 'static,
	{
		let tracker = self.clone();
		tokio::spawn(async move {
			match tracker.confirm(params).await {
				Ok(confirmation) => on_confirmed(confirmation.receipt),
				Err(error) => on_failed(error),
			}
		})
	}

	async fn drive(&self, mut request: ConfirmationRequest) -> Result<Confirmation, ConfirmationError> {
		let mut action = NextAction::PollHeight;

		loop {
			action = match action {
				NextAction::PollHeight => match self.ledger.chain_height().await {
					Ok(height) => {
						debug!(height, remaining_ms = request.remaining().as_millis() as u64, "Polled chain height");
						request.on_height(height)
					}
					Err(e) => {
						request.abort();
						warn!(error = %e, "Height query failed");
						return Err(ConfirmationError::QueryFailed(e));
					}
				},
				NextAction::Sleep(delay) => {
					tokio::time::sleep(delay).await;
					NextAction::PollHeight
				}
				NextAction::FetchBlock(index) => match self.ledger.block(index).await {
					Ok(block) => {
						debug!(index, transactions = block.transactions.len(), "Scanned block");
						request.on_block(&block)
					}
					Err(e) => {
						request.abort();
						warn!(index, error = %e, "Block query failed");
						return Err(ConfirmationError::QueryFailed(e));
					}
				},
				NextAction::Confirmed(block_index) => {
					info!(
						block_index,
						block_queries = request.block_queries(),
						height_queries = request.height_queries(),
						"Transaction confirmed"
					);
					return Ok(Confirmation {
						receipt: request.into_receipt(),
						block_index,
						confirmed_at: Utc::now(),
					});
				}
				NextAction::TimedOut(reason) => {
					warn!(
						%reason,
						height_at_submission = request.height_at_submission(),
						height_at_search = ?request.height_at_search(),
						"Transaction not confirmed"
					);
					return Err(ConfirmationError::Timeout {
						txid: request.txid().clone(),
						reason,
					});
				}
			};
		}
	}
}
