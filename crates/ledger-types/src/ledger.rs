//! Ledger entities as reported by a peer.
//!
//! The ledger is treated as an opaque append-only sequence of blocks. Only the
//! fields the client needs are typed; everything else a peer sends is kept as
//! raw JSON so nothing is lost when a record is handed back to a caller.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Opaque transaction identifier assigned by the peer on submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxId(pub String);

impl TxId {
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for TxId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl From<&str> for TxId {
	fn from(value: &str) -> Self {
		Self(value.to_string())
	}
}

impl From<String> for TxId {
	fn from(value: String) -> Self {
		Self(value)
	}
}

/// Number of committed blocks. The newest block has index `height - 1`.
pub type ChainHeight = u64;

/// Index of a block in the chain, dense from zero.
pub type BlockIndex = u64;

/// Response of the peer's chain summary endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainInfo {
	pub height: ChainHeight,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub current_block_hash: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub previous_block_hash: Option<String>,
}

/// A single committed transaction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
	#[serde(default)]
	pub txid: TxId,
	/// Remaining record fields (type, chaincode id, payload, timestamp, ...).
	#[serde(flatten)]
	pub details: Map<String, Value>,
}

impl TransactionRecord {
	pub fn new(txid: impl Into<TxId>) -> Self {
		Self {
			txid: txid.into(),
			details: Map::new(),
		}
	}
}

/// A committed block.
///
/// Peers do not echo the index in the block body, so it is filled in by the
/// client from the index it asked for. A block without a `transactions` field
/// is read as an empty block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
	#[serde(default)]
	pub index: BlockIndex,
	#[serde(default)]
	pub transactions: Vec<TransactionRecord>,
	#[serde(flatten)]
	pub details: Map<String, Value>,
}

impl Block {
	pub fn new(index: BlockIndex, transactions: Vec<TransactionRecord>) -> Self {
		Self {
			index,
			transactions,
			details: Map::new(),
		}
	}

	/// Position of the first record carrying `txid`, in transaction order.
	pub fn position_of(&self, txid: &TxId) -> Option<usize> {
		self.transactions.iter().position(|tx| &tx.txid == txid)
	}

	pub fn contains(&self, txid: &TxId) -> bool {
		self.position_of(txid).is_some()
	}
}

/// Outcome of a successful submission: the assigned identifier and the
/// peer's full response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
	pub txid: TxId,
	pub payload: Value,
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn test_block_from_peer_json() {
		let raw = json!({
			"transactions": [
				{ "type": 2, "chaincodeID": "Eh0...", "txid": "a1", "timestamp": { "seconds": 1 } },
				{ "type": 2, "txid": "b2" }
			],
			"stateHash": "7f...",
			"previousBlockHash": "c3..."
		});

		let block: Block = serde_json::from_value(raw).unwrap();
		assert_eq!(block.transactions.len(), 2);
		assert_eq!(block.position_of(&TxId::from("b2")), Some(1));
		assert!(!block.contains(&TxId::from("zz")));
		assert_eq!(block.details.get("stateHash"), Some(&json!("7f...")));
		assert_eq!(block.transactions[0].details.get("type"), Some(&json!(2)));
	}

	#[test]
	fn test_block_without_transactions() {
		let block: Block = serde_json::from_value(json!({ "stateHash": "00" })).unwrap();
		assert!(block.transactions.is_empty());
		assert!(!block.contains(&TxId::from("")));
	}

	#[test]
	fn test_chain_info_camel_case() {
		let info: ChainInfo = serde_json::from_value(json!({
			"height": 12,
			"currentBlockHash": "aa",
			"previousBlockHash": "bb"
		}))
		.unwrap();
		assert_eq!(info.height, 12);
		assert_eq!(info.current_block_hash.as_deref(), Some("aa"));
	}
}
