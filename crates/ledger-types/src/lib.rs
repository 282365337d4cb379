//! Shared types for the ledger peer client.
//!
//! This crate holds the vocabulary every other crate in the workspace speaks:
//! blocks and transaction records as the peer reports them, the JSON-RPC
//! payloads posted to the chaincode endpoint, and the two interfaces the
//! confirmation tracker consumes.

pub mod errors;
pub mod interfaces;
pub mod ledger;
pub mod rpc;

pub use errors::*;
pub use interfaces::*;
pub use ledger::*;
pub use rpc::*;
