//! JSON-RPC payloads for the peer's chaincode endpoint.
//!
//! Deploy, query and invoke share one request shape and differ only in the
//! method name and the constructor function used when the caller does not
//! name one. Only invocations change ledger state, so only they are worth
//! confirming.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The closed set of chaincode request kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RpcMethod {
	Deploy,
	Query,
	Invoke,
}

impl RpcMethod {
	/// Constructor function used when none is given.
	pub fn default_function(&self) -> &'static str {
		match self {
			RpcMethod::Deploy => "init",
			RpcMethod::Query => "query",
			RpcMethod::Invoke => "invoke",
		}
	}

	/// Whether a successful response still has to be confirmed against the ledger.
	pub fn requires_confirmation(&self) -> bool {
		matches!(self, RpcMethod::Invoke)
	}
}

/// Identifies the chaincode a request targets: a source path for deployment,
/// or the name (hash) of an already deployed chaincode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChaincodeId {
	Path(String),
	Name(String),
}

/// Constructor message: function name and string arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CtorMsg {
	#[serde(default, skip_serializing_if = "String::is_empty")]
	pub function: String,
	#[serde(default)]
	pub args: Vec<String>,
}

/// Payload forwarded verbatim from a caller to a submitter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationParams {
	pub function: String,
	pub args: Vec<String>,
}

impl InvocationParams {
	pub fn new<I, S>(function: impl Into<String>, args: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			function: function.into(),
			args: args.into_iter().map(Into::into).collect(),
		}
	}
}

impl From<InvocationParams> for CtorMsg {
	fn from(params: InvocationParams) -> Self {
		Self {
			function: params.function,
			args: params.args,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChaincodeParams {
	#[serde(rename = "type")]
	pub chaincode_type: u32,
	#[serde(rename = "chaincodeID", default, skip_serializing_if = "Option::is_none")]
	pub chaincode_id: Option<ChaincodeId>,
	#[serde(rename = "ctorMsg")]
	pub ctor_msg: CtorMsg,
	#[serde(default)]
	pub attributes: Vec<String>,
	#[serde(rename = "secureContext", default, skip_serializing_if = "Option::is_none")]
	pub secure_context: Option<String>,
}

impl Default for ChaincodeParams {
	fn default() -> Self {
		Self {
			// GOLANG
			chaincode_type: 1,
			chaincode_id: None,
			ctor_msg: CtorMsg::default(),
			attributes: vec!["position".to_string()],
			secure_context: None,
		}
	}
}

/// A JSON-RPC 2.0 request to the chaincode endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcRequest {
	pub jsonrpc: String,
	pub method: RpcMethod,
	pub params: ChaincodeParams,
	pub id: u64,
}

impl RpcRequest {
	pub fn new(method: RpcMethod, params: ChaincodeParams, id: u64) -> Self {
		Self {
			jsonrpc: "2.0".to_string(),
			method,
			params,
			id,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcResult {
	#[serde(default)]
	pub status: String,
	#[serde(default)]
	pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcErrorObject {
	pub code: i64,
	pub message: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data: Option<Value>,
}

/// A JSON-RPC 2.0 response.
///
/// For `invoke` the result message is the transaction id, for `deploy` the
/// name of the deployed chaincode, for `query` the query result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub jsonrpc: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub result: Option<RpcResult>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<RpcErrorObject>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id: Option<u64>,
}

/// Credentials posted to the registrar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
	pub enroll_id: String,
	pub enroll_secret: String,
}
