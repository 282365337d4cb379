//! Peer REST client.

use crate::PeerEndpoint;
use async_trait::async_trait;
use ledger_types::{
	Block, BlockIndex, ChainHeight, ChainInfo, ChaincodeId, ChaincodeParams, CtorMsg, Enrollment,
	InvocationParams, LedgerQuery, PeerError, PeerResult, RpcMethod, RpcRequest, RpcResponse,
	SubmissionReceipt, TransactionSubmitter, TxId,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info};

/// JSON-RPC request ID counter
static REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Client for one peer.
///
/// The secure context (the enrolled user requests are made on behalf of) and
/// the target chaincode are fixed per client value; derive another client with
/// the builder methods to change them.
#[derive(Debug, Clone)]
pub struct PeerClient {
	client: reqwest::Client,
	base_url: String,
	secure_context: Option<String>,
	chaincode_id: Option<ChaincodeId>,
}

impl PeerClient {
	pub fn new(endpoint: &PeerEndpoint) -> PeerResult<Self> {
		Self::from_base_url(endpoint.base_url(), endpoint.request_timeout)
	}

	pub fn from_base_url(base_url: impl Into<String>, timeout: Duration) -> PeerResult<Self> {
		let client = reqwest::Client::builder()
			.timeout(timeout)
			.build()
			.map_err(|e| PeerError::InvalidConfiguration(format!("HTTP client: {}", e)))?;

		Ok(Self {
			client,
			base_url: base_url.into().trim_end_matches('/').to_string(),
			secure_context: None,
			chaincode_id: None,
		})
	}

	/// Sets, or clears with `None`, the user requests are made on behalf of.
	pub fn with_secure_context(mut self, user: Option<String>) -> Self {
		self.secure_context = user;
		self
	}

	pub fn with_chaincode_id(mut self, chaincode_id: ChaincodeId) -> Self {
		self.chaincode_id = Some(chaincode_id);
		self
	}

	pub fn base_url(&self) -> &str {
		&self.base_url
	}

	pub fn secure_context(&self) -> Option<&str> {
		self.secure_context.as_deref()
	}

	pub fn chaincode_id(&self) -> Option<&ChaincodeId> {
		self.chaincode_id.as_ref()
	}

	pub async fn chain_info(&self) -> PeerResult<ChainInfo> {
		let body = self.send(self.client.get(self.url("chain"))).await?;
		decode(body)
	}

	pub async fn block_at(&self, index: BlockIndex) -> PeerResult<Block> {
		let body = self
			.send(self.client.get(self.url(&format!("chain/blocks/{}", index))))
			.await?;
		let mut block: Block = decode(body)?;
		block.index = index;
		Ok(block)
	}

	/// Deploys the chaincode whose path was set with
	/// [`with_chaincode_id`](Self::with_chaincode_id).
	///
	/// The response message carries the name of the deployed chaincode.
	pub async fn deploy(&self, params: InvocationParams) -> PeerResult<RpcResponse> {
		let body = self.post_chaincode(RpcMethod::Deploy, params).await?;
		let response: RpcResponse = decode(body)?;
		info!(
			chaincode = response.result.as_ref().map(|r| r.message.as_str()).unwrap_or_default(),
			"Chaincode deployed"
		);
		Ok(response)
	}

	/// Runs a read-only query against the chaincode.
	pub async fn query(&self, params: InvocationParams) -> PeerResult<RpcResponse> {
		let body = self.post_chaincode(RpcMethod::Query, params).await?;
		decode(body)
	}

	/// Submits an invocation without waiting for it to be committed.
	///
	/// An accepted invocation may still never reach the ledger; use a
	/// confirmation tracker to find out.
	pub async fn invoke(&self, params: &InvocationParams) -> PeerResult<SubmissionReceipt> {
		let payload = self.post_chaincode(RpcMethod::Invoke, params.clone()).await?;
		let response: RpcResponse = decode(payload.clone())?;

		let txid = response
			.result
			.map(|result| result.message)
			.filter(|message| !message.is_empty())
			.ok_or(PeerError::MissingField("result.message"))?;

		debug!(txid = %txid, "Invocation accepted");
		Ok(SubmissionReceipt {
			txid: TxId(txid),
			payload,
		})
	}

	/// Registers the user with the peer's member services.
	pub async fn login(&self, enrollment: &Enrollment) -> PeerResult<Value> {
		self.send(self.client.post(self.url("registrar")).json(enrollment))
			.await
	}

	/// Removes the user's enrollment from the peer.
	pub async fn logout(&self, enroll_id: &str) -> PeerResult<Value> {
		self.send(
			self.client
				.delete(self.url(&format!("registrar/{}", enroll_id))),
		)
		.await
	}

	async fn post_chaincode(&self, method: RpcMethod, params: InvocationParams) -> PeerResult<Value> {
		let mut ctor_msg: CtorMsg = params.into();
		if ctor_msg.function.is_empty() {
			ctor_msg.function = method.default_function().to_string();
		}

		let request = RpcRequest::new(
			method,
			ChaincodeParams {
				chaincode_id: self.chaincode_id.clone(),
				ctor_msg,
				secure_context: self.secure_context.clone(),
				..Default::default()
			},
			REQUEST_ID.fetch_add(1, Ordering::SeqCst),
		);

		debug!(
			method = ?request.method,
			function = %request.params.ctor_msg.function,
			id = request.id,
			"Posting chaincode request"
		);

		let body = self
			.send(self.client.post(self.url("chaincode")).json(&request))
			.await?;

		if let Some(error) = body.get("error").filter(|e| !e.is_null()) {
			let code = error.get("code").and_then(Value::as_i64).unwrap_or_default();
			let message = error
				.get("message")
				.and_then(Value::as_str)
				.unwrap_or_default()
				.to_string();
			return Err(PeerError::Rpc { code, message });
		}

		Ok(body)
	}

	/// Sends a request and reads the body as JSON.
	///
	/// Successful responses that are not JSON are wrapped as `{"text": body}`.
	async fn send(&self, request: reqwest::RequestBuilder) -> PeerResult<Value> {
		let response = request
			.send()
			.await
			.map_err(|e| PeerError::Transport(e.to_string()))?;

		let status = response.status();
		let body = response
			.text()
			.await
			.map_err(|e| PeerError::Transport(e.to_string()))?;

		if status != reqwest::StatusCode::OK {
			return Err(PeerError::UnexpectedResponse {
				status: status.as_u16(),
				body,
			});
		}

		Ok(serde_json::from_str(&body).unwrap_or_else(|_| json!({ "text": body })))
	}

	fn url(&self, path: &str) -> String {
		format!("{}/{}", self.base_url, path)
	}
}

fn decode<T: DeserializeOwned>(body: Value) -> PeerResult<T> {
	serde_json::from_value(body).map_err(|e| PeerError::Decode(e.to_string()))
}

#[async_trait]
impl LedgerQuery for PeerClient {
	async fn chain_height(&self) -> PeerResult<ChainHeight> {
		Ok(self.chain_info().await?.height)
	}

	async fn block(&self, index: BlockIndex) -> PeerResult<Block> {
		self.block_at(index).await
	}
}

#[async_trait]
impl TransactionSubmitter for PeerClient {
	async fn submit(&self, params: &InvocationParams) -> PeerResult<SubmissionReceipt> {
		self.invoke(params).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use ledger_confirm::{ConfirmationConfig, ConfirmationError, ConfirmationTracker};
	use std::sync::Arc;
	use wiremock::matchers::{body_partial_json, method, path};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	fn client(server: &MockServer) -> PeerClient {
		PeerClient::from_base_url(server.uri(), Duration::from_secs(5)).unwrap()
	}

	#[tokio::test]
	async fn test_chain_height() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/chain"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"height": 42,
				"currentBlockHash": "RrndKwuojRMjOz/rdD7rJD/NUupiuBuCtQwnZG7Vdi/XXcTd2MDyAMsFAZ1ntZL2/IIcSUeatIZAKS6ss7fEvg==",
				"previousBlockHash": "V7ohk5WqLAS9kCc8NQ0ULEY0GmUFfsdUp6qjJ4I9bB0ATu6tUl1eO2HKuC6FWlAr45LcvPKgHQBbPHSd0oENDQ=="
			})))
			.mount(&server)
			.await;

		assert_eq!(client(&server).chain_height().await.unwrap(), 42);
	}

	#[tokio::test]
	async fn test_block_sets_requested_index() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/chain/blocks/7"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"transactions": [{ "type": 2, "txid": "7a1c" }],
				"stateHash": "ab"
			})))
			.mount(&server)
			.await;

		let block = client(&server).block(7).await.unwrap();
		assert_eq!(block.index, 7);
		assert!(block.contains(&TxId::from("7a1c")));
	}

	#[tokio::test]
	async fn test_non_success_status_is_error() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/chain/blocks/99"))
			.respond_with(ResponseTemplate::new(404).set_body_string("{\"Error\":\"Not found\"}"))
			.mount(&server)
			.await;

		let err = client(&server).block(99).await.unwrap_err();
		assert_eq!(
			err,
			PeerError::UnexpectedResponse {
				status: 404,
				body: "{\"Error\":\"Not found\"}".to_string(),
			}
		);
	}

	#[tokio::test]
	async fn test_only_ok_status_is_success() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/chain"))
			.respond_with(ResponseTemplate::new(202).set_body_json(json!({ "height": 4 })))
			.mount(&server)
			.await;

		let err = client(&server).chain_height().await.unwrap_err();
		assert!(matches!(err, PeerError::UnexpectedResponse { status: 202, .. }));
	}

	#[tokio::test]
	async fn test_invoke_posts_context_and_returns_txid() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path("/chaincode"))
			.and(body_partial_json(json!({
				"jsonrpc": "2.0",
				"method": "invoke",
				"params": {
					"type": 1,
					"chaincodeID": { "name": "mycc" },
					"ctorMsg": { "function": "invoke", "args": ["a", "b", "10"] },
					"secureContext": "jim"
				}
			})))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"jsonrpc": "2.0",
				"result": { "status": "OK", "message": "5a4b1f3e" },
				"id": 1
			})))
			.expect(1)
			.mount(&server)
			.await;

		let peer = client(&server)
			.with_secure_context(Some("jim".to_string()))
			.with_chaincode_id(ChaincodeId::Name("mycc".to_string()));
		let receipt = peer
			.invoke(&InvocationParams::new("", ["a", "b", "10"]))
			.await
			.unwrap();

		assert_eq!(receipt.txid, TxId::from("5a4b1f3e"));
		assert_eq!(receipt.payload["result"]["status"], json!("OK"));
	}

	#[tokio::test]
	async fn test_rpc_error_body_is_error() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path("/chaincode"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"jsonrpc": "2.0",
				"error": { "code": -32002, "message": "Invocation failure", "data": "Error when invoking chaincode" },
				"id": 3
			})))
			.mount(&server)
			.await;

		let err = client(&server)
			.invoke(&InvocationParams::new("move", ["a"]))
			.await
			.unwrap_err();
		assert_eq!(
			err,
			PeerError::Rpc {
				code: -32002,
				message: "Invocation failure".to_string(),
			}
		);
	}

	#[tokio::test]
	async fn test_invoke_without_message_is_error() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path("/chaincode"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"jsonrpc": "2.0",
				"result": { "status": "OK" },
				"id": 4
			})))
			.mount(&server)
			.await;

		let err = client(&server)
			.invoke(&InvocationParams::new("move", ["a"]))
			.await
			.unwrap_err();
		assert_eq!(err, PeerError::MissingField("result.message"));
	}

	#[tokio::test]
	async fn test_deploy_uses_path_and_init() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path("/chaincode"))
			.and(body_partial_json(json!({
				"method": "deploy",
				"params": {
					"chaincodeID": { "path": "github.com/hyperledger/example02" },
					"ctorMsg": { "function": "init", "args": ["a", "100"] }
				}
			})))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"jsonrpc": "2.0",
				"result": { "status": "OK", "message": "ee5b24a1f17c356dd5f6e37307922e39ddba12e5d2e203ed93401d7d05eb0dd194fb9070549c5dc31eb63f4e654dbd5a1d86cbb30c48e3ab1812590cd0f78539" },
				"id": 2
			})))
			.expect(1)
			.mount(&server)
			.await;

		let response = client(&server)
			.with_chaincode_id(ChaincodeId::Path("github.com/hyperledger/example02".to_string()))
			.deploy(InvocationParams::new("", ["a", "100"]))
			.await
			.unwrap();

		assert_eq!(response.result.unwrap().status, "OK");
	}

	#[tokio::test]
	async fn test_login_and_logout() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path("/registrar"))
			.and(body_partial_json(json!({ "enrollId": "jim", "enrollSecret": "6avZQLwcUe9b" })))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({ "OK": "Login successful for user 'jim'." })))
			.mount(&server)
			.await;
		Mock::given(method("DELETE"))
			.and(path("/registrar/jim"))
			.respond_with(ResponseTemplate::new(200).set_body_string("Deleted jim"))
			.mount(&server)
			.await;

		let peer = client(&server);
		let login = peer
			.login(&Enrollment {
				enroll_id: "jim".to_string(),
				enroll_secret: "6avZQLwcUe9b".to_string(),
			})
			.await
			.unwrap();
		assert_eq!(login["OK"], json!("Login successful for user 'jim'."));

		let logout = peer.logout("jim").await.unwrap();
		assert_eq!(logout, json!({ "text": "Deleted jim" }));
	}

	#[tokio::test]
	async fn test_tracker_confirms_over_http() {
		let server = MockServer::start().await;
		// Snapshot before submission, then the chain grows by one block.
		Mock::given(method("GET"))
			.and(path("/chain"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({ "height": 10 })))
			.up_to_n_times(1)
			.mount(&server)
			.await;
		Mock::given(method("GET"))
			.and(path("/chain"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({ "height": 11 })))
			.mount(&server)
			.await;
		Mock::given(method("POST"))
			.and(path("/chaincode"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"jsonrpc": "2.0",
				"result": { "status": "OK", "message": "c0ffee" },
				"id": 5
			})))
			.mount(&server)
			.await;
		Mock::given(method("GET"))
			.and(path("/chain/blocks/10"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"transactions": [{ "txid": "beef" }, { "txid": "c0ffee" }]
			})))
			.expect(1)
			.mount(&server)
			.await;

		let peer = Arc::new(client(&server));
		let tracker = ConfirmationTracker::new(peer.clone(), peer, ConfirmationConfig::default());

		let confirmation = tracker
			.confirm(InvocationParams::new("invoke", ["a", "b", "1"]))
			.await
			.unwrap();
		assert_eq!(confirmation.block_index, 10);
		assert_eq!(confirmation.receipt.txid, TxId::from("c0ffee"));
	}

	#[tokio::test]
	async fn test_tracker_reports_unreachable_peer() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/chain"))
			.respond_with(ResponseTemplate::new(500).set_body_string("internal"))
			.mount(&server)
			.await;

		let peer = Arc::new(client(&server));
		let tracker = ConfirmationTracker::new(peer.clone(), peer, ConfirmationConfig::default());

		let err = tracker
			.confirm(InvocationParams::new("invoke", ["a"]))
			.await
			.unwrap_err();
		assert!(matches!(
			err,
			ConfirmationError::QueryFailed(PeerError::UnexpectedResponse { status: 500, .. })
		));
	}
}
