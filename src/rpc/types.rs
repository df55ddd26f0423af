//! CometBFT JSON-RPC wire types.

use serde::{Deserialize, Serialize};

use crate::shared::serde_util::lenient_string;

/// JSON-RPC 2.0 request envelope.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest<'a, P: Serialize> {
    pub jsonrpc: &'static str,
    pub id: String,
    pub method: &'a str,
    pub params: P,
}

impl<'a, P: Serialize> JsonRpcRequest<'a, P> {
    /// Request with a fresh uuid v4 id.
    pub fn new(method: &'a str, params: P) -> Self {
        Self {
            jsonrpc: "2.0",
            id: uuid::Uuid::new_v4().to_string(),
            method,
            params,
        }
    }
}

/// `broadcast_tx_commit` params.
#[derive(Debug, Clone, Serialize)]
pub struct BroadcastTxParams {
    /// Envelope bytes, standard base64
    pub tx: String,
}

/// JSON-RPC error object.
///
/// Every field is optional on the wire; a partial object still decodes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcErrorObject {
    #[serde(default)]
    pub code: i64,
    #[serde(default, with = "lenient_string")]
    pub message: String,
    #[serde(default, with = "lenient_string")]
    pub data: String,
}

// ============================================================================
// broadcast_tx_commit
// ============================================================================

/// `broadcast_tx_commit` result.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BroadcastResult {
    #[serde(default)]
    pub check_tx: TxResult,
    /// Named `tx_result` from CometBFT 0.38 on
    #[serde(default, alias = "tx_result")]
    pub deliver_tx: TxResult,
    #[serde(default, with = "lenient_string")]
    pub hash: String,
    #[serde(default, with = "lenient_string")]
    pub height: String,
}

/// CheckTx / DeliverTx outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxResult {
    #[serde(default)]
    pub code: u32,
    #[serde(default, with = "lenient_string")]
    pub log: String,
    #[serde(default, with = "lenient_string")]
    pub info: String,
    #[serde(default, with = "lenient_string")]
    pub codespace: String,
}

impl TxResult {
    /// Whether the code reports success (`0`).
    pub fn is_ok(&self) -> bool {
        self.code == 0
    }
}

/// A committed transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastOutcome {
    /// Transaction hash (hex, as reported by the node)
    pub hash: String,
    /// Block height the transaction was committed in
    pub height: String,
    pub check_tx: TxResult,
    pub deliver_tx: TxResult,
}

impl From<BroadcastResult> for BroadcastOutcome {
    fn from(result: BroadcastResult) -> Self {
        Self {
            hash: result.hash,
            height: result.height,
            check_tx: result.check_tx,
            deliver_tx: result.deliver_tx,
        }
    }
}

// ============================================================================
// abci_query
// ============================================================================

/// `abci_query` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbciQueryResponse {
    #[serde(default)]
    pub jsonrpc: String,
    #[serde(default)]
    pub id: serde_json::Value,
    #[serde(default)]
    pub result: Option<AbciQueryResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcErrorObject>,
}

impl AbciQueryResponse {
    /// The inner ABCI response. Present once classification succeeded.
    pub fn response(&self) -> Option<&AbciResponse> {
        self.result.as_ref().map(|r| &r.response)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbciQueryResult {
    #[serde(default)]
    pub response: AbciResponse,
}

/// ABCI query response payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AbciResponse {
    #[serde(default)]
    pub code: u32,
    #[serde(default, with = "lenient_string")]
    pub log: String,
    #[serde(default, with = "lenient_string")]
    pub info: String,
    #[serde(default, with = "lenient_string")]
    pub index: String,
    /// Base64, or absent
    #[serde(default)]
    pub key: Option<String>,
    /// Base64, or absent
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default, rename = "proofOps")]
    pub proof_ops: Option<serde_json::Value>,
    #[serde(default, with = "lenient_string")]
    pub height: String,
    #[serde(default, with = "lenient_string")]
    pub codespace: String,
}
