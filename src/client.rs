//! High-level LBC client.
//!
//! Wires the key store, body model, envelope signing, and RPC transport
//! into the ledger operations: identity registration, beneficiary
//! creation, atomic promise+commitment creation, and queries.

use crate::config::ClientConfig;
use crate::error::{LbcError, LbcResult};
use crate::keys::{KeyStore, Keypair};
use crate::query::{QueryRequest, QueryView};
use crate::rpc::{AbciQueryResponse, BroadcastOutcome, LbcRpcClient};
use crate::shared::parse_due;
use crate::tx::{
    BeneficiaryBody, CommiterBody, CommitmentBody, CompositeBody, Payload, PromiseBody, SignedTx,
};

/// A committed payload and the node's report on it.
#[derive(Debug, Clone)]
pub struct Receipt<P> {
    pub payload: P,
    pub outcome: BroadcastOutcome,
}

/// Arguments for [`LbcClient::create_promise_with_commitment`].
///
/// Due dates accept RFC 3339 or `YYYY-MM-DD` (midnight UTC).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreatePromiseArgs {
    pub text: String,
    pub due: String,
    pub beneficiary_id: String,
    /// Empty or `None` creates a root promise
    pub parent_promise_id: Option<String>,
    pub commitment_due: String,
}

impl CreatePromiseArgs {
    pub fn new(
        text: impl Into<String>,
        due: impl Into<String>,
        beneficiary_id: impl Into<String>,
        commitment_due: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            due: due.into(),
            beneficiary_id: beneficiary_id.into(),
            parent_promise_id: None,
            commitment_due: commitment_due.into(),
        }
    }

    pub fn with_parent(mut self, parent_promise_id: impl Into<String>) -> Self {
        self.parent_promise_id = Some(parent_promise_id.into());
        self
    }

    /// Check required fields and parse both dues.
    fn resolve(&self) -> LbcResult<(i64, i64)> {
        if self.text.is_empty() {
            return Err(LbcError::InvalidInput("promise text is required".to_string()));
        }
        if self.beneficiary_id.is_empty() {
            return Err(LbcError::InvalidInput("beneficiary id is required".to_string()));
        }
        let promise_due = parse_due(&self.due).map_err(|e| with_context("promise due", e))?;
        let commitment_due =
            parse_due(&self.commitment_due).map_err(|e| with_context("commitment due", e))?;
        Ok((promise_due, commitment_due))
    }
}

fn with_context(context: &str, err: LbcError) -> LbcError {
    match err {
        LbcError::InvalidInput(msg) => LbcError::InvalidInput(format!("{context}: {msg}")),
        other => other,
    }
}

fn require_name(name: &str, what: &str) -> LbcResult<()> {
    if name.trim().is_empty() {
        return Err(LbcError::InvalidInput(format!("{what} name is required")));
    }
    Ok(())
}

/// LBC ledger client.
#[derive(Debug, Clone)]
pub struct LbcClient {
    rpc: LbcRpcClient,
    key_store: KeyStore,
}

impl LbcClient {
    pub fn new(rpc: LbcRpcClient, key_store: KeyStore) -> Self {
        Self { rpc, key_store }
    }

    /// Build a client from validated configuration.
    pub fn from_config(config: &ClientConfig) -> LbcResult<Self> {
        config.validate()?;
        let mut builder = LbcRpcClient::builder(&config.rpc_url)
            .timeout_secs(config.timeout_secs)
            .with_retry(config.retry);
        for (name, value) in &config.headers {
            builder = builder.header(name, value);
        }
        let rpc = builder.build()?;
        Ok(Self::new(rpc, KeyStore::new(&config.key_dir)))
    }

    pub fn rpc(&self) -> &LbcRpcClient {
        &self.rpc
    }

    pub fn key_store(&self) -> &KeyStore {
        &self.key_store
    }

    /// Load the local keypair, generating and persisting one on first use.
    pub fn keypair(&self) -> LbcResult<Keypair> {
        Ok(self.key_store.ensure_keypair()?)
    }

    // =========================================================================
    // Write operations
    // =========================================================================

    /// Sign `payload` and submit it.
    pub async fn submit<P: Payload>(&self, keypair: &Keypair, payload: P) -> LbcResult<Receipt<P>> {
        let tx = SignedTx::sign(keypair, &payload)?;
        tracing::info!(kind = P::LABEL, signer = %keypair.identity_id(), "submitting transaction");
        let outcome = self.rpc.broadcast_tx_commit(&tx).await?;
        Ok(Receipt { payload, outcome })
    }

    /// Register the local key as an identity named `name`.
    ///
    /// The identity id is derived from the public key, so repeated
    /// registrations from the same key directory target the same id.
    pub async fn register_commiter(&self, name: &str) -> LbcResult<Receipt<CommiterBody>> {
        require_name(name, "commiter")?;
        let keypair = self.keypair()?;
        let body = CommiterBody::for_keypair(name, &keypair);
        self.submit(&keypair, body).await
    }

    /// Create a beneficiary. The new id is on the returned payload.
    pub async fn create_beneficiary(&self, name: &str) -> LbcResult<Receipt<BeneficiaryBody>> {
        require_name(name, "beneficiary")?;
        let keypair = self.keypair()?;
        self.submit(&keypair, BeneficiaryBody::new(name)).await
    }

    /// Create a promise and the local identity's commitment to it in one
    /// transaction.
    ///
    /// Input is validated before the key store is touched.
    pub async fn create_promise_with_commitment(
        &self,
        args: &CreatePromiseArgs,
    ) -> LbcResult<Receipt<CompositeBody>> {
        let (promise_due, commitment_due) = args.resolve()?;
        let keypair = self.keypair()?;

        let mut promise = PromiseBody::new(&args.text, promise_due, &args.beneficiary_id);
        if let Some(parent) = args.parent_promise_id.as_deref().filter(|p| !p.is_empty()) {
            promise = promise.with_parent(parent);
        }
        let commitment = CommitmentBody::for_promise(&promise, keypair.identity_id(), commitment_due);
        let body = CompositeBody::new(promise, commitment)?;

        self.submit(&keypair, body).await
    }

    // =========================================================================
    // Read operations
    // =========================================================================

    /// Run a query and return the full response.
    pub async fn query(&self, request: &QueryRequest) -> LbcResult<AbciQueryResponse> {
        self.rpc.abci_query(request).await
    }

    /// Run a query and decode its value.
    pub async fn query_value(&self, request: &QueryRequest) -> LbcResult<QueryView> {
        let response = self.query(request).await?;
        QueryView::decode(response.response().and_then(|r| r.value.as_deref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_client(dir: &std::path::Path) -> LbcClient {
        // Port 9 (discard) is never contacted by these tests.
        let rpc = LbcRpcClient::new("http://127.0.0.1:9").unwrap();
        LbcClient::new(rpc, KeyStore::new(dir))
    }

    #[test]
    fn test_args_resolve_dues() {
        let args = CreatePromiseArgs::new("t", "2030-01-01", "beneficiary:1", "2030-01-01T00:00:00Z");
        assert_eq!(args.resolve().unwrap(), (1_893_456_000, 1_893_456_000));
    }

    #[test]
    fn test_args_missing_fields() {
        let args = CreatePromiseArgs::new("", "2030-01-01", "b", "2030-01-01");
        assert!(matches!(args.resolve(), Err(LbcError::InvalidInput(_))));
        let args = CreatePromiseArgs::new("t", "2030-01-01", "", "2030-01-01");
        assert!(matches!(args.resolve(), Err(LbcError::InvalidInput(_))));
    }

    #[test]
    fn test_bad_due_names_the_field() {
        let args = CreatePromiseArgs::new("t", "2030-01-01", "b", "next week");
        let err = args.resolve().unwrap_err();
        assert!(err.to_string().contains("commitment due"), "{err}");
    }

    #[tokio::test]
    async fn test_invalid_input_does_not_create_keys() {
        let dir = tempfile::tempdir().unwrap();
        let client = offline_client(dir.path());

        let args = CreatePromiseArgs::new("t", "tomorrow", "b", "2030-01-01");
        assert!(client.create_promise_with_commitment(&args).await.is_err());
        assert!(client.register_commiter("  ").await.is_err());
        assert!(!client.key_store().private_key_path().exists());
    }

    #[test]
    fn test_from_config() {
        let config = ClientConfig {
            rpc_url: "http://node:26657/".to_string(),
            timeout_secs: 7,
            ..Default::default()
        };
        let client = LbcClient::from_config(&config).unwrap();
        assert_eq!(client.rpc().base_url(), "http://node:26657");
        assert_eq!(client.rpc().timeout(), std::time::Duration::from_secs(7));
    }
}
