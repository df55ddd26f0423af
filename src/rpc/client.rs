//! CometBFT JSON-RPC client.
//!
//! Submits signed envelopes with `broadcast_tx_commit` and reads state with
//! `abci_query`. Every call is bounded by the client timeout. Transport
//! failures that happen before any response is received may be retried;
//! a response, once received, is always classified as-is.

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::classify::{classify_broadcast, classify_query};
use super::types::{AbciQueryResponse, BroadcastOutcome, BroadcastTxParams, JsonRpcRequest};
use crate::error::{LbcError, LbcResult};
use crate::query::QueryRequest;
use crate::tx::SignedTx;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Retry configuration for transport failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (0 = disabled)
    pub max_retries: u32,
    /// Base delay before first retry (ms)
    pub base_delay_ms: u64,
    /// Maximum delay between retries (ms)
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 1,
            base_delay_ms: 200,
            max_delay_ms: 2_000,
        }
    }
}

impl RetryConfig {
    /// Create a new retry config with the given max retries.
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// No retries.
    pub fn disabled() -> Self {
        Self::new(0)
    }

    /// Set the base delay in milliseconds.
    pub fn with_base_delay_ms(mut self, ms: u64) -> Self {
        self.base_delay_ms = ms;
        self
    }

    /// Set the maximum delay in milliseconds.
    pub fn with_max_delay_ms(mut self, ms: u64) -> Self {
        self.max_delay_ms = ms;
        self
    }

    /// Exponential backoff with 75-100% jitter.
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exp_delay = self.base_delay_ms.saturating_mul(1 << attempt.min(10));
        let capped_delay = exp_delay.min(self.max_delay_ms);
        let jitter_range = capped_delay / 4;
        let jitter = rand::random::<u64>() % (jitter_range + 1);
        Duration::from_millis(capped_delay - jitter_range + jitter)
    }
}

/// Whether a call may be repeated after a timeout.
///
/// A timed-out broadcast may already be in the mempool, so only reads
/// retry on timeout. Connection failures are retried for both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CallKind {
    Broadcast,
    Query,
}

impl CallKind {
    fn is_retryable(self, e: &reqwest::Error) -> bool {
        e.is_connect() || (self == CallKind::Query && e.is_timeout())
    }
}

/// Builder for configuring [`LbcRpcClient`].
#[derive(Debug, Clone)]
pub struct LbcRpcClientBuilder {
    base_url: String,
    timeout: Duration,
    default_headers: Vec<(String, String)>,
    retry_config: RetryConfig,
}

impl LbcRpcClientBuilder {
    /// Create a new builder for the given RPC endpoint.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            default_headers: Vec::new(),
            retry_config: RetryConfig::default(),
        }
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the timeout in seconds.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    /// Add a default header to all requests.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Set the transport retry policy.
    pub fn with_retry(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }

    /// Build the client.
    pub fn build(self) -> LbcResult<LbcRpcClient> {
        if self.base_url.is_empty() {
            return Err(LbcError::InvalidInput("RPC URL cannot be empty".to_string()));
        }
        if self.timeout.is_zero() {
            return Err(LbcError::InvalidInput("timeout must be > 0".to_string()));
        }

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::CONTENT_TYPE,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );

        for (name, value) in self.default_headers {
            let header_name = reqwest::header::HeaderName::try_from(name.as_str())
                .map_err(|e| LbcError::InvalidInput(format!("Invalid header name '{}': {}", name, e)))?;
            let header_value = reqwest::header::HeaderValue::from_str(&value)
                .map_err(|e| LbcError::InvalidInput(format!("Invalid header value for '{}': {}", name, e)))?;
            headers.insert(header_name, header_value);
        }

        let http_client = Client::builder()
            .timeout(self.timeout)
            .default_headers(headers)
            .build()?;

        Ok(LbcRpcClient {
            http_client,
            base_url: self.base_url,
            timeout: self.timeout,
            retry_config: self.retry_config,
        })
    }
}

/// CometBFT JSON-RPC client.
#[derive(Debug, Clone)]
pub struct LbcRpcClient {
    http_client: Client,
    base_url: String,
    timeout: Duration,
    retry_config: RetryConfig,
}

impl LbcRpcClient {
    /// Create a client with default settings (30s timeout, one transport retry).
    pub fn new(base_url: impl Into<String>) -> LbcResult<Self> {
        LbcRpcClientBuilder::new(base_url).build()
    }

    /// Create a new client builder for custom configuration.
    pub fn builder(base_url: impl Into<String>) -> LbcRpcClientBuilder {
        LbcRpcClientBuilder::new(base_url)
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    // =========================================================================
    // Write path
    // =========================================================================

    /// Submit a signed envelope and wait for it to be committed.
    ///
    /// # Errors
    ///
    /// - [`LbcError::ValidationRejected`] if CheckTx returned a non-zero code
    /// - [`LbcError::ExecutionRejected`] if DeliverTx returned a non-zero code
    /// - [`LbcError::Rpc`], [`LbcError::Http`], [`LbcError::Timeout`] on transport failure
    /// - [`LbcError::EmptyResult`] if the node returned no result
    pub async fn broadcast_tx_commit(&self, tx: &SignedTx) -> LbcResult<BroadcastOutcome> {
        let envelope = tx.to_vec()?;
        self.broadcast_tx_commit_raw(&envelope).await
    }

    /// Submit pre-encoded envelope bytes.
    pub async fn broadcast_tx_commit_raw(&self, envelope: &[u8]) -> LbcResult<BroadcastOutcome> {
        let request = JsonRpcRequest::new(
            "broadcast_tx_commit",
            BroadcastTxParams {
                tx: STANDARD.encode(envelope),
            },
        );
        let body = serde_json::to_vec(&request).map_err(|e| LbcError::Encoding(e.to_string()))?;

        tracing::info!(
            request_id = %request.id,
            tx_len = envelope.len(),
            "broadcasting transaction"
        );

        let (status, bytes) = self
            .execute_with_retry(CallKind::Broadcast, || {
                self.http_client.post(&self.base_url).body(body.clone()).send()
            })
            .await?;

        let outcome = classify_broadcast(status, &bytes)?;
        tracing::info!(hash = %outcome.hash, height = %outcome.height, "transaction committed");
        Ok(outcome)
    }

    // =========================================================================
    // Read path
    // =========================================================================

    /// Run an `abci_query`.
    ///
    /// A non-zero ABCI code is logged and returned, not treated as an error.
    pub async fn abci_query(&self, request: &QueryRequest) -> LbcResult<AbciQueryResponse> {
        let url = format!("{}/abci_query?{}", self.base_url, request.to_query_string()?);
        tracing::debug!(url = %url, "abci_query");

        let (status, bytes) = self
            .execute_with_retry(CallKind::Query, || self.http_client.get(&url).send())
            .await?;

        let response = classify_query(status, &bytes)?;
        if let Some(inner) = response.response() {
            if inner.code != 0 {
                tracing::warn!(
                    code = inner.code,
                    log = %inner.log,
                    codespace = %inner.codespace,
                    path = %request.path(),
                    "abci_query returned non-zero code"
                );
            }
        }
        Ok(response)
    }

    // =========================================================================
    // Internal helpers
    // =========================================================================

    /// Send a request, retrying transport failures allowed for `kind`.
    ///
    /// Returns the HTTP status and the full body. Non-success statuses are
    /// returned, not retried.
    async fn execute_with_retry<F, Fut>(&self, kind: CallKind, request_fn: F) -> LbcResult<(u16, Vec<u8>)>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<reqwest::Response, reqwest::Error>>,
    {
        let mut attempt = 0;

        loop {
            match request_fn().await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    let bytes = response.bytes().await.map_err(|e| self.map_transport_error(e))?;
                    return Ok((status, bytes.to_vec()));
                }
                Err(e) => {
                    if attempt < self.retry_config.max_retries && kind.is_retryable(&e) {
                        let delay = self.retry_config.delay_for_attempt(attempt);
                        tracing::debug!(
                            attempt = attempt + 1,
                            max_retries = self.retry_config.max_retries,
                            delay_ms = delay.as_millis(),
                            error = %e,
                            "Retrying request after network error"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }

                    return Err(self.map_transport_error(e));
                }
            }
        }
    }

    fn map_transport_error(&self, e: reqwest::Error) -> LbcError {
        if e.is_timeout() {
            LbcError::Timeout(self.timeout)
        } else {
            LbcError::Http(e)
        }
    }
}
