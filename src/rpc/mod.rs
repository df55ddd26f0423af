//! CometBFT JSON-RPC transport and response classification.

pub mod classify;
pub mod client;
pub mod types;

pub use classify::{classify_broadcast, classify_query};
pub use client::{LbcRpcClient, LbcRpcClientBuilder, RetryConfig, DEFAULT_TIMEOUT_SECS};
pub use types::{AbciQueryResponse, AbciResponse, BroadcastOutcome, TxResult};
