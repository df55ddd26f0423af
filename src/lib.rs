//! # LBC Rust Client
//!
//! A Rust client for the LBC promise ledger, a CometBFT application that
//! records identities, beneficiaries, promises, and commitments.
//!
//! ## Modules
//!
//! - [`keys`]: Local ed25519 identity key storage
//! - [`tx`]: Transaction bodies, canonical encoding, and signed envelopes
//! - [`rpc`]: CometBFT JSON-RPC transport (`broadcast_tx_commit`, `abci_query`)
//! - [`query`]: Query path resolution and value decoding
//! - [`client`]: High-level operations tying the above together
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use lbc_client::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = LbcClient::from_config(&ClientConfig::default())?;
//!
//!     // Register the local key as an identity
//!     client.register_commiter("Alice").await?;
//!
//!     // Create a beneficiary and promise something to it
//!     let beneficiary = client.create_beneficiary("Bob").await?;
//!     let args = CreatePromiseArgs::new(
//!         "Ship the release",
//!         "2030-01-01",
//!         &beneficiary.payload.id,
//!         "2030-01-01",
//!     );
//!     client.create_promise_with_commitment(&args).await?;
//!
//!     // List promises
//!     let view = client.query_value(&QueryRequest::list(EntityAlias::Promise)).await?;
//!     println!("{view}");
//!     Ok(())
//! }
//! ```

// ============================================================================
// MODULES
// ============================================================================

/// High-level client.
pub mod client;

/// Client configuration (TOML).
pub mod config;

/// Error types.
pub mod error;

/// ed25519 key store.
pub mod keys;

/// Default endpoint and key file names.
pub mod network;

/// Query requests and value views.
pub mod query;

/// JSON-RPC transport.
pub mod rpc;

/// Shared utilities: ids, due-date parsing, serde helpers.
pub mod shared;

/// Transaction bodies and envelopes.
pub mod tx;

// ============================================================================
// PRELUDE
// ============================================================================

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use lbc_client::prelude::*;
/// ```
pub mod prelude {
    pub use crate::client::{CreatePromiseArgs, LbcClient, Receipt};
    pub use crate::config::{ClientConfig, ConfigError};
    pub use crate::error::{ErrorKind, LbcError, LbcResult};
    pub use crate::keys::{identity_id, KeyError, KeyStore, Keypair};
    pub use crate::network::{DEFAULT_KEY_DIR, DEFAULT_RPC_URL};
    pub use crate::query::{EntityAlias, QueryRequest, QueryView};
    pub use crate::rpc::{
        AbciQueryResponse, AbciResponse, BroadcastOutcome, LbcRpcClient, LbcRpcClientBuilder,
        RetryConfig, TxResult,
    };
    pub use crate::shared::{new_entity_id, parse_due};
    pub use crate::tx::{
        BeneficiaryBody, BodyKind, CommiterBody, CommitmentBody, CompositeBody, Payload,
        PromiseBody, SignedTx,
    };
}
